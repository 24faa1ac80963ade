//! End-to-end command-router tests over the in-memory store backend.
//!
//! These drive the runtime exactly the way a presentation layer would:
//! typed commands in, projections and progress events out, nothing but the
//! channel endpoints touched.

use gridiron::generate::{LeagueOptions, TeamDef};
use gridiron::router::runtime::{LeagueRuntime, RuntimeConfig};
use gridiron::router::{Command, Event, ResponseBody};
use gridiron::sim::{GameSimulator, SimOutcome, SimRequest};
use gridiron::storage::InMemoryStores;
use gridiron::{LeagueSettings, PlayerId, SeasonId, StatDelta, TeamId};

fn defs(n: usize) -> Vec<TeamDef> {
    (0..n)
        .map(|i| TeamDef {
            name: format!("City {i}"),
            abbr: format!("C{i}"),
            conference: if i % 2 == 0 { "East" } else { "West" }.to_string(),
            division: "North".to_string(),
        })
        .collect()
}

fn options(season_weeks: u32) -> LeagueOptions {
    LeagueOptions {
        settings: LeagueSettings {
            season_weeks,
            roster_size: 5,
            ..LeagueSettings::default()
        },
        start_year: 2025,
        user_team: Some(0),
    }
}

/// Scripted simulator: every game ends 24-10 for the home side, with a
/// single stat line for the home team's first skill player.
struct FixedScoreSimulator;

impl GameSimulator for FixedScoreSimulator {
    fn simulate(&mut self, request: &SimRequest) -> Vec<SimOutcome> {
        request
            .games
            .iter()
            .map(|game| {
                let scorer = request
                    .teams
                    .iter()
                    .find(|t| t.team.id == game.home)
                    .and_then(|t| t.roster.first())
                    .map(|p| p.id);
                SimOutcome {
                    home: game.home,
                    away: game.away,
                    home_score: 24,
                    away_score: 10,
                    player_stats: scorer
                        .map(|id| {
                            vec![(
                                id,
                                StatDelta {
                                    games: Some(1),
                                    pass_yd: Some(240),
                                    ..StatDelta::default()
                                },
                            )]
                        })
                        .unwrap_or_default(),
                    box_score: None,
                }
            })
            .collect()
    }
}

#[test]
fn advance_week_applies_the_spec_scenario() {
    // New league with 2 teams; one scheduled game, home team 0 wins 24-10.
    let stores = InMemoryStores::handles();
    let runtime = LeagueRuntime::start(
        stores.clone(),
        Box::new(FixedScoreSimulator),
        RuntimeConfig::default(),
    );

    let response = runtime
        .request(Command::NewLeague {
            team_defs: defs(2),
            options: options(2),
        })
        .unwrap();
    assert!(matches!(response.body, ResponseBody::League(_)));

    let response = runtime.request(Command::AdvanceWeek).unwrap();
    let ResponseBody::Week(outcome) = response.body else {
        panic!("expected week outcome, got {:?}", response.body);
    };

    assert_eq!(outcome.week, 1);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].id, "s1_w1_0_1");
    assert_eq!(outcome.results[0].home_score, 24);
    assert_eq!(outcome.results[0].away_score, 10);
    assert_eq!(outcome.next_week, 2);
    assert!(!outcome.season_over);

    // Standings: team 0 at 1-0 with 24/10, team 1 symmetric.
    let winner = outcome
        .standings
        .iter()
        .find(|r| r.team_id == TeamId(0))
        .unwrap();
    assert_eq!((winner.wins, winner.losses), (1, 0));
    assert_eq!((winner.points_for, winner.points_against), (24, 10));

    let loser = outcome
        .standings
        .iter()
        .find(|r| r.team_id == TeamId(1))
        .unwrap();
    assert_eq!((loser.wins, loser.losses), (0, 1));
    assert_eq!((loser.points_for, loser.points_against), (10, 24));

    // The advance flushed: both team records and the game are durable.
    let stored = stores.teams.get(TeamId(0)).unwrap().unwrap();
    assert_eq!(stored.record.wins, 1);
    let game = stores
        .games
        .get("s1_w1_0_1".parse().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(game.home_score, 24);
}

#[test]
fn sim_to_week_emits_progress_and_stops_at_the_target() {
    let runtime = LeagueRuntime::start(
        InMemoryStores::handles(),
        Box::new(FixedScoreSimulator),
        RuntimeConfig {
            sim_batch_size: 1,
            ..RuntimeConfig::default()
        },
    );

    runtime
        .request(Command::NewLeague {
            team_defs: defs(4),
            options: options(6),
        })
        .unwrap();

    let response = runtime
        .request(Command::SimToWeek { target_week: 4 })
        .unwrap();
    let ResponseBody::League(projection) = response.body else {
        panic!("expected league projection");
    };
    assert_eq!(projection.week, 4);

    // 3 weeks x 2 games at batch size 1 = 6 progress events, each batch
    // reporting done/total for its own week.
    let mut events = Vec::new();
    while let Some(event) = runtime.try_next_event() {
        events.push(event);
    }
    assert_eq!(events.len(), 6);
    assert!(events
        .iter()
        .all(|e| matches!(e, Event::SimProgress { total: 2, .. })));
}

#[test]
fn a_full_season_archives_and_rolls_over() {
    let stores = InMemoryStores::handles();
    let runtime = LeagueRuntime::start(
        stores.clone(),
        Box::new(FixedScoreSimulator),
        RuntimeConfig::default(),
    );

    runtime
        .request(Command::NewLeague {
            team_defs: defs(2),
            options: options(2),
        })
        .unwrap();

    // Weeks 1 and 2, then the championship.
    runtime.request(Command::AdvanceWeek).unwrap();
    runtime.request(Command::AdvanceWeek).unwrap();
    let response = runtime.request(Command::AdvanceWeek).unwrap();
    let ResponseBody::Week(outcome) = response.body else {
        panic!("expected week outcome");
    };
    assert!(outcome.season_over);

    // The finished season is queryable through the History Cache path.
    let response = runtime
        .request(Command::GetSeasonHistory {
            season: SeasonId(1),
        })
        .unwrap();
    let ResponseBody::SeasonHistory { data, .. } = response.body else {
        panic!("expected season history");
    };
    let summary = data.expect("season 1 should be archived");
    assert_eq!(summary.season, SeasonId(1));
    assert!(summary.champion.is_some());
    assert_eq!(summary.standings.len(), 2);

    // Offseason advance starts season 2 with fresh records.
    let response = runtime.request(Command::AdvanceWeek).unwrap();
    let ResponseBody::Week(outcome) = response.body else {
        panic!("expected week outcome");
    };
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.next_week, 1);
    assert!(outcome.standings.iter().all(|r| r.wins == 0 && r.losses == 0));

    let response = runtime.request(Command::Init).unwrap();
    let ResponseBody::League(projection) = response.body else {
        panic!("expected league projection");
    };
    assert_eq!(projection.season, SeasonId(2));
    assert_eq!(projection.year, 2026);
}

#[test]
fn player_career_includes_the_live_season() {
    let runtime = LeagueRuntime::start(
        InMemoryStores::handles(),
        Box::new(FixedScoreSimulator),
        RuntimeConfig::default(),
    );

    runtime
        .request(Command::NewLeague {
            team_defs: defs(2),
            options: options(2),
        })
        .unwrap();
    runtime.request(Command::AdvanceWeek).unwrap();

    // The scripted simulator credits the home team's first roster player.
    let response = runtime.request(Command::GetLeagueLeaders).unwrap();
    let ResponseBody::Leaders(leaders) = response.body else {
        panic!("expected leaders");
    };
    let leader = leaders.passing.first().expect("someone threw for yards");
    assert_eq!(leader.value, 240);

    let response = runtime
        .request(Command::GetPlayerCareer {
            player: leader.player_id,
        })
        .unwrap();
    let ResponseBody::PlayerCareer { player, stats } = response.body else {
        panic!("expected player career");
    };
    assert_eq!(player.id, leader.player_id);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].key.season, SeasonId(1));
    assert_eq!(stats[0].totals.pass_yd, 240);
}

#[test]
fn unknown_player_career_is_a_not_found_error_response() {
    let runtime = LeagueRuntime::start(
        InMemoryStores::handles(),
        Box::new(FixedScoreSimulator),
        RuntimeConfig::default(),
    );

    runtime
        .request(Command::NewLeague {
            team_defs: defs(2),
            options: options(2),
        })
        .unwrap();

    let response = runtime
        .request(Command::GetPlayerCareer {
            player: PlayerId(9999),
        })
        .unwrap();
    let ResponseBody::Error { kind, message } = response.body else {
        panic!("expected error response");
    };
    assert_eq!(kind, "not_found");
    assert!(message.contains("9999"));
}

#[test]
fn reset_league_returns_to_no_save() {
    let stores = InMemoryStores::handles();
    let runtime = LeagueRuntime::start(
        stores.clone(),
        Box::new(FixedScoreSimulator),
        RuntimeConfig::default(),
    );

    runtime
        .request(Command::NewLeague {
            team_defs: defs(2),
            options: options(2),
        })
        .unwrap();
    let response = runtime.request(Command::ResetLeague).unwrap();
    assert!(matches!(response.body, ResponseBody::NoSave));

    assert!(stores.teams.get_all().unwrap().is_empty());
    let response = runtime.request(Command::Init).unwrap();
    assert!(matches!(response.body, ResponseBody::NoSave));
}
