//! League bootstrap: builds the entities a fresh league starts from.
//!
//! Generation is deterministic: rosters, ratings, and the round-robin
//! schedule all derive from team/slot indexes. The simulation collaborator
//! owns every random decision in the system.

use chrono::Utc;

use crate::cache::LeagueSnapshot;
use crate::draft::{DraftPick, PickId};
use crate::error::ValidationError;
use crate::meta::{LeagueMeta, LeagueSettings, Phase, ScheduledGame, SlimSchedule};
use crate::player::{Contract, Player, PlayerId, Position};
use crate::season::SeasonId;
use crate::stats::StatTotals;
use crate::team::{Team, TeamId, TeamRecord};

/// Caller-supplied definition of one franchise.
#[derive(Debug, Clone)]
pub struct TeamDef {
    /// Full display name.
    pub name: String,
    /// Short abbreviation.
    pub abbr: String,
    /// Conference assignment.
    pub conference: String,
    /// Division assignment.
    pub division: String,
}

/// Options for a new league.
#[derive(Debug, Clone)]
pub struct LeagueOptions {
    /// Rule settings.
    pub settings: LeagueSettings,
    /// Calendar year of the first season.
    pub start_year: u32,
    /// Team the user controls, by index into the team definitions.
    pub user_team: Option<u32>,
}

impl Default for LeagueOptions {
    fn default() -> Self {
        Self {
            settings: LeagueSettings::default(),
            start_year: 2025,
            user_team: Some(0),
        }
    }
}

const FIRST_NAMES: [&str; 16] = [
    "Marcus", "Deshaun", "Tyler", "Jalen", "Aaron", "Chris", "Derrick", "Malik", "Jordan", "Trey",
    "Caleb", "Darius", "Evan", "Isaiah", "Nolan", "Xavier",
];

const LAST_NAMES: [&str; 16] = [
    "Washington", "Brooks", "Carter", "Hayes", "Jenkins", "Mitchell", "Porter", "Reed", "Sanders",
    "Tate", "Vaughn", "Walsh", "Young", "Bishop", "Dalton", "Fletcher",
];

fn player_name(seed: u32) -> String {
    let first = FIRST_NAMES[(seed as usize * 7) % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed as usize * 13 + seed as usize / 16) % LAST_NAMES.len()];
    format!("{first} {last}")
}

fn generate_roster(team: TeamId, settings: &LeagueSettings, next_id: &mut u32) -> Vec<Player> {
    (0..settings.roster_size)
        .map(|slot| {
            let id = *next_id;
            *next_id += 1;

            let pos = Position::ALL[slot as usize % Position::ALL.len()];
            let overall = 58 + ((team.0 * 7 + slot * 11) % 30) as u8;
            let potential = (overall + (slot * 5 % 12) as u8).min(99);
            let age = 22 + ((team.0 + slot * 3) % 12) as u8;
            let salary = 800_000 + u64::from(overall) * 60_000;

            Player {
                id: PlayerId(id),
                name: player_name(id),
                pos,
                age,
                overall,
                potential,
                contract: Some(Contract {
                    salary,
                    years: 1 + (slot % 4) as u8,
                }),
                team_id: Some(team),
                career: StatTotals::default(),
            }
        })
        .collect()
}

/// Circle-method round-robin schedule over `team_ids`, repeated until
/// `weeks` are filled. Odd team counts get a rotating bye.
#[must_use]
pub fn round_robin(team_ids: &[TeamId], weeks: u32) -> SlimSchedule {
    let mut slots: Vec<Option<TeamId>> = team_ids.iter().copied().map(Some).collect();
    if slots.len() % 2 != 0 {
        slots.push(None); // bye marker
    }
    let n = slots.len();
    if n < 2 {
        return SlimSchedule::default();
    }
    let rounds_per_cycle = n - 1;

    let mut games = Vec::new();
    for week in 1..=weeks {
        let round = ((week - 1) as usize) % rounds_per_cycle;

        // Standard circle method: fix slot 0, rotate the rest by `round`.
        for pair in 0..n / 2 {
            let a = if pair == 0 {
                0
            } else {
                (pair + round) % (n - 1) + 1
            };
            let b = (n - 1 - pair + round) % (n - 1) + 1;
            let (Some(first), Some(second)) = (slots[a % n], slots[b % n]) else {
                continue; // bye
            };
            // Alternate home advantage cycle over cycle.
            let flip = (week - 1) / rounds_per_cycle as u32 % 2 == 1;
            let (home, away) = if flip { (second, first) } else { (first, second) };
            games.push(ScheduledGame { week, home, away });
        }
    }

    SlimSchedule { games }
}

fn generate_picks(
    teams: &[Team],
    settings: &LeagueSettings,
    start_year: u32,
    next_id: &mut u32,
) -> Vec<DraftPick> {
    let mut picks = Vec::new();
    // Two draft classes of assets ahead of the current season.
    for year_offset in 1..=2u32 {
        for round in 1..=settings.draft_rounds {
            for team in teams {
                let id = *next_id;
                *next_id += 1;
                picks.push(DraftPick {
                    id: PickId(id),
                    round,
                    year: start_year + year_offset,
                    original_owner: team.id,
                    owner: team.id,
                    selection: None,
                });
            }
        }
    }
    picks
}

/// Build a complete first-season league from team definitions.
///
/// # Errors
/// Rejects leagues with fewer than two teams.
pub fn build_league(
    team_defs: &[TeamDef],
    options: &LeagueOptions,
) -> Result<LeagueSnapshot, ValidationError> {
    if team_defs.len() < 2 {
        return Err(ValidationError::TooFewTeams {
            count: team_defs.len(),
        });
    }

    let teams: Vec<Team> = team_defs
        .iter()
        .enumerate()
        .map(|(idx, def)| Team {
            id: TeamId(idx as u32),
            name: def.name.clone(),
            abbr: def.abbr.clone(),
            conference: def.conference.clone(),
            division: def.division.clone(),
            record: TeamRecord::default(),
            cap_used: 0,
        })
        .collect();

    let mut next_player_id = 1u32;
    let mut players = Vec::new();
    for team in &teams {
        players.extend(generate_roster(team.id, &options.settings, &mut next_player_id));
    }

    // Derive cap usage now so the first projection is already consistent.
    let mut teams = teams;
    for team in &mut teams {
        team.cap_used = players
            .iter()
            .filter(|p| p.team_id == Some(team.id))
            .filter_map(|p| p.contract.map(|c| c.salary))
            .sum();
    }

    let team_ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
    let schedule = round_robin(&team_ids, options.settings.season_weeks);

    let mut next_pick_id = 1u32;
    let draft_picks = generate_picks(&teams, &options.settings, options.start_year, &mut next_pick_id);

    let user_team_id = options
        .user_team
        .filter(|idx| (*idx as usize) < teams.len())
        .map(TeamId);

    let meta = LeagueMeta {
        user_team_id,
        season: SeasonId(1),
        year: options.start_year,
        week: 1,
        phase: Phase::Regular,
        settings: options.settings,
        schedule,
        created_at: Utc::now(),
    };

    Ok(LeagueSnapshot {
        meta: Some(meta),
        teams,
        players,
        games: Vec::new(),
        season_stats: Vec::new(),
        draft_picks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

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

    #[test]
    fn build_league_rejects_a_single_team() {
        let err = build_league(&defs(1), &LeagueOptions::default()).unwrap_err();
        assert!(matches!(err, ValidationError::TooFewTeams { count: 1 }));
    }

    #[test]
    fn every_team_gets_a_full_roster_with_cap_usage() {
        let options = LeagueOptions::default();
        let league = build_league(&defs(4), &options).unwrap();

        assert_eq!(league.teams.len(), 4);
        assert_eq!(
            league.players.len(),
            4 * options.settings.roster_size as usize
        );
        for team in &league.teams {
            let rostered = league
                .players
                .iter()
                .filter(|p| p.team_id == Some(team.id))
                .count();
            assert_eq!(rostered, options.settings.roster_size as usize);
            assert!(team.cap_used > 0);
        }
    }

    #[test]
    fn player_ids_are_unique() {
        let league = build_league(&defs(6), &LeagueOptions::default()).unwrap();
        let ids: HashSet<PlayerId> = league.players.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), league.players.len());
    }

    #[test]
    fn round_robin_gives_every_team_one_game_per_week() {
        let ids: Vec<TeamId> = (0..4).map(TeamId).collect();
        let schedule = round_robin(&ids, 6);

        for week in 1..=6 {
            let mut seen = HashSet::new();
            for game in schedule.week(week) {
                assert!(seen.insert(game.home), "double-booked home team");
                assert!(seen.insert(game.away), "double-booked away team");
            }
            assert_eq!(seen.len(), 4);
        }
    }

    #[test]
    fn round_robin_handles_odd_team_counts_with_byes() {
        let ids: Vec<TeamId> = (0..5).map(TeamId).collect();
        let schedule = round_robin(&ids, 5);

        for week in 1..=5 {
            // Two games, one team idle.
            assert_eq!(schedule.week(week).count(), 2);
        }
    }

    #[test]
    fn draft_picks_cover_two_years_of_rounds() {
        let options = LeagueOptions::default();
        let league = build_league(&defs(2), &options).unwrap();

        let expected = 2 * options.settings.draft_rounds as usize * 2;
        assert_eq!(league.draft_picks.len(), expected);
        assert!(league.draft_picks.iter().all(DraftPick::is_outstanding));
    }
}
