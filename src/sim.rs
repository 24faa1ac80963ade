//! Simulation collaborator seam.
//!
//! The play-by-play engine is an external collaborator: it consumes
//! teams-with-rosters plus the week's scheduled games and returns outcomes.
//! It never touches the Hot Cache. All randomness in the system lives behind
//! this trait; the state engine itself is deterministic.

use serde_json::json;

use crate::meta::ScheduledGame;
use crate::player::{Player, PlayerId, Position};
use crate::season::SeasonId;
use crate::stats::StatDelta;
use crate::team::{Team, TeamId};

/// One team and its current roster, as handed to the simulator.
#[derive(Debug, Clone)]
pub struct SimTeam {
    /// The team record.
    pub team: Team,
    /// Rostered players.
    pub roster: Vec<Player>,
}

/// Input for one batch of games.
#[derive(Debug, Clone)]
pub struct SimRequest {
    /// Season being played.
    pub season: SeasonId,
    /// Calendar year.
    pub year: u32,
    /// Week being played.
    pub week: u32,
    /// Every team involved in the batch, with rosters.
    pub teams: Vec<SimTeam>,
    /// The games to resolve.
    pub games: Vec<ScheduledGame>,
}

/// Result of one simulated game.
#[derive(Debug, Clone)]
pub struct SimOutcome {
    /// Home team.
    pub home: TeamId,
    /// Away team.
    pub away: TeamId,
    /// Home final score.
    pub home_score: u32,
    /// Away final score.
    pub away_score: u32,
    /// Per-player stat deltas produced by the game.
    pub player_stats: Vec<(PlayerId, StatDelta)>,
    /// Opaque box-score payload, stored verbatim on the game record.
    pub box_score: Option<serde_json::Value>,
}

/// The external game simulator.
///
/// Implementations may hold RNG state, hence `&mut self`.
pub trait GameSimulator: Send {
    /// Resolve every game in the request, in order.
    fn simulate(&mut self, request: &SimRequest) -> Vec<SimOutcome>;
}

/// Deterministic rating-based simulator.
///
/// Scores derive from average roster overall plus a home edge and a
/// schedule-keyed jitter, so repeated runs of the same save produce the same
/// season. Good enough to exercise the state engine; a real game swaps in
/// its own collaborator.
#[derive(Debug, Default)]
pub struct RatingSimulator;

impl RatingSimulator {
    fn roster_rating(teams: &[SimTeam], id: TeamId) -> i64 {
        teams
            .iter()
            .find(|t| t.team.id == id)
            .map_or(60, |t| {
                if t.roster.is_empty() {
                    60
                } else {
                    t.roster.iter().map(|p| i64::from(p.overall)).sum::<i64>()
                        / t.roster.len() as i64
                }
            })
    }

    fn best_at(teams: &[SimTeam], id: TeamId, pos: Position) -> Option<PlayerId> {
        teams
            .iter()
            .find(|t| t.team.id == id)
            .and_then(|t| {
                t.roster
                    .iter()
                    .filter(|p| p.pos == pos)
                    .max_by_key(|p| p.overall)
            })
            .map(|p| p.id)
    }

    fn team_stats(
        teams: &[SimTeam],
        id: TeamId,
        score: u32,
        out: &mut Vec<(PlayerId, StatDelta)>,
    ) {
        let pass_yd = 140 + score * 6;
        let rush_yd = 60 + score * 2;
        let tds = score / 7;

        if let Some(qb) = Self::best_at(teams, id, Position::QB) {
            out.push((
                qb,
                StatDelta {
                    games: Some(1),
                    pass_yd: Some(pass_yd),
                    pass_td: Some(tds),
                    pass_int: Some(u32::from(score < 14)),
                    ..StatDelta::default()
                },
            ));
        }
        if let Some(rb) = Self::best_at(teams, id, Position::RB) {
            out.push((
                rb,
                StatDelta {
                    games: Some(1),
                    rush_yd: Some(rush_yd),
                    rush_td: Some(tds / 2),
                    ..StatDelta::default()
                },
            ));
        }
        if let Some(wr) = Self::best_at(teams, id, Position::WR) {
            out.push((
                wr,
                StatDelta {
                    games: Some(1),
                    rec: Some(4 + score / 10),
                    rec_yd: Some(pass_yd / 2),
                    rec_td: Some(tds - tds / 2),
                    ..StatDelta::default()
                },
            ));
        }
    }
}

impl GameSimulator for RatingSimulator {
    fn simulate(&mut self, request: &SimRequest) -> Vec<SimOutcome> {
        request
            .games
            .iter()
            .map(|game| {
                let home_rating = Self::roster_rating(&request.teams, game.home);
                let away_rating = Self::roster_rating(&request.teams, game.away);

                // Schedule-keyed jitter keeps seasons from being pure chalk
                // while staying reproducible.
                let seed = u64::from(request.season.0) * 1_000_003
                    + u64::from(game.week) * 7919
                    + u64::from(game.home.0) * 131
                    + u64::from(game.away.0) * 31;
                let jitter = (seed % 13) as i64 - 6;

                let margin = (home_rating + 2 - away_rating) / 2 + jitter;
                let base = 20i64;
                let home_score = (base + margin).clamp(3, 48) as u32;
                let away_score = (base - margin).clamp(3, 48) as u32;

                let mut player_stats = Vec::new();
                Self::team_stats(&request.teams, game.home, home_score, &mut player_stats);
                Self::team_stats(&request.teams, game.away, away_score, &mut player_stats);

                SimOutcome {
                    home: game.home,
                    away: game.away,
                    home_score,
                    away_score,
                    player_stats,
                    box_score: Some(json!({
                        "homeRating": home_rating,
                        "awayRating": away_rating,
                    })),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatTotals;
    use crate::team::TeamRecord;

    fn sim_team(id: u32, overall: u8) -> SimTeam {
        let team = Team {
            id: TeamId(id),
            name: format!("Team {id}"),
            abbr: format!("T{id}"),
            conference: "East".to_string(),
            division: "North".to_string(),
            record: TeamRecord::default(),
            cap_used: 0,
        };
        let roster = [Position::QB, Position::RB, Position::WR]
            .iter()
            .enumerate()
            .map(|(i, &pos)| Player {
                id: PlayerId(id * 10 + i as u32),
                name: format!("Player {i}"),
                pos,
                age: 25,
                overall,
                potential: overall,
                contract: None,
                team_id: Some(TeamId(id)),
                career: StatTotals::default(),
            })
            .collect();
        SimTeam { team, roster }
    }

    fn request() -> SimRequest {
        SimRequest {
            season: SeasonId(1),
            year: 2025,
            week: 1,
            teams: vec![sim_team(0, 90), sim_team(1, 60)],
            games: vec![ScheduledGame {
                week: 1,
                home: TeamId(0),
                away: TeamId(1),
            }],
        }
    }

    #[test]
    fn outcomes_are_deterministic() {
        let mut sim = RatingSimulator;
        let a = sim.simulate(&request());
        let b = sim.simulate(&request());

        assert_eq!(a.len(), 1);
        assert_eq!(a[0].home_score, b[0].home_score);
        assert_eq!(a[0].away_score, b[0].away_score);
    }

    #[test]
    fn stronger_roster_wins_comfortably() {
        let mut sim = RatingSimulator;
        let outcomes = sim.simulate(&request());
        assert!(outcomes[0].home_score > outcomes[0].away_score);
    }

    #[test]
    fn every_game_produces_skill_player_stats() {
        let mut sim = RatingSimulator;
        let outcomes = sim.simulate(&request());

        // One QB, RB, and WR line per side.
        assert_eq!(outcomes[0].player_stats.len(), 6);
        assert!(outcomes[0]
            .player_stats
            .iter()
            .all(|(_, delta)| delta.games == Some(1)));
    }
}
