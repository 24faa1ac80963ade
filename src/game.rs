//! Game records and their composite durable key.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::season::SeasonId;
use crate::team::TeamId;

/// Composite key identifying one scheduled or played game, rendered
/// `"s1_w1_0_1"` (season, week, home team, away team).
///
/// The rendering is the durable-store key, so it must stay stable across
/// versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId {
    /// Season the game belongs to.
    pub season: SeasonId,
    /// Week within the season, 1-based.
    pub week: u32,
    /// Home team.
    pub home: TeamId,
    /// Away team.
    pub away: TeamId,
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_w{}_{}_{}", self.season, self.week, self.home, self.away)
    }
}

impl FromStr for GameId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('_');
        let season = parts
            .next()
            .ok_or_else(|| format!("malformed game id '{s}'"))?
            .parse::<SeasonId>()
            .map_err(|e| format!("malformed game id '{s}': {e}"))?;
        let week = parts
            .next()
            .and_then(|w| w.strip_prefix('w'))
            .ok_or_else(|| format!("malformed game id '{s}'"))?
            .parse::<u32>()
            .map_err(|e| format!("malformed game id '{s}': {e}"))?;
        let home = parts
            .next()
            .ok_or_else(|| format!("malformed game id '{s}'"))?
            .parse::<u32>()
            .map_err(|e| format!("malformed game id '{s}': {e}"))?;
        let away = parts
            .next()
            .ok_or_else(|| format!("malformed game id '{s}'"))?
            .parse::<u32>()
            .map_err(|e| format!("malformed game id '{s}': {e}"))?;
        if parts.next().is_some() {
            return Err(format!("malformed game id '{s}': trailing segments"));
        }
        Ok(Self {
            season,
            week,
            home: TeamId(home),
            away: TeamId(away),
        })
    }
}

impl Serialize for GameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A completed game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    /// Composite key: season, week, home, away.
    pub id: GameId,
    /// Home team final score.
    pub home_score: u32,
    /// Away team final score.
    pub away_score: u32,
    /// Optional box-score payload produced by the simulation collaborator.
    /// Opaque to this crate; stored and returned verbatim.
    pub box_score: Option<serde_json::Value>,
}

impl GameRecord {
    /// Winner of the game, `None` on a tie.
    #[must_use]
    pub fn winner(&self) -> Option<TeamId> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(self.id.home),
            std::cmp::Ordering::Less => Some(self.id.away),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> GameId {
        GameId {
            season: SeasonId(1),
            week: 1,
            home: TeamId(0),
            away: TeamId(1),
        }
    }

    #[test]
    fn game_id_renders_the_durable_key() {
        assert_eq!(id().to_string(), "s1_w1_0_1");
    }

    #[test]
    fn game_id_round_trips_through_parse() {
        assert_eq!("s1_w1_0_1".parse::<GameId>().unwrap(), id());
        assert_eq!(
            "s10_w17_12_3".parse::<GameId>().unwrap(),
            GameId {
                season: SeasonId(10),
                week: 17,
                home: TeamId(12),
                away: TeamId(3),
            }
        );
    }

    #[test]
    fn game_id_rejects_malformed_keys() {
        assert!("s1_w1_0".parse::<GameId>().is_err());
        assert!("s1_1_0_1".parse::<GameId>().is_err());
        assert!("s1_w1_0_1_9".parse::<GameId>().is_err());
    }

    #[test]
    fn game_id_serializes_as_string() {
        assert_eq!(serde_json::to_string(&id()).unwrap(), "\"s1_w1_0_1\"");
        let parsed: GameId = serde_json::from_str("\"s1_w1_0_1\"").unwrap();
        assert_eq!(parsed, id());
    }

    #[test]
    fn winner_reads_the_score() {
        let mut game = GameRecord {
            id: id(),
            home_score: 24,
            away_score: 10,
            box_score: None,
        };
        assert_eq!(game.winner(), Some(TeamId(0)));

        game.away_score = 24;
        assert_eq!(game.winner(), None);
    }
}
