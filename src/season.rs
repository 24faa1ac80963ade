//! Season identity and archived season summaries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::team::TeamId;

/// Season identifier, rendered `"s1"`, `"s2"`, … in durable keys.
///
/// Seasons count up from 1 for the life of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonId(pub u32);

impl SeasonId {
    /// The season after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl FromStr for SeasonId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('s')
            .ok_or_else(|| format!("season id '{s}' must start with 's'"))?;
        let n = digits
            .parse::<u32>()
            .map_err(|e| format!("season id '{s}': {e}"))?;
        Ok(Self(n))
    }
}

/// One row of a standings snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    /// The team.
    pub team_id: TeamId,
    /// Abbreviation at snapshot time, so history survives a rename.
    pub abbr: String,
    /// Games won.
    pub wins: u32,
    /// Games lost.
    pub losses: u32,
    /// Games tied.
    pub ties: u32,
    /// Points scored.
    pub points_for: u32,
    /// Points conceded.
    pub points_against: u32,
}

/// A season award, e.g. the passing-yardage title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    /// Award name.
    pub name: String,
    /// Recipient.
    pub player_id: PlayerId,
    /// The stat value that won it, for display.
    pub value: u32,
}

/// Archived summary of a completed season. Read-mostly after rollover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonSummary {
    /// The season this summarizes.
    pub season: SeasonId,
    /// Calendar year the season was played in.
    pub year: u32,
    /// Champion, if the playoffs completed.
    pub champion: Option<TeamId>,
    /// Final standings, best record first.
    pub standings: Vec<StandingRow>,
    /// Season awards.
    pub awards: Vec<Award>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_id_round_trips_through_display() {
        let id = SeasonId(12);
        assert_eq!(id.to_string(), "s12");
        assert_eq!("s12".parse::<SeasonId>().unwrap(), id);
    }

    #[test]
    fn season_id_rejects_bad_prefixes() {
        assert!("12".parse::<SeasonId>().is_err());
        assert!("w12".parse::<SeasonId>().is_err());
        assert!("s".parse::<SeasonId>().is_err());
    }

    #[test]
    fn next_increments() {
        assert_eq!(SeasonId(1).next(), SeasonId(2));
    }
}
