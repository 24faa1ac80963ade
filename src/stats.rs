//! Statistic accumulators and their typed partial updates.
//!
//! Accumulation is additive: the simulation collaborator reports per-game
//! deltas, and [`StatDelta::apply_to`] merges only the declared numeric
//! fields. Non-numeric attribution (player, team) is set once when the
//! accumulator is created and never overwritten by a merge.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::season::SeasonId;
use crate::team::TeamId;

/// Running per-stat totals for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTotals {
    /// Games appeared in.
    pub games: u32,
    /// Passing yards.
    pub pass_yd: u32,
    /// Passing touchdowns.
    pub pass_td: u32,
    /// Interceptions thrown.
    pub pass_int: u32,
    /// Rushing yards.
    pub rush_yd: u32,
    /// Rushing touchdowns.
    pub rush_td: u32,
    /// Receptions.
    pub rec: u32,
    /// Receiving yards.
    pub rec_yd: u32,
    /// Receiving touchdowns.
    pub rec_td: u32,
}

impl StatTotals {
    /// Fold another totals value into this one, field by field.
    ///
    /// Used at season rollover to merge a season's accumulator into a
    /// player's career totals.
    pub fn fold(&mut self, other: &Self) {
        self.games += other.games;
        self.pass_yd += other.pass_yd;
        self.pass_td += other.pass_td;
        self.pass_int += other.pass_int;
        self.rush_yd += other.rush_yd;
        self.rush_td += other.rush_td;
        self.rec += other.rec;
        self.rec_yd += other.rec_yd;
        self.rec_td += other.rec_td;
    }
}

/// Typed partial update for [`StatTotals`].
///
/// Only the declared (`Some`) fields are applied; everything else is left
/// untouched. This replaces shallow-merge patching with a shape the compiler
/// can check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    /// Games appeared in.
    pub games: Option<u32>,
    /// Passing yards.
    pub pass_yd: Option<u32>,
    /// Passing touchdowns.
    pub pass_td: Option<u32>,
    /// Interceptions thrown.
    pub pass_int: Option<u32>,
    /// Rushing yards.
    pub rush_yd: Option<u32>,
    /// Rushing touchdowns.
    pub rush_td: Option<u32>,
    /// Receptions.
    pub rec: Option<u32>,
    /// Receiving yards.
    pub rec_yd: Option<u32>,
    /// Receiving touchdowns.
    pub rec_td: Option<u32>,
}

impl StatDelta {
    /// Add every declared field into `totals`.
    pub fn apply_to(&self, totals: &mut StatTotals) {
        if let Some(v) = self.games {
            totals.games += v;
        }
        if let Some(v) = self.pass_yd {
            totals.pass_yd += v;
        }
        if let Some(v) = self.pass_td {
            totals.pass_td += v;
        }
        if let Some(v) = self.pass_int {
            totals.pass_int += v;
        }
        if let Some(v) = self.rush_yd {
            totals.rush_yd += v;
        }
        if let Some(v) = self.rush_td {
            totals.rush_td += v;
        }
        if let Some(v) = self.rec {
            totals.rec += v;
        }
        if let Some(v) = self.rec_yd {
            totals.rec_yd += v;
        }
        if let Some(v) = self.rec_td {
            totals.rec_td += v;
        }
    }

    /// Returns true if no field is declared.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.games.is_none()
            && self.pass_yd.is_none()
            && self.pass_td.is_none()
            && self.pass_int.is_none()
            && self.rush_yd.is_none()
            && self.rush_td.is_none()
            && self.rec.is_none()
            && self.rec_yd.is_none()
            && self.rec_td.is_none()
    }
}

/// Current-season accumulator for one player.
///
/// Exists only for the active season; never survives a rollover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonStatLine {
    /// Player the stats belong to.
    pub player_id: PlayerId,
    /// Team the player earned the stats for.
    pub team_id: TeamId,
    /// Running totals.
    pub totals: StatTotals,
}

/// Durable key for an archived per-season stat row, rendered `"s1_p4"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatKey {
    /// The season the row covers.
    pub season: SeasonId,
    /// The player the row belongs to.
    pub player: PlayerId,
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_p{}", self.season, self.player)
    }
}

impl FromStr for StatKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (season_part, player_part) = s
            .split_once("_p")
            .ok_or_else(|| format!("malformed stat key '{s}'"))?;
        let season = season_part
            .parse::<SeasonId>()
            .map_err(|e| format!("malformed stat key '{s}': {e}"))?;
        let player = player_part
            .parse::<u32>()
            .map_err(|e| format!("malformed stat key '{s}': {e}"))?;
        Ok(Self {
            season,
            player: PlayerId(player),
        })
    }
}

impl Serialize for StatKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StatKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Archived per-season stat row, written at flush time and at rollover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSeasonStat {
    /// Durable key, `season` + `player`.
    pub key: StatKey,
    /// Team attribution at archive time.
    pub team_id: TeamId,
    /// Final (or latest-flushed) totals for the season.
    pub totals: StatTotals,
}

impl PlayerSeasonStat {
    /// Build an archived row from a live accumulator.
    #[must_use]
    pub fn from_line(season: SeasonId, line: &SeasonStatLine) -> Self {
        Self {
            key: StatKey {
                season,
                player: line.player_id,
            },
            team_id: line.team_id,
            totals: line.totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_applies_only_declared_fields() {
        let mut totals = StatTotals {
            pass_yd: 100,
            rush_yd: 40,
            ..StatTotals::default()
        };

        let delta = StatDelta {
            pass_yd: Some(250),
            pass_td: Some(2),
            ..StatDelta::default()
        };
        delta.apply_to(&mut totals);

        assert_eq!(totals.pass_yd, 350);
        assert_eq!(totals.pass_td, 2);
        // Undeclared fields untouched.
        assert_eq!(totals.rush_yd, 40);
    }

    #[test]
    fn delta_is_additive_across_repeated_calls() {
        let mut totals = StatTotals::default();
        let delta = StatDelta {
            rec: Some(4),
            rec_yd: Some(62),
            ..StatDelta::default()
        };
        delta.apply_to(&mut totals);
        delta.apply_to(&mut totals);

        assert_eq!(totals.rec, 8);
        assert_eq!(totals.rec_yd, 124);
    }

    #[test]
    fn fold_sums_every_field() {
        let mut career = StatTotals {
            games: 16,
            pass_yd: 4000,
            ..StatTotals::default()
        };
        let season = StatTotals {
            games: 17,
            pass_yd: 4500,
            pass_td: 38,
            ..StatTotals::default()
        };
        career.fold(&season);

        assert_eq!(career.games, 33);
        assert_eq!(career.pass_yd, 8500);
        assert_eq!(career.pass_td, 38);
    }

    #[test]
    fn stat_key_round_trips_through_display() {
        let key = StatKey {
            season: SeasonId(3),
            player: PlayerId(17),
        };
        assert_eq!(key.to_string(), "s3_p17");
        assert_eq!("s3_p17".parse::<StatKey>().unwrap(), key);
    }

    #[test]
    fn stat_key_serializes_as_string() {
        let key = StatKey {
            season: SeasonId(1),
            player: PlayerId(4),
        };
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"s1_p4\"");

        let parsed: StatKey = serde_json::from_str("\"s1_p4\"").unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn malformed_stat_keys_are_rejected() {
        assert!("s1p4".parse::<StatKey>().is_err());
        assert!("x1_p4".parse::<StatKey>().is_err());
        assert!("s1_pxyz".parse::<StatKey>().is_err());
    }
}
