//! Player identity, positions, and contracts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::StatTotals;
use crate::team::TeamId;

/// Stable player identifier, assigned at league creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-field position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Quarterback.
    QB,
    /// Running back.
    RB,
    /// Wide receiver.
    WR,
    /// Tight end.
    TE,
    /// Offensive line.
    OL,
    /// Defensive line.
    DL,
    /// Linebacker.
    LB,
    /// Cornerback.
    CB,
    /// Safety.
    S,
    /// Kicker.
    K,
}

impl Position {
    /// All positions in roster-construction order.
    pub const ALL: [Self; 10] = [
        Self::QB,
        Self::RB,
        Self::WR,
        Self::TE,
        Self::OL,
        Self::DL,
        Self::LB,
        Self::CB,
        Self::S,
        Self::K,
    ];
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::QB => "QB",
            Self::RB => "RB",
            Self::WR => "WR",
            Self::TE => "TE",
            Self::OL => "OL",
            Self::DL => "DL",
            Self::LB => "LB",
            Self::CB => "CB",
            Self::S => "S",
            Self::K => "K",
        };
        write!(f, "{s}")
    }
}

/// Contract terms between a player and the team holding their rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Annual salary counted against the team cap.
    pub salary: u64,
    /// Remaining contract years.
    pub years: u8,
}

/// A player in the league.
///
/// A player with `team_id == None` is a free agent; release never deletes the
/// player record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// On-field position.
    pub pos: Position,
    /// Age in years.
    pub age: u8,
    /// Current overall rating, 0-99.
    pub overall: u8,
    /// Rating ceiling, 0-99.
    pub potential: u8,
    /// Current contract, if under one.
    pub contract: Option<Contract>,
    /// Team holding this player's rights; `None` = free agent.
    pub team_id: Option<TeamId>,
    /// Career stat totals, folded forward at every season rollover.
    pub career: StatTotals,
}

impl Player {
    /// Returns true if the player is not rostered by any team.
    #[must_use]
    pub const fn is_free_agent(&self) -> bool {
        self.team_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_agency_follows_team_id() {
        let mut p = Player {
            id: PlayerId(1),
            name: "Test Player".to_string(),
            pos: Position::QB,
            age: 25,
            overall: 80,
            potential: 90,
            contract: None,
            team_id: None,
            career: StatTotals::default(),
        };
        assert!(p.is_free_agent());

        p.team_id = Some(TeamId(3));
        assert!(!p.is_free_agent());
    }

    #[test]
    fn position_serializes_as_bare_tag() {
        let json = serde_json::to_string(&Position::WR).unwrap();
        assert_eq!(json, "\"WR\"");
    }
}
