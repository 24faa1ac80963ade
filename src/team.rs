//! Team identity and season records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable team identifier, assigned at league creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Win/loss record and point totals for the current season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
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

impl TeamRecord {
    /// Fold one final score into the record from this team's perspective.
    pub fn apply_result(&mut self, scored: u32, conceded: u32) {
        self.points_for += scored;
        self.points_against += conceded;
        if scored > conceded {
            self.wins += 1;
        } else if scored < conceded {
            self.losses += 1;
        } else {
            self.ties += 1;
        }
    }

    /// Win percentage with ties counted as half a win. Used for standings order.
    #[must_use]
    pub fn win_pct(&self) -> f64 {
        let played = self.wins + self.losses + self.ties;
        if played == 0 {
            return 0.0;
        }
        (f64::from(self.wins) + f64::from(self.ties) * 0.5) / f64::from(played)
    }
}

/// A franchise in the league.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Stable identifier.
    pub id: TeamId,
    /// Full display name.
    pub name: String,
    /// Short abbreviation, e.g. "PHI".
    pub abbr: String,
    /// Conference this team belongs to.
    pub conference: String,
    /// Division within the conference.
    pub division: String,
    /// Current-season record. Reset at season rollover.
    pub record: TeamRecord,
    /// Salary committed to the current roster. Derived from player contracts;
    /// recomputed after every roster mutation rather than adjusted in place.
    pub cap_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_result_counts_wins_losses_and_ties() {
        let mut record = TeamRecord::default();
        record.apply_result(24, 10);
        record.apply_result(7, 31);
        record.apply_result(14, 14);

        assert_eq!(record.wins, 1);
        assert_eq!(record.losses, 1);
        assert_eq!(record.ties, 1);
        assert_eq!(record.points_for, 45);
        assert_eq!(record.points_against, 55);
    }

    #[test]
    fn win_pct_counts_ties_as_half() {
        let mut record = TeamRecord::default();
        record.apply_result(10, 10);
        record.apply_result(21, 3);
        assert!((record.win_pct() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn win_pct_of_unplayed_record_is_zero() {
        assert!(TeamRecord::default().win_pct().abs() < f64::EPSILON);
    }
}
