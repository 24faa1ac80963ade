//! League metadata: the singleton record owning season position and settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::season::SeasonId;
use crate::team::TeamId;

/// Where the league currently sits inside a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Regular-season weeks.
    Regular,
    /// Championship week.
    Playoffs,
    /// Between seasons; the next ADVANCE_WEEK starts a new season.
    Offseason,
}

/// League rule settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSettings {
    /// Regular-season length in weeks.
    pub season_weeks: u32,
    /// Salary cap per team.
    pub salary_cap: u64,
    /// Players generated per team at league creation.
    pub roster_size: u32,
    /// Draft rounds generated per year.
    pub draft_rounds: u8,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            season_weeks: 14,
            salary_cap: 200_000_000,
            roster_size: 20,
            draft_rounds: 3,
        }
    }
}

/// Typed partial update for [`LeagueSettings`].
///
/// Only declared fields are applied; undeclared fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New regular-season length.
    pub season_weeks: Option<u32>,
    /// New salary cap.
    pub salary_cap: Option<u64>,
}

impl SettingsPatch {
    /// Validate and apply the declared fields to `settings`.
    ///
    /// # Errors
    /// Rejects out-of-range values before anything is applied.
    pub fn apply_to(&self, settings: &mut LeagueSettings) -> Result<(), ValidationError> {
        if let Some(weeks) = self.season_weeks {
            if weeks == 0 {
                return Err(ValidationError::InvalidSetting {
                    field: "season_weeks",
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(cap) = self.salary_cap {
            if cap == 0 {
                return Err(ValidationError::InvalidSetting {
                    field: "salary_cap",
                    reason: "must be non-zero".to_string(),
                });
            }
        }

        if let Some(weeks) = self.season_weeks {
            settings.season_weeks = weeks;
        }
        if let Some(cap) = self.salary_cap {
            settings.salary_cap = cap;
        }
        Ok(())
    }
}

/// One schedule slot, referencing teams by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGame {
    /// Week the game is slotted into, 1-based.
    pub week: u32,
    /// Home team.
    pub home: TeamId,
    /// Away team.
    pub away: TeamId,
}

/// Slim schedule: team-id pairs per week, small enough to live inside the
/// league metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlimSchedule {
    /// Every slot for the season, ordered by week.
    pub games: Vec<ScheduledGame>,
}

impl SlimSchedule {
    /// Slots for one week.
    pub fn week(&self, week: u32) -> impl Iterator<Item = &ScheduledGame> {
        self.games.iter().filter(move |g| g.week == week)
    }

    /// The last scheduled week, 0 when the schedule is empty.
    #[must_use]
    pub fn last_week(&self) -> u32 {
        self.games.iter().map(|g| g.week).max().unwrap_or(0)
    }
}

/// Singleton league metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueMeta {
    /// Team controlled by the user, if chosen.
    pub user_team_id: Option<TeamId>,
    /// Season currently in progress.
    pub season: SeasonId,
    /// Calendar year of the current season.
    pub year: u32,
    /// Week about to be played, 1-based.
    pub week: u32,
    /// Phase within the season.
    pub phase: Phase,
    /// League rule settings.
    pub settings: LeagueSettings,
    /// Current season's slim schedule.
    pub schedule: SlimSchedule,
    /// When the save was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_patch_applies_only_declared_fields() {
        let mut settings = LeagueSettings::default();
        let before_weeks = settings.season_weeks;

        let patch = SettingsPatch {
            salary_cap: Some(150_000_000),
            ..SettingsPatch::default()
        };
        patch.apply_to(&mut settings).unwrap();

        assert_eq!(settings.salary_cap, 150_000_000);
        assert_eq!(settings.season_weeks, before_weeks);
    }

    #[test]
    fn settings_patch_rejects_zero_weeks_without_applying() {
        let mut settings = LeagueSettings::default();
        let patch = SettingsPatch {
            season_weeks: Some(0),
            salary_cap: Some(1),
        };

        assert!(patch.apply_to(&mut settings).is_err());
        // Nothing applied, including the valid field.
        assert_eq!(settings, LeagueSettings::default());
    }

    #[test]
    fn schedule_filters_by_week() {
        let schedule = SlimSchedule {
            games: vec![
                ScheduledGame { week: 1, home: TeamId(0), away: TeamId(1) },
                ScheduledGame { week: 2, home: TeamId(1), away: TeamId(0) },
                ScheduledGame { week: 1, home: TeamId(2), away: TeamId(3) },
            ],
        };

        assert_eq!(schedule.week(1).count(), 2);
        assert_eq!(schedule.week(2).count(), 1);
        assert_eq!(schedule.week(3).count(), 0);
        assert_eq!(schedule.last_week(), 2);
    }
}
