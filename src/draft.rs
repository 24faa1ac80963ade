//! Draft pick assets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::team::TeamId;

/// Stable draft-pick identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PickId(pub u32);

impl fmt::Display for PickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tradable draft pick.
///
/// `original_owner` never changes; `owner` follows trades. Once the pick is
/// used, `selection` records the drafted player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPick {
    /// Stable identifier.
    pub id: PickId,
    /// Draft round, 1-based.
    pub round: u8,
    /// Draft year.
    pub year: u32,
    /// Team the pick originally belonged to.
    pub original_owner: TeamId,
    /// Team currently holding the pick.
    pub owner: TeamId,
    /// Player taken with this pick, once used.
    pub selection: Option<PlayerId>,
}

impl DraftPick {
    /// Returns true if the pick has not been used yet.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        self.selection.is_none()
    }
}
