//! Ledger domain types for split creation and editing.
//!
//! A split is a recorded expense or balance-adjusting event affecting one or
//! more group members. Each participant receives a signed balance delta
//! (`change`); per split these deltas net to exactly zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitledger_shared::types::{GroupId, UserId};

/// Bit flags classifying a split.
///
/// A split carries zero or more flags; a plain expense has none set.
/// Flags are stored as an integer column, so the representation is a
/// transparent wrapper over the raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitFlags(i32);

impl SplitFlags {
    /// Plain expense split, no flags set.
    pub const NORMAL: Self = Self(0);
    /// Synthetic split that settles outstanding balances.
    pub const SETTLE_UP: Self = Self(1);
    /// Split where the payer's share is inverted.
    pub const INVERSED: Self = Self(1 << 1);
    /// Direct balance adjustment, not tied to a purchase.
    pub const BALANCE_CHANGE: Self = Self(1 << 2);
    /// One member lends money to another.
    pub const LEND: Self = Self(1 << 3);
    /// Split recorded now but resolved later.
    pub const DELAYED: Self = Self(1 << 4);

    /// Reconstructs flags from their raw bit representation.
    #[must_use]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Returns the raw bit representation.
    #[must_use]
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Returns true if all flags in `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the split is a settle-up split.
    ///
    /// Settle-up splits are excluded from monthly statistics: they move
    /// balances around but do not represent new spend.
    #[must_use]
    pub const fn is_settle_up(self) -> bool {
        self.contains(Self::SETTLE_UP)
    }
}

impl std::ops::BitOr for SplitFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Signed balance delta one member receives from one split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantChange {
    /// The member receiving the delta.
    pub user_id: UserId,
    /// The signed amount added to that member's balance.
    pub change: Decimal,
}

impl ParticipantChange {
    /// Creates a new participant change.
    #[must_use]
    pub const fn new(user_id: UserId, change: Decimal) -> Self {
        Self { user_id, change }
    }
}

/// A member's current balance within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    /// The member.
    pub user_id: UserId,
    /// Signed balance in group currency units. Positive means the group
    /// owes this member.
    pub balance: Decimal,
}

/// Input for creating a new split.
#[derive(Debug, Clone)]
pub struct CreateSplitInput {
    /// The group this split belongs to.
    pub group_id: GroupId,
    /// The caller creating the split.
    pub created_by: UserId,
    /// Display title (bounded length).
    pub title: String,
    /// Positive magnitude of the split.
    pub total: Decimal,
    /// The member who paid.
    pub paid_by: UserId,
    /// User-facing transaction date.
    pub timestamp: DateTime<Utc>,
    /// Split classification flags.
    pub flags: SplitFlags,
    /// Participant deltas; must net to zero.
    pub changes: Vec<ParticipantChange>,
}

/// Input for updating an existing split in place.
///
/// Balances are recomputed as a diff: the old deltas are reversed and the
/// new ones applied within one transaction.
#[derive(Debug, Clone)]
pub struct UpdateSplitInput {
    /// New display title.
    pub title: String,
    /// New positive magnitude.
    pub total: Decimal,
    /// New payer.
    pub paid_by: UserId,
    /// New user-facing transaction date.
    pub timestamp: DateTime<Utc>,
    /// New classification flags.
    pub flags: SplitFlags,
    /// New participant deltas; must net to zero.
    pub changes: Vec<ParticipantChange>,
}
