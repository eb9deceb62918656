//! Ledger error types for validation, permission, and state errors.
//!
//! Every mutating operation validates before touching storage, so each of
//! these errors implies the enclosing transaction was aborted (or never
//! started) with no partial writes.

use rust_decimal::Decimal;
use splitledger_shared::error::AppError;
use splitledger_shared::types::{GroupId, SplitId, UserId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Permission Errors ==========
    /// Caller lacks the required capability.
    ///
    /// Deliberately also returned when the referenced group does not exist
    /// and the caller has no access, so callers cannot probe for existence.
    #[error("Permission denied")]
    PermissionDenied,

    // ========== Not-Found Errors (post access gate) ==========
    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    /// Split not found in the stated group.
    #[error("Split not found: {0}")]
    SplitNotFound(SplitId),

    // ========== Validation Errors ==========
    /// Split total must be positive.
    #[error("Split total must be positive, got {0}")]
    NonPositiveTotal(Decimal),

    /// Title exceeds the maximum length.
    #[error("Title too long: {len} chars (max {max})")]
    TitleTooLong {
        /// Actual title length in characters.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A split needs at least two participants.
    #[error("Split must have at least 2 participants")]
    InsufficientParticipants,

    /// The same member appears twice in the participant set.
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(UserId),

    /// Participant deltas do not net to zero.
    #[error("Participant deltas must sum to zero, got {sum}")]
    UnbalancedDelta {
        /// The offending delta sum.
        sum: Decimal,
    },

    /// The payer is not part of the participant set.
    #[error("Payer {0} is not a participant of the split")]
    PayerNotParticipant(UserId),

    // ========== Membership Errors ==========
    /// A referenced participant or payer is not a current group member.
    #[error("User {0} is not a member of the group")]
    UserNotInGroup(UserId),

    // ========== Settle-Up Errors ==========
    /// The confirmation hash no longer matches current balances.
    #[error("Settlement is stale: balances changed since preview")]
    StaleSettleUp,

    /// All relevant balances are already zero.
    #[error("Nothing to settle: balances are already even")]
    NothingToSettle,

    // ========== Restore Errors ==========
    /// Quick restore attempted outside the grace window.
    #[error("Restore window expired")]
    RestoreWindowExpired,

    /// Restore requested for a split that is not deleted.
    #[error("Split {0} is not deleted")]
    NotDeleted(SplitId),

    /// Delete requested for a split that is already deleted.
    #[error("Split {0} is already deleted")]
    AlreadyDeleted(SplitId),
}

impl LedgerError {
    /// Returns the stable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::SplitNotFound(_) => "SPLIT_NOT_FOUND",
            Self::NonPositiveTotal(_) => "NON_POSITIVE_TOTAL",
            Self::TitleTooLong { .. } => "TITLE_TOO_LONG",
            Self::InsufficientParticipants => "INSUFFICIENT_PARTICIPANTS",
            Self::DuplicateParticipant(_) => "DUPLICATE_PARTICIPANT",
            Self::UnbalancedDelta { .. } => "UNBALANCED_DELTA",
            Self::PayerNotParticipant(_) => "PAYER_NOT_PARTICIPANT",
            Self::UserNotInGroup(_) => "USER_NOT_IN_GROUP",
            Self::StaleSettleUp => "STALE_SETTLE_UP",
            Self::NothingToSettle => "NOTHING_TO_SETTLE",
            Self::RestoreWindowExpired => "RESTORE_WINDOW_EXPIRED",
            Self::NotDeleted(_) => "NOT_DELETED",
            Self::AlreadyDeleted(_) => "ALREADY_DELETED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 403 Forbidden - permission errors (also masks nonexistent groups)
            Self::PermissionDenied | Self::RestoreWindowExpired => 403,

            // 404 Not Found - only reachable after the access gate passes
            Self::GroupNotFound(_) | Self::SplitNotFound(_) => 404,

            // 400 Bad Request - validation errors
            Self::NonPositiveTotal(_)
            | Self::TitleTooLong { .. }
            | Self::InsufficientParticipants
            | Self::DuplicateParticipant(_)
            | Self::UnbalancedDelta { .. }
            | Self::PayerNotParticipant(_) => 400,

            // 422 Unprocessable - membership rule violations
            Self::UserNotInGroup(_) | Self::NotDeleted(_) | Self::AlreadyDeleted(_) => 422,

            // 409 Conflict - optimistic concurrency
            Self::StaleSettleUp => 409,

            // 422 - nothing to do
            Self::NothingToSettle => 422,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let msg = err.to_string();
        match err {
            LedgerError::PermissionDenied | LedgerError::RestoreWindowExpired => {
                Self::Forbidden(msg)
            }
            LedgerError::GroupNotFound(_) | LedgerError::SplitNotFound(_) => Self::NotFound(msg),
            LedgerError::NonPositiveTotal(_)
            | LedgerError::TitleTooLong { .. }
            | LedgerError::InsufficientParticipants
            | LedgerError::DuplicateParticipant(_)
            | LedgerError::UnbalancedDelta { .. }
            | LedgerError::PayerNotParticipant(_) => Self::Validation(msg),
            LedgerError::UserNotInGroup(_)
            | LedgerError::NotDeleted(_)
            | LedgerError::AlreadyDeleted(_)
            | LedgerError::NothingToSettle => Self::BusinessRule(msg),
            LedgerError::StaleSettleUp => Self::Conflict(msg),
        }
    }
}
