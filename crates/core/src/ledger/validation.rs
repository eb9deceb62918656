//! Fail-fast validation for split operations.
//!
//! All validation runs before any mutation; a failure here means nothing
//! was written. Membership checks (participants actually belonging to the
//! group) are enforced by the storage layer inside the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use splitledger_shared::types::UserId;
use std::collections::HashSet;

use super::error::LedgerError;
use super::types::{CreateSplitInput, ParticipantChange, SplitFlags, UpdateSplitInput};

/// Maximum split title length in characters.
///
/// The transport boundary enforces this too; the engine still rejects
/// oversize input defensively.
pub const MAX_TITLE_LEN: usize = 512;

/// Length of the quick-restore grace window in seconds (5 minutes).
pub const QUICK_RESTORE_WINDOW_SECS: i64 = 5 * 60;

/// How a restore request is authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreAuthorization {
    /// The original deleter undoing their own delete within the grace
    /// window; needs only baseline group access.
    QuickRestore,
    /// A caller holding the `RestoreSplit` capability; valid at any time.
    Privileged,
}

/// Validates the shared field set of create and update operations.
fn validate_fields(
    title: &str,
    total: Decimal,
    paid_by: UserId,
    flags: SplitFlags,
    changes: &[ParticipantChange],
) -> Result<(), LedgerError> {
    if total <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveTotal(total));
    }

    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(LedgerError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }

    if changes.len() < 2 {
        return Err(LedgerError::InsufficientParticipants);
    }

    let mut seen = HashSet::with_capacity(changes.len());
    for change in changes {
        if !seen.insert(change.user_id) {
            return Err(LedgerError::DuplicateParticipant(change.user_id));
        }
    }

    let sum: Decimal = changes.iter().map(|c| c.change).sum();
    if !sum.is_zero() {
        return Err(LedgerError::UnbalancedDelta { sum });
    }

    // Settle-up splits are synthesized by the engine; the confirming caller
    // need not appear in the change set. Every other split is paid by one
    // of its participants.
    if !flags.is_settle_up() && !seen.contains(&paid_by) {
        return Err(LedgerError::PayerNotParticipant(paid_by));
    }

    Ok(())
}

/// Validates input for split creation.
///
/// # Errors
///
/// Returns a validation error if any field is out of range or the deltas
/// do not net to zero.
pub fn validate_create(input: &CreateSplitInput) -> Result<(), LedgerError> {
    validate_fields(
        &input.title,
        input.total,
        input.paid_by,
        input.flags,
        &input.changes,
    )
}

/// Validates input for an in-place split update.
///
/// # Errors
///
/// Returns a validation error if any field is out of range or the deltas
/// do not net to zero.
pub fn validate_update(input: &UpdateSplitInput) -> Result<(), LedgerError> {
    validate_fields(
        &input.title,
        input.total,
        input.paid_by,
        input.flags,
        &input.changes,
    )
}

/// Decides whether a caller may restore a deleted split.
///
/// The original deleter gets a time-boxed self-service undo; anyone
/// holding the `RestoreSplit` capability may restore at any time. The
/// window is a wall-clock rule evaluated at read time.
///
/// # Errors
///
/// Returns `RestoreWindowExpired` when the deleter is outside the window
/// without the capability, and `PermissionDenied` for any other caller
/// without it.
pub fn authorize_restore(
    caller: UserId,
    deleted_by: UserId,
    deleted_at: DateTime<Utc>,
    now: DateTime<Utc>,
    has_restore_capability: bool,
) -> Result<RestoreAuthorization, LedgerError> {
    if has_restore_capability {
        return Ok(RestoreAuthorization::Privileged);
    }

    if caller != deleted_by {
        return Err(LedgerError::PermissionDenied);
    }

    let elapsed = now.signed_duration_since(deleted_at);
    if elapsed.num_seconds() <= QUICK_RESTORE_WINDOW_SECS {
        Ok(RestoreAuthorization::QuickRestore)
    } else {
        Err(LedgerError::RestoreWindowExpired)
    }
}
