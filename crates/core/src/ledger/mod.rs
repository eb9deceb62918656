//! Group ledger and split transaction logic.
//!
//! This module implements the core engine rules:
//! - Domain types for splits and participant deltas
//! - Permission evaluation (capability gating)
//! - Fail-fast input validation and the quick-restore window rule
//! - Settle-up computation with content hashing
//! - Monthly statistics delta computation
//! - Error types for ledger operations

pub mod error;
pub mod permission;
pub mod settle;
pub mod stats;
pub mod types;
pub mod validation;

#[cfg(test)]
mod settle_props;
#[cfg(test)]
mod validation_props;

pub use error::LedgerError;
pub use permission::{Capability, MemberAccess, Subject, check_permission};
pub use settle::{SettlementPlan, compute_settlement, content_hash};
pub use stats::{StatsDelta, month_start};
pub use types::{
    CreateSplitInput, MemberBalance, ParticipantChange, SplitFlags, UpdateSplitInput,
};
pub use validation::{
    MAX_TITLE_LEN, QUICK_RESTORE_WINDOW_SECS, RestoreAuthorization, authorize_restore,
    validate_create, validate_update,
};
