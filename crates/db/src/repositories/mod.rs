//! Repository abstractions executing ledger operations.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every mutating operation runs inside a single database transaction:
//! permission gate first, fail-fast validation before any write, full
//! rollback on any error.

pub mod group;
pub mod settle;
pub mod split;
pub mod stats;

pub use group::{GroupRepository, GroupWithMembers};
pub use split::{SplitRepository, SplitWithParticipants};

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use splitledger_core::ledger::permission::{Capability, MemberAccess, check_permission};
use splitledger_core::ledger::LedgerError;
use splitledger_shared::types::{GroupId, UserId};
use uuid::Uuid;

use crate::entities::{group_members, groups};

/// Error type shared by all ledger repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A typed ledger error (permission, validation, state).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result type alias using `RepoError`.
pub type RepoResult<T> = Result<T, RepoError>;

/// Loads the caller's membership row for the permission evaluator.
///
/// Returns `None` when the caller has no membership row, including when
/// the group itself does not exist - the evaluator maps both to
/// `PermissionDenied`.
pub(crate) async fn load_member_access<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    user_id: UserId,
) -> Result<Option<MemberAccess>, DbErr> {
    let member = group_members::Entity::find_by_id((group_id.into_inner(), user_id.into_inner()))
        .one(conn)
        .await?;

    Ok(member.map(|m| MemberAccess {
        has_access: m.has_access,
        is_admin: m.is_admin,
    }))
}

/// Gates an operation on a capability, returning the caller's membership
/// on success.
pub(crate) async fn require_permission<C: ConnectionTrait>(
    conn: &C,
    capability: Capability,
    group_id: GroupId,
    caller: UserId,
) -> RepoResult<MemberAccess> {
    let access = load_member_access(conn, group_id, caller).await?;
    check_permission(capability, access.as_ref())?;
    // check_permission only passes with a present membership row.
    access.ok_or_else(|| LedgerError::PermissionDenied.into())
}

/// Loads a group that exists and is not soft-deleted.
///
/// Only called after the access gate, so `GroupNotFound` here does not
/// leak existence to outsiders.
pub(crate) async fn load_live_group<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
) -> RepoResult<groups::Model> {
    let group = groups::Entity::find_by_id(group_id.into_inner())
        .one(conn)
        .await?
        .filter(|g| !g.deleted)
        .ok_or(LedgerError::GroupNotFound(group_id))?;
    Ok(group)
}

/// Converts a typed id slice to raw UUIDs for query binding.
pub(crate) fn raw_ids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_inner()).collect()
}
