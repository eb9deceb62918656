//! Settle-up operations on top of the split repository.
//!
//! Settling is a two-step flow. `preview_settle_up` computes a settlement
//! plan from current balances and hands the caller its content hash.
//! `confirm_settle_up` recomputes the plan inside the write transaction
//! and compares hashes: if any split landed in between, the balances (and
//! so the hash) changed and the confirmation fails with `StaleSettleUp`
//! instead of settling amounts the caller never saw.
//!
//! A confirmed settlement is persisted as a regular split carrying the
//! settle-up flag, so it shows in history and participates in delete and
//! restore, but it is excluded from monthly statistics.

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use splitledger_core::ledger::permission::Capability;
use splitledger_core::ledger::settle::{SettlementPlan, compute_settlement};
use splitledger_core::ledger::types::{CreateSplitInput, MemberBalance, SplitFlags};
use splitledger_core::ledger::LedgerError;
use splitledger_shared::types::{GroupId, SplitId, UserId};
use tracing::info;

use super::split::SplitRepository;
use super::{RepoResult, load_live_group, require_permission};
use crate::entities::group_members;

/// Title recorded on synthetic settle-up splits.
const SETTLE_UP_TITLE: &str = "Settle up";

impl SplitRepository {
    /// Computes a settlement plan from current balances without writing
    /// anything.
    ///
    /// Pass `with_members` to settle only a subset; the plan then settles
    /// as much of the subset's debt as the subset's credit covers.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the caller lacks group access.
    pub async fn preview_settle_up(
        &self,
        group_id: GroupId,
        caller: UserId,
        with_members: Option<&[UserId]>,
    ) -> RepoResult<SettlementPlan> {
        require_permission(self.connection(), Capability::ReadSplits, group_id, caller).await?;
        let balances = load_balances(self.connection(), group_id).await?;
        Ok(compute_settlement(&balances, with_members))
    }

    /// Confirms a previously previewed settlement.
    ///
    /// The plan is recomputed against current balances inside the write
    /// transaction; `expected_hash` must match the recomputed plan's
    /// content hash. On success a settle-up split is recorded and the
    /// scoped balances are cancelled.
    ///
    /// # Errors
    ///
    /// `StaleSettleUp` when balances changed since the preview,
    /// `NothingToSettle` when the scoped balances are already zero,
    /// `PermissionDenied` or `GroupNotFound` otherwise.
    pub async fn confirm_settle_up(
        &self,
        group_id: GroupId,
        caller: UserId,
        with_members: Option<&[UserId]>,
        expected_hash: &str,
    ) -> RepoResult<SplitId> {
        let txn = self.connection().begin().await?;
        require_permission(&txn, Capability::CreateSplit, group_id, caller).await?;
        load_live_group(&txn, group_id).await?;

        let balances = load_balances(&txn, group_id).await?;
        let plan = compute_settlement(&balances, with_members);
        if plan.is_empty() {
            return Err(LedgerError::NothingToSettle.into());
        }
        if plan.content_hash != expected_hash {
            return Err(LedgerError::StaleSettleUp.into());
        }

        let total = plan.total();
        let input = CreateSplitInput {
            group_id,
            created_by: caller,
            title: SETTLE_UP_TITLE.to_owned(),
            total,
            paid_by: caller,
            timestamp: Utc::now(),
            flags: SplitFlags::SETTLE_UP,
            changes: plan.changes,
        };

        let split_id = SplitId::new();
        Self::insert_split(&txn, split_id, &input).await?;
        Self::insert_participants(&txn, split_id, &input.changes).await?;
        Self::apply_participant_deltas(&txn, group_id, &input.changes).await?;
        // Settle-up moves balances, not spend: no monthly stats entry.
        Self::adjust_group_cache(&txn, group_id, total).await?;

        txn.commit().await?;
        info!(%group_id, %split_id, %total, "settle-up confirmed");
        Ok(split_id)
    }
}

/// Snapshot of all member balances in a group, in user-id order.
async fn load_balances<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
) -> RepoResult<Vec<MemberBalance>> {
    let members = group_members::Entity::find()
        .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
        .order_by_asc(group_members::Column::UserId)
        .all(conn)
        .await?;

    Ok(members
        .into_iter()
        .map(|m| MemberBalance {
            user_id: UserId::from_uuid(m.user_id),
            balance: m.balance,
        })
        .collect())
}
