//! Split repository: the split lifecycle state machine.
//!
//! Implements create, update, delete, and restore. Each operation runs in
//! one database transaction: permission gate, fail-fast validation, then
//! the writes (split row, participant rows, relative balance updates,
//! monthly statistics, group cache columns). Any error rolls the whole
//! transaction back; partial application is never observable.
//!
//! Balance updates are relative (`SET balance = balance + delta`), never
//! read-modify-write, so concurrent splits over disjoint member sets do
//! not contend and splits sharing a member serialize on the row lock.
//! Deltas are applied in user-id order to keep lock acquisition order
//! stable across concurrent transactions.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use splitledger_core::ledger::permission::Capability;
use splitledger_core::ledger::types::{CreateSplitInput, ParticipantChange, SplitFlags, UpdateSplitInput};
use splitledger_core::ledger::validation::{authorize_restore, validate_create, validate_update};
use splitledger_core::ledger::LedgerError;
use splitledger_shared::types::{GroupId, SplitId, UserId};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::{RepoResult, load_live_group, raw_ids, require_permission, stats};
use crate::entities::{group_members, groups, split_participants, splits};

/// A split together with its participant deltas.
#[derive(Debug, Clone)]
pub struct SplitWithParticipants {
    /// The split row.
    pub split: splits::Model,
    /// Participant deltas, one row per member.
    pub participants: Vec<split_participants::Model>,
}

/// Repository executing split lifecycle operations.
#[derive(Debug, Clone)]
pub struct SplitRepository {
    db: DatabaseConnection,
}

impl SplitRepository {
    /// Creates a new split repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Access to the underlying connection for sibling repositories.
    pub(crate) const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates a split: inserts the split and participant rows, applies
    /// the balance deltas, and records monthly statistics, atomically.
    ///
    /// Returns the new split identifier.
    ///
    /// # Errors
    ///
    /// `PermissionDenied`, `GroupNotFound`, validation errors, or
    /// `UserNotInGroup` when a participant has no membership row.
    pub async fn create_split(&self, input: CreateSplitInput) -> RepoResult<SplitId> {
        let txn = self.db.begin().await?;
        require_permission(&txn, Capability::CreateSplit, input.group_id, input.created_by).await?;
        load_live_group(&txn, input.group_id).await?;
        validate_create(&input)?;

        let split_id = SplitId::new();
        Self::insert_split(&txn, split_id, &input).await?;
        Self::insert_participants(&txn, split_id, &input.changes).await?;
        Self::apply_participant_deltas(&txn, input.group_id, &input.changes).await?;

        if !input.flags.is_settle_up() {
            stats::record_create(&txn, input.group_id, input.total, input.timestamp).await?;
        }
        Self::adjust_group_cache(&txn, input.group_id, input.total).await?;

        txn.commit().await?;
        info!(group_id = %input.group_id, %split_id, total = %input.total, "split created");
        Ok(split_id)
    }

    /// Updates a split in place: reverses the old participant deltas,
    /// upserts the new participant set, applies the new deltas, and nets
    /// the monthly statistics, all in one transaction. Bumps `version`.
    ///
    /// # Errors
    ///
    /// `PermissionDenied`, `GroupNotFound`, `SplitNotFound` (wrong group
    /// or missing), `AlreadyDeleted`, validation errors, or
    /// `UserNotInGroup`.
    pub async fn update_split(
        &self,
        group_id: GroupId,
        split_id: SplitId,
        caller: UserId,
        input: UpdateSplitInput,
    ) -> RepoResult<()> {
        let txn = self.db.begin().await?;
        require_permission(&txn, Capability::UpdateSplit, group_id, caller).await?;
        load_live_group(&txn, group_id).await?;
        validate_update(&input)?;

        let split = Self::load_split_in_group(&txn, group_id, split_id).await?;
        if split.deleted {
            return Err(LedgerError::AlreadyDeleted(split_id).into());
        }

        // Undo old, apply new: both inside this transaction, so no
        // intermediate balance state is ever visible.
        let old_changes = Self::load_participants(&txn, split_id).await?;
        Self::apply_participant_deltas(&txn, group_id, &negate(&old_changes)).await?;
        Self::upsert_participants(&txn, split_id, &input.changes).await?;
        Self::apply_participant_deltas(&txn, group_id, &input.changes).await?;

        let old_flags = SplitFlags::from_bits(split.split_type);
        let old_timestamp = split.timestamp.with_timezone(&Utc);
        match (old_flags.is_settle_up(), input.flags.is_settle_up()) {
            (false, false) => {
                stats::record_update(
                    &txn,
                    group_id,
                    split.total,
                    old_timestamp,
                    input.total,
                    input.timestamp,
                )
                .await?;
            }
            (false, true) => {
                stats::record_delete(&txn, group_id, split.total, old_timestamp).await?;
            }
            (true, false) => {
                stats::record_create(&txn, group_id, input.total, input.timestamp).await?;
            }
            (true, true) => {}
        }

        let now = Utc::now();
        splits::Entity::update_many()
            .col_expr(splits::Column::Title, Expr::value(input.title.clone()))
            .col_expr(splits::Column::Total, Expr::value(input.total))
            .col_expr(splits::Column::PaidBy, Expr::value(input.paid_by.into_inner()))
            .col_expr(splits::Column::Timestamp, Expr::value(input.timestamp))
            .col_expr(splits::Column::SplitType, Expr::value(input.flags.bits()))
            .col_expr(splits::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                splits::Column::Version,
                Expr::col(splits::Column::Version).add(1),
            )
            .filter(splits::Column::Id.eq(split_id.into_inner()))
            .exec(&txn)
            .await?;

        Self::adjust_group_cache(&txn, group_id, input.total - split.total).await?;

        txn.commit().await?;
        info!(%group_id, %split_id, "split updated");
        Ok(())
    }

    /// Soft-deletes a split: reverses its deltas and marks it deleted,
    /// retaining participant rows for a later restore.
    ///
    /// # Errors
    ///
    /// `PermissionDenied`, `GroupNotFound`, `SplitNotFound`, or
    /// `AlreadyDeleted`.
    pub async fn delete_split(
        &self,
        group_id: GroupId,
        split_id: SplitId,
        caller: UserId,
    ) -> RepoResult<()> {
        let txn = self.db.begin().await?;
        require_permission(&txn, Capability::DeleteSplit, group_id, caller).await?;
        load_live_group(&txn, group_id).await?;
        let split = Self::load_split_in_group(&txn, group_id, split_id).await?;
        if split.deleted {
            return Err(LedgerError::AlreadyDeleted(split_id).into());
        }

        let now = Utc::now();
        // The deleted filter makes concurrent double deletes lose cleanly.
        let marked = splits::Entity::update_many()
            .col_expr(splits::Column::Deleted, Expr::value(true))
            .col_expr(splits::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(
                splits::Column::DeletedBy,
                Expr::value(Some(caller.into_inner())),
            )
            .col_expr(splits::Column::UpdatedAt, Expr::value(now))
            .filter(splits::Column::Id.eq(split_id.into_inner()))
            .filter(splits::Column::Deleted.eq(false))
            .exec(&txn)
            .await?;
        if marked.rows_affected == 0 {
            return Err(LedgerError::AlreadyDeleted(split_id).into());
        }

        let changes = Self::load_participants(&txn, split_id).await?;
        Self::apply_participant_deltas(&txn, group_id, &negate(&changes)).await?;

        if !SplitFlags::from_bits(split.split_type).is_settle_up() {
            stats::record_delete(&txn, group_id, split.total, split.timestamp.with_timezone(&Utc))
                .await?;
        }
        Self::adjust_group_cache(&txn, group_id, -split.total).await?;

        txn.commit().await?;
        info!(%group_id, %split_id, deleted_by = %caller, "split deleted");
        Ok(())
    }

    /// Restores a soft-deleted split.
    ///
    /// The original deleter may restore within the 5-minute grace window
    /// with only baseline access; any later or third-party restore needs
    /// the `RestoreSplit` capability.
    ///
    /// # Errors
    ///
    /// `PermissionDenied`, `RestoreWindowExpired`, `GroupNotFound`,
    /// `SplitNotFound`, or `NotDeleted`.
    pub async fn restore_split(
        &self,
        group_id: GroupId,
        split_id: SplitId,
        caller: UserId,
    ) -> RepoResult<()> {
        let txn = self.db.begin().await?;

        // Baseline access gate; the elevated capability is checked through
        // the restore authorization rule below.
        let member = require_permission(&txn, Capability::ReadSplits, group_id, caller).await?;
        let has_restore_capability = member.is_admin;
        load_live_group(&txn, group_id).await?;

        let split = Self::load_split_in_group(&txn, group_id, split_id).await?;
        if !split.deleted {
            return Err(LedgerError::NotDeleted(split_id).into());
        }
        let (Some(deleted_by), Some(deleted_at)) = (split.deleted_by, split.deleted_at) else {
            return Err(LedgerError::NotDeleted(split_id).into());
        };

        let authorization = authorize_restore(
            caller,
            UserId::from_uuid(deleted_by),
            deleted_at.with_timezone(&Utc),
            Utc::now(),
            has_restore_capability,
        )?;

        let unmarked = splits::Entity::update_many()
            .col_expr(splits::Column::Deleted, Expr::value(false))
            .col_expr(splits::Column::DeletedAt, Expr::value(None::<chrono::DateTime<Utc>>))
            .col_expr(splits::Column::DeletedBy, Expr::value(None::<Uuid>))
            .col_expr(splits::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(
                splits::Column::Version,
                Expr::col(splits::Column::Version).add(1),
            )
            .filter(splits::Column::Id.eq(split_id.into_inner()))
            .filter(splits::Column::Deleted.eq(true))
            .exec(&txn)
            .await?;
        if unmarked.rows_affected == 0 {
            return Err(LedgerError::NotDeleted(split_id).into());
        }

        // Re-apply the retained deltas.
        let changes = Self::load_participants(&txn, split_id).await?;
        Self::apply_participant_deltas(&txn, group_id, &changes).await?;

        if !SplitFlags::from_bits(split.split_type).is_settle_up() {
            stats::record_create(&txn, group_id, split.total, split.timestamp.with_timezone(&Utc))
                .await?;
        }
        Self::adjust_group_cache(&txn, group_id, split.total).await?;

        txn.commit().await?;
        info!(%group_id, %split_id, ?authorization, "split restored");
        Ok(())
    }

    /// Fetches one non-deleted split with its participants.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `SplitNotFound`.
    pub async fn get_split(
        &self,
        group_id: GroupId,
        split_id: SplitId,
        caller: UserId,
    ) -> RepoResult<SplitWithParticipants> {
        require_permission(&self.db, Capability::ReadSplits, group_id, caller).await?;

        let split = Self::load_split_in_group(&self.db, group_id, split_id).await?;
        if split.deleted {
            return Err(LedgerError::SplitNotFound(split_id).into());
        }

        let participants = split_participants::Entity::find()
            .filter(split_participants::Column::SplitId.eq(split_id.into_inner()))
            .all(&self.db)
            .await?;

        Ok(SplitWithParticipants {
            split,
            participants,
        })
    }

    /// Lists the non-deleted splits of a group, newest first, with their
    /// participants.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the caller lacks group access.
    pub async fn list_splits(
        &self,
        group_id: GroupId,
        caller: UserId,
    ) -> RepoResult<Vec<SplitWithParticipants>> {
        require_permission(&self.db, Capability::ReadSplits, group_id, caller).await?;

        let split_rows = splits::Entity::find()
            .filter(splits::Column::GroupId.eq(group_id.into_inner()))
            .filter(splits::Column::Deleted.eq(false))
            .order_by_desc(splits::Column::Timestamp)
            .all(&self.db)
            .await?;

        let ids: Vec<Uuid> = split_rows.iter().map(|s| s.id).collect();
        let mut by_split: HashMap<Uuid, Vec<split_participants::Model>> = HashMap::new();
        if !ids.is_empty() {
            let participant_rows = split_participants::Entity::find()
                .filter(split_participants::Column::SplitId.is_in(ids))
                .all(&self.db)
                .await?;
            for row in participant_rows {
                by_split.entry(row.split_id).or_default().push(row);
            }
        }

        Ok(split_rows
            .into_iter()
            .map(|split| {
                let participants = by_split.remove(&split.id).unwrap_or_default();
                SplitWithParticipants {
                    split,
                    participants,
                }
            })
            .collect())
    }

    // ========================================================================
    // Transaction building blocks
    // ========================================================================

    /// Applies signed balance deltas to member rows, relatively and in
    /// user-id order.
    ///
    /// A delta for a user without a membership row affects zero rows and
    /// fails the transaction with `UserNotInGroup`.
    pub(crate) async fn apply_participant_deltas<C: ConnectionTrait>(
        conn: &C,
        group_id: GroupId,
        changes: &[ParticipantChange],
    ) -> RepoResult<()> {
        let mut ordered: Vec<&ParticipantChange> = changes.iter().collect();
        ordered.sort_by_key(|c| c.user_id);

        // Zero deltas are applied too: the affected-row count is what
        // verifies the user's membership.
        for change in ordered {
            let result = group_members::Entity::update_many()
                .col_expr(
                    group_members::Column::Balance,
                    Expr::col(group_members::Column::Balance).add(change.change),
                )
                .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
                .filter(group_members::Column::UserId.eq(change.user_id.into_inner()))
                .exec(conn)
                .await?;

            if result.rows_affected == 0 {
                return Err(LedgerError::UserNotInGroup(change.user_id).into());
            }
        }

        Ok(())
    }

    /// Inserts the split row.
    pub(crate) async fn insert_split(
        txn: &DatabaseTransaction,
        split_id: SplitId,
        input: &CreateSplitInput,
    ) -> RepoResult<()> {
        let now = Utc::now();
        let split = splits::ActiveModel {
            id: Set(split_id.into_inner()),
            group_id: Set(input.group_id.into_inner()),
            total: Set(input.total),
            paid_by: Set(input.paid_by.into_inner()),
            created_by: Set(input.created_by.into_inner()),
            title: Set(input.title.clone()),
            timestamp: Set(input.timestamp.into()),
            updated_at: Set(now.into()),
            version: Set(1),
            split_type: Set(input.flags.bits()),
            deleted: Set(false),
            deleted_at: Set(None),
            deleted_by: Set(None),
        };
        split.insert(txn).await?;
        Ok(())
    }

    /// Inserts fresh participant rows for a new split.
    pub(crate) async fn insert_participants(
        txn: &DatabaseTransaction,
        split_id: SplitId,
        changes: &[ParticipantChange],
    ) -> RepoResult<()> {
        let rows: Vec<split_participants::ActiveModel> = changes
            .iter()
            .map(|c| split_participants::ActiveModel {
                split_id: Set(split_id.into_inner()),
                user_id: Set(c.user_id.into_inner()),
                change: Set(c.change),
            })
            .collect();
        split_participants::Entity::insert_many(rows).exec(txn).await?;
        Ok(())
    }

    /// Upserts the participant set of an edited split, keyed on
    /// `(split_id, user_id)`, and drops members no longer present.
    async fn upsert_participants(
        txn: &DatabaseTransaction,
        split_id: SplitId,
        changes: &[ParticipantChange],
    ) -> RepoResult<()> {
        for change in changes {
            let row = split_participants::ActiveModel {
                split_id: Set(split_id.into_inner()),
                user_id: Set(change.user_id.into_inner()),
                change: Set(change.change),
            };
            split_participants::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        split_participants::Column::SplitId,
                        split_participants::Column::UserId,
                    ])
                    .update_column(split_participants::Column::Change)
                    .to_owned(),
                )
                .exec(txn)
                .await?;
        }

        let keep: Vec<UserId> = changes.iter().map(|c| c.user_id).collect();
        split_participants::Entity::delete_many()
            .filter(split_participants::Column::SplitId.eq(split_id.into_inner()))
            .filter(split_participants::Column::UserId.is_not_in(raw_ids(&keep)))
            .exec(txn)
            .await?;

        Ok(())
    }

    /// Loads a split that belongs to the stated group.
    async fn load_split_in_group<C: ConnectionTrait>(
        conn: &C,
        group_id: GroupId,
        split_id: SplitId,
    ) -> RepoResult<splits::Model> {
        let split = splits::Entity::find_by_id(split_id.into_inner())
            .filter(splits::Column::GroupId.eq(group_id.into_inner()))
            .one(conn)
            .await?
            .ok_or(LedgerError::SplitNotFound(split_id))?;
        Ok(split)
    }

    /// Loads the retained participant deltas of a split.
    pub(crate) async fn load_participants<C: ConnectionTrait>(
        conn: &C,
        split_id: SplitId,
    ) -> RepoResult<Vec<ParticipantChange>> {
        let rows = split_participants::Entity::find()
            .filter(split_participants::Column::SplitId.eq(split_id.into_inner()))
            .all(conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ParticipantChange::new(UserId::from_uuid(r.user_id), r.change))
            .collect())
    }

    /// Adjusts the group's cached split total and touches `updated_at`.
    pub(crate) async fn adjust_group_cache<C: ConnectionTrait>(
        conn: &C,
        group_id: GroupId,
        total_delta: Decimal,
    ) -> RepoResult<()> {
        groups::Entity::update_many()
            .col_expr(
                groups::Column::Total,
                Expr::col(groups::Column::Total).add(total_delta),
            )
            .col_expr(groups::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(groups::Column::Id.eq(group_id.into_inner()))
            .exec(conn)
            .await?;
        Ok(())
    }
}

/// The element-wise negation of a change set (undo).
fn negate(changes: &[ParticipantChange]) -> Vec<ParticipantChange> {
    changes
        .iter()
        .map(|c| ParticipantChange::new(c.user_id, -c.change))
        .collect()
}
