//! Group repository: group lifecycle, membership, and read models.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use splitledger_core::ledger::permission::Capability;
use splitledger_core::ledger::types::MemberBalance;
use splitledger_core::ledger::LedgerError;
use splitledger_shared::types::{GroupId, UserId};
use tracing::info;

use super::{RepoResult, load_live_group, require_permission};
use crate::entities::{group_members, group_monthly_stats, groups};

/// A group together with its membership rows.
#[derive(Debug, Clone)]
pub struct GroupWithMembers {
    /// The group row.
    pub group: groups::Model,
    /// All membership rows, including revoked-access members.
    pub members: Vec<group_members::Model>,
}

/// Repository managing groups and their memberships.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a group and enrolls the creator as its first admin.
    ///
    /// # Errors
    ///
    /// Returns a database error if either insert fails.
    pub async fn create_group(
        &self,
        creator: UserId,
        name: String,
        currency: String,
    ) -> RepoResult<GroupId> {
        let txn = self.db.begin().await?;

        let group_id = GroupId::new();
        let now = Utc::now();
        let group = groups::ActiveModel {
            id: Set(group_id.into_inner()),
            name: Set(name),
            currency: Set(currency),
            total: Set(Decimal::ZERO),
            deleted: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        group.insert(&txn).await?;

        let creator_row = group_members::ActiveModel {
            group_id: Set(group_id.into_inner()),
            user_id: Set(creator.into_inner()),
            balance: Set(Decimal::ZERO),
            is_admin: Set(true),
            has_access: Set(true),
            is_hidden: Set(false),
            joined_at: Set(now.into()),
        };
        creator_row.insert(&txn).await?;

        txn.commit().await?;
        info!(%group_id, %creator, "group created");
        Ok(group_id)
    }

    /// Adds a member with a zero balance and default permissions.
    ///
    /// Adding a user who already has a membership row is a no-op: the
    /// existing row, and in particular its balance, is left untouched.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless the caller is an admin with access, or
    /// `GroupNotFound` if the group is gone.
    pub async fn add_member(
        &self,
        group_id: GroupId,
        caller: UserId,
        new_member: UserId,
    ) -> RepoResult<()> {
        let txn = self.db.begin().await?;
        require_permission(&txn, Capability::AddMembers, group_id, caller).await?;
        load_live_group(&txn, group_id).await?;

        let row = group_members::ActiveModel {
            group_id: Set(group_id.into_inner()),
            user_id: Set(new_member.into_inner()),
            balance: Set(Decimal::ZERO),
            is_admin: Set(false),
            has_access: Set(true),
            is_hidden: Set(false),
            joined_at: Set(Utc::now().into()),
        };
        group_members::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    group_members::Column::GroupId,
                    group_members::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(%group_id, %new_member, "member added");
        Ok(())
    }

    /// Grants or revokes a member's group access.
    ///
    /// Revocation keeps the row and its balance; the member just loses the
    /// ability to act until access is granted again.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `UserNotInGroup`.
    pub async fn set_access(
        &self,
        group_id: GroupId,
        caller: UserId,
        target: UserId,
        has_access: bool,
    ) -> RepoResult<()> {
        require_permission(&self.db, Capability::ManageAccess, group_id, caller).await?;
        self.update_member_flag(group_id, target, group_members::Column::HasAccess, has_access)
            .await
    }

    /// Grants or revokes a member's admin role.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `UserNotInGroup`.
    pub async fn set_admin(
        &self,
        group_id: GroupId,
        caller: UserId,
        target: UserId,
        is_admin: bool,
    ) -> RepoResult<()> {
        require_permission(&self.db, Capability::ManageAdmins, group_id, caller).await?;
        self.update_member_flag(group_id, target, group_members::Column::IsAdmin, is_admin)
            .await
    }

    /// Hides or unhides the group in the caller's own listing.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the caller lacks group access.
    pub async fn set_hidden(
        &self,
        group_id: GroupId,
        caller: UserId,
        is_hidden: bool,
    ) -> RepoResult<()> {
        require_permission(&self.db, Capability::ReadSplits, group_id, caller).await?;
        self.update_member_flag(group_id, caller, group_members::Column::IsHidden, is_hidden)
            .await
    }

    /// Fetches a group with all of its membership rows.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `GroupNotFound`.
    pub async fn get_group_with_members(
        &self,
        group_id: GroupId,
        caller: UserId,
    ) -> RepoResult<GroupWithMembers> {
        require_permission(&self.db, Capability::ReadSplits, group_id, caller).await?;
        let group = load_live_group(&self.db, group_id).await?;

        let members = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
            .order_by_asc(group_members::Column::UserId)
            .all(&self.db)
            .await?;

        Ok(GroupWithMembers { group, members })
    }

    /// Reads the current member balances of a group.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the caller lacks group access.
    pub async fn member_balances(
        &self,
        group_id: GroupId,
        caller: UserId,
    ) -> RepoResult<Vec<MemberBalance>> {
        require_permission(&self.db, Capability::ReadSplits, group_id, caller).await?;

        let members = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
            .order_by_asc(group_members::Column::UserId)
            .all(&self.db)
            .await?;

        Ok(members
            .into_iter()
            .map(|m| MemberBalance {
                user_id: UserId::from_uuid(m.user_id),
                balance: m.balance,
            })
            .collect())
    }

    /// Reads the monthly statistics of a group, most recent month first.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the caller lacks group access.
    pub async fn monthly_stats(
        &self,
        group_id: GroupId,
        caller: UserId,
    ) -> RepoResult<Vec<group_monthly_stats::Model>> {
        require_permission(&self.db, Capability::ReadSplits, group_id, caller).await?;

        let rows = group_monthly_stats::Entity::find()
            .filter(group_monthly_stats::Column::GroupId.eq(group_id.into_inner()))
            .order_by_desc(group_monthly_stats::Column::Month)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Flips one boolean column on a member row.
    async fn update_member_flag(
        &self,
        group_id: GroupId,
        target: UserId,
        column: group_members::Column,
        value: bool,
    ) -> RepoResult<()> {
        let result = group_members::Entity::update_many()
            .col_expr(column, Expr::value(value))
            .filter(group_members::Column::GroupId.eq(group_id.into_inner()))
            .filter(group_members::Column::UserId.eq(target.into_inner()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(LedgerError::UserNotInGroup(target).into());
        }
        Ok(())
    }
}
