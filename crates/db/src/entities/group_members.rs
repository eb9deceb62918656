//! `SeaORM` Entity for the group_members table.
//!
//! Rows are never physically deleted; access revocation flips `has_access`.
//! Per group, committed balances always sum to zero.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership of one user in one group, carrying the running balance.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "group_members")]
pub struct Model {
    /// The group.
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: Uuid,
    /// The member.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    /// Signed running balance in group currency units.
    pub balance: Decimal,
    /// Whether the member holds admin rights.
    pub is_admin: bool,
    /// Whether the member currently has access.
    pub has_access: bool,
    /// Per-member display preference.
    pub is_hidden: bool,
    /// When the member joined the group.
    pub joined_at: DateTimeWithTimeZone,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning group.
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
