//! `SeaORM` Entity for the groups table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An expense group: the root aggregate owning members and splits.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    /// Group identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// ISO 4217 currency code all balances are denominated in.
    pub currency: String,
    /// Cached sum of magnitudes of all non-deleted split totals.
    pub total: Decimal,
    /// Soft-deletion flag for the group itself.
    pub deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTimeWithTimeZone,
    /// Last ledger mutation timestamp.
    pub updated_at: DateTimeWithTimeZone,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Members of this group.
    #[sea_orm(has_many = "super::group_members::Entity")]
    GroupMembers,
    /// Splits recorded in this group.
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    /// Monthly statistics rows of this group.
    #[sea_orm(has_many = "super::group_monthly_stats::Entity")]
    GroupMonthlyStats,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMembers.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::group_monthly_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMonthlyStats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
