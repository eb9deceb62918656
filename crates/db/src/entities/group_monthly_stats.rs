//! `SeaORM` Entity for the group_monthly_stats table.
//!
//! One row per group and UTC calendar month, maintained incrementally by
//! the split lifecycle operations. Settle-up splits are never counted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Running totals for one group/month.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "group_monthly_stats")]
pub struct Model {
    /// The group.
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: Uuid,
    /// UTC start of the calendar month.
    #[sea_orm(primary_key, auto_increment = false)]
    pub month: DateTimeWithTimeZone,
    /// Running sum of non-settle-up split totals in this month.
    pub total_value: Decimal,
    /// Number of non-settle-up splits in this month.
    pub transaction_count: i64,
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
