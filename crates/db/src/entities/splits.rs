//! `SeaORM` Entity for the splits table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A recorded expense or balance-adjusting event.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    /// Split identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning group.
    pub group_id: Uuid,
    /// Positive magnitude of the split.
    pub total: Decimal,
    /// Member who paid.
    pub paid_by: Uuid,
    /// Member who recorded the split.
    pub created_by: Uuid,
    /// Display title.
    pub title: String,
    /// User-facing transaction date.
    pub timestamp: DateTimeWithTimeZone,
    /// Last edit timestamp.
    pub updated_at: DateTimeWithTimeZone,
    /// Monotonic edit counter.
    pub version: i64,
    /// Classification bit flags (see `splitledger_core::ledger::SplitFlags`).
    pub split_type: i32,
    /// Soft-deletion flag.
    pub deleted: bool,
    /// When the split was deleted.
    pub deleted_at: Option<DateTimeWithTimeZone>,
    /// Who deleted the split.
    pub deleted_by: Option<Uuid>,
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
    /// Participant deltas of this split.
    #[sea_orm(has_many = "super::split_participants::Entity")]
    SplitParticipants,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::split_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SplitParticipants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
