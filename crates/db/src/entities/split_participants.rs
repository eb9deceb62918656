//! `SeaORM` Entity for the split_participants table.
//!
//! Participant rows are retained after a split is soft-deleted so a
//! restore can cheaply re-apply them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The signed balance delta one member receives from one split.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "split_participants")]
pub struct Model {
    /// The split.
    #[sea_orm(primary_key, auto_increment = false)]
    pub split_id: Uuid,
    /// The participating member.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    /// Signed delta applied to the member's balance. Sums to zero across
    /// all participants of one split.
    pub change: Decimal,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning split.
    #[sea_orm(
        belongs_to = "super::splits::Entity",
        from = "Column::SplitId",
        to = "super::splits::Column::Id"
    )]
    Splits,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
