//! Monthly statistics maintenance.
//!
//! Applies the deltas computed by `splitledger_core::ledger::stats` inside
//! the caller's transaction. Creates are a single atomic upsert (insert or
//! accumulate) so concurrent first-writers in the same group/month cannot
//! lose updates; removals are relative decrements.
//!
//! Callers are responsible for skipping settle-up splits entirely.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use splitledger_core::ledger::stats::{StatsDelta, create_delta, delete_delta, update_deltas};
use splitledger_shared::types::GroupId;
use tracing::warn;

use crate::entities::group_monthly_stats::{ActiveModel, Column, Entity};

/// Records a newly created (or restored) split in its month.
pub(crate) async fn record_create<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    total: Decimal,
    timestamp: DateTime<Utc>,
) -> Result<(), DbErr> {
    upsert(conn, group_id, &create_delta(total, timestamp)).await
}

/// Removes a deleted split from its original month.
///
/// A missing row is a data inconsistency (historical rows may predate
/// instrumentation); it is logged and tolerated rather than failing the
/// enclosing split operation.
pub(crate) async fn record_delete<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    total: Decimal,
    timestamp: DateTime<Utc>,
) -> Result<(), DbErr> {
    decrement(conn, group_id, &delete_delta(total, timestamp)).await
}

/// Re-records an edited split, netting same-month edits into one update.
pub(crate) async fn record_update<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    previous_total: Decimal,
    previous_timestamp: DateTime<Utc>,
    new_total: Decimal,
    new_timestamp: DateTime<Utc>,
) -> Result<(), DbErr> {
    for delta in update_deltas(previous_total, previous_timestamp, new_total, new_timestamp) {
        if delta.count >= 0 {
            upsert(conn, group_id, &delta).await?;
        } else {
            decrement(conn, group_id, &delta).await?;
        }
    }
    Ok(())
}

/// Insert-or-accumulate in one statement.
async fn upsert<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    delta: &StatsDelta,
) -> Result<(), DbErr> {
    let model = ActiveModel {
        group_id: Set(group_id.into_inner()),
        month: Set(delta.month.into()),
        total_value: Set(delta.value),
        transaction_count: Set(delta.count),
    };

    Entity::insert(model)
        .on_conflict(
            OnConflict::columns([Column::GroupId, Column::Month])
                .value(
                    Column::TotalValue,
                    Expr::col((Entity, Column::TotalValue)).add(delta.value),
                )
                .value(
                    Column::TransactionCount,
                    Expr::col((Entity, Column::TransactionCount)).add(delta.count),
                )
                .to_owned(),
        )
        .exec(conn)
        .await?;

    Ok(())
}

/// Relative decrement of an existing month row.
async fn decrement<C: ConnectionTrait>(
    conn: &C,
    group_id: GroupId,
    delta: &StatsDelta,
) -> Result<(), DbErr> {
    let result = Entity::update_many()
        .col_expr(
            Column::TotalValue,
            Expr::col(Column::TotalValue).add(delta.value),
        )
        .col_expr(
            Column::TransactionCount,
            Expr::col(Column::TransactionCount).add(delta.count),
        )
        .filter(Column::GroupId.eq(group_id.into_inner()))
        .filter(Column::Month.eq(delta.month))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            %group_id,
            month = %delta.month,
            "monthly stats row missing on removal; historical data predates instrumentation"
        );
    }

    Ok(())
}
