//! Initial database migration.
//!
//! Creates the ledger schema: groups, members, splits, participants, and
//! monthly statistics.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(GROUPS_SQL).await?;
        db.execute_unprepared(GROUP_MEMBERS_SQL).await?;
        db.execute_unprepared(SPLITS_SQL).await?;
        db.execute_unprepared(SPLIT_PARTICIPANTS_SQL).await?;
        db.execute_unprepared(GROUP_MONTHLY_STATS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const GROUPS_SQL: &str = r#"
CREATE TABLE groups (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    currency CHAR(3) NOT NULL,
    total NUMERIC(20, 4) NOT NULL DEFAULT 0,
    deleted BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

const GROUP_MEMBERS_SQL: &str = r#"
-- Member rows are never physically deleted; access revocation flips
-- has_access. Balances per group sum to zero at every committed state.
CREATE TABLE group_members (
    group_id UUID NOT NULL REFERENCES groups(id),
    user_id UUID NOT NULL,
    balance NUMERIC(20, 4) NOT NULL DEFAULT 0,
    is_admin BOOLEAN NOT NULL DEFAULT FALSE,
    has_access BOOLEAN NOT NULL DEFAULT TRUE,
    is_hidden BOOLEAN NOT NULL DEFAULT FALSE,
    joined_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (group_id, user_id)
);
"#;

const SPLITS_SQL: &str = r#"
CREATE TABLE splits (
    id UUID PRIMARY KEY,
    group_id UUID NOT NULL REFERENCES groups(id),
    total NUMERIC(20, 4) NOT NULL CHECK (total > 0),
    paid_by UUID NOT NULL,
    created_by UUID NOT NULL,
    title VARCHAR(512) NOT NULL,
    "timestamp" TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version BIGINT NOT NULL DEFAULT 1,
    split_type INTEGER NOT NULL DEFAULT 0,
    deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    deleted_by UUID
);

CREATE INDEX idx_splits_group_timestamp ON splits (group_id, "timestamp" DESC);
CREATE INDEX idx_splits_group_deleted ON splits (group_id, deleted);
"#;

const SPLIT_PARTICIPANTS_SQL: &str = r#"
-- Retained after soft delete so restore can re-apply the deltas.
CREATE TABLE split_participants (
    split_id UUID NOT NULL REFERENCES splits(id),
    user_id UUID NOT NULL,
    change NUMERIC(20, 4) NOT NULL,
    PRIMARY KEY (split_id, user_id)
);
"#;

const GROUP_MONTHLY_STATS_SQL: &str = r#"
-- month is the first instant of the UTC calendar month.
CREATE TABLE group_monthly_stats (
    group_id UUID NOT NULL REFERENCES groups(id),
    month TIMESTAMPTZ NOT NULL,
    total_value NUMERIC(20, 4) NOT NULL DEFAULT 0,
    transaction_count BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (group_id, month)
);
"#;

const DROP_ALL_SQL: &str = r#"
DROP TABLE IF EXISTS group_monthly_stats;
DROP TABLE IF EXISTS split_participants;
DROP TABLE IF EXISTS splits;
DROP TABLE IF EXISTS group_members;
DROP TABLE IF EXISTS groups;
"#;
