//! `SeaORM` entity definitions for the ledger schema.

pub mod group_members;
pub mod group_monthly_stats;
pub mod groups;
pub mod split_participants;
pub mod splits;
