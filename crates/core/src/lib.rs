//! Core business logic for Splitledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Split transactions, balances, settle-up, and monthly statistics

pub mod ledger;
