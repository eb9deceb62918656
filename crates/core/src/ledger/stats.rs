//! Monthly statistics delta computation.
//!
//! Statistics are kept per group and calendar month as running totals of
//! split value and transaction count. This module computes the deltas each
//! lifecycle operation must apply; the storage layer turns them into
//! atomic upserts.
//!
//! Calendar months are truncated in UTC. This is the canonical reference
//! for the whole system: a split near a month boundary is attributed to
//! its UTC month regardless of where the caller lives.

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;

/// A delta to apply to one group/month statistics row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsDelta {
    /// UTC start of the calendar month the delta applies to.
    pub month: DateTime<Utc>,
    /// Signed change to the month's total value.
    pub value: Decimal,
    /// Signed change to the month's transaction count.
    pub count: i64,
}

/// Truncates a timestamp to the first instant of its UTC calendar month.
#[must_use]
pub fn month_start(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let date = timestamp.date_naive();
    // with_day(1) cannot fail for a date that already exists.
    let first = date.with_day(1).unwrap_or(date);
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Delta for recording a newly created (or restored) split.
#[must_use]
pub fn create_delta(total: Decimal, timestamp: DateTime<Utc>) -> StatsDelta {
    StatsDelta {
        month: month_start(timestamp),
        value: total,
        count: 1,
    }
}

/// Delta for removing a deleted split from its original month.
#[must_use]
pub fn delete_delta(total: Decimal, timestamp: DateTime<Utc>) -> StatsDelta {
    StatsDelta {
        month: month_start(timestamp),
        value: -total,
        count: -1,
    }
}

/// Deltas for an in-place edit that may move the split across months.
///
/// Same-month edits collapse to a single net-value delta (the count is
/// unchanged); the case is never skipped outright because the value still
/// needs netting. Cross-month edits produce a removal from the old month
/// and an addition to the new one.
#[must_use]
pub fn update_deltas(
    previous_total: Decimal,
    previous_timestamp: DateTime<Utc>,
    new_total: Decimal,
    new_timestamp: DateTime<Utc>,
) -> Vec<StatsDelta> {
    let previous_month = month_start(previous_timestamp);
    let new_month = month_start(new_timestamp);

    if previous_month == new_month {
        vec![StatsDelta {
            month: new_month,
            value: new_total - previous_total,
            count: 0,
        }]
    } else {
        vec![
            delete_delta(previous_total, previous_timestamp),
            create_delta(new_total, new_timestamp),
        ]
    }
}
