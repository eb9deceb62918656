//! Property-based tests for split input validation.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use splitledger_shared::types::{GroupId, UserId};

use super::error::LedgerError;
use super::types::{CreateSplitInput, ParticipantChange, SplitFlags};
use super::validation::{MAX_TITLE_LEN, validate_create};

/// Strategy for a signed amount with two decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a balanced participant change set of at least two members.
fn balanced_changes(max_members: usize) -> impl Strategy<Value = Vec<ParticipantChange>> {
    prop::collection::vec(amount_strategy(), 1..max_members).prop_map(|amounts| {
        let sum: Decimal = amounts.iter().copied().sum();
        let mut changes: Vec<ParticipantChange> = amounts
            .into_iter()
            .map(|change| ParticipantChange::new(UserId::new(), change))
            .collect();
        changes.push(ParticipantChange::new(UserId::new(), -sum));
        changes
    })
}

fn make_input(changes: Vec<ParticipantChange>, total: Decimal) -> CreateSplitInput {
    let paid_by = changes[0].user_id;
    CreateSplitInput {
        group_id: GroupId::new(),
        created_by: paid_by,
        title: "prop split".to_string(),
        total,
        paid_by,
        timestamp: Utc::now(),
        flags: SplitFlags::NORMAL,
        changes,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any balanced change set with a positive total and bounded title
    /// passes validation.
    #[test]
    fn prop_balanced_input_is_accepted(
        changes in balanced_changes(8),
        total in 1i64..1_000_000i64,
    ) {
        let input = make_input(changes, Decimal::new(total, 2));
        prop_assert!(validate_create(&input).is_ok());
    }

    /// Perturbing any single delta by a nonzero epsilon breaks the zero-sum
    /// precondition and is rejected before any mutation could happen.
    #[test]
    fn prop_unbalanced_input_is_rejected(
        changes in balanced_changes(8),
        index in any::<prop::sample::Index>(),
        epsilon in prop_oneof![(-10_000i64..-1i64), (1i64..10_000i64)],
    ) {
        let mut changes = changes;
        let i = index.index(changes.len());
        changes[i].change += Decimal::new(epsilon, 2);

        let input = make_input(changes, Decimal::new(100, 0));
        let rejected = matches!(
            validate_create(&input),
            Err(LedgerError::UnbalancedDelta { .. })
        );
        prop_assert!(rejected);
    }

    /// Non-positive totals are always rejected regardless of the change set.
    #[test]
    fn prop_non_positive_total_is_rejected(
        changes in balanced_changes(8),
        total in -1_000_000i64..=0i64,
    ) {
        let input = make_input(changes, Decimal::new(total, 2));
        prop_assert!(matches!(
            validate_create(&input),
            Err(LedgerError::NonPositiveTotal(_))
        ));
    }

    /// Titles longer than the bound are rejected, independent of content.
    #[test]
    fn prop_oversize_title_is_rejected(
        changes in balanced_changes(8),
        extra in 1usize..64,
    ) {
        let mut input = make_input(changes, Decimal::new(100, 0));
        input.title = "t".repeat(MAX_TITLE_LEN + extra);
        let rejected = matches!(
            validate_create(&input),
            Err(LedgerError::TitleTooLong { .. })
        );
        prop_assert!(rejected);
    }

    /// Duplicating an existing participant is always caught.
    #[test]
    fn prop_duplicate_participant_is_rejected(
        changes in balanced_changes(8),
        index in any::<prop::sample::Index>(),
    ) {
        let mut changes = changes;
        let i = index.index(changes.len());
        // Duplicate with negated delta so the set still sums to zero: the
        // duplicate check must fire, not the balance check.
        let dup = ParticipantChange::new(changes[i].user_id, Decimal::ZERO);
        changes.push(dup);

        let input = make_input(changes, Decimal::new(100, 0));
        prop_assert!(matches!(
            validate_create(&input),
            Err(LedgerError::DuplicateParticipant(_))
        ));
    }
}
