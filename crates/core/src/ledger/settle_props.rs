//! Property-based tests for settle-up computation and delta algebra.

use proptest::prelude::*;
use rust_decimal::Decimal;
use splitledger_shared::types::UserId;

use super::settle::{compute_settlement, content_hash};
use super::types::{MemberBalance, ParticipantChange};

/// Strategy for a signed amount with two decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a group balance snapshot netting to zero: the last member
/// absorbs the negated sum of the others.
fn zero_sum_balances(max_members: usize) -> impl Strategy<Value = Vec<MemberBalance>> {
    prop::collection::vec(amount_strategy(), 1..max_members).prop_map(|amounts| {
        let sum: Decimal = amounts.iter().copied().sum();
        let mut balances: Vec<MemberBalance> = amounts
            .into_iter()
            .map(|balance| MemberBalance {
                user_id: UserId::new(),
                balance,
            })
            .collect();
        balances.push(MemberBalance {
            user_id: UserId::new(),
            balance: -sum,
        });
        balances
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any zero-sum snapshot, the settlement cancels every balance
    /// exactly: applying the plan leaves all members at zero.
    #[test]
    fn prop_full_settlement_zeroes_all_balances(balances in zero_sum_balances(8)) {
        let plan = compute_settlement(&balances, None);

        for member in &balances {
            let change = plan
                .changes
                .iter()
                .find(|c| c.user_id == member.user_id)
                .map_or(Decimal::ZERO, |c| c.change);
            prop_assert_eq!(
                member.balance + change,
                Decimal::ZERO,
                "member balance not cancelled"
            );
        }
    }

    /// The change set always nets to zero, preserving the group zero-sum
    /// invariant once applied.
    #[test]
    fn prop_changes_net_to_zero(balances in zero_sum_balances(8)) {
        let plan = compute_settlement(&balances, None);
        let sum: Decimal = plan.changes.iter().map(|c| c.change).sum();
        prop_assert_eq!(sum, Decimal::ZERO);
    }

    /// Previewing twice against an unchanged snapshot yields the same hash.
    #[test]
    fn prop_preview_hash_is_idempotent(balances in zero_sum_balances(8)) {
        let first = compute_settlement(&balances, None);
        let second = compute_settlement(&balances, None);
        prop_assert_eq!(first.content_hash, second.content_hash);
    }

    /// The computation does not depend on snapshot ordering.
    #[test]
    fn prop_plan_independent_of_input_order(balances in zero_sum_balances(8)) {
        let forward = compute_settlement(&balances, None);
        let mut reversed = balances;
        reversed.reverse();
        let backward = compute_settlement(&reversed, None);
        prop_assert_eq!(forward, backward);
    }

    /// Subset settlements never overshoot: each member moves toward zero by
    /// at most their outstanding balance, and the change set still nets to
    /// zero.
    #[test]
    fn prop_subset_settlement_is_bounded(balances in zero_sum_balances(8)) {
        // Scope to roughly the first half of the group.
        let subset: Vec<UserId> = balances
            .iter()
            .take(balances.len().div_ceil(2))
            .map(|b| b.user_id)
            .collect();
        let plan = compute_settlement(&balances, Some(&subset));

        let sum: Decimal = plan.changes.iter().map(|c| c.change).sum();
        prop_assert_eq!(sum, Decimal::ZERO);

        for change in &plan.changes {
            let member = balances
                .iter()
                .find(|b| b.user_id == change.user_id)
                .expect("change for unknown member");
            prop_assert!(subset.contains(&change.user_id));
            // Opposite sign, bounded magnitude.
            prop_assert!(change.change.abs() <= member.balance.abs());
            prop_assert!((member.balance + change.change).abs() <= member.balance.abs());
        }
    }

    /// Delta algebra: applying a zero-sum change set and then its negation
    /// restores the original balances bit-for-bit. This is the undo/redo
    /// identity that split update and delete/restore rely on.
    #[test]
    fn prop_apply_then_reverse_restores_balances(balances in zero_sum_balances(8)) {
        let plan = compute_settlement(&balances, None);

        let mut working: Vec<MemberBalance> = balances.clone();
        for change in &plan.changes {
            if let Some(member) = working.iter_mut().find(|b| b.user_id == change.user_id) {
                member.balance += change.change;
            }
        }
        for change in &plan.changes {
            if let Some(member) = working.iter_mut().find(|b| b.user_id == change.user_id) {
                member.balance -= change.change;
            }
        }

        prop_assert_eq!(working, balances);
    }
}

// ============================================================================
// Concrete scenario from the product: two members, one split, settle up
// ============================================================================

#[cfg(test)]
mod scenario {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_two_member_expense_then_settle_up() {
        let a = UserId::new();
        let b = UserId::new();

        // A pays 100, shares are 50/50: deltas {A: +50, B: -50}.
        let create_changes = [
            ParticipantChange::new(a, dec!(50)),
            ParticipantChange::new(b, dec!(-50)),
        ];
        let sum: Decimal = create_changes.iter().map(|c| c.change).sum();
        assert_eq!(sum, Decimal::ZERO);

        let balances = [
            MemberBalance {
                user_id: a,
                balance: dec!(50),
            },
            MemberBalance {
                user_id: b,
                balance: dec!(-50),
            },
        ];

        // Preview: A receives -50, B receives +50.
        let plan = compute_settlement(&balances, None);
        assert_eq!(
            plan.changes.iter().find(|c| c.user_id == a).unwrap().change,
            dec!(-50)
        );
        assert_eq!(
            plan.changes.iter().find(|c| c.user_id == b).unwrap().change,
            dec!(50)
        );

        // Confirming against the same snapshot matches the preview hash.
        let confirm = compute_settlement(&balances, None);
        assert_eq!(confirm.content_hash, plan.content_hash);

        // A new split in between changes the snapshot and breaks the hash.
        let changed = [
            MemberBalance {
                user_id: a,
                balance: dec!(70),
            },
            MemberBalance {
                user_id: b,
                balance: dec!(-70),
            },
        ];
        let stale_check = compute_settlement(&changed, None);
        assert_ne!(stale_check.content_hash, plan.content_hash);

        // Applying the plan zeroes both members.
        let final_a = dec!(50) + plan.changes.iter().find(|c| c.user_id == a).unwrap().change;
        let final_b = dec!(-50) + plan.changes.iter().find(|c| c.user_id == b).unwrap().change;
        assert_eq!(final_a, Decimal::ZERO);
        assert_eq!(final_b, Decimal::ZERO);
    }

    #[test]
    fn test_content_hash_is_stable_hex_sha256() {
        let changes = [ParticipantChange::new(UserId::new(), dec!(10))];
        let digest = content_hash(&changes);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
