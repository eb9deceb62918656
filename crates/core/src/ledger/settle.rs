//! Settle-up computation.
//!
//! Computes, from a snapshot of member balances, a synthetic change set
//! that cancels outstanding balances. The computation is deterministic for
//! a given snapshot and member subset, so its content hash can serve as an
//! optimistic-concurrency guard between preview and confirmation: the
//! confirming call recomputes against current balances and rejects when
//! the hash no longer matches.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use splitledger_shared::types::UserId;
use std::collections::BTreeMap;

use super::types::{MemberBalance, ParticipantChange};

/// A computed settlement: the participant deltas and their content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Deltas that cancel outstanding balances; sorted by user id and
    /// netting to zero. Empty when all scoped balances are zero.
    pub changes: Vec<ParticipantChange>,
    /// SHA-256 hex digest of the canonical change-set encoding.
    pub content_hash: String,
}

impl SettlementPlan {
    /// The value moved by this settlement: the sum of positive deltas.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.changes
            .iter()
            .filter(|c| c.change > Decimal::ZERO)
            .map(|c| c.change)
            .sum()
    }

    /// Returns true when there is nothing to settle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Computes the SHA-256 content hash of a change set.
///
/// The encoding is canonical: changes ordered by user id, amounts
/// normalized so trailing zeros do not produce distinct digests.
#[must_use]
pub fn content_hash(changes: &[ParticipantChange]) -> String {
    let mut hasher = Sha256::new();
    for change in changes {
        hasher.update(change.user_id.into_inner().as_bytes());
        hasher.update(change.change.normalize().to_string().as_bytes());
        hasher.update(b";");
    }
    hex::encode(hasher.finalize())
}

/// Computes a settlement from the given balance snapshot.
///
/// When `with_members` is given, only those members' balances are settled.
/// Debtors and creditors are paired greedily, largest first (ties broken
/// by user id), so the produced change set always nets to zero even when
/// the scoped balances do not; any residual stays on the members'
/// balances. For a full group the snapshot itself nets to zero and every
/// scoped balance is cancelled exactly.
#[must_use]
pub fn compute_settlement(
    balances: &[MemberBalance],
    with_members: Option<&[UserId]>,
) -> SettlementPlan {
    let scoped = balances.iter().filter(|b| match with_members {
        Some(members) => members.contains(&b.user_id),
        None => true,
    });

    let mut creditors: Vec<(UserId, Decimal)> = Vec::new();
    let mut debtors: Vec<(UserId, Decimal)> = Vec::new();
    for member in scoped {
        if member.balance > Decimal::ZERO {
            creditors.push((member.user_id, member.balance));
        } else if member.balance < Decimal::ZERO {
            debtors.push((member.user_id, -member.balance));
        }
    }

    // Deterministic pairing order: largest amount first, user id as tiebreak.
    let by_amount_desc =
        |a: &(UserId, Decimal), b: &(UserId, Decimal)| b.1.cmp(&a.1).then(a.0.cmp(&b.0));
    creditors.sort_by(by_amount_desc);
    debtors.sort_by(by_amount_desc);

    let mut net: BTreeMap<UserId, Decimal> = BTreeMap::new();
    let (mut i, mut j) = (0, 0);
    while i < creditors.len() && j < debtors.len() {
        let amount = creditors[i].1.min(debtors[j].1);

        // The creditor is paid out (balance moves toward zero), the debtor
        // pays in.
        *net.entry(creditors[i].0).or_default() -= amount;
        *net.entry(debtors[j].0).or_default() += amount;

        creditors[i].1 -= amount;
        debtors[j].1 -= amount;
        if creditors[i].1.is_zero() {
            i += 1;
        }
        if debtors[j].1.is_zero() {
            j += 1;
        }
    }

    let changes: Vec<ParticipantChange> = net
        .into_iter()
        .filter(|(_, change)| !change.is_zero())
        .map(|(user_id, change)| ParticipantChange::new(user_id, change))
        .collect();

    let content_hash = content_hash(&changes);
    SettlementPlan {
        changes,
        content_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(user_id: UserId, amount: Decimal) -> MemberBalance {
        MemberBalance {
            user_id,
            balance: amount,
        }
    }

    #[test]
    fn test_two_member_settlement_cancels_balances() {
        let a = UserId::new();
        let b = UserId::new();
        let plan = compute_settlement(&[balance(a, dec!(50)), balance(b, dec!(-50))], None);

        assert_eq!(plan.changes.len(), 2);
        let change_a = plan.changes.iter().find(|c| c.user_id == a).unwrap();
        let change_b = plan.changes.iter().find(|c| c.user_id == b).unwrap();
        assert_eq!(change_a.change, dec!(-50));
        assert_eq!(change_b.change, dec!(50));
        assert_eq!(plan.total(), dec!(50));
    }

    #[test]
    fn test_settlement_is_deterministic() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        let balances = [
            balance(a, dec!(70)),
            balance(b, dec!(-30)),
            balance(c, dec!(-40)),
        ];

        let first = compute_settlement(&balances, None);
        let second = compute_settlement(&balances, None);
        assert_eq!(first, second);
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[test]
    fn test_zero_balances_yield_empty_plan() {
        let plan = compute_settlement(
            &[
                balance(UserId::new(), dec!(0)),
                balance(UserId::new(), dec!(0)),
            ],
            None,
        );
        assert!(plan.is_empty());
        assert_eq!(plan.total(), Decimal::ZERO);
    }

    #[test]
    fn test_changes_net_to_zero_for_full_group() {
        let balances = [
            balance(UserId::new(), dec!(25.50)),
            balance(UserId::new(), dec!(10)),
            balance(UserId::new(), dec!(-20.25)),
            balance(UserId::new(), dec!(-15.25)),
        ];
        let plan = compute_settlement(&balances, None);

        let sum: Decimal = plan.changes.iter().map(|c| c.change).sum();
        assert!(sum.is_zero());

        // Every scoped balance is cancelled exactly.
        for member in &balances {
            let change = plan
                .changes
                .iter()
                .find(|c| c.user_id == member.user_id)
                .unwrap();
            assert_eq!(change.change, -member.balance);
        }
    }

    #[test]
    fn test_subset_settlement_nets_to_zero() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        let balances = [
            balance(a, dec!(60)),
            balance(b, dec!(-10)),
            balance(c, dec!(-50)),
        ];

        // Only a and b: the subset does not net to zero, the plan must.
        let plan = compute_settlement(&balances, Some(&[a, b]));
        let sum: Decimal = plan.changes.iter().map(|ch| ch.change).sum();
        assert!(sum.is_zero());
        assert_eq!(plan.total(), dec!(10));

        // b's debt is fully settled, a keeps the residual.
        let change_b = plan.changes.iter().find(|ch| ch.user_id == b).unwrap();
        assert_eq!(change_b.change, dec!(10));
    }

    #[test]
    fn test_hash_changes_with_balances() {
        let a = UserId::new();
        let b = UserId::new();
        let before = compute_settlement(&[balance(a, dec!(50)), balance(b, dec!(-50))], None);
        let after = compute_settlement(&[balance(a, dec!(30)), balance(b, dec!(-30))], None);
        assert_ne!(before.content_hash, after.content_hash);
    }

    #[test]
    fn test_hash_ignores_trailing_zeros() {
        let a = UserId::new();
        let b = UserId::new();
        let x = compute_settlement(&[balance(a, dec!(50)), balance(b, dec!(-50))], None);
        let y = compute_settlement(&[balance(a, dec!(50.00)), balance(b, dec!(-50.00))], None);
        assert_eq!(x.content_hash, y.content_hash);
    }
}
