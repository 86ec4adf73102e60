use indexmap::IndexMap;

use crate::models::Transfer;

/// Half a minor unit. Net positions within this distance of zero are settled.
pub const SETTLEMENT_THRESHOLD: f64 = 0.5;

/// Produces the transfers that bring every net position back to zero.
///
/// Greedy pairing of the largest remaining debt with the largest remaining
/// credit. Both sides are sorted with a stable sort, so equal magnitudes keep
/// the order of `net`. Reported amounts are rounded half-up; the running
/// remainders are not, so rounding error does not accumulate.
pub fn settle(net: &IndexMap<String, f64>) -> Vec<Transfer> {
    let mut creditors: Vec<(&str, f64)> = Vec::new();
    let mut debtors: Vec<(&str, f64)> = Vec::new();

    for (name, &position) in net {
        if position > SETTLEMENT_THRESHOLD {
            creditors.push((name.as_str(), position));
        } else if position < -SETTLEMENT_THRESHOLD {
            debtors.push((name.as_str(), -position));
        }
    }

    creditors.sort_by(|a, b| b.1.total_cmp(&a.1));
    debtors.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut transfers = Vec::with_capacity(creditors.len() + debtors.len());
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let (debtor, debt) = debtors[i];
        let (creditor, credit) = creditors[j];
        let pay = debt.min(credit);

        transfers.push(Transfer::new(debtor, creditor, round_half_up(pay)));

        debtors[i].1 = debt - pay;
        creditors[j].1 = credit - pay;

        if debtors[i].1 <= SETTLEMENT_THRESHOLD {
            i += 1;
        }
        if creditors[j].1 <= SETTLEMENT_THRESHOLD {
            j += 1;
        }
    }

    transfers
}

/// Rounds a non-negative amount to the nearest minor unit, halves going up.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_two_debtors_one_creditor() {
        let net = positions(&[("Bình", 80.0), ("An", -40.0), ("Duy", -40.0)]);
        let transfers = settle(&net);

        assert_eq!(
            transfers,
            vec![Transfer::new("An", "Bình", 40), Transfer::new("Duy", "Bình", 40)]
        );
    }

    #[test]
    fn test_balanced_positions_yield_nothing() {
        let net = positions(&[("An", 0.4), ("Bình", -0.3), ("Duy", -0.1)]);
        assert!(settle(&net).is_empty());
        assert!(settle(&IndexMap::new()).is_empty());
    }

    #[test]
    fn test_largest_debt_pairs_with_largest_credit() {
        let net = positions(&[
            ("A", 10.0),
            ("B", 70.0),
            ("C", -50.0),
            ("D", -30.0),
        ]);
        let transfers = settle(&net);

        assert_eq!(
            transfers,
            vec![
                Transfer::new("C", "B", 50),
                Transfer::new("D", "B", 20),
                Transfer::new("D", "A", 10),
            ]
        );
    }

    #[test]
    fn test_thirds_round_per_transfer() {
        // 100 split three ways from a single payer.
        let third = 100.0 / 3.0;
        let net = positions(&[("An", 100.0 - third), ("Bình", -third), ("Duy", -third)]);
        let transfers = settle(&net);

        assert_eq!(transfers.len(), 2);
        assert!(transfers.iter().all(|t| t.amount == 33));
        assert!(transfers.iter().all(|t| t.to == "An"));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.4999), 2);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[test]
    fn test_step_bound() {
        let net = positions(&[
            ("A", 35.0),
            ("B", 25.0),
            ("C", -20.0),
            ("D", -20.0),
            ("E", -20.0),
        ]);
        let transfers = settle(&net);
        assert!(transfers.len() <= 2 + 3 - 1);
    }
}
