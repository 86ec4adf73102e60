use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-participant totals for one period snapshot.
///
/// `paid` and `net` share the key order of `members`: roster order first,
/// then ad-hoc payers and participants in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub paid: IndexMap<String, i64>,
    /// Paid minus owed share. Positive = is owed money.
    pub net: IndexMap<String, f64>,
    pub members: Vec<String>,
}

impl BalanceSheet {
    /// Adds a participant with zero totals if not already tracked.
    pub fn track(&mut self, name: &str) {
        if !self.net.contains_key(name) {
            self.paid.insert(name.to_string(), 0);
            self.net.insert(name.to_string(), 0.0);
            self.members.push(name.to_string());
        }
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.net.contains_key(name)
    }

    pub fn paid_by(&self, name: &str) -> i64 {
        self.paid.get(name).copied().unwrap_or(0)
    }

    pub fn net_of(&self, name: &str) -> f64 {
        self.net.get(name).copied().unwrap_or(0.0)
    }

    /// Sum of everything paid in the period, saturating at the `i64` bounds.
    pub fn total_spent(&self) -> i64 {
        self.paid
            .values()
            .fold(0i64, |total, amount| total.saturating_add(*amount))
    }
}

/// One advisory payment from a debtor to a creditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: i64,
}

impl Transfer {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: i64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}
