use crate::models::{BalanceSheet, ExpenseRecord, Participants};

/// Folds a period's expense records into paid totals and net positions.
///
/// `roster` seeds the member order; payers and named participants outside
/// the roster are appended the first time they appear. A record shared by
/// `Participants::All`, or by a subset that is empty after trimming, is split
/// across every member tracked at that point of the fold.
pub fn compute_balances(records: &[ExpenseRecord], roster: &[String]) -> BalanceSheet {
    let mut sheet = BalanceSheet::default();
    for name in roster {
        sheet.track(name);
    }

    for record in records {
        sheet.track(&record.payer);
        if let Some(paid) = sheet.paid.get_mut(&record.payer) {
            *paid = paid.saturating_add(record.amount);
        }
        if let Some(net) = sheet.net.get_mut(&record.payer) {
            *net += record.amount as f64;
        }

        let sharers = resolve_sharers(&mut sheet, &record.participants);
        if sharers.is_empty() {
            continue;
        }

        let share = record.amount as f64 / sharers.len() as f64;
        for name in &sharers {
            if let Some(net) = sheet.net.get_mut(name) {
                *net -= share;
            }
        }
    }

    sheet
}

/// Returns the de-duplicated share set for one record, tracking unknown names.
fn resolve_sharers(sheet: &mut BalanceSheet, participants: &Participants) -> Vec<String> {
    let mut sharers: Vec<String> = Vec::new();

    if let Participants::Subset(names) = participants {
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            if !sharers.iter().any(|s| s == name) {
                sharers.push(name.to_string());
            }
        }
    }

    if sharers.is_empty() {
        return sheet.members.clone();
    }

    for name in &sharers {
        sheet.track(name);
    }
    sharers
}
