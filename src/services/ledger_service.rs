use crate::commands::{AliasPair, Command, ExpenseEntry, ParticipantSpec};
use crate::error::Result;
use crate::models::{NameAlias, NewExpense, Participants};
use crate::observability::{get_metrics, LatencyTimer};
use crate::presentation;
use crate::repositories::ExpenseStore;
use crate::services::{compute_balances, settle};
use chrono::{DateTime, Local, Utc};
use indexmap::IndexSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of resolving an entry's initials against the chat's alias map.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Resolved {
        payer: String,
        participants: Participants,
    },
    Unknown(String),
}

/// Per-chat command handler. Every operation returns the reply text.
pub struct LedgerService<S: ExpenseStore + ?Sized = dyn ExpenseStore> {
    store: Arc<S>,
    default_aliases: Vec<(String, String)>,
}

impl<S: ExpenseStore + ?Sized> LedgerService<S> {
    pub fn new(store: Arc<S>, default_aliases: Vec<(String, String)>) -> Self {
        Self {
            store,
            default_aliases,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Dispatches a parsed command.
    pub async fn handle(&self, chat_id: i64, command: Command) -> Result<String> {
        match command {
            Command::Start => Ok(presentation::HELP_TEXT.to_string()),
            Command::SetMap(pairs) => self.set_aliases(chat_id, &pairs).await,
            Command::Summary => self.summarize(chat_id).await,
            Command::NewPeriod => self.start_new_period(chat_id).await,
            Command::Entry(entry) => self.record_expense(chat_id, &entry).await,
        }
    }

    /// Installs the configured alias map when the chat has none yet.
    pub async fn ensure_default_aliases(&self, chat_id: i64) -> Result<()> {
        if self.default_aliases.is_empty() || self.store.alias_count(chat_id).await? > 0 {
            return Ok(());
        }

        let aliases: Vec<NameAlias> = self
            .default_aliases
            .iter()
            .map(|(initial, fullname)| NameAlias::new(chat_id, initial, fullname))
            .collect();
        self.store.upsert_aliases(&aliases).await?;

        info!(chat_id, count = aliases.len(), "Installed default aliases");
        Ok(())
    }

    /// Reads the period start, storing `now` first if the chat has none.
    pub async fn period_start_or_init(&self, chat_id: i64) -> Result<DateTime<Utc>> {
        if let Some(start) = self.store.period_start(chat_id).await? {
            return Ok(start);
        }

        let now = Utc::now();
        self.store.set_period_start(chat_id, now).await?;
        debug!(chat_id, %now, "Initialized period start");
        Ok(now)
    }

    #[instrument(skip(self, entry), fields(initial = %entry.initial, amount = entry.amount))]
    pub async fn record_expense(&self, chat_id: i64, entry: &ExpenseEntry) -> Result<String> {
        self.ensure_default_aliases(chat_id).await?;
        self.period_start_or_init(chat_id).await?;

        let (payer, participants) = match self.resolve(chat_id, entry).await? {
            Resolution::Resolved { payer, participants } => (payer, participants),
            Resolution::Unknown(initial) => {
                warn!(chat_id, %initial, "Entry uses an unmapped initial");
                get_metrics().record_entry_rejected("unknown_initial");
                return Ok(presentation::unknown_initial_reply(&initial));
            }
        };

        let expense = NewExpense::new(chat_id, payer, entry.amount, entry.note.clone())
            .with_participants(participants);
        let record = self.store.append_expense(&expense, Utc::now()).await?;

        get_metrics().record_expense_recorded(record.participants.is_all());
        info!(
            chat_id,
            expense_id = record.id,
            payer = %record.payer,
            amount = record.amount,
            "Expense recorded"
        );

        Ok(presentation::recorded_reply(
            &record.payer,
            record.amount,
            &record.note,
            &record.participants,
        ))
    }

    #[instrument(skip(self))]
    pub async fn summarize(&self, chat_id: i64) -> Result<String> {
        self.ensure_default_aliases(chat_id).await?;
        let start = self.period_start_or_init(chat_id).await?;
        let end = Utc::now();

        let records = self.store.expenses_since(chat_id, start).await?;
        let roster: Vec<String> = self
            .store
            .aliases(chat_id)
            .await?
            .into_iter()
            .map(|alias| alias.fullname)
            .collect();

        let start_text = presentation::fmt_date_dmy(start, &Local);
        let end_text = presentation::fmt_date_dmy(end, &Local);

        if records.is_empty() {
            debug!(chat_id, "Summary requested for an empty period");
            return Ok(presentation::empty_summary(&start_text, &end_text));
        }

        let timer = LatencyTimer::new();
        let sheet = compute_balances(&records, &roster);
        let transfers = settle(&sheet.net);

        get_metrics().record_settlement(
            sheet.members.len() as u64,
            transfers.len() as u64,
            timer.elapsed_ms(),
        );
        info!(
            chat_id,
            records = records.len(),
            members = sheet.members.len(),
            transfers = transfers.len(),
            total_spent = sheet.total_spent(),
            "Period summarized"
        );

        Ok(presentation::summary(&start_text, &end_text, &sheet, &transfers))
    }

    #[instrument(skip(self))]
    pub async fn start_new_period(&self, chat_id: i64) -> Result<String> {
        let now = Utc::now();
        let deleted = self.store.reset_period(chat_id, now).await?;

        get_metrics().record_period_started(deleted);
        info!(chat_id, deleted, "New period started");

        Ok(presentation::new_period_reply(&presentation::fmt_date_dmy(now, &Local)))
    }

    #[instrument(skip(self, pairs), fields(pairs = pairs.len()))]
    pub async fn set_aliases(&self, chat_id: i64, pairs: &[AliasPair]) -> Result<String> {
        let aliases: Vec<NameAlias> = pairs
            .iter()
            .map(|pair| NameAlias::new(chat_id, &pair.initial, &pair.fullname))
            .collect();
        self.store.upsert_aliases(&aliases).await?;

        get_metrics().record_aliases_updated(aliases.len() as u64);
        info!(chat_id, count = aliases.len(), "Aliases updated");

        Ok(presentation::aliases_updated_reply(pairs))
    }

    /// Resolves payer and participant initials to fullnames.
    /// Participant names are de-duplicated in typed order.
    async fn resolve(&self, chat_id: i64, entry: &ExpenseEntry) -> Result<Resolution> {
        let Some(payer) = self.store.resolve_alias(chat_id, &entry.initial).await? else {
            return Ok(Resolution::Unknown(entry.initial.clone()));
        };

        let participants = match &entry.participants {
            ParticipantSpec::Everyone => Participants::All,
            ParticipantSpec::Initials(initials) => {
                let mut names = IndexSet::new();
                for initial in initials {
                    match self.store.resolve_alias(chat_id, initial).await? {
                        Some(name) => {
                            names.insert(name);
                        }
                        None => return Ok(Resolution::Unknown(initial.clone())),
                    }
                }
                Participants::Subset(names.into_iter().collect())
            }
        };

        Ok(Resolution::Resolved { payer, participants })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory store for exercising the service without SQLite.
    #[derive(Default)]
    struct MemoryStore {
        expenses: Mutex<Vec<ExpenseRecord>>,
        period: Mutex<Option<DateTime<Utc>>>,
        aliases: Mutex<Vec<NameAlias>>,
    }

    #[async_trait]
    impl ExpenseStore for MemoryStore {
        async fn append_expense(&self, expense: &NewExpense, at: DateTime<Utc>) -> Result<ExpenseRecord> {
            let mut expenses = self.expenses.lock().unwrap();
            let record = ExpenseRecord {
                id: expenses.len() as i64 + 1,
                chat_id: expense.chat_id,
                payer: expense.payer.clone(),
                amount: expense.amount,
                note: expense.note.clone(),
                participants: expense.participants.clone(),
                created_at: at,
            };
            expenses.push(record.clone());
            Ok(record)
        }

        async fn expenses_since(&self, chat_id: i64, since: DateTime<Utc>) -> Result<Vec<ExpenseRecord>> {
            Ok(self
                .expenses
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.chat_id == chat_id && e.created_at >= since)
                .cloned()
                .collect())
        }

        async fn period_start(&self, _chat_id: i64) -> Result<Option<DateTime<Utc>>> {
            Ok(*self.period.lock().unwrap())
        }

        async fn set_period_start(&self, _chat_id: i64, start: DateTime<Utc>) -> Result<()> {
            *self.period.lock().unwrap() = Some(start);
            Ok(())
        }

        async fn reset_period(&self, chat_id: i64, start: DateTime<Utc>) -> Result<u64> {
            let mut expenses = self.expenses.lock().unwrap();
            let before = expenses.len();
            expenses.retain(|e| e.chat_id != chat_id);
            *self.period.lock().unwrap() = Some(start);
            Ok((before - expenses.len()) as u64)
        }

        async fn aliases(&self, chat_id: i64) -> Result<Vec<NameAlias>> {
            Ok(self
                .aliases
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.chat_id == chat_id)
                .cloned()
                .collect())
        }

        async fn resolve_alias(&self, chat_id: i64, initial: &str) -> Result<Option<String>> {
            Ok(self
                .aliases
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.chat_id == chat_id && a.initial == initial)
                .map(|a| a.fullname.clone()))
        }

        async fn upsert_aliases(&self, aliases: &[NameAlias]) -> Result<()> {
            let mut stored = self.aliases.lock().unwrap();
            for alias in aliases {
                match stored
                    .iter_mut()
                    .find(|a| a.chat_id == alias.chat_id && a.initial == alias.initial)
                {
                    Some(existing) => existing.fullname = alias.fullname.clone(),
                    None => stored.push(alias.clone()),
                }
            }
            Ok(())
        }

        async fn alias_count(&self, chat_id: i64) -> Result<i64> {
            Ok(self.aliases(chat_id).await?.len() as i64)
        }
    }

    fn defaults() -> Vec<(String, String)> {
        vec![
            ("b".to_string(), "Bình".to_string()),
            ("a".to_string(), "An".to_string()),
            ("d".to_string(), "Duy".to_string()),
        ]
    }

    fn service() -> LedgerService<MemoryStore> {
        LedgerService::new(Arc::new(MemoryStore::default()), defaults())
    }

    fn entry(initial: &str, amount: i64, note: &str, participants: ParticipantSpec) -> ExpenseEntry {
        ExpenseEntry {
            initial: initial.to_string(),
            amount,
            note: note.to_string(),
            participants,
        }
    }

    #[tokio::test]
    async fn test_record_installs_defaults_and_replies() {
        let service = service();
        let reply = service
            .record_expense(1, &entry("b", 120, "siêu thị", ParticipantSpec::Everyone))
            .await
            .unwrap();

        assert_eq!(reply, "đã ghi nhận: \"Bình chi 120k cho siêu thị\"");
        assert_eq!(service.store().alias_count(1).await.unwrap(), 3);
        assert!(service.store().period_start(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_payer_is_a_reply() {
        let service = service();
        let reply = service
            .record_expense(1, &entry("k", 50, "", ParticipantSpec::Everyone))
            .await
            .unwrap();

        assert_eq!(reply, presentation::unknown_initial_reply("k"));
        assert!(service.store().expenses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_participant_is_a_reply() {
        let service = service();
        let sharers = ParticipantSpec::Initials(vec!["a".into(), "z".into()]);
        let reply = service.record_expense(1, &entry("a", 50, "", sharers)).await.unwrap();

        assert_eq!(reply, presentation::unknown_initial_reply("z"));
    }

    #[tokio::test]
    async fn test_participants_resolved_to_fullnames() {
        let service = service();
        let sharers = ParticipantSpec::Initials(vec!["a".into(), "b".into()]);
        service.record_expense(1, &entry("a", 200, "pizza", sharers)).await.unwrap();

        let stored = service.store().expenses.lock().unwrap()[0].clone();
        assert_eq!(
            stored.participants,
            Participants::Subset(vec!["An".to_string(), "Bình".to_string()])
        );
    }

    #[tokio::test]
    async fn test_summary_of_empty_period() {
        let service = service();
        let reply = service.summarize(1).await.unwrap();

        assert!(reply.ends_with("- (chưa có khoản chi nào)\n"));
    }

    #[tokio::test]
    async fn test_summary_lists_transfers() {
        let service = service();
        service
            .handle(1, Command::Entry(entry("b", 120, "", ParticipantSpec::Everyone)))
            .await
            .unwrap();

        let reply = service.handle(1, Command::Summary).await.unwrap();
        assert!(reply.contains("- Bình đã chi tiêu tổng cộng: 120k"));
        assert!(reply.contains("- An đã chi tiêu tổng cộng: 0k"));
        assert!(reply.ends_with("An trả Bình 40k, Duy trả Bình 40k"));
    }

    #[tokio::test]
    async fn test_new_period_clears_expenses() {
        let service = service();
        service
            .record_expense(1, &entry("b", 120, "", ParticipantSpec::Everyone))
            .await
            .unwrap();

        let reply = service.start_new_period(1).await.unwrap();
        assert!(reply.starts_with("✅ Đã bắt đầu kỳ mới từ ngày "));
        assert!(service.store().expenses.lock().unwrap().is_empty());
        assert_eq!(service.store().alias_count(1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_setmap_does_not_install_defaults() {
        let service = service();
        let pairs = vec![AliasPair {
            initial: "k".into(),
            fullname: "Khoa".into(),
        }];

        let reply = service.handle(1, Command::SetMap(pairs)).await.unwrap();
        assert_eq!(reply, "✅ Đã cập nhật map: k→Khoa");
        assert_eq!(service.store().alias_count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_start_replies_with_help() {
        let service = service();
        let reply = service.handle(1, Command::Start).await.unwrap();
        assert_eq!(reply, presentation::HELP_TEXT);
    }
}
