use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Separator used when a participant subset is persisted as a single column.
pub const PARTICIPANT_SEPARATOR: char = ';';

/// Who shares the cost of a single expense.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "names", rename_all = "snake_case")]
pub enum Participants {
    /// Every member known at the time the record is folded.
    #[default]
    All,
    /// An ordered subset of resolved fullnames.
    Subset(Vec<String>),
}

impl Participants {
    pub fn is_all(&self) -> bool {
        matches!(self, Participants::All)
    }

    /// Encodes to the nullable storage column: `None` means everyone.
    pub fn to_column(&self) -> Option<String> {
        match self {
            Participants::All => None,
            Participants::Subset(names) => Some(names.join(&PARTICIPANT_SEPARATOR.to_string())),
        }
    }

    /// Decodes the nullable storage column.
    pub fn from_column(column: Option<&str>) -> Self {
        match column {
            None => Participants::All,
            Some(raw) => Participants::Subset(
                raw.split(PARTICIPANT_SEPARATOR)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

/// An immutable expense entry, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub chat_id: i64,
    pub payer: String,
    /// Amount in minor units ("k"). Negative values are corrections.
    pub amount: i64,
    pub note: String,
    pub participants: Participants,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Builds an in-memory record that shares the cost with everyone.
    pub fn shared_by_all(payer: impl Into<String>, amount: i64) -> Self {
        Self {
            id: 0,
            chat_id: 0,
            payer: payer.into(),
            amount,
            note: String::new(),
            participants: Participants::All,
            created_at: Utc::now(),
        }
    }

    /// Builds an in-memory record shared by the given names only.
    pub fn shared_by<I, S>(payer: impl Into<String>, amount: i64, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            participants: Participants::Subset(names.into_iter().map(Into::into).collect()),
            ..Self::shared_by_all(payer, amount)
        }
    }
}

/// Row shape of the `expenses` table.
#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub id: i64,
    pub chat_id: i64,
    pub payer: String,
    pub amount: i64,
    pub note: String,
    pub participants: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for ExpenseRecord {
    fn from(row: ExpenseRow) -> Self {
        Self {
            participants: Participants::from_column(row.participants.as_deref()),
            id: row.id,
            chat_id: row.chat_id,
            payer: row.payer,
            amount: row.amount,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

/// An expense that has been parsed and resolved but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub chat_id: i64,
    pub payer: String,
    pub amount: i64,
    pub note: String,
    pub participants: Participants,
}

impl NewExpense {
    pub fn new(chat_id: i64, payer: impl Into<String>, amount: i64, note: impl Into<String>) -> Self {
        Self {
            chat_id,
            payer: payer.into(),
            amount,
            note: note.into(),
            participants: Participants::All,
        }
    }

    pub fn with_participants(mut self, participants: Participants) -> Self {
        self.participants = participants;
        self
    }
}
