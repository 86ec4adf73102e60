pub mod parser;

pub use parser::{parse_entry, parse_message, parse_setmap, ParseError, MAX_AMOUNT, SETMAP_USAGE};

/// A chat message the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`.
    Start,
    /// `/setmap b=Bình;a=An`.
    SetMap(Vec<AliasPair>),
    /// `/tongket`: summary of the current period.
    Summary,
    /// `/batdau`: wipe expenses and start a new period.
    NewPeriod,
    /// A plain expense line.
    Entry(ExpenseEntry),
}

/// An expense line before initials are resolved to fullnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseEntry {
    /// Lowercase payer initial.
    pub initial: String,
    pub amount: i64,
    pub note: String,
    pub participants: ParticipantSpec,
}

/// Participant selection as typed in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantSpec {
    Everyone,
    /// Lowercase initials, de-duplicated, in typed order.
    Initials(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPair {
    pub initial: String,
    pub fullname: String,
}
