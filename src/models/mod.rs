pub mod balance_sheet;
pub mod expense;
pub mod name_alias;

pub use balance_sheet::{BalanceSheet, Transfer};
pub use expense::{ExpenseRecord, ExpenseRow, NewExpense, Participants, PARTICIPANT_SEPARATOR};
pub use name_alias::NameAlias;
