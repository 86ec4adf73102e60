pub mod balance_aggregator;
pub mod ledger_service;
pub mod settlement_solver;

pub use balance_aggregator::compute_balances;
pub use ledger_service::LedgerService;
pub use settlement_solver::{settle, SETTLEMENT_THRESHOLD};
