//! Persisted ingestion state

mod ledger;

pub use ledger::{Ledger, LedgerRecord};
