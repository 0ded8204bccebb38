//! The prediction ledger.
//!
//! Durable record of every scoring event, keyed by the caller-supplied
//! observation identifier. The ledger enforces at-most-one record per
//! identifier: repeated submissions are rejected with a distinguishable
//! duplicate error instead of being overwritten, and a ground-truth label
//! can be attached to a previously scored observation after the fact.
//!
//! The ledger exclusively owns record lifecycle; no other component
//! touches the underlying store.

mod storage;


pub use storage::{LedgerError, PredictionRecord, SqliteLedger};
