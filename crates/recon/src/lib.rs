//! `bankrec-recon`: ledger-to-bank-statement reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded ledger and bank records, returns a
//! categorized report with a proven amount balance. The CSV adapters in
//! [`engine`] map column names into typed records; reading files is the
//! caller's job.

pub mod adjust;
pub mod aggregate;
pub mod amount;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod key;
pub mod matcher;
pub mod model;
pub mod report;

pub use config::ReconConfig;
pub use engine::{load_bank_csv, load_ledger_csv, run};
pub use error::{IntegrityViolation, ReconError};
pub use model::{ReconInput, ReconReport, ReconSummary, ReportRow};
