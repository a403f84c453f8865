use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{DuplicateKey, Side};

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty name, blank column, negative tolerance).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in input data.
    #[error("{side}: missing column '{column}'")]
    MissingColumn { side: Side, column: String },
    /// Malformed CSV (ragged row, bad quoting, unreadable header).
    #[error("{side}: CSV error: {message}")]
    Csv { side: Side, message: String },
    /// A hand-built record carries an amount too large to total safely.
    #[error("{side} row {row}: amount {amount} is out of range")]
    AmountOutOfRange { side: Side, row: usize, amount: Decimal },
    /// Duplicate join keys under `duplicates = "reject"`.
    #[error("duplicate keys: {}", describe_duplicates(.0))]
    DuplicateKeys(Vec<DuplicateKey>),
    /// The computed result broke one of the engine's own accounting rules.
    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),
}

/// An internal consistency failure. Never produced by bad input data;
/// seeing one means the engine has a bug, so the run is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error(
        "ledger statuses do not partition valid entries: \
         {matched} matched + {mismatched} mismatched + {unmatched} unmatched + {invalid} invalid != {valid}"
    )]
    LedgerPartition {
        valid: usize,
        matched: usize,
        mismatched: usize,
        unmatched: usize,
        invalid: usize,
    },
    #[error("ledger rows {rows} != {valid} valid + {discarded} discarded")]
    LedgerRowCount {
        rows: usize,
        valid: usize,
        discarded: usize,
    },
    #[error("bank entries {entries} != {claimed} claimed + {unregistered} unregistered")]
    BankPartition {
        entries: usize,
        claimed: usize,
        unregistered: usize,
    },
    #[error("bank rows {rows} != {entries} entries + {discarded} discarded + {invalid} invalid")]
    BankRowCount {
        rows: usize,
        entries: usize,
        discarded: usize,
        invalid: usize,
    },
    #[error("bank row {bank_row} claimed by more than one ledger entry")]
    DoubleClaim { bank_row: usize },
    #[error("balance identity failed: difference {difference} != expected {expected}")]
    Balance { difference: Decimal, expected: Decimal },
}

fn describe_duplicates(dups: &[DuplicateKey]) -> String {
    let shown: Vec<String> = dups
        .iter()
        .take(5)
        .map(|d| format!("{} '{}' x{}", d.side, d.key, d.count))
        .collect();
    let more = dups.len().saturating_sub(shown.len());
    if more > 0 {
        format!("{} (and {more} more)", shown.join(", "))
    } else {
        shown.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_truncates() {
        let dups: Vec<DuplicateKey> = (0..7)
            .map(|i| DuplicateKey {
                side: Side::Bank,
                key: format!("J{i}"),
                count: 2,
            })
            .collect();
        let msg = ReconError::DuplicateKeys(dups).to_string();
        assert!(msg.starts_with("duplicate keys: bank 'J0' x2"));
        assert!(msg.ends_with("(and 2 more)"));
    }

    #[test]
    fn missing_column_names_side() {
        let err = ReconError::MissingColumn {
            side: Side::Ledger,
            column: "ChequeDDNo".into(),
        };
        assert_eq!(err.to_string(), "ledger: missing column 'ChequeDDNo'");
    }
}
