use tracing::debug;

use crate::config::KeyTransform;
use crate::key::normalize_key;
use crate::model::{BankEntry, CanonicalKey, LedgerEntry};

/// A ledger entry that survived filtering, with its join key attached.
#[derive(Debug, Clone)]
pub struct KeyedLedger<'a> {
    pub key: CanonicalKey,
    pub entry: &'a LedgerEntry,
}

/// Ledger entries with a derivable key, in input order.
///
/// `entries.len()` is the valid-entry count used by every later stage.
#[derive(Debug)]
pub struct FilteredLedger<'a> {
    pub entries: Vec<KeyedLedger<'a>>,
    pub rows: usize,
    pub discarded: usize,
}

/// A bank entry eligible for matching: keyed and with a parseable amount.
#[derive(Debug, Clone)]
pub struct KeyedBank<'a> {
    pub key: CanonicalKey,
    pub entry: &'a BankEntry,
}

#[derive(Debug)]
pub struct FilteredBank<'a> {
    pub entries: Vec<KeyedBank<'a>>,
    /// Keyed rows whose amount did not parse. Reported, never matched.
    pub invalid: Vec<KeyedBank<'a>>,
    pub rows: usize,
    pub discarded: usize,
}

pub fn filter_ledger(rows: &[LedgerEntry], transform: KeyTransform) -> FilteredLedger<'_> {
    let entries: Vec<KeyedLedger<'_>> = rows
        .iter()
        .filter_map(|entry| {
            normalize_key(entry.identifier.as_deref(), transform)
                .map(|key| KeyedLedger { key, entry })
        })
        .collect();
    let discarded = rows.len() - entries.len();
    debug!(valid = entries.len(), discarded, "filtered ledger");
    FilteredLedger {
        entries,
        rows: rows.len(),
        discarded,
    }
}

pub fn filter_bank(rows: &[BankEntry], transform: KeyTransform) -> FilteredBank<'_> {
    let mut entries = Vec::new();
    let mut invalid = Vec::new();
    let mut discarded = 0;

    for entry in rows {
        let Some(key) = normalize_key(entry.identifier.as_deref(), transform) else {
            discarded += 1;
            continue;
        };
        if entry.amount.is_valid() {
            entries.push(KeyedBank { key, entry });
        } else {
            invalid.push(KeyedBank { key, entry });
        }
    }

    debug!(
        entries = entries.len(),
        invalid = invalid.len(),
        discarded,
        "filtered bank"
    );
    FilteredBank {
        entries,
        invalid,
        rows: rows.len(),
        discarded,
    }
}
