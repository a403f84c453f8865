use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::{DuplicatePolicy, MatchingConfig, ToleranceConfig};
use crate::error::ReconError;
use crate::filter::{FilteredBank, FilteredLedger};
use crate::model::{Amount, CanonicalKey, DuplicateKey, EntryStatus, LedgerEntry, Side};

/// Classification of one valid ledger entry.
#[derive(Debug, Clone)]
pub struct LedgerMatch<'a> {
    pub key: CanonicalKey,
    pub entry: &'a LedgerEntry,
    pub status: EntryStatus,
    /// Position in `FilteredBank::entries` of the claimed bank entry.
    pub claimed: Option<usize>,
    pub bank_amount: Option<Decimal>,
    /// `bank − ledger`, when both amounts are known.
    pub difference: Option<Decimal>,
}

impl LedgerMatch<'_> {
    pub fn ledger_amount(&self) -> Option<Decimal> {
        self.entry.amount.value()
    }
}

#[derive(Debug)]
pub struct MatchOutcome<'a> {
    /// One per valid ledger entry, in ledger input order.
    pub matches: Vec<LedgerMatch<'a>>,
    /// Positions in `FilteredBank::entries` never claimed, in bank input order.
    pub unregistered: Vec<usize>,
    pub duplicates: Vec<DuplicateKey>,
}

/// Join valid ledger entries to bank entries by canonical key.
///
/// Each bank entry is claimed at most once. Which bank entry a ledger entry
/// claims when a key repeats is decided by `DuplicatePolicy`.
pub fn match_entries<'a>(
    ledger: &FilteredLedger<'a>,
    bank: &FilteredBank<'a>,
    matching: &MatchingConfig,
    tolerance: &ToleranceConfig,
) -> Result<MatchOutcome<'a>, ReconError> {
    let duplicates = find_duplicates(ledger, bank);
    if !duplicates.is_empty() {
        if matching.duplicates == DuplicatePolicy::Reject {
            return Err(ReconError::DuplicateKeys(duplicates));
        }
        for dup in &duplicates {
            warn!(side = %dup.side, key = %dup.key, count = dup.count, policy = %matching.duplicates, "duplicate key");
        }
    }

    // key → claimable bank positions, in bank input order
    let mut candidates: HashMap<&CanonicalKey, VecDeque<usize>> = HashMap::new();
    for (pos, b) in bank.entries.iter().enumerate() {
        let queue = candidates.entry(&b.key).or_default();
        if matching.duplicates == DuplicatePolicy::FirstWins && !queue.is_empty() {
            continue;
        }
        queue.push_back(pos);
    }

    let limit = Decimal::new(tolerance.amount_cents, 2);
    let mut claimed = vec![false; bank.entries.len()];
    let mut matches = Vec::with_capacity(ledger.entries.len());

    for l in &ledger.entries {
        let candidate = candidates.get_mut(&l.key).and_then(|q| q.pop_front());

        let (status, bank_amount, difference) = match (candidate, &l.entry.amount) {
            (None, Amount::Valid(_)) => (EntryStatus::Unmatched, None, None),
            (None, Amount::Invalid(_)) => (EntryStatus::InvalidAmount, None, None),
            (Some(pos), amount) => {
                claimed[pos] = true;
                let bank_amount = bank.entries[pos].entry.amount.value();
                match (amount, bank_amount) {
                    (Amount::Valid(ledger_amount), Some(bank_amount)) => {
                        let diff = bank_amount - *ledger_amount;
                        let status = if diff.abs() <= limit {
                            EntryStatus::Matched
                        } else {
                            EntryStatus::AmountMismatch
                        };
                        (status, Some(bank_amount), Some(diff))
                    }
                    _ => (EntryStatus::InvalidAmount, bank_amount, None),
                }
            }
        };

        matches.push(LedgerMatch {
            key: l.key.clone(),
            entry: l.entry,
            status,
            claimed: candidate,
            bank_amount,
            difference,
        });
    }

    let unregistered: Vec<usize> = claimed
        .iter()
        .enumerate()
        .filter(|(_, c)| !**c)
        .map(|(pos, _)| pos)
        .collect();

    debug!(
        ledger = matches.len(),
        claimed = bank.entries.len() - unregistered.len(),
        unregistered = unregistered.len(),
        "matched entries"
    );

    Ok(MatchOutcome {
        matches,
        unregistered,
        duplicates,
    })
}

/// Keys seen more than once on either side, ledger first, each in first-seen order.
fn find_duplicates(ledger: &FilteredLedger<'_>, bank: &FilteredBank<'_>) -> Vec<DuplicateKey> {
    let mut dups = count_repeats(Side::Ledger, ledger.entries.iter().map(|e| &e.key));
    dups.extend(count_repeats(Side::Bank, bank.entries.iter().map(|e| &e.key)));
    dups
}

fn count_repeats<'k>(side: Side, keys: impl Iterator<Item = &'k CanonicalKey>) -> Vec<DuplicateKey> {
    let mut order: Vec<&CanonicalKey> = Vec::new();
    let mut counts: HashMap<&CanonicalKey, usize> = HashMap::new();
    for key in keys {
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter_map(|key| {
            let count = counts.get(key).copied().unwrap_or(0);
            (count > 1).then(|| DuplicateKey {
                side,
                key: key.to_string(),
                count,
            })
        })
        .collect()
}
