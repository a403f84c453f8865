use rust_decimal::{Decimal, RoundingStrategy};

use crate::adjust::AdjustmentRecord;
use crate::amount::to_money;
use crate::error::IntegrityViolation;
use crate::filter::{FilteredBank, FilteredLedger};
use crate::matcher::MatchOutcome;
use crate::model::{EntryStatus, ReconSummary, Side};

/// Compute counts and totals, then prove they are internally consistent.
pub fn aggregate(
    ledger: &FilteredLedger<'_>,
    bank: &FilteredBank<'_>,
    outcome: &MatchOutcome<'_>,
    adjustments: &[AdjustmentRecord],
) -> Result<ReconSummary, IntegrityViolation> {
    let summary = summarize(ledger, bank, outcome, adjustments);
    verify(&summary, ledger, bank, outcome)?;
    Ok(summary)
}

fn summarize(
    ledger: &FilteredLedger<'_>,
    bank: &FilteredBank<'_>,
    outcome: &MatchOutcome<'_>,
    adjustments: &[AdjustmentRecord],
) -> ReconSummary {
    let count = |status: EntryStatus| outcome.matches.iter().filter(|m| m.status == status).count();
    let matched = count(EntryStatus::Matched);

    let total_entered: Decimal = outcome.matches.iter().filter_map(|m| m.ledger_amount()).sum();
    let total_adjustment: Decimal = adjustments.iter().map(|a| a.amount).sum();
    let total_after_adjustment = total_entered + total_adjustment;
    let total_bank: Decimal = outcome
        .matches
        .iter()
        .filter_map(|m| m.claimed)
        .filter_map(|pos| bank.entries[pos].entry.amount.value())
        .sum();
    let total_statement: Decimal = bank.entries.iter().filter_map(|b| b.entry.amount.value()).sum();
    let total_unmatched: Decimal = outcome
        .matches
        .iter()
        .filter(|m| m.status == EntryStatus::Unmatched)
        .filter_map(|m| m.ledger_amount())
        .sum();
    let total_unregistered: Decimal = outcome
        .unregistered
        .iter()
        .filter_map(|pos| bank.entries[*pos].entry.amount.value())
        .sum();
    let difference = total_after_adjustment - total_bank;

    let duplicates = |side: Side| outcome.duplicates.iter().filter(|d| d.side == side).count();

    ReconSummary {
        ledger_rows: ledger.rows,
        valid_entries: ledger.entries.len(),
        discarded_no_key: ledger.discarded,
        matched,
        amount_mismatches: count(EntryStatus::AmountMismatch),
        unmatched: count(EntryStatus::Unmatched),
        invalid_amounts: count(EntryStatus::InvalidAmount),
        bank_rows: bank.rows,
        bank_entries: bank.entries.len(),
        bank_discarded_no_key: bank.discarded,
        bank_invalid_amounts: bank.invalid.len(),
        unregistered: outcome.unregistered.len(),
        duplicate_ledger_keys: duplicates(Side::Ledger),
        duplicate_bank_keys: duplicates(Side::Bank),
        total_entered: to_money(total_entered),
        total_adjustment: to_money(total_adjustment),
        total_after_adjustment: to_money(total_after_adjustment),
        total_bank: to_money(total_bank),
        difference: to_money(difference),
        total_statement: to_money(total_statement),
        total_unmatched: to_money(total_unmatched),
        total_unregistered: to_money(total_unregistered),
        match_rate: match_rate(matched, ledger.entries.len()),
        is_balanced: difference.is_zero(),
    }
}

fn match_rate(matched: usize, valid: usize) -> Decimal {
    let mut rate = if valid == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(matched) * Decimal::ONE_HUNDRED / Decimal::from(valid))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    };
    rate.rescale(1);
    rate
}

/// Partition, claim and balance checks. A failure here is an engine bug.
fn verify(
    s: &ReconSummary,
    ledger: &FilteredLedger<'_>,
    bank: &FilteredBank<'_>,
    outcome: &MatchOutcome<'_>,
) -> Result<(), IntegrityViolation> {
    if s.matched + s.amount_mismatches + s.unmatched + s.invalid_amounts != s.valid_entries
        || outcome.matches.len() != ledger.entries.len()
    {
        return Err(IntegrityViolation::LedgerPartition {
            valid: s.valid_entries,
            matched: s.matched,
            mismatched: s.amount_mismatches,
            unmatched: s.unmatched,
            invalid: s.invalid_amounts,
        });
    }
    if s.valid_entries + s.discarded_no_key != s.ledger_rows {
        return Err(IntegrityViolation::LedgerRowCount {
            rows: s.ledger_rows,
            valid: s.valid_entries,
            discarded: s.discarded_no_key,
        });
    }

    let mut seen = vec![false; bank.entries.len()];
    for pos in outcome.matches.iter().filter_map(|m| m.claimed) {
        if std::mem::replace(&mut seen[pos], true) {
            return Err(IntegrityViolation::DoubleClaim {
                bank_row: bank.entries[pos].entry.row,
            });
        }
    }
    for pos in &outcome.unregistered {
        if seen[*pos] {
            return Err(IntegrityViolation::DoubleClaim {
                bank_row: bank.entries[*pos].entry.row,
            });
        }
    }

    let claimed = seen.iter().filter(|c| **c).count();
    if claimed + s.unregistered != s.bank_entries {
        return Err(IntegrityViolation::BankPartition {
            entries: s.bank_entries,
            claimed,
            unregistered: s.unregistered,
        });
    }
    if s.bank_entries + s.bank_discarded_no_key + s.bank_invalid_amounts != s.bank_rows {
        return Err(IntegrityViolation::BankRowCount {
            rows: s.bank_rows,
            entries: s.bank_entries,
            discarded: s.bank_discarded_no_key,
            invalid: s.bank_invalid_amounts,
        });
    }

    // difference = unmatched ledger total
    //            + drift accepted inside tolerance (ledger − bank over Matched)
    //            − bank amounts claimed by entries whose own amount is unknown
    let drift: Decimal = outcome
        .matches
        .iter()
        .filter(|m| m.status == EntryStatus::Matched)
        .filter_map(|m| m.difference)
        .map(|d| -d)
        .sum();
    let uncaptured: Decimal = outcome
        .matches
        .iter()
        .filter(|m| m.status == EntryStatus::InvalidAmount)
        .filter_map(|m| m.bank_amount)
        .sum();
    let expected = to_money(s.total_unmatched + drift - uncaptured);
    if s.difference != expected {
        return Err(IntegrityViolation::Balance {
            difference: s.difference,
            expected,
        });
    }

    Ok(())
}
