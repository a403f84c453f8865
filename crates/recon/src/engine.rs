use tracing::{info, instrument, warn};

use crate::adjust::generate_adjustments;
use crate::aggregate::aggregate;
use crate::amount::{in_range, parse_amount};
use crate::config::{BankSource, LedgerSource, ReconConfig};
use crate::error::ReconError;
use crate::filter::{filter_bank, filter_ledger};
use crate::matcher::match_entries;
use crate::model::{
    Amount, BankEntry, Fields, LedgerEntry, ReconInput, ReconMeta, ReconReport, Side,
};
use crate::report::assemble;

/// Run reconciliation per config. Returns the full report, or an error when
/// the run cannot produce a trustworthy one.
#[instrument(
    skip_all,
    fields(config = %config.name, ledger_rows = input.ledger.len(), bank_rows = input.bank.len())
)]
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconReport, ReconError> {
    config.validate()?;
    check_amount_range(input)?;

    let transform = config.matching.key_transform;
    let ledger = filter_ledger(&input.ledger, transform);
    let bank = filter_bank(&input.bank, transform);

    let outcome = match_entries(&ledger, &bank, &config.matching, &config.tolerance)?;
    let adjustments = generate_adjustments(&outcome.matches);
    let summary = aggregate(&ledger, &bank, &outcome, &adjustments)?;

    if summary.discarded_no_key > 0 {
        warn!(rows = summary.discarded_no_key, "ledger rows without identifier skipped");
    }
    if summary.invalid_amounts > 0 || summary.bank_invalid_amounts > 0 {
        warn!(
            ledger = summary.invalid_amounts,
            bank = summary.bank_invalid_amounts,
            "non-numeric amounts found"
        );
    }
    info!(
        matched = summary.matched,
        mismatched = summary.amount_mismatches,
        unmatched = summary.unmatched,
        unregistered = summary.unregistered,
        difference = %summary.difference,
        "reconciliation complete"
    );

    let meta = ReconMeta {
        config_name: config.name.clone(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        currency: config.output.currency.clone(),
    };

    Ok(assemble(meta, summary, &bank, &outcome, &adjustments))
}

/// `parse_amount` already bounds amounts; this catches `Amount::Valid`
/// values built directly by callers.
fn check_amount_range(input: &ReconInput) -> Result<(), ReconError> {
    let ledger = input.ledger.iter().map(|e| (Side::Ledger, e.row, &e.amount));
    let bank = input.bank.iter().map(|e| (Side::Bank, e.row, &e.amount));
    for (side, row, amount) in ledger.chain(bank) {
        if let Amount::Valid(value) = amount {
            if !in_range(*value) {
                return Err(ReconError::AmountOutOfRange {
                    side,
                    row,
                    amount: *value,
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV adapters
// ---------------------------------------------------------------------------

/// Parsed header row plus a positional lookup.
struct Header {
    side: Side,
    names: Vec<String>,
}

impl Header {
    fn read(side: Side, reader: &mut csv::Reader<&[u8]>) -> Result<Self, ReconError> {
        let names = reader
            .headers()
            .map_err(|e| ReconError::Csv {
                side,
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self { side, names })
    }

    fn required(&self, name: &str) -> Result<usize, ReconError> {
        self.optional(name).ok_or_else(|| ReconError::MissingColumn {
            side: self.side,
            column: name.into(),
        })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|h| h == name)
    }

    fn fields(&self, record: &csv::StringRecord) -> Fields {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, h)| record.get(i).map(|v| (h.clone(), v.to_string())))
            .collect()
    }
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
}

/// Load data-entry rows, mapping the configured identifier and amount columns.
pub fn load_ledger_csv(csv_data: &str, source: &LedgerSource) -> Result<Vec<LedgerEntry>, ReconError> {
    let mut reader = reader(csv_data);
    let header = Header::read(Side::Ledger, &mut reader)?;
    let id_idx = header.required(&source.columns.identifier)?;
    let amount_idx = header.required(&source.columns.amount)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Csv {
            side: Side::Ledger,
            message: e.to_string(),
        })?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        rows.push(LedgerEntry {
            row: i + 1,
            identifier: identifier_cell(&record, id_idx),
            amount: parse_amount(record.get(amount_idx).unwrap_or("")),
            fields: header.fields(&record),
        });
    }
    Ok(rows)
}

/// Load bank statement rows. Date and description columns are picked up
/// when present in the header.
pub fn load_bank_csv(csv_data: &str, source: &BankSource) -> Result<Vec<BankEntry>, ReconError> {
    let mut reader = reader(csv_data);
    let header = Header::read(Side::Bank, &mut reader)?;
    let id_idx = header.required(&source.columns.identifier)?;
    let amount_idx = header.required(&source.columns.amount)?;
    let date_idx = header.optional(&source.columns.date);
    let description_idx = header.optional(&source.columns.description);

    let text = |record: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Csv {
            side: Side::Bank,
            message: e.to_string(),
        })?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        rows.push(BankEntry {
            row: i + 1,
            identifier: identifier_cell(&record, id_idx),
            amount: parse_amount(record.get(amount_idx).unwrap_or("")),
            date: text(&record, date_idx),
            description: text(&record, description_idx),
            fields: header.fields(&record),
        });
    }
    Ok(rows)
}

/// Raw identifier cell. Spreadsheet exports render integer identifiers as
/// `1373134.0`; an all-zero fraction on an all-digit value is dropped.
fn identifier_cell(record: &csv::StringRecord, idx: usize) -> Option<String> {
    let raw = record.get(idx)?;
    let trimmed = raw.trim();
    if let Some((int, frac)) = trimmed.split_once('.') {
        if !int.is_empty()
            && int.chars().all(|c| c.is_ascii_digit())
            && !frac.is_empty()
            && frac.chars().all(|c| c == '0')
        {
            return Some(int.to_string());
        }
    }
    Some(raw.to_string())
}
