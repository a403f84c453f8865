use std::collections::HashMap;

use crate::adjust::AdjustmentRecord;
use crate::filter::{FilteredBank, KeyedBank};
use crate::matcher::{LedgerMatch, MatchOutcome};
use crate::model::{
    Amount, CanonicalKey, DataQualityIssue, EntryStatus, Fields, IssueKind, ReconMeta, ReconReport,
    ReconSummary, ReportRow, Side,
};

/// Build every view of the report. Pure reshaping of already-computed data.
pub fn assemble(
    meta: ReconMeta,
    summary: ReconSummary,
    bank: &FilteredBank<'_>,
    outcome: &MatchOutcome<'_>,
    adjustments: &[AdjustmentRecord],
) -> ReconReport {
    let mut all_entries = Vec::with_capacity(outcome.matches.len() + adjustments.len());
    let mut matched = Vec::new();
    let mut adjusted = Vec::new();
    let mut unmatched = Vec::new();
    let mut invalid_amounts = Vec::new();

    // adjustments are generated in match order, so one cursor suffices
    let mut pending = adjustments.iter().peekable();

    // first bank row per key whose amount could not be read
    let mut unreadable: HashMap<&CanonicalKey, usize> = HashMap::new();
    for b in &bank.invalid {
        unreadable.entry(&b.key).or_insert(b.entry.row);
    }

    for (i, m) in outcome.matches.iter().enumerate() {
        let mut row = ledger_row(m);
        if m.status == EntryStatus::Unmatched {
            if let Some(bank_row) = unreadable.get(&m.key) {
                row.remarks = Some(format!(
                    "Bank row {bank_row} has this key but a non-numeric amount"
                ));
            }
        }
        all_entries.push(row.clone());

        match m.status {
            EntryStatus::Matched => matched.push(row),
            EntryStatus::Unmatched => unmatched.push(row),
            EntryStatus::InvalidAmount => invalid_amounts.push(row),
            EntryStatus::AmountMismatch => {
                adjusted.push(row);
                if let Some(adj) = pending.next_if(|a| a.parent == i) {
                    let adj_row = adjustment_row(m, adj);
                    all_entries.push(adj_row.clone());
                    adjusted.push(adj_row);
                }
            }
            EntryStatus::Adjustment | EntryStatus::Unregistered => {}
        }
    }

    let unregistered: Vec<ReportRow> = outcome
        .unregistered
        .iter()
        .map(|pos| bank_row(&bank.entries[*pos], EntryStatus::Unregistered))
        .collect();
    invalid_amounts.extend(
        bank.invalid
            .iter()
            .map(|b| bank_row(b, EntryStatus::InvalidAmount)),
    );

    let bank_statement = statement_rows(bank, outcome);

    ReconReport {
        meta,
        summary,
        all_entries,
        matched,
        adjusted,
        unmatched,
        unregistered,
        invalid_amounts,
        bank_statement,
        issues: collect_issues(bank, outcome),
    }
}

fn ledger_row(m: &LedgerMatch<'_>) -> ReportRow {
    let raw_amount = match &m.entry.amount {
        Amount::Invalid(raw) => Some(raw.clone()),
        Amount::Valid(_) => None,
    };
    ReportRow {
        status: m.status,
        label: m.status.label(),
        side: Side::Ledger,
        row: m.entry.row,
        key: m.key.to_string(),
        amount: m.ledger_amount(),
        raw_amount,
        bank_amount: m.bank_amount,
        difference: m.difference,
        remarks: None,
        fields: m.entry.fields.clone(),
    }
}

fn adjustment_row(parent: &LedgerMatch<'_>, adj: &AdjustmentRecord) -> ReportRow {
    ReportRow {
        status: EntryStatus::Adjustment,
        label: EntryStatus::Adjustment.label(),
        side: Side::Ledger,
        row: parent.entry.row,
        key: adj.key.to_string(),
        amount: Some(adj.amount),
        raw_amount: None,
        bank_amount: Some(adj.bank_amount),
        difference: None,
        remarks: Some(adj.remarks()),
        fields: parent.entry.fields.clone(),
    }
}

fn bank_row(b: &KeyedBank<'_>, status: EntryStatus) -> ReportRow {
    let raw_amount = match &b.entry.amount {
        Amount::Invalid(raw) => Some(raw.clone()),
        Amount::Valid(_) => None,
    };
    let amount = b.entry.amount.value();
    ReportRow {
        status,
        label: status.label(),
        side: Side::Bank,
        row: b.entry.row,
        key: b.key.to_string(),
        amount,
        raw_amount,
        bank_amount: amount,
        difference: None,
        remarks: b.entry.description.clone(),
        fields: bank_fields(b),
    }
}

/// All keyed bank rows back in input order. Claimed rows take the status of
/// the ledger entry that claimed them.
fn statement_rows(bank: &FilteredBank<'_>, outcome: &MatchOutcome<'_>) -> Vec<ReportRow> {
    let mut status = vec![EntryStatus::Unregistered; bank.entries.len()];
    for m in &outcome.matches {
        if let Some(pos) = m.claimed {
            status[pos] = m.status;
        }
    }

    let mut rows: Vec<ReportRow> = bank
        .entries
        .iter()
        .zip(status)
        .map(|(b, status)| bank_row(b, status))
        .chain(bank.invalid.iter().map(|b| bank_row(b, EntryStatus::InvalidAmount)))
        .collect();
    rows.sort_by_key(|r| r.row);
    rows
}

/// Bank rows carry the statement's own columns; date and description are
/// promoted to the front so exports show them first.
fn bank_fields(b: &KeyedBank<'_>) -> Fields {
    let mut fields = Fields::new();
    if let Some(date) = &b.entry.date {
        fields.push("date", date.clone());
    }
    if let Some(description) = &b.entry.description {
        fields.push("description", description.clone());
    }
    for (name, value) in b.entry.fields.iter() {
        if fields.get(name).is_none() {
            fields.push(name, value);
        }
    }
    fields
}

fn collect_issues(bank: &FilteredBank<'_>, outcome: &MatchOutcome<'_>) -> Vec<DataQualityIssue> {
    let mut issues = Vec::new();

    for m in &outcome.matches {
        if let Amount::Invalid(raw) = &m.entry.amount {
            issues.push(DataQualityIssue {
                kind: IssueKind::InvalidAmount,
                side: Side::Ledger,
                row: Some(m.entry.row),
                key: Some(m.key.to_string()),
                detail: format!("non-numeric amount '{raw}'"),
            });
        }
    }

    for b in &bank.invalid {
        if let Amount::Invalid(raw) = &b.entry.amount {
            issues.push(DataQualityIssue {
                kind: IssueKind::InvalidAmount,
                side: Side::Bank,
                row: Some(b.entry.row),
                key: Some(b.key.to_string()),
                detail: format!("non-numeric amount '{raw}'; excluded from matching"),
            });
        }
    }

    for dup in &outcome.duplicates {
        issues.push(DataQualityIssue {
            kind: IssueKind::DuplicateKey,
            side: dup.side,
            row: None,
            key: Some(dup.key.clone()),
            detail: format!("key appears {} times", dup.count),
        });
    }

    issues
}

