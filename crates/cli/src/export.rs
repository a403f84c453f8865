//! Tabular renderings of a report: shared table model, text dashboard, CSV.

use std::path::{Path, PathBuf};

use bankrec_recon::model::{ReconReport, ReconSummary, ReportRow};
use rust_decimal::Decimal;

/// Fixed leading columns of every transaction view.
pub const BASE_HEADERS: [&str; 8] = [
    "Status",
    "Side",
    "Row",
    "Key",
    "Amount",
    "Bank Amount",
    "Difference",
    "Remarks",
];

/// Position of the Amount column within `BASE_HEADERS`.
pub const AMOUNT_COL: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Money(Decimal),
    Count(usize),
    Empty,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Money(d) => write!(f, "{d}"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// One named slice of the report, as exported to a sheet or file.
pub struct View<'a> {
    pub title: &'static str,
    pub file_stem: &'static str,
    pub rows: &'a [ReportRow],
}

pub fn views(report: &ReconReport) -> Vec<View<'_>> {
    vec![
        View { title: "All Entries", file_stem: "all_entries", rows: &report.all_entries },
        View { title: "Matched", file_stem: "matched", rows: &report.matched },
        View { title: "Adjusted", file_stem: "adjusted", rows: &report.adjusted },
        View { title: "Unmatched", file_stem: "unmatched", rows: &report.unmatched },
        View { title: "Unregistered", file_stem: "unregistered", rows: &report.unregistered },
        View { title: "Invalid Amounts", file_stem: "invalid_amounts", rows: &report.invalid_amounts },
        View { title: "Bank Statement", file_stem: "bank_statement", rows: &report.bank_statement },
    ]
}

/// Base columns followed by every passthrough field seen in `rows`, in
/// first-seen order. Rows lacking a field get an empty cell.
pub fn view_table(rows: &[ReportRow]) -> Table {
    let mut extra: Vec<&str> = Vec::new();
    for row in rows {
        for name in row.fields.names() {
            if !extra.contains(&name) {
                extra.push(name);
            }
        }
    }

    let mut headers: Vec<String> = BASE_HEADERS.iter().map(|h| h.to_string()).collect();
    headers.extend(extra.iter().map(|h| h.to_string()));

    let money = |d: Option<Decimal>| d.map(Cell::Money).unwrap_or(Cell::Empty);
    let body = rows
        .iter()
        .map(|r| {
            let amount = match (&r.amount, &r.raw_amount) {
                (Some(d), _) => Cell::Money(*d),
                (None, Some(raw)) => Cell::Text(raw.clone()),
                (None, None) => Cell::Empty,
            };
            let mut cells = vec![
                Cell::Text(r.label.to_string()),
                Cell::Text(r.side.to_string()),
                Cell::Count(r.row),
                Cell::Text(r.key.clone()),
                amount,
                money(r.bank_amount),
                money(r.difference),
                r.remarks.clone().map(Cell::Text).unwrap_or(Cell::Empty),
            ];
            cells.extend(extra.iter().map(|name| {
                r.fields
                    .get(name)
                    .map(|v| Cell::Text(v.to_string()))
                    .unwrap_or(Cell::Empty)
            }));
            cells
        })
        .collect();

    Table { headers, rows: body }
}

/// Label/value pairs shown in the dashboard, the summary CSV and the Summary sheet.
pub fn summary_rows(s: &ReconSummary, currency: &str) -> Vec<(&'static str, Cell)> {
    let money = |d: Decimal| Cell::Text(format!("{currency} {}", group_thousands(d)));
    vec![
        ("Total Entries", Cell::Count(s.valid_entries)),
        ("Skipped (no identifier)", Cell::Count(s.discarded_no_key)),
        ("Matched", Cell::Count(s.matched)),
        ("Amount Mismatches", Cell::Count(s.amount_mismatches)),
        ("Not Found in Bank", Cell::Count(s.unmatched)),
        ("Invalid Amounts", Cell::Count(s.invalid_amounts)),
        ("Not in Data Entry", Cell::Count(s.unregistered)),
        ("Bank Transactions", Cell::Count(s.bank_entries)),
        ("Bank Invalid Amounts", Cell::Count(s.bank_invalid_amounts)),
        ("Duplicate Ledger Keys", Cell::Count(s.duplicate_ledger_keys)),
        ("Duplicate Bank Keys", Cell::Count(s.duplicate_bank_keys)),
        ("Total Entered", money(s.total_entered)),
        ("Total Adjustment", money(s.total_adjustment)),
        ("Total After Adjustment", money(s.total_after_adjustment)),
        ("Total Bank (matched)", money(s.total_bank)),
        ("Difference", money(s.difference)),
        ("Total Statement", money(s.total_statement)),
        ("Total Not Found in Bank", money(s.total_unmatched)),
        ("Total Not in Data Entry", money(s.total_unregistered)),
        ("Match Rate", Cell::Text(format!("{}%", s.match_rate))),
        ("Balanced", Cell::Text(if s.is_balanced { "yes" } else { "no" }.into())),
    ]
}

/// `12850.00` → `12,850.00`; the fraction is left as formatted.
pub fn group_thousands(value: Decimal) -> String {
    let text = value.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Human dashboard for stderr.
pub fn render_summary(report: &ReconReport) -> String {
    let rows = summary_rows(&report.summary, &report.meta.currency);
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    let mut out = format!("reconciliation: {}\n", report.meta.config_name);
    for (label, value) in &rows {
        out.push_str(&format!("  {label:<width$}  {value}\n"));
    }
    if !report.issues.is_empty() {
        out.push_str(&format!("  {} data-quality issue(s); see report issues\n", report.issues.len()));
    }
    out
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_table(path: &Path, table: &Table) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| format!("cannot create {}: {e}", path.display()))?;
    writer
        .write_record(&table.headers)
        .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    }
    writer
        .flush()
        .map_err(|e| format!("cannot write {}: {e}", path.display()))
}

/// Write one CSV per view plus `summary.csv` into `dir`. Returns written paths.
pub fn write_csv_dir(report: &ReconReport, dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {e}", dir.display()))?;

    let mut written = Vec::new();
    for view in views(report) {
        let path = dir.join(format!("{}.csv", view.file_stem));
        write_table(&path, &view_table(view.rows))?;
        written.push(path);
    }

    let summary = Table {
        headers: vec!["Metric".into(), "Value".into()],
        rows: summary_rows(&report.summary, &report.meta.currency)
            .into_iter()
            .map(|(label, value)| vec![Cell::Text(label.into()), value])
            .collect(),
    };
    let path = dir.join("summary.csv");
    write_table(&path, &summary)?;
    written.push(path);

    Ok(written)
}
