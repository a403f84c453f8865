//! Workbook export: one sheet per view plus a Summary sheet.

use std::path::Path;

use bankrec_recon::model::ReconReport;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::export::{summary_rows, view_table, views, Cell, Table, AMOUNT_COL};

const MONEY_FORMAT: &str = "#,##0.00";

/// Convert a 0-based column index to its spreadsheet letter (0 → A, 27 → AB).
fn column_letter(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    money: &Format,
) -> Result<(), String> {
    let res = match cell {
        Cell::Text(s) => sheet.write_string(row, col, s).map(|_| ()),
        Cell::Money(d) => match d.to_f64() {
            Some(n) => sheet.write_number_with_format(row, col, n, money).map(|_| ()),
            None => sheet.write_string(row, col, d.to_string()).map(|_| ()),
        },
        Cell::Count(n) => sheet.write_number(row, col, *n as f64).map(|_| ()),
        Cell::Empty => Ok(()),
    };
    res.map_err(|e| format!("Failed to write cell: {e}"))
}

/// Header, body, then a TOTAL row summing the Amount column. An empty view
/// gets a single message row instead of a total.
fn write_view_sheet(
    sheet: &mut Worksheet,
    title: &str,
    table: &Table,
    bold: &Format,
    money: &Format,
) -> Result<(), String> {
    for (col, header) in table.headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, header, bold)
            .map_err(|e| format!("Failed to write header: {e}"))?;
    }

    if table.rows.is_empty() {
        sheet
            .write_string(1, 0, format!("No {} entries", title.to_lowercase()))
            .map_err(|e| format!("Failed to write cell: {e}"))?;
        return Ok(());
    }

    for (r, cells) in table.rows.iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            write_cell(sheet, r as u32 + 1, c as u16, cell, money)?;
        }
    }

    let total_row = table.rows.len() as u32 + 1;
    let letter = column_letter(AMOUNT_COL);
    let formula = format!("=SUM({letter}2:{letter}{total_row})");
    sheet
        .write_string_with_format(total_row, 0, "TOTAL", bold)
        .map_err(|e| format!("Failed to write total: {e}"))?;
    sheet
        .write_formula_with_format(total_row, AMOUNT_COL as u16, formula.as_str(), money)
        .map_err(|e| format!("Failed to write total: {e}"))?;

    sheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header: {e}"))?;
    Ok(())
}

/// Export the report to an XLSX workbook at `path`.
pub fn write_workbook(report: &ReconReport, path: &Path) -> Result<(), String> {
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format(MONEY_FORMAT);
    let mut workbook = Workbook::new();

    for view in views(report) {
        let sheet = workbook
            .add_worksheet()
            .set_name(view.title)
            .map_err(|e| format!("Failed to create sheet '{}': {e}", view.title))?;
        write_view_sheet(sheet, view.title, &view_table(view.rows), &bold, &money)?;
    }

    let sheet = workbook
        .add_worksheet()
        .set_name("Summary")
        .map_err(|e| format!("Failed to create sheet 'Summary': {e}"))?;
    sheet
        .write_string_with_format(0, 0, "Metric", &bold)
        .map_err(|e| format!("Failed to write header: {e}"))?;
    sheet
        .write_string_with_format(0, 1, "Value", &bold)
        .map_err(|e| format!("Failed to write header: {e}"))?;
    let rows = summary_rows(&report.summary, &report.meta.currency);
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet
            .write_string(row, 0, *label)
            .map_err(|e| format!("Failed to write cell: {e}"))?;
        write_cell(sheet, row, 1, value, &money)?;
    }
    sheet
        .set_column_width(0, 26)
        .map_err(|e| format!("Failed to size column: {e}"))?;

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankrec_recon::engine::{load_bank_csv, load_ledger_csv};
    use bankrec_recon::{run, ReconConfig, ReconInput};

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(AMOUNT_COL), "E");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn writes_workbook_file() {
        let config = ReconConfig::named("xlsx");
        let input = ReconInput {
            ledger: load_ledger_csv("ChequeDDNo,Amount\n1,10\n2,20\n", &config.ledger).unwrap(),
            bank: load_bank_csv("journal_number,amount\n1,10\n2,25\n", &config.bank).unwrap(),
        };
        let report = run(&config, &input).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_workbook(&report, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // XLSX is a zip container
        assert_eq!(&bytes[..2], b"PK");

        // zip entry names are stored uncompressed: seven views plus Summary
        let has_entry = |name: &[u8]| bytes.windows(name.len()).any(|w| w == name);
        assert!(has_entry(b"xl/worksheets/sheet8.xml"));
        assert!(!has_entry(b"xl/worksheets/sheet9.xml"));
    }
}
