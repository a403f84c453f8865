use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::Amount;

/// Currency markers that statements and data-entry sheets put in amount cells.
const CURRENCY_MARKERS: [&str; 3] = ["Nu.", "BTN", "$"];

/// Largest magnitude accepted as a money amount (one quadrillion). Summing
/// any in-memory number of amounts within this bound stays inside `Decimal`.
const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000_000;

/// True when `value` is small enough to take part in totals.
pub fn in_range(value: Decimal) -> bool {
    value.abs() <= Decimal::from(MAX_AMOUNT_UNITS)
}

/// Round to two fraction digits (half away from zero) and fix the scale at 2,
/// so `300` and `300.004` both become `300.00`.
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Parse a financial amount cell:
/// - strip currency markers, thousands separators, whitespace
/// - `(123.45)` → `-123.45`
/// - plain and scientific notation (`1.2E+4`, as spreadsheets export)
///
/// Anything else, including values beyond one quadrillion, is
/// `Amount::Invalid` carrying the raw text.
pub fn parse_amount(raw: &str) -> Amount {
    match parse_decimal(raw) {
        Some(value) if in_range(value) => Amount::Valid(to_money(value)),
        _ => Amount::Invalid(raw.to_string()),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let mut text = raw.trim().to_string();
    for marker in CURRENCY_MARKERS {
        text = text.replace(marker, "");
    }
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (is_negative, inner) = if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        (true, &text[1..text.len() - 1])
    } else {
        (false, text)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' | 'e' | 'E' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            '-' | '+' if i > 0 && matches!(cleaned.as_bytes()[i - 1], b'e' | b'E') => {}
            _ => return None,
        }
    }

    let value = if cleaned.contains(['e', 'E']) {
        Decimal::from_scientific(&cleaned).ok()?
    } else {
        Decimal::from_str(&cleaned).ok()?
    };
    Some(if is_negative { -value } else { value })
}
