use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which input a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Ledger,
    Bank,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ledger => write!(f, "ledger"),
            Self::Bank => write!(f, "bank"),
        }
    }
}

/// A monetary amount as loaded from a source row.
///
/// Parsing happens at the adapter boundary. A value that does not parse keeps
/// its raw text so it can be reported; it is never treated as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Valid(Decimal),
    Invalid(String),
}

impl Amount {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Valid(d) => Some(*d),
            Self::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Ordered passthrough fields (header → cell), kept verbatim for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One row of the internal ledger (data-entry export).
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// 1-based data row in the source file.
    pub row: usize,
    pub identifier: Option<String>,
    pub amount: Amount,
    pub fields: Fields,
}

/// One transaction line of the bank statement.
#[derive(Debug, Clone)]
pub struct BankEntry {
    pub row: usize,
    pub identifier: Option<String>,
    pub amount: Amount,
    pub date: Option<String>,
    pub description: Option<String>,
    pub fields: Fields,
}

/// Pre-loaded records for one run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub ledger: Vec<LedgerEntry>,
    pub bank: Vec<BankEntry>,
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Normalized join key. Equality is the only matching criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Matched,
    AmountMismatch,
    Unmatched,
    InvalidAmount,
    Adjustment,
    Unregistered,
}

impl EntryStatus {
    /// Human-readable label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::AmountMismatch => "Amount Mismatch",
            Self::Unmatched => "Not Found in Bank",
            Self::InvalidAmount => "Invalid Amount",
            Self::Adjustment => "Adjustment Entry",
            Self::Unregistered => "Not in Data Entry",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::AmountMismatch => write!(f, "amount_mismatch"),
            Self::Unmatched => write!(f, "unmatched"),
            Self::InvalidAmount => write!(f, "invalid_amount"),
            Self::Adjustment => write!(f, "adjustment"),
            Self::Unregistered => write!(f, "unregistered"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidAmount,
    DuplicateKey,
}

/// A recoverable problem with the input. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityIssue {
    pub kind: IssueKind,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One line of a report view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub status: EntryStatus,
    pub label: &'static str,
    pub side: Side,
    pub row: usize,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconSummary {
    // Ledger counts
    pub ledger_rows: usize,
    pub valid_entries: usize,
    pub discarded_no_key: usize,
    pub matched: usize,
    pub amount_mismatches: usize,
    pub unmatched: usize,
    pub invalid_amounts: usize,
    // Bank counts
    pub bank_rows: usize,
    pub bank_entries: usize,
    pub bank_discarded_no_key: usize,
    pub bank_invalid_amounts: usize,
    pub unregistered: usize,
    pub duplicate_ledger_keys: usize,
    pub duplicate_bank_keys: usize,
    // Totals
    pub total_entered: Decimal,
    pub total_adjustment: Decimal,
    pub total_after_adjustment: Decimal,
    pub total_bank: Decimal,
    pub difference: Decimal,
    pub total_statement: Decimal,
    pub total_unmatched: Decimal,
    pub total_unregistered: Decimal,
    /// Matched share of valid entries, in percent, one decimal place.
    pub match_rate: Decimal,
    pub is_balanced: bool,
}

impl ReconSummary {
    /// True when nothing needs attention: no mismatch, no missing entry on
    /// either side, no data-quality status and a zero difference.
    pub fn is_clean(&self) -> bool {
        self.amount_mismatches == 0
            && self.unmatched == 0
            && self.unregistered == 0
            && self.invalid_amounts == 0
            && self.bank_invalid_amounts == 0
            && self.is_balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub all_entries: Vec<ReportRow>,
    pub matched: Vec<ReportRow>,
    pub adjusted: Vec<ReportRow>,
    pub unmatched: Vec<ReportRow>,
    pub unregistered: Vec<ReportRow>,
    pub invalid_amounts: Vec<ReportRow>,
    /// Every keyed bank row in statement order, each with the status of the
    /// ledger entry that claimed it (or `Unregistered` / `InvalidAmount`).
    pub bank_statement: Vec<ReportRow>,
    pub issues: Vec<DataQualityIssue>,
}

impl ReconReport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
