use serde::Deserialize;

use crate::error::ReconError;

pub const DEFAULT_LEDGER_IDENTIFIER: &str = "ChequeDDNo";
pub const DEFAULT_LEDGER_AMOUNT: &str = "Amount";
pub const DEFAULT_BANK_IDENTIFIER: &str = "journal_number";
pub const DEFAULT_BANK_AMOUNT: &str = "amount";
pub const DEFAULT_BANK_DATE: &str = "date";
pub const DEFAULT_BANK_DESCRIPTION: &str = "description";
pub const DEFAULT_CURRENCY: &str = "Nu.";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub ledger: LedgerSource,
    #[serde(default)]
    pub bank: BankSource,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources + column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerSource {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub columns: LedgerColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerColumns {
    #[serde(default = "default_ledger_identifier")]
    pub identifier: String,
    #[serde(default = "default_ledger_amount")]
    pub amount: String,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        Self {
            identifier: default_ledger_identifier(),
            amount: default_ledger_amount(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankSource {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub columns: BankColumns,
}

/// Bank statement columns. `date` and `description` are display-only and
/// may be absent from the file; `identifier` and `amount` are required.
#[derive(Debug, Clone, Deserialize)]
pub struct BankColumns {
    #[serde(default = "default_bank_identifier")]
    pub identifier: String,
    #[serde(default = "default_bank_amount")]
    pub amount: String,
    #[serde(default = "default_bank_date")]
    pub date: String,
    #[serde(default = "default_bank_description")]
    pub description: String,
}

impl Default for BankColumns {
    fn default() -> Self {
        Self {
            identifier: default_bank_identifier(),
            amount: default_bank_amount(),
            date: default_bank_date(),
            description: default_bank_description(),
        }
    }
}

fn default_ledger_identifier() -> String {
    DEFAULT_LEDGER_IDENTIFIER.into()
}

fn default_ledger_amount() -> String {
    DEFAULT_LEDGER_AMOUNT.into()
}

fn default_bank_identifier() -> String {
    DEFAULT_BANK_IDENTIFIER.into()
}

fn default_bank_amount() -> String {
    DEFAULT_BANK_AMOUNT.into()
}

fn default_bank_date() -> String {
    DEFAULT_BANK_DATE.into()
}

fn default_bank_description() -> String {
    DEFAULT_BANK_DESCRIPTION.into()
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub key_transform: KeyTransform,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

/// How a raw identifier becomes a join key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyTransform {
    /// Trim surrounding whitespace; the rest is compared verbatim.
    #[default]
    Trim,
    /// Keep ASCII digits only.
    Digits,
}

/// Tie-break when several entries share a join key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Each ledger entry claims the earliest unclaimed bank entry with its key.
    #[default]
    ClaimInOrder,
    /// Only the first bank entry per key can ever be claimed.
    FirstWins,
    /// Any duplicate key on either side fails the run.
    Reject,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClaimInOrder => write!(f, "claim_in_order"),
            Self::FirstWins => write!(f, "first_wins"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerance + Output
// ---------------------------------------------------------------------------

/// Largest absolute ledger/bank gap, in minor units, still counted as matched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default)]
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub xlsx: Option<String>,
    #[serde(default)]
    pub csv_dir: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            json: None,
            xlsx: None,
            csv_dir: None,
        }
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with every default applied, for callers that have no TOML file.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ledger: LedgerSource::default(),
            bank: BankSource::default(),
            matching: MatchingConfig::default(),
            tolerance: ToleranceConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let columns = [
            ("ledger.columns.identifier", &self.ledger.columns.identifier),
            ("ledger.columns.amount", &self.ledger.columns.amount),
            ("bank.columns.identifier", &self.bank.columns.identifier),
            ("bank.columns.amount", &self.bank.columns.amount),
            ("bank.columns.date", &self.bank.columns.date),
            ("bank.columns.description", &self.bank.columns.description),
        ];
        for (path, column) in columns {
            if column.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{path} must not be empty")));
            }
        }

        if self.bank.columns.identifier == self.bank.columns.amount {
            return Err(ReconError::ConfigValidation(
                "bank identifier and amount columns must differ".into(),
            ));
        }
        if self.ledger.columns.identifier == self.ledger.columns.amount {
            return Err(ReconError::ConfigValidation(
                "ledger identifier and amount columns must differ".into(),
            ));
        }

        if self.tolerance.amount_cents < 0 {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.amount_cents must be >= 0, got {}",
                self.tolerance.amount_cents
            )));
        }

        if self.output.currency.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "output.currency must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "March statement"

[ledger]
file = "data_entry.csv"
[ledger.columns]
identifier = "Cheque No"
amount = "Paid"

[bank]
file = "statement.csv"
[bank.columns]
identifier = "Journal"
amount = "Credit"
date = "Txn Date"
description = "Narration"

[matching]
key_transform = "digits"
duplicates = "first_wins"

[tolerance]
amount_cents = 99

[output]
currency = "BTN"
xlsx = "out.xlsx"
"#;

    #[test]
    fn parse_full() {
        let config = ReconConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "March statement");
        assert_eq!(config.ledger.file.as_deref(), Some("data_entry.csv"));
        assert_eq!(config.ledger.columns.identifier, "Cheque No");
        assert_eq!(config.bank.columns.description, "Narration");
        assert_eq!(config.matching.key_transform, KeyTransform::Digits);
        assert_eq!(config.matching.duplicates, DuplicatePolicy::FirstWins);
        assert_eq!(config.tolerance.amount_cents, 99);
        assert_eq!(config.output.currency, "BTN");
        assert_eq!(config.output.xlsx.as_deref(), Some("out.xlsx"));
        assert!(config.output.json.is_none());
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ReconConfig::from_toml(r#"name = "Defaults""#).unwrap();
        assert_eq!(config.ledger.columns.identifier, "ChequeDDNo");
        assert_eq!(config.ledger.columns.amount, "Amount");
        assert_eq!(config.bank.columns.identifier, "journal_number");
        assert_eq!(config.bank.columns.amount, "amount");
        assert_eq!(config.bank.columns.date, "date");
        assert_eq!(config.matching.key_transform, KeyTransform::Trim);
        assert_eq!(config.matching.duplicates, DuplicatePolicy::ClaimInOrder);
        assert_eq!(config.tolerance.amount_cents, 0);
        assert_eq!(config.output.currency, "Nu.");
        assert!(config.ledger.file.is_none());
    }

    #[test]
    fn partial_columns_keep_other_defaults() {
        let input = r#"
name = "Partial"
[bank.columns]
amount = "credit"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.bank.columns.amount, "credit");
        assert_eq!(config.bank.columns.identifier, "journal_number");
    }

    #[test]
    fn reject_unknown_policy() {
        let input = r#"
name = "Bad"
[matching]
duplicates = "last_wins"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_name() {
        let err = ReconConfig::from_toml(r#"name = "  ""#).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn reject_negative_tolerance() {
        let input = r#"
name = "Neg"
[tolerance]
amount_cents = -1
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("amount_cents"));
    }

    #[test]
    fn reject_blank_column() {
        let input = r#"
name = "Blank"
[ledger.columns]
identifier = ""
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("ledger.columns.identifier"));
    }

    #[test]
    fn reject_same_identifier_and_amount() {
        let input = r#"
name = "Same"
[bank.columns]
identifier = "ref"
amount = "ref"
"#;
        assert!(ReconConfig::from_toml(input).is_err());
    }

    #[test]
    fn named_passes_validation() {
        ReconConfig::named("adhoc").validate().unwrap();
    }
}
