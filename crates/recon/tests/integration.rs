use std::path::PathBuf;

use bankrec_recon::config::{DuplicatePolicy, ReconConfig};
use bankrec_recon::engine::{load_bank_csv, load_ledger_csv, run};
use bankrec_recon::model::{EntryStatus, IssueKind, ReconInput, ReconReport, Side};
use bankrec_recon::ReconError;
use rust_decimal_macros::dec;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn load_input(config: &ReconConfig) -> ReconInput {
    let ledger_file = config.ledger.file.as_deref().expect("fixture config names a ledger file");
    let bank_file = config.bank.file.as_deref().expect("fixture config names a bank file");
    ReconInput {
        ledger: load_ledger_csv(&read_fixture(ledger_file), &config.ledger).unwrap(),
        bank: load_bank_csv(&read_fixture(bank_file), &config.bank).unwrap(),
    }
}

fn load_and_run(config_toml: &str) -> Result<ReconReport, ReconError> {
    let config = ReconConfig::from_toml(config_toml).unwrap();
    run(&config, &load_input(&config))
}

fn dup_config(policy: &str) -> String {
    format!(
        r#"
name = "Duplicates"
[ledger]
file = "dup_entry.csv"
[bank]
file = "dup_statement.csv"
[matching]
duplicates = "{policy}"
"#
    )
}

// -------------------------------------------------------------------------
// Scenario file: matched, mismatched, unmatched, unregistered
// -------------------------------------------------------------------------

#[test]
fn scenarios_summary() {
    let report = load_and_run(&read_fixture("scenarios.recon.toml")).unwrap();
    let s = &report.summary;

    assert_eq!(report.meta.config_name, "March statement");
    assert_eq!(s.ledger_rows, 4);
    assert_eq!(s.discarded_no_key, 1);
    assert_eq!(s.valid_entries, 3);
    assert_eq!(s.matched, 1);
    assert_eq!(s.amount_mismatches, 1);
    assert_eq!(s.unmatched, 1);
    assert_eq!(s.unregistered, 1);
    assert_eq!(s.total_entered, dec!(9800.00));
    assert_eq!(s.total_adjustment, dec!(3050.00));
    assert_eq!(s.total_after_adjustment, dec!(12850.00));
    assert_eq!(s.total_bank, dec!(12350.00));
    assert_eq!(s.difference, dec!(500.00));
    assert!(!s.is_clean());
}

#[test]
fn matched_entry_has_no_adjustment() {
    let report = load_and_run(&read_fixture("scenarios.recon.toml")).unwrap();
    assert_eq!(report.matched.len(), 1);
    let row = &report.matched[0];
    assert_eq!(row.key, "100");
    assert_eq!(row.amount, Some(dec!(300.00)));
    assert_eq!(row.difference, Some(dec!(0.00)));
    assert!(report
        .all_entries
        .iter()
        .filter(|r| r.status == EntryStatus::Adjustment)
        .all(|r| r.key != "100"));
}

#[test]
fn mismatch_is_followed_by_its_adjustment() {
    let report = load_and_run(&read_fixture("scenarios.recon.toml")).unwrap();

    let pos = report
        .all_entries
        .iter()
        .position(|r| r.status == EntryStatus::AmountMismatch)
        .unwrap();
    let parent = &report.all_entries[pos];
    let adj = &report.all_entries[pos + 1];
    assert_eq!(parent.key, "200");
    assert_eq!(adj.status, EntryStatus::Adjustment);
    assert_eq!(adj.key, "200");
    assert_eq!(adj.amount, Some(dec!(3050.00)));
    assert_eq!(adj.fields.get("CustomerName"), Some("Pema Wangmo"));
    assert_eq!(
        adj.remarks.as_deref(),
        Some("Adjustment for Journal 200: Bank=12050.00, Entry=9000.00, Diff=3050.00")
    );

    assert_eq!(report.adjusted.len(), 2);
    assert_eq!(report.adjusted[0].status, EntryStatus::AmountMismatch);
    assert_eq!(report.adjusted[1].status, EntryStatus::Adjustment);
}

#[test]
fn unmatched_and_unregistered_views() {
    let report = load_and_run(&read_fixture("scenarios.recon.toml")).unwrap();

    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].key, "300");
    assert_eq!(report.unmatched[0].label, "Not Found in Bank");
    assert_eq!(report.unmatched[0].bank_amount, None);

    assert_eq!(report.unregistered.len(), 1);
    let u = &report.unregistered[0];
    assert_eq!(u.side, Side::Bank);
    assert_eq!(u.key, "400");
    assert_eq!(u.amount, Some(dec!(750.00)));
    assert_eq!(u.fields.get("date"), Some("05/03/2024"));
    assert_eq!(u.remarks.as_deref(), Some("NEFT CREDIT"));
}

#[test]
fn bank_statement_lists_every_keyed_bank_row() {
    let report = load_and_run(&read_fixture("scenarios.recon.toml")).unwrap();

    let keys: Vec<&str> = report.bank_statement.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["100", "200", "400"]);
    let statuses: Vec<EntryStatus> = report.bank_statement.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![EntryStatus::Matched, EntryStatus::AmountMismatch, EntryStatus::Unregistered]
    );
    assert!(report.bank_statement.iter().all(|r| r.side == Side::Bank));
    assert_eq!(report.bank_statement[1].fields.get("description"), Some("CHQ DEP 200"));

    let total: rust_decimal::Decimal = report.bank_statement.iter().filter_map(|r| r.amount).sum();
    assert_eq!(total, report.summary.total_statement);
    assert_eq!(total, dec!(13100.00));
}

#[test]
fn bank_statement_keeps_invalid_rows_in_place() {
    let report = load_and_run(&dup_config("claim_in_order")).unwrap();
    let rows: Vec<(usize, EntryStatus)> =
        report.bank_statement.iter().map(|r| (r.row, r.status)).collect();
    assert_eq!(
        rows,
        vec![
            (1, EntryStatus::Matched),
            (2, EntryStatus::Matched),
            (3, EntryStatus::Unregistered),
            (4, EntryStatus::InvalidAmount),
            (5, EntryStatus::InvalidAmount),
        ]
    );
    assert_eq!(report.bank_statement[4].raw_amount.as_deref(), Some("oops"));
}

#[test]
fn unmatched_entry_points_at_unreadable_bank_row() {
    let config = ReconConfig::named("unreadable");
    let input = ReconInput {
        ledger: load_ledger_csv("ChequeDDNo,Amount\nJ9,10\nJ8,20\n", &config.ledger).unwrap(),
        bank: load_bank_csv("journal_number,amount\nJ9,ten\n", &config.bank).unwrap(),
    };
    let report = run(&config, &input).unwrap();

    assert_eq!(report.unmatched.len(), 2);
    assert_eq!(
        report.unmatched[0].remarks.as_deref(),
        Some("Bank row 1 has this key but a non-numeric amount")
    );
    assert_eq!(report.unmatched[1].remarks, None);
    assert_eq!(report.all_entries[0].remarks, report.unmatched[0].remarks);
}

#[test]
fn discarded_rows_never_appear() {
    let report = load_and_run(&read_fixture("scenarios.recon.toml")).unwrap();
    assert!(report
        .all_entries
        .iter()
        .all(|r| r.fields.get("CustomerName") != Some("Walk-in customer")));
    assert_eq!(report.all_entries.len(), 4);
}

#[test]
fn json_report_is_stable_across_runs() {
    let toml = read_fixture("scenarios.recon.toml");
    let a = load_and_run(&toml).unwrap().to_json_pretty().unwrap();
    let b = load_and_run(&toml).unwrap().to_json_pretty().unwrap();
    assert_eq!(a, b);

    let value: serde_json::Value = serde_json::from_str(&a).unwrap();
    assert_eq!(value["summary"]["difference"], "500.00");
    assert_eq!(value["all_entries"][0]["fields"]["CustomerName"], "Tashi Dorji");
    assert_eq!(value["all_entries"][0]["status"], "matched");
}

#[test]
fn tolerance_absorbs_small_gap() {
    let toml = format!("{}\n[tolerance]\namount_cents = 305000\n", read_fixture("scenarios.recon.toml"));
    let report = load_and_run(&toml).unwrap();
    assert_eq!(report.summary.matched, 2);
    assert_eq!(report.summary.amount_mismatches, 0);
    assert!(report.adjusted.is_empty());
    assert_eq!(report.summary.total_adjustment, dec!(0.00));
}

// -------------------------------------------------------------------------
// Duplicate keys + invalid amounts
// -------------------------------------------------------------------------

#[test]
fn claim_in_order_pairs_duplicates() {
    let report = load_and_run(&dup_config("claim_in_order")).unwrap();
    let s = &report.summary;

    assert_eq!(s.matched, 2);
    assert_eq!(s.invalid_amounts, 1);
    assert_eq!(s.unregistered, 1);
    assert_eq!(s.bank_rows, 5);
    assert_eq!(s.bank_entries, 4);
    assert_eq!(s.bank_invalid_amounts, 1);
    assert_eq!(s.duplicate_ledger_keys, 1);
    assert_eq!(s.duplicate_bank_keys, 1);
    assert_eq!(s.total_entered, dec!(300.00));
    assert_eq!(s.total_bank, dec!(340.00));
    assert_eq!(s.difference, dec!(-40.00));
    assert_eq!(report.unregistered[0].amount, Some(dec!(300.00)));
}

#[test]
fn first_wins_strands_later_entries() {
    let report = load_and_run(&dup_config("first_wins")).unwrap();
    let s = &report.summary;

    assert_eq!(s.matched, 1);
    assert_eq!(s.unmatched, 1);
    assert_eq!(s.invalid_amounts, 1);
    assert_eq!(s.unregistered, 2);
    assert_eq!(report.unmatched[0].fields.get("CustomerName"), Some("Second"));
    assert_eq!(s.difference, dec!(160.00));
}

#[test]
fn reject_fails_the_run() {
    let err = load_and_run(&dup_config("reject")).unwrap_err();
    match err {
        ReconError::DuplicateKeys(dups) => {
            assert_eq!(dups.len(), 2);
            assert_eq!(dups[0].side, Side::Ledger);
            assert_eq!(dups[1].count, 3);
        }
        other => panic!("expected DuplicateKeys, got {other:?}"),
    }
}

#[test]
fn invalid_amounts_are_reported_not_zeroed() {
    let report = load_and_run(&dup_config("claim_in_order")).unwrap();

    assert_eq!(report.invalid_amounts.len(), 2);
    let ledger_invalid = &report.invalid_amounts[0];
    assert_eq!(ledger_invalid.side, Side::Ledger);
    assert_eq!(ledger_invalid.amount, None);
    assert_eq!(ledger_invalid.raw_amount.as_deref(), Some("n/a"));
    assert_eq!(ledger_invalid.bank_amount, Some(dec!(40.00)));
    let bank_invalid = &report.invalid_amounts[1];
    assert_eq!(bank_invalid.side, Side::Bank);
    assert_eq!(bank_invalid.key, "J3");

    let kinds: Vec<IssueKind> = report.issues.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            IssueKind::InvalidAmount,
            IssueKind::InvalidAmount,
            IssueKind::DuplicateKey,
            IssueKind::DuplicateKey,
        ]
    );
}

#[test]
fn policy_is_read_from_config() {
    let config = ReconConfig::from_toml(&dup_config("first_wins")).unwrap();
    assert_eq!(config.matching.duplicates, DuplicatePolicy::FirstWins);
}

// -------------------------------------------------------------------------
// Edge inputs
// -------------------------------------------------------------------------

#[test]
fn no_valid_keys_yields_empty_report() {
    let config = ReconConfig::named("empty");
    let input = ReconInput {
        ledger: load_ledger_csv("ChequeDDNo,Amount\n,10\n  ,20\n", &config.ledger).unwrap(),
        bank: load_bank_csv("journal_number,amount\n", &config.bank).unwrap(),
    };
    let report = run(&config, &input).unwrap();
    assert_eq!(report.summary.valid_entries, 0);
    assert_eq!(report.summary.discarded_no_key, 2);
    assert!(report.all_entries.is_empty());
    assert_eq!(report.summary.total_entered, dec!(0.00));
    assert!(report.summary.is_balanced);
}

#[test]
fn digits_transform_joins_decorated_identifiers() {
    let mut config = ReconConfig::from_toml(
        r#"
name = "Digits"
[matching]
key_transform = "digits"
"#,
    )
    .unwrap();
    config.output.currency = "BTN".into();
    let input = ReconInput {
        ledger: load_ledger_csv("ChequeDDNo,Amount\nCHQ-0042,10\n", &config.ledger).unwrap(),
        bank: load_bank_csv("journal_number,amount\nJ 0042,10\n", &config.bank).unwrap(),
    };
    let report = run(&config, &input).unwrap();
    assert_eq!(report.summary.matched, 1);
    assert_eq!(report.matched[0].key, "0042");
    assert_eq!(report.meta.currency, "BTN");
}
