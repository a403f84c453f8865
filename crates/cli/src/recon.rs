//! `bankrec run | validate | history`: config-driven ledger/bank reconciliation.

use std::path::{Path, PathBuf};

use bankrec_recon::{load_bank_csv, load_ledger_csv, ReconConfig, ReconError, ReconInput, ReconReport};
use tracing::info;

use crate::exit_codes::{
    EXIT_RECON_DUPLICATE, EXIT_RECON_INTEGRITY, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_OUTSTANDING,
    EXIT_RECON_RUNTIME,
};
use crate::export::{render_summary, write_csv_dir};
use crate::store::{FsReportStore, ReportStore, RunSources};
use crate::xlsx::write_workbook;
use crate::CliError;

/// Options for `bankrec run`, gathered from clap.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub config: PathBuf,
    pub ledger: Option<PathBuf>,
    pub bank: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub no_store: bool,
    pub allow_outstanding: bool,
    pub quiet: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Map engine errors onto the exit-code registry.
fn engine_err(err: ReconError) -> CliError {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
            recon_err(EXIT_RECON_INVALID_CONFIG, err.to_string())
        }
        ReconError::MissingColumn { side, .. } => recon_err(EXIT_RECON_RUNTIME, err.to_string())
            .with_hint(format!("map the column under [{side}.columns] in the config")),
        ReconError::Csv { .. } | ReconError::AmountOutOfRange { .. } => {
            recon_err(EXIT_RECON_RUNTIME, err.to_string())
        }
        ReconError::DuplicateKeys(_) => recon_err(EXIT_RECON_DUPLICATE, err.to_string()).with_hint(
            "deduplicate the inputs or set [matching] duplicates = \"claim_in_order\"",
        ),
        ReconError::Integrity(_) => recon_err(EXIT_RECON_INTEGRITY, err.to_string())
            .with_hint("this is a bug in bankrec; please report it with the input files"),
    }
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        recon_err(EXIT_RECON_RUNTIME, format!("cannot read config {}: {e}", path.display()))
    })?;
    ReconConfig::from_toml(&text).map_err(engine_err)
}

/// Flag wins; otherwise the config's path, relative to the config file.
fn resolve(flag: Option<&Path>, configured: Option<&str>, base_dir: &Path) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| configured.map(|f| base_dir.join(f)))
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read {}: {e}", path.display())))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));

    let ledger_path = resolve(args.ledger.as_deref(), config.ledger.file.as_deref(), base_dir)
        .ok_or_else(|| {
            CliError::args("no ledger file").with_hint("set [ledger] file in the config or pass --ledger")
        })?;
    let bank_path = resolve(args.bank.as_deref(), config.bank.file.as_deref(), base_dir)
        .ok_or_else(|| {
            CliError::args("no bank statement file").with_hint("set [bank] file in the config or pass --bank")
        })?;

    let input = ReconInput {
        ledger: load_ledger_csv(&read_input(&ledger_path)?, &config.ledger).map_err(engine_err)?,
        bank: load_bank_csv(&read_input(&bank_path)?, &config.bank).map_err(engine_err)?,
    };
    info!(ledger = %ledger_path.display(), bank = %bank_path.display(), "inputs loaded");

    let report = bankrec_recon::run(&config, &input).map_err(engine_err)?;

    write_outputs(&args, &config, base_dir, &report)?;

    if !args.no_store {
        let root = args.store.clone().unwrap_or_else(FsReportStore::default_root);
        let store = FsReportStore::new(root);
        let sources = RunSources {
            ledger_file: Some(ledger_path.display().to_string()),
            bank_file: Some(bank_path.display().to_string()),
        };
        let entry = store
            .save(&report, &sources, chrono::Utc::now())
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
        if !args.quiet {
            eprintln!("saved {}", store.report_path(&entry.filename).display());
        }
    }

    if !args.quiet {
        eprint!("{}", render_summary(&report));
    }

    let s = &report.summary;
    if !s.is_clean() && !args.allow_outstanding {
        return Err(recon_err(
            EXIT_RECON_OUTSTANDING,
            format!(
                "outstanding items: {} mismatched, {} not found in bank, {} not in data entry, {} invalid amounts, difference {} {}",
                s.amount_mismatches,
                s.unmatched,
                s.unregistered,
                s.invalid_amounts + s.bank_invalid_amounts,
                report.meta.currency,
                s.difference,
            ),
        ));
    }

    Ok(())
}

fn write_outputs(
    args: &RunArgs,
    config: &ReconConfig,
    base_dir: &Path,
    report: &ReconReport,
) -> Result<(), CliError> {
    let json_str = report
        .to_json_pretty()
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if args.json {
        println!("{json_str}");
    }

    if let Some(path) = resolve(args.output.as_deref(), config.output.json.as_deref(), base_dir) {
        std::fs::write(&path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        if !args.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if let Some(dir) = resolve(args.csv_dir.as_deref(), config.output.csv_dir.as_deref(), base_dir) {
        let written = write_csv_dir(report, &dir).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
        if !args.quiet {
            eprintln!("wrote {} CSV files to {}", written.len(), dir.display());
        }
    }

    if let Some(path) = resolve(args.xlsx.as_deref(), config.output.xlsx.as_deref(), base_dir) {
        write_workbook(report, &path).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
        if !args.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "{}: valid (ledger key '{}', bank key '{}', duplicates {}, tolerance {} cents)",
        config_path.display(),
        config.ledger.columns.identifier,
        config.bank.columns.identifier,
        config.matching.duplicates,
        config.tolerance.amount_cents,
    );
    Ok(())
}

pub fn cmd_history(store: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let store = FsReportStore::new(store.unwrap_or_else(FsReportStore::default_root));
    let entries = store.list().map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;

    if json {
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("no saved reports in {}", store.root().display());
        return Ok(());
    }

    for e in entries.iter().rev() {
        let s = &e.summary;
        println!(
            "{}  {:<24} matched {}/{}  unregistered {}  difference {}  {}",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.config_name,
            s.matched,
            s.valid_entries,
            s.unregistered,
            s.difference,
            e.filename,
        );
    }
    Ok(())
}
