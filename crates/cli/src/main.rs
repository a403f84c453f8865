// bankrec CLI - reconcile a data-entry ledger against a bank statement

mod exit_codes;
mod export;
mod recon;
mod store;
mod xlsx;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "bankrec")]
#[command(about = "Reconcile a payment ledger against a bank statement")]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by BANKREC_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  bankrec run march.recon.toml
  bankrec run march.recon.toml --ledger entries.csv --bank statement.csv
  bankrec run march.recon.toml --json --no-store
  bankrec run march.recon.toml --xlsx march.xlsx --csv-dir march/")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Ledger CSV (overrides [ledger] file)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Bank statement CSV (overrides [bank] file)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file (overrides [output] json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write an XLSX workbook (overrides [output] xlsx)
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Write one CSV per view into this directory (overrides [output] csv_dir)
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Report history directory
        #[arg(long, env = "BANKREC_HOME")]
        store: Option<PathBuf>,

        /// Do not save the report to history
        #[arg(long)]
        no_store: bool,

        /// Exit 0 even when items remain outstanding
        #[arg(long)]
        allow_outstanding: bool,

        /// Suppress the summary dashboard
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  bankrec validate march.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// List saved reconciliation runs, newest first
    History {
        /// Report history directory
        #[arg(long, env = "BANKREC_HOME")]
        store: Option<PathBuf>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("BANKREC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            ledger,
            bank,
            json,
            output,
            xlsx,
            csv_dir,
            store,
            no_store,
            allow_outstanding,
            quiet,
        } => recon::cmd_run(recon::RunArgs {
            config,
            ledger,
            bank,
            json,
            output,
            xlsx,
            csv_dir,
            store,
            no_store,
            allow_outstanding,
            quiet,
        }),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::History { store, json } => recon::cmd_history(store, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
