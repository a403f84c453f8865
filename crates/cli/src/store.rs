//! Run history: saved reports plus a capped metadata index.

use std::path::{Path, PathBuf};

use bankrec_recon::model::{ReconReport, ReconSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Entries kept in the metadata index; older ones are pruned on save.
pub const MAX_HISTORY: usize = 50;

const METADATA_FILE: &str = "reports_metadata.json";
const REPORTS_DIR: &str = "reports";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub config_name: String,
    #[serde(default)]
    pub ledger_file: Option<String>,
    #[serde(default)]
    pub bank_file: Option<String>,
    pub summary: ReconSummary,
}

/// Where a run's inputs came from, recorded alongside the report.
#[derive(Debug, Clone, Default)]
pub struct RunSources {
    pub ledger_file: Option<String>,
    pub bank_file: Option<String>,
}

pub trait ReportStore {
    /// Persist `report`, returning its index entry.
    fn save(
        &self,
        report: &ReconReport,
        sources: &RunSources,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry, String>;

    /// Index entries, oldest first.
    fn list(&self) -> Result<Vec<HistoryEntry>, String>;
}

/// Filesystem store: `<root>/reports/*.json` + `<root>/reports_metadata.json`.
pub struct FsReportStore {
    root: PathBuf,
}

impl FsReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$BANKREC_HOME` is handled by clap; this is the fallback.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("bankrec"))
            .unwrap_or_else(|| PathBuf::from(".bankrec"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    fn reports_dir(&self) -> PathBuf {
        self.root.join(REPORTS_DIR)
    }

    pub fn report_path(&self, filename: &str) -> PathBuf {
        self.reports_dir().join(filename)
    }

    /// A corrupt index is logged and treated as empty so new runs still save.
    fn read_index(&self) -> Result<Vec<HistoryEntry>, String> {
        let path = self.metadata_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(format!("cannot read {}: {e}", path.display())),
        };
        match serde_json::from_str(&text) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "report index unreadable; starting fresh");
                Ok(Vec::new())
            }
        }
    }

    fn write_index(&self, entries: &[HistoryEntry]) -> Result<(), String> {
        let path = self.metadata_path();
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| format!("JSON serialization error: {e}"))?;
        std::fs::write(&path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))
    }

    /// `<slug>_<YYYYmmdd_HHMMSS>.json`, suffixed if that name is taken.
    fn unused_filename(&self, config_name: &str, at: DateTime<Utc>) -> String {
        let stem = format!("{}_{}", slug(config_name), at.format("%Y%m%d_%H%M%S"));
        let mut candidate = format!("{stem}.json");
        let mut n = 1;
        while self.report_path(&candidate).exists() {
            n += 1;
            candidate = format!("{stem}_{n}.json");
        }
        candidate
    }
}

impl ReportStore for FsReportStore {
    fn save(
        &self,
        report: &ReconReport,
        sources: &RunSources,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry, String> {
        let dir = self.reports_dir();
        std::fs::create_dir_all(&dir).map_err(|e| format!("cannot create {}: {e}", dir.display()))?;

        let filename = self.unused_filename(&report.meta.config_name, at);
        let path = self.report_path(&filename);
        let json = report
            .to_json_pretty()
            .map_err(|e| format!("JSON serialization error: {e}"))?;
        std::fs::write(&path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;

        let entry = HistoryEntry {
            filename,
            timestamp: at,
            config_name: report.meta.config_name.clone(),
            ledger_file: sources.ledger_file.clone(),
            bank_file: sources.bank_file.clone(),
            summary: report.summary.clone(),
        };

        let mut entries = self.read_index()?;
        entries.push(entry.clone());
        if entries.len() > MAX_HISTORY {
            let excess = entries.len() - MAX_HISTORY;
            for old in entries.drain(..excess) {
                let old_path = self.report_path(&old.filename);
                if let Err(e) = std::fs::remove_file(&old_path) {
                    debug!(path = %old_path.display(), error = %e, "pruned report not removed");
                }
            }
        }
        self.write_index(&entries)?;

        debug!(file = %entry.filename, "report saved");
        Ok(entry)
    }

    fn list(&self) -> Result<Vec<HistoryEntry>, String> {
        self.read_index()
    }
}

fn slug(name: &str) -> String {
    let mut out = String::new();
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "report".into()
    } else {
        trimmed.to_string()
    }
}
