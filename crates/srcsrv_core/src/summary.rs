//! Execution summary reporting.
//!
//! An indexing run can record what it did to a JSON summary file: the
//! effective arguments, one entry per symbol database, and batch totals.
//! Four verbosity levels control how much lands in the per-database entries.

use crate::error::{Result, SrcSrvError};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Detail level of the execution summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Batch totals only.
    #[default]
    Minimal,
    /// Plus per-database duration.
    Normal,
    /// Plus per-database source count.
    Detailed,
    /// Plus the full per-database record list and credential state.
    Verbose,
}

impl FromStr for Verbosity {
    type Err = SrcSrvError;

    /// Accepts full names or their first letter (`m`, `n`, `d`, `v`).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "minimal" => Ok(Self::Minimal),
            "n" | "normal" => Ok(Self::Normal),
            "d" | "detailed" => Ok(Self::Detailed),
            "v" | "verbose" => Ok(Self::Verbose),
            other => Err(SrcSrvError::Config(format!(
                "invalid summary level: {other}"
            ))),
        }
    }
}

/// Collects summary data over one indexing run.
pub struct Summary {
    level: Verbosity,
    arguments: Map<String, Value>,
    pdbs: Vec<Value>,
}

impl Summary {
    /// Creates an empty summary at the given detail level.
    pub fn new(level: Verbosity) -> Self {
        Self {
            level,
            arguments: Map::new(),
            pdbs: Vec::new(),
        }
    }

    /// The configured detail level.
    pub fn level(&self) -> Verbosity {
        self.level
    }

    /// Records the effective arguments of the run.
    pub fn record_arguments(&mut self, arguments: Map<String, Value>) {
        self.arguments = arguments;
    }

    /// Mutable access to the arguments map for adapter contributions.
    pub fn arguments_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.arguments
    }

    /// Records a successfully indexed symbol database.
    ///
    /// What is kept depends on the level: minimal drops the entry entirely,
    /// normal keeps the duration, detailed adds the source count, verbose
    /// replaces the count with the record lines themselves.
    pub fn record_indexed(
        &mut self,
        pdb: &Path,
        records: &[String],
        duration: Duration,
    ) {
        let mut entry = Map::new();
        entry.insert("pdb".to_string(), json!(pdb.display().to_string()));
        match self.level {
            Verbosity::Minimal => return,
            Verbosity::Normal => {}
            Verbosity::Detailed => {
                entry.insert("sources".to_string(), json!(records.len()));
            }
            Verbosity::Verbose => {
                entry.insert("sources".to_string(), json!(records));
            }
        }
        entry.insert(
            "duration (seconds)".to_string(),
            json!(duration.as_secs_f64()),
        );
        self.pdbs.push(Value::Object(entry));
    }

    /// Records a symbol database that produced no index (skipped or failed).
    /// Kept at every level; there is no record list to elide.
    pub fn record_unindexed(&mut self, pdb: &Path, duration: Duration) {
        self.pdbs.push(json!({
            "pdb": pdb.display().to_string(),
            "duration (seconds)": duration.as_secs_f64(),
        }));
    }

    /// Assembles the final summary document from the batch totals.
    pub fn finish(&self, processed: u32, failed: u32, skipped: u32, duration: Duration) -> Value {
        json!({
            "arguments": self.arguments,
            "pdbs": self.pdbs,
            "processed": processed,
            "failed": failed,
            "skipped": skipped,
            "duration (seconds)": duration.as_secs_f64(),
        })
    }

    /// Writes the final summary document to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(
        &self,
        path: &Path,
        processed: u32,
        failed: u32,
        skipped: u32,
        duration: Duration,
    ) -> Result<()> {
        let document = self.finish(processed, failed, skipped, duration);
        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| SrcSrvError::Config(format!("failed to serialize summary: {e}")))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
