//! Batch indexing of symbol databases.
//!
//! For each .PDB: dump its source records, filter them to the build root,
//! resolve repository identities, write the index stream to a staging file
//! and embed it back into the .PDB. One database failing never aborts the
//! batch.

use crate::error::Result;
use crate::git::GitRepo;
use crate::host::HostAdapter;
use crate::sources::{SourceFilter, SourceMap};
use crate::summary::Summary;
use crate::tools::SrcSrvTools;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Effective options of one indexing run.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Build directory the source paths in the .PDBs are anchored at.
    pub build_base: String,
    /// Semicolon-separated extension allow-list.
    pub extensions: String,
    /// Directory holding `srctool` and `pdbstr`.
    pub tools_dir: PathBuf,
    /// .PDB files or directories to scan for them.
    pub pdbs: Vec<PathBuf>,
    /// Cache root written into SRCSRVTRG, forward-slashed. May contain
    /// debugger-substituted variables such as `%USERPROFILE%`.
    pub cache_root: String,
    /// Write index streams but skip the embedding step.
    pub dry_run: bool,
    /// Keep the staging files next to each .PDB.
    pub keep: bool,
}

/// Outcome of processing one symbol database.
pub enum PdbOutcome {
    /// Index embedded; carries the entry lines that were written.
    Indexed(Vec<String>),
    /// No source under the build root matched; nothing was persisted.
    Skipped,
}

/// Totals of one indexing run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Databases indexed and embedded.
    pub processed: u32,
    /// Databases whose processing errored (tool failure, I/O).
    pub failed: u32,
    /// Databases with no matching source files.
    pub skipped: u32,
    /// Wall-clock duration of the whole batch.
    pub duration: Duration,
}

/// Drives one indexing run over a set of symbol databases.
pub struct Indexer<'a> {
    options: IndexOptions,
    tools: SrcSrvTools,
    filter: SourceFilter,
    sources: SourceMap<'a>,
    host: &'a dyn HostAdapter,
}

impl<'a> Indexer<'a> {
    /// Prepares a run: resolves the tools and compiles the source filter.
    ///
    /// # Errors
    ///
    /// Returns `ToolsDirMissing` or `InvalidFilter`; both are fatal for the
    /// whole batch.
    pub fn new(
        options: IndexOptions,
        host: &'a dyn HostAdapter,
        repo: Option<&'a GitRepo>,
    ) -> Result<Self> {
        let tools = SrcSrvTools::new(&options.tools_dir)?;
        let filter = SourceFilter::new(&options.build_base, &options.extensions)?;
        let sources = SourceMap::new(&options.build_base, repo);
        Ok(Self {
            options,
            tools,
            filter,
            sources,
            host,
        })
    }

    /// Processes every discovered database, recording each into `summary`.
    pub fn run(&mut self, summary: &mut Summary) -> Result<BatchReport> {
        let start = Instant::now();
        let mut processed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for pdb in self.discover_pdbs() {
            let item_start = Instant::now();
            match self.process_pdb(&pdb) {
                Ok(PdbOutcome::Indexed(records)) => {
                    processed += 1;
                    summary.record_indexed(&pdb, &records, item_start.elapsed());
                }
                Ok(PdbOutcome::Skipped) => {
                    skipped += 1;
                    warn!("{} has no matching source files", pdb.display());
                    summary.record_unindexed(&pdb, item_start.elapsed());
                }
                Err(e) => {
                    failed += 1;
                    warn!("error processing {}: {}", pdb.display(), e);
                    summary.record_unindexed(&pdb, item_start.elapsed());
                }
            }
        }

        let report = BatchReport {
            processed,
            failed,
            skipped,
            duration: start.elapsed(),
        };
        if report.processed == 0 {
            warn!("no symbol databases indexed");
        }
        info!(
            "indexing completed. processed: {}, failed: {}, skipped: {}",
            report.processed, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Enumerates the .PDB files named by the options: explicit files pass
    /// through, directories are walked recursively, and a missing directory
    /// is skipped with a warning.
    pub fn discover_pdbs(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for item in &self.options.pdbs {
            if item.is_file() {
                if is_pdb(item) {
                    found.push(item.clone());
                }
            } else if item.is_dir() {
                collect_pdbs(item, &mut found);
            } else {
                warn!("directory {} not found", item.display());
            }
        }
        found.sort();
        found
    }

    /// Processes one symbol database end to end.
    ///
    /// Staging files (`<stem>.srcs`, `<stem>.ini`) live next to the .PDB
    /// and are removed on every path except success with `--keep`; a
    /// zero-entry stream in particular never persists.
    pub fn process_pdb(&mut self, pdb: &Path) -> Result<PdbOutcome> {
        let ini_path = pdb.with_extension("ini");
        let srcs_path = pdb.with_extension("srcs");

        let result = self.write_index(pdb, &ini_path, &srcs_path);
        match &result {
            Ok(PdbOutcome::Indexed(_)) if self.options.keep => {}
            _ => remove_staging(&ini_path, &srcs_path),
        }
        result
    }

    fn write_index(
        &mut self,
        pdb: &Path,
        ini_path: &Path,
        srcs_path: &Path,
    ) -> Result<PdbOutcome> {
        self.tools
            .dump_sources(pdb, self.filter.build_base(), srcs_path)?;

        let mut out = BufWriter::new(File::create(ini_path)?);
        self.write_preamble(&mut out)?;

        let mut records = Vec::new();
        let dump = BufReader::new(File::open(srcs_path)?);
        for line in dump.lines() {
            let line = line?;
            let Some(entry) = self.filter.match_line(&line) else {
                continue;
            };
            let Some(record) = self.sources.resolve(&entry)? else {
                continue;
            };
            // Format once, capture for the summary, then write out.
            let mut buf = Vec::new();
            self.host.write_entry(&mut buf, &record)?;
            out.write_all(&buf)?;
            records.push(String::from_utf8_lossy(&buf).trim_end().to_string());
        }

        if records.is_empty() {
            return Ok(PdbOutcome::Skipped);
        }

        writeln!(
            out,
            "SRCSRV: end ------------------------------------------------"
        )?;
        out.flush()?;
        drop(out);
        info!("{} contains {} source files", pdb.display(), records.len());

        if !self.options.dry_run {
            self.tools.embed(pdb, ini_path)?;
        }
        Ok(PdbOutcome::Indexed(records))
    }

    /// Writes the fixed stream preamble, the adapter's variable block, and
    /// the source-files section marker.
    fn write_preamble(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(
            out,
            "SRCSRV: ini ------------------------------------------------"
        )?;
        writeln!(out, "VERSION=2")?;
        writeln!(out, "VERCTRL=")?;
        writeln!(
            out,
            "SRCSRV: variables ------------------------------------------"
        )?;
        writeln!(out, "SRCSRVTRG={}/%var4%/%var3%", self.options.cache_root)?;
        self.host.write_header(out, self.filter.build_base())?;
        writeln!(
            out,
            "SRCSRV: source files ---------------------------------------"
        )?;
        Ok(())
    }
}

fn is_pdb(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdb"))
}

fn collect_pdbs(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        warn!("cannot read directory {}", dir.display());
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_pdbs(&path, found);
        } else if is_pdb(&path) {
            found.push(path);
        }
    }
}

fn remove_staging(ini_path: &Path, srcs_path: &Path) {
    for path in [ini_path, srcs_path] {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("could not remove {}: {}", path.display(), e);
            }
        }
    }
}
