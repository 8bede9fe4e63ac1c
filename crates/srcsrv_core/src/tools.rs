//! Wrappers for the SRCSRV native tools.
//!
//! `srctool` dumps a symbol database's source-file records and `pdbstr`
//! embeds the generated index stream back into the .PDB. Both are opaque
//! subprocess calls: given inputs, they either succeed or fail with an
//! exit code.

use crate::error::{Result, SrcSrvError};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// SRCSRV tool pair resolved from a tools directory.
pub struct SrcSrvTools {
    srctool: PathBuf,
    pdbstr: PathBuf,
}

impl SrcSrvTools {
    /// Resolves the tools inside `dir`.
    ///
    /// Looks for `<name>.exe` first and falls back to `<name>` so that test
    /// substitutes without the Windows suffix are found.
    ///
    /// # Errors
    ///
    /// Returns `ToolsDirMissing` if `dir` does not exist. This is fatal for
    /// the whole batch; no indexing can happen without the tools.
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(SrcSrvError::ToolsDirMissing(dir.to_path_buf()));
        }
        Ok(Self {
            srctool: tool_path(dir, "srctool"),
            pdbstr: tool_path(dir, "pdbstr"),
        })
    }

    /// Dumps the source records of `pdb` into `out_path`, one line per file.
    ///
    /// Output goes straight to a file; large symbol databases produce dumps
    /// too big to buffer in memory.
    ///
    /// # Errors
    ///
    /// Returns `ToolFailed` on a non-zero exit. The caller treats this as a
    /// per-item failure: the symbol database is counted and skipped.
    pub fn dump_sources(&self, pdb: &Path, prefix: &str, out_path: &Path) -> Result<()> {
        let out = File::create(out_path)?;
        let output = Command::new(&self.srctool)
            .arg(format!("-l:{prefix}*"))
            .args(["-r", "-z", "-h"])
            .arg(pdb)
            .stdout(out)
            .output()?;
        if !output.status.success() {
            return Err(SrcSrvError::ToolFailed {
                tool: "srctool".to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("srctool dumped {} into {}", pdb.display(), out_path.display());
        Ok(())
    }

    /// Merges the index stream `ini` into `pdb`.
    ///
    /// # Errors
    ///
    /// Returns `ToolFailed` on a non-zero exit.
    pub fn embed(&self, pdb: &Path, ini: &Path) -> Result<()> {
        let output = Command::new(&self.pdbstr)
            .arg("-w")
            .arg(format!("-p:{}", pdb.display()))
            .arg("-s:srcsrv")
            .arg(format!("-i:{}", ini.display()))
            .output()?;
        if !output.status.success() {
            return Err(SrcSrvError::ToolFailed {
                tool: "pdbstr".to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("pdbstr embedded {} into {}", ini.display(), pdb.display());
        Ok(())
    }
}

fn tool_path(dir: &Path, name: &str) -> PathBuf {
    let exe = dir.join(format!("{name}.exe"));
    if exe.exists() {
        exe
    } else {
        dir.join(name)
    }
}
