//! Thin wrapper over the `git` command line.
//!
//! Indexing needs exactly three read-only operations: resolve HEAD, compute
//! a file's blob hash, and read a blob's bytes. The mock hosting layer in the
//! e2e tests additionally uses [`CheckoutGuard`] to serve historical content
//! from a shared working tree.

use crate::error::{Result, SrcSrvError};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;

/// Handle over a git working tree.
pub struct GitRepo {
    work_tree: PathBuf,
}

impl GitRepo {
    /// Opens the repository containing `work_tree`.
    ///
    /// # Errors
    ///
    /// Returns `NotARepository` if the directory is not inside a git
    /// working tree.
    pub fn open(work_tree: impl AsRef<Path>) -> Result<Self> {
        let repo = Self {
            work_tree: work_tree.as_ref().to_path_buf(),
        };
        repo.run(["rev-parse", "--git-dir"])
            .map_err(|_| SrcSrvError::NotARepository(repo.work_tree.clone()))?;
        Ok(repo)
    }

    /// Returns the working tree this handle is bound to.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Computes the blob hash of a file's current bytes.
    ///
    /// The file does not have to be committed; this is the identity the
    /// file would have in the object database.
    ///
    /// # Errors
    ///
    /// Returns `Git` if the file cannot be read (e.g. it does not exist).
    pub fn hash_object(&self, path: &Path) -> Result<String> {
        self.run([OsStr::new("hash-object"), path.as_os_str()])
    }

    /// Resolves HEAD to a full commit hash.
    pub fn head_commit(&self) -> Result<String> {
        self.run(["rev-parse", "HEAD"])
    }

    /// Resolves a branch, tag, or abbreviated hash to a full commit hash.
    pub fn resolve_commit(&self, rev: &str) -> Result<String> {
        self.run(["rev-parse", "--verify", &format!("{rev}^{{commit}}")])
    }

    /// Reads the raw bytes of a blob.
    pub fn cat_blob(&self, blob_id: &str) -> Result<Vec<u8>> {
        self.run_raw(["cat-file", "blob", blob_id])
    }

    /// Checks out `commit`, returning a guard that restores the previously
    /// checked-out ref when dropped.
    ///
    /// Not reentrant: only one guard may be active against a given working
    /// tree at a time, and no locking enforces this.
    ///
    /// # Errors
    ///
    /// Returns `Git` if the checkout fails; nothing is restored in that case.
    pub fn checkout_guard(&self, commit: &str) -> Result<CheckoutGuard<'_>> {
        self.run(["checkout", "--quiet", commit])?;
        Ok(CheckoutGuard { repo: self })
    }

    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = self.run_raw(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim_end().to_string())
    }

    fn run_raw<I, S>(&self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new("git");
        command.arg("-C").arg(&self.work_tree);
        let mut rendered = Vec::new();
        for arg in args {
            rendered.push(arg.as_ref().to_string_lossy().into_owned());
            command.arg(arg.as_ref());
        }
        let output = command.output()?;
        if !output.status.success() {
            return Err(SrcSrvError::Git {
                command: rendered.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Scoped checkout of one commit in a shared working tree.
///
/// On drop the tree is switched back to whatever ref was checked out
/// immediately before. Used only by the mock hosting layer; production
/// fetches never touch a working tree.
pub struct CheckoutGuard<'a> {
    repo: &'a GitRepo,
}

impl CheckoutGuard<'_> {
    /// The repository this guard holds checked out.
    pub fn repo(&self) -> &GitRepo {
        self.repo
    }
}

impl Drop for CheckoutGuard<'_> {
    fn drop(&mut self) {
        // Restore runs on all exit paths, including unwinding.
        if let Err(e) = self.repo.run(["switch", "--quiet", "-"]) {
            warn!("failed to restore previous checkout: {}", e);
        }
    }
}
