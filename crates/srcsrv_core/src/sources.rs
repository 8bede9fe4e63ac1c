//! Symbol-database source enumeration.
//!
//! `srctool` dumps one line per source file recorded in a .PDB. This module
//! filters that dump to files under the build root with a recognized
//! extension and resolves each to its repository blob identity.

use crate::error::{Result, SrcSrvError};
use crate::git::GitRepo;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Checksum algorithm recorded in the symbol database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// MD5 digest (older toolchains).
    Md5,
    /// SHA-256 digest.
    Sha256,
}

impl HashKind {
    fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("MD5") {
            Some(Self::Md5)
        } else if token.eq_ignore_ascii_case("SHA256") {
            Some(Self::Sha256)
        } else {
            None
        }
    }
}

/// A matched `srctool` dump line: build path plus checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpEntry {
    /// Absolute source path as recorded at compile time.
    pub build_path: String,
    /// Checksum algorithm of `digest`.
    pub kind: HashKind,
    /// Hex digest reported by the symbol database.
    pub digest: String,
}

/// One source file referenced by a symbol database, resolved to its
/// repository identity. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// Absolute path as recorded at compile time, verbatim.
    pub build_path: String,
    /// Repository-relative directory: forward-slashed, trailing slash,
    /// empty string for the repository root.
    pub repo_dir: String,
    /// File name within `repo_dir`.
    pub file_name: String,
    /// Content digest reported by the symbol database.
    pub pdb_hash: String,
    /// Checksum algorithm of `pdb_hash`.
    pub hash_kind: HashKind,
    /// Blob identity at index time; `None` without a repository context.
    pub repo_blob_hash: Option<String>,
}

/// Normalizes a build-base string to end with a path separator.
///
/// The separator style of the input is preserved: a Windows-style base keeps
/// a backslash, anything else gets a forward slash.
pub fn normalize_build_base(base: &str) -> String {
    let mut base = base.to_string();
    if !base.ends_with('/') && !base.ends_with('\\') {
        if base.contains('\\') {
            base.push('\\');
        } else {
            base.push('/');
        }
    }
    base
}

/// Matches `srctool` dump lines against the build root and extension
/// allow-list.
///
/// ```
/// use srcsrv_core::SourceFilter;
///
/// let filter = SourceFilter::new(r"C:\build", "cpp;h").unwrap();
/// let entry = filter
///     .match_line("C:\\build\\app\\main.cpp\t Checksum MD5: AB12CD34")
///     .unwrap();
/// assert_eq!(entry.build_path, r"C:\build\app\main.cpp");
/// assert_eq!(entry.digest, "AB12CD34");
/// ```
pub struct SourceFilter {
    pattern: Regex,
    build_base: String,
}

impl SourceFilter {
    /// Builds a filter for `build_base` and a semicolon-separated extension
    /// allow-list (e.g. `"cpp;hpp;c;h"`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilter` if the extension list is empty.
    pub fn new(build_base: &str, extensions: &str) -> Result<Self> {
        let build_base = normalize_build_base(build_base);
        let exts: Vec<String> = extensions
            .split(';')
            .filter(|e| !e.is_empty())
            .map(regex::escape)
            .collect();
        if exts.is_empty() {
            return Err(SrcSrvError::InvalidFilter(format!(
                "no extensions in {extensions:?}"
            )));
        }
        let pattern = format!(
            r"(?i)^({}.+\.(?:{}))\t Checksum (MD5|SHA256): ([A-Fa-f0-9]+)",
            regex::escape(&build_base),
            exts.join("|"),
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| SrcSrvError::InvalidFilter(e.to_string()))?;
        Ok(Self {
            pattern,
            build_base,
        })
    }

    /// The normalized build base this filter is anchored to.
    pub fn build_base(&self) -> &str {
        &self.build_base
    }

    /// Matches one dump line. Returns `None` for unrelated entries; the
    /// tool emits records this system does not index.
    pub fn match_line(&self, line: &str) -> Option<DumpEntry> {
        let caps = self.pattern.captures(line)?;
        Some(DumpEntry {
            build_path: caps[1].to_string(),
            kind: HashKind::from_token(&caps[2])?,
            digest: caps[3].to_string(),
        })
    }
}

/// Lazily-populated mapping from resolved absolute path to source identity.
///
/// Memoized for the duration of one indexing run: a symbol database is
/// assumed not to reference two different contents at the same absolute
/// path, so entries are never invalidated.
pub struct SourceMap<'a> {
    build_base: String,
    repo: Option<&'a GitRepo>,
    resolved: HashMap<PathBuf, SourceRecord>,
}

impl<'a> SourceMap<'a> {
    /// Creates an empty map anchored at `build_base`, optionally bound to a
    /// repository for blob-hash resolution.
    pub fn new(build_base: &str, repo: Option<&'a GitRepo>) -> Self {
        Self {
            build_base: normalize_build_base(build_base),
            repo,
            resolved: HashMap::new(),
        }
    }

    /// Resolves a matched dump entry to a [`SourceRecord`].
    ///
    /// Returns `Ok(None)` when a repository context exists but the file has
    /// no blob there (soft per-file failure: the caller skips the line).
    pub fn resolve(&mut self, entry: &DumpEntry) -> Result<Option<SourceRecord>> {
        let key = canonical_key(&entry.build_path);
        if let Some(record) = self.resolved.get(&key) {
            return Ok(Some(record.clone()));
        }

        let (repo_dir, file_name) = split_repo_path(&self.build_base, &entry.build_path);
        let repo_blob_hash = match self.repo {
            Some(repo) => match repo.hash_object(&key) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!("could not resolve {} in repository: {}", entry.build_path, e);
                    return Ok(None);
                }
            },
            None => None,
        };

        let record = SourceRecord {
            build_path: entry.build_path.clone(),
            repo_dir,
            file_name,
            pdb_hash: entry.digest.clone(),
            hash_kind: entry.kind,
            repo_blob_hash,
        };
        self.resolved.insert(key.clone(), record);
        Ok(self.resolved.get(&key).cloned())
    }

    /// Number of distinct source files resolved so far.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether any source file has been resolved.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Canonicalizes a build path for memoization, falling back to the recorded
/// path when it no longer exists on this machine.
fn canonical_key(build_path: &str) -> PathBuf {
    let path = Path::new(build_path);
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Splits a build path into (repo_dir, file_name) relative to the build
/// base: `C:\build\app\main.cpp` under `C:\build\` becomes
/// `("app/", "main.cpp")`; a file at the root gets `repo_dir == ""`.
fn split_repo_path(build_base: &str, build_path: &str) -> (String, String) {
    let relative = build_path
        .get(build_base.len()..)
        .unwrap_or(build_path)
        .replace('\\', "/");
    match relative.rsplit_once('/') {
        Some((dir, name)) => (format!("{dir}/"), name.to_string()),
        None => (String::new(), relative),
    }
}
