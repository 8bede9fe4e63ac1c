//! Content-addressed source cache shared by all host adapters.
//!
//! Every cached file lives in a bucket directory named after the content
//! hash the symbol database recorded for it, so all bytes under one bucket
//! are identical by construction. A bucket's inventory (`.inv/inv.txt`)
//! records which names, origins, and commits map onto that shared content;
//! it is append-only and matched case-insensitively. The first-ever-written
//! file name is canonical; every later name is a hard link to its bytes.
//!
//! The network is touched exactly once per bucket: when the inventory does
//! not exist yet. All other requests are satisfied by inventory bookkeeping
//! alone. A failed retrieval writes nothing, so the cache never holds a
//! record for content it does not actually have.

use crate::error::{Result, SrcSrvError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// First line of every inventory file.
pub const INVENTORY_VERSION: &str = "# Ver: 1.0 - Cache inventory";

/// Content-addressed cache the debugger reads source files from.
///
/// # Examples
///
/// ```
/// use srcsrv_core::SourceCache;
/// use tempfile::TempDir;
///
/// let tmp = TempDir::new().unwrap();
/// let cache = SourceCache::new(tmp.path().join(".srcsrv"));
///
/// let path = cache
///     .materialize("main.cpp", "ABCD1234", "github.com/acct/repo/app/", "deadbeef", || {
///         Ok(b"int main() {}".to_vec())
///     })
///     .unwrap();
/// assert_eq!(std::fs::read(path).unwrap(), b"int main() {}");
/// ```
pub struct SourceCache {
    root: PathBuf,
}

impl SourceCache {
    /// Creates a cache rooted at `root`. Nothing is written until the first
    /// fetch.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Materializes `file_name` in the bucket for `pdb_hash` and returns its
    /// path.
    ///
    /// `origin` is the host-side description of where the bytes come from
    /// (server, repository, repository-relative directory); together with
    /// `commit` it forms the inventory record. `retrieve` performs the
    /// network retrieval and is invoked only when the bucket does not exist
    /// yet: the bucket key is the symbol database's own content hash, so
    /// any two requests landing in the same bucket are byte-identical and
    /// the cache only has to materialize the right set of names.
    ///
    /// # Errors
    ///
    /// Propagates the `retrieve` error untouched (fatal per the fetch
    /// contract) before any bytes or inventory records are written. Returns
    /// `LedgerCorrupted` if an existing inventory is malformed.
    pub fn materialize(
        &self,
        file_name: &str,
        pdb_hash: &str,
        origin: &str,
        commit: &str,
        retrieve: impl FnOnce() -> Result<Vec<u8>>,
    ) -> Result<PathBuf> {
        let bucket = self.root.join(pdb_hash);
        let target = bucket.join(file_name);
        let inventory_path = bucket.join(".inv").join("inv.txt");
        let record = format!("{file_name}: {origin}{file_name}:{commit}");

        if !inventory_path.exists() {
            // New bucket: retrieval first, on success bytes, inventory last.
            let bytes = retrieve()?;
            fs::create_dir_all(bucket.join(".inv"))?;
            fs::write(&target, &bytes)?;
            fs::write(
                &inventory_path,
                format!("{INVENTORY_VERSION} {pdb_hash}\n{record}\n"),
            )?;
            info!("{}: cached from {}{}", target.display(), origin, file_name);
            return Ok(target);
        }

        let text = fs::read_to_string(&inventory_path)?;
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 2 || !lines[0].starts_with("# Ver:") {
            return Err(SrcSrvError::LedgerCorrupted {
                path: inventory_path,
                reason: "missing version header or records".to_string(),
            });
        }

        let name_prefix = format!("{}:", file_name.to_lowercase());
        let mut name_found = false;
        for line in &lines[1..] {
            if line.eq_ignore_ascii_case(&record) {
                debug!("{}: already cached", file_name);
                return Ok(target);
            }
            if line.to_lowercase().starts_with(&name_prefix) {
                name_found = true;
            }
        }

        if !name_found {
            // New alias: link it to the canonical first-recorded payload
            // before the inventory admits to having it.
            let canonical = lines[1].split(':').next().unwrap_or_default();
            if canonical.is_empty() {
                return Err(SrcSrvError::LedgerCorrupted {
                    path: inventory_path,
                    reason: format!("unparsable first record: {:?}", lines[1]),
                });
            }
            fs::hard_link(bucket.join(canonical), &target)?;
            info!("{}: linked to cached {}", file_name, canonical);
        } else {
            // Same name, different origin or commit: the bytes already sit
            // under the right name, only the inventory grows.
            debug!("adding to inventory: {}", record);
        }

        let mut inventory = OpenOptions::new().append(true).open(&inventory_path)?;
        writeln!(inventory, "{record}")?;
        Ok(target)
    }
}

/// Derives the cache root from a SRCSRVTRG path handed over by the debugger.
///
/// The debugger substitutes the full target path of the file being fetched;
/// the cache root is everything up to and including its `.srcsrv` component
/// (matched case-insensitively).
///
/// # Errors
///
/// Returns `CacheRootNotFound` if no `.srcsrv` component exists.
pub fn cache_root_from_target(target: &str) -> Result<PathBuf> {
    let mut root = PathBuf::new();
    for component in Path::new(target).components() {
        root.push(component);
        if let Component::Normal(name) = component {
            if name.to_string_lossy().eq_ignore_ascii_case(".srcsrv") {
                return Ok(root);
            }
        }
    }
    Err(SrcSrvError::CacheRootNotFound(target.to_string()))
}
