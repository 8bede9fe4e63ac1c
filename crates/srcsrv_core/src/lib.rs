//! SRCSRV Core Library
//!
//! Source indexing for native symbol databases (.PDB files), providing:
//! - Build-to-repository mapping of the source files a .PDB references
//! - SRCSRV index stream generation and embedding
//! - Content-addressed retrieval of historical file content from git
//!   hosting providers (GitHub, GitLab, Bitbucket, Codebase)
//!
//! # How it fits together
//!
//! At build time, [`Indexer`] dumps each symbol database's source records,
//! matches them against the build root, resolves each file's repository
//! blob identity, and embeds an index stream into the .PDB. Years later a
//! debugger reads that stream and re-invokes this tool in fetch mode; the
//! selected [`HostAdapter`] retrieves the exact historical bytes and
//! [`SourceCache`] materializes them under a checksum-keyed directory so
//! each revision is fetched at most once.
//!
//! # Matching dump lines
//!
//! ```
//! use srcsrv_core::SourceFilter;
//!
//! let filter = SourceFilter::new(r"C:\build", "cpp;hpp;c;h").unwrap();
//! let entry = filter
//!     .match_line("C:\\build\\app\\main.cpp\t Checksum MD5: AB12CD34")
//!     .unwrap();
//! assert_eq!(entry.build_path, r"C:\build\app\main.cpp");
//! ```
//!
//! # Caching retrieved content
//!
//! ```
//! use srcsrv_core::SourceCache;
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let cache = SourceCache::new(tmp.path().to_path_buf());
//!
//! // The retrieval closure runs only when the checksum bucket is new.
//! let path = cache
//!     .materialize("main.cpp", "AB12CD34", "github.com/acct/app/", "c0ffee", || {
//!         Ok(b"int main() {}\n".to_vec())
//!     })
//!     .unwrap();
//! assert_eq!(std::fs::read(path).unwrap(), b"int main() {}\n");
//! ```

mod auth;
mod cache;
mod config;
mod error;
mod git;
mod host;
mod hosts;
mod index;
mod sources;
mod summary;
mod tools;

pub use auth::Credential;
pub use cache::{cache_root_from_target, SourceCache, INVENTORY_VERSION};
pub use config::{index_cache_root, Config, IndexConfig, DEFAULT_EXTENSIONS, DEFAULT_TOOLS_DIR};
pub use error::{Result, SrcSrvError};
pub use git::{CheckoutGuard, GitRepo};
pub use host::{create_host, normalize_uri, HostAdapter, HostOptions};
pub use hosts::{
    Bitbucket, Codebase, GitHub, GitLab, BITBUCKET_AUTH_VAR, CODEBASE_AUTH_VAR, GITHUB_AUTH_VAR,
    GITLAB_AUTH_VAR,
};
pub use index::{BatchReport, IndexOptions, Indexer, PdbOutcome};
pub use sources::{
    normalize_build_base, DumpEntry, HashKind, SourceFilter, SourceMap, SourceRecord,
};
pub use summary::{Summary, Verbosity};
pub use tools::SrcSrvTools;
