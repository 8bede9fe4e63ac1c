//! Configuration file support.
//!
//! Every value here can also be given on the command line; the file only
//! supplies defaults for options that rarely change between runs.

use crate::error::{Result, SrcSrvError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default SRCSRV tools location inside the Windows debugging kit.
pub const DEFAULT_TOOLS_DIR: &str =
    r"C:\Program Files (x86)\Windows Kits\10\Debuggers\x64\srcsrv";

/// Default extension allow-list for native builds.
pub const DEFAULT_EXTENSIONS: &str = "cpp;hpp;c;h";

/// Configuration loaded from `srcsrv.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Indexing defaults.
    #[serde(default)]
    pub index: IndexConfig,
}

impl Config {
    /// Loads configuration from `path`, or defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| SrcSrvError::Config(format!("failed to read config: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| SrcSrvError::Config(format!("failed to parse config: {e}")))
        } else {
            Ok(Config::default())
        }
    }
}

/// Indexing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Semicolon-separated source extension allow-list.
    pub extensions: String,

    /// Directory holding `srctool` and `pdbstr`.
    pub tools_dir: PathBuf,

    /// Cache parent directory. `None` leaves the debugger-substituted
    /// `%USERPROFILE%` default in place.
    pub cache: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.to_string(),
            tools_dir: PathBuf::from(DEFAULT_TOOLS_DIR),
            cache: None,
        }
    }
}

/// Computes the SRCSRVTRG cache root from an optional cache parent, always
/// forward-slashed: `<cache>/.srcsrv` when given, the literal
/// `%USERPROFILE%/.srcsrv` otherwise.
pub fn index_cache_root(cache: Option<&Path>) -> String {
    match cache {
        Some(dir) => format!("{}/.srcsrv", dir.display()).replace('\\', "/"),
        None => "%USERPROFILE%/.srcsrv".to_string(),
    }
}
