//! Error types for srcsrv_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for srcsrv_core operations.
#[derive(Error, Debug)]
pub enum SrcSrvError {
    /// The SRCSRV tools directory does not exist.
    #[error("directory {} does not exist", .0.display())]
    ToolsDirMissing(PathBuf),

    /// A native tool (srctool, pdbstr) exited with a non-zero status.
    #[error("{tool} exited with code {code}: {stderr}")]
    ToolFailed {
        /// Tool executable name
        tool: String,
        /// Exit code (-1 if killed by a signal)
        code: i32,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// A git command failed.
    #[error("git {command} failed: {stderr}")]
    Git {
        /// The git subcommand and arguments
        command: String,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// The given directory is not inside a git working tree.
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// A REST call returned a non-2xx status. Fatal: the fetch must fail
    /// closed with no cache mutation.
    #[error("REST API call {url}: error {status}: {body}")]
    HttpStatus {
        /// The request URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// The remote host could not be reached or the transfer failed.
    #[error("REST API call {url} failed: {source}")]
    HttpTransport {
        /// The request URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// A REST response did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    HttpResponseShape {
        /// The request URL
        url: String,
        /// What was missing or malformed
        reason: String,
    },

    /// No host adapter is registered under this name.
    #[error("unknown host adapter: {0}")]
    UnknownHost(String),

    /// A host adapter is missing a required option.
    #[error("host {host} requires --{option}")]
    MissingHostOption {
        /// Adapter name
        host: &'static str,
        /// CLI option name
        option: &'static str,
    },

    /// The credential environment variable does not hold a valid value.
    #[error("invalid credential in {var}: {reason}")]
    InvalidCredential {
        /// Environment variable name
        var: String,
        /// Parse failure description
        reason: String,
    },

    /// The cache inventory file is malformed.
    #[error("corrupted cache inventory at {}: {}", path.display(), reason)]
    LedgerCorrupted {
        /// Path to the inventory file
        path: PathBuf,
        /// Description of the corruption
        reason: String,
    },

    /// The debugger-supplied cache target does not contain the cache root.
    #[error("subdirectory .srcsrv not found in {0}")]
    CacheRootNotFound(String),

    /// The enumerator's line pattern could not be built.
    #[error("invalid source filter: {0}")]
    InvalidFilter(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for srcsrv_core operations.
pub type Result<T> = std::result::Result<T, SrcSrvError>;
