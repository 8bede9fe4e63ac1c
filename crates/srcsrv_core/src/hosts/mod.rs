//! Hosting-provider adapters.
//!
//! Each adapter owns its URL template, required path encoding, and
//! retrieval step count; everything else (entry format, caching,
//! deduplication) is shared through the [`crate::host`] contract.

mod bitbucket;
mod codebase;
mod github;
mod gitlab;

pub use bitbucket::{Bitbucket, BITBUCKET_AUTH_VAR};
pub use codebase::{Codebase, CODEBASE_AUTH_VAR};
pub use github::{GitHub, GITHUB_AUTH_VAR};
pub use gitlab::{GitLab, GITLAB_AUTH_VAR};

/// Placeholder account used when none is given; the debugger substitutes
/// the variable at fetch time.
pub(crate) const DEFAULT_ACCOUNT: &str = "%SRCSRV_USERNAME%";

/// Adds the credential variable to the summary arguments: the raw value at
/// verbose level, the variable name otherwise.
pub(crate) fn summarize_auth(
    arguments: &mut serde_json::Map<String, serde_json::Value>,
    var: &str,
    level: crate::summary::Verbosity,
) {
    let value = if level >= crate::summary::Verbosity::Verbose {
        serde_json::json!([var, crate::auth::raw_for_summary(var)])
    } else {
        serde_json::json!(var)
    };
    arguments.insert("--auth".to_string(), value);
}
