//! Credential resolution for host REST calls.
//!
//! Each host adapter names an environment variable holding its credential.
//! The variable contains a small JSON document parsed into a [`Credential`];
//! it is never evaluated as code. An unset, empty, or `null` variable means
//! the request is sent without authentication.

use crate::error::{Result, SrcSrvError};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Credential material merged into an outgoing request.
///
/// ```
/// use srcsrv_core::Credential;
///
/// let basic: Credential =
///     serde_json::from_str(r#"{"basic": {"user": "svc", "password": "s3cret"}}"#).unwrap();
/// assert_eq!(
///     basic,
///     Credential::Basic { user: "svc".into(), password: "s3cret".into() }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    /// HTTP basic authentication.
    Basic {
        /// Account name
        user: String,
        /// Account password or token
        password: String,
    },
    /// Literal request headers, e.g. `{"Authorization": "token <t>"}`.
    Header(BTreeMap<String, String>),
}

impl Credential {
    /// Parses a credential from the raw text of an environment variable.
    ///
    /// Returns `None` for empty or `null` content.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredential` if the text is neither empty nor a valid
    /// credential document.
    pub fn parse(var: &str, raw: &str) -> Result<Option<Credential>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        let cred = serde_json::from_str(trimmed).map_err(|e| SrcSrvError::InvalidCredential {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(cred))
    }

    /// Resolves the credential for `var` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredential` if the variable is set but malformed.
    pub fn resolve(var: &str) -> Result<Option<Credential>> {
        match std::env::var(var) {
            Ok(raw) => Self::parse(var, &raw),
            Err(_) => {
                debug!("{} is not defined, no authentication", var);
                Ok(None)
            }
        }
    }

    /// Applies the credential to a request builder.
    pub fn apply(
        cred: &Option<Credential>,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match cred {
            None => request,
            Some(Credential::Basic { user, password }) => request.basic_auth(user, Some(password)),
            Some(Credential::Header(headers)) => headers
                .iter()
                .fold(request, |req, (name, value)| req.header(name, value)),
        }
    }
}

/// Raw environment variable text for the verbose execution summary.
pub fn raw_for_summary(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| "Not set".to_string())
}
