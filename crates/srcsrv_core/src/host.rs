//! Host adapter contract and registry.
//!
//! One adapter exists per hosting provider. Adapters differ only in URL
//! template, path encoding, and retrieval step count; the caching and
//! deduplication logic is shared through [`SourceCache`] and must not be
//! duplicated per provider.

use crate::auth::Credential;
use crate::cache::SourceCache;
use crate::error::{Result, SrcSrvError};
use crate::hosts::{Bitbucket, Codebase, GitHub, GitLab};
use crate::sources::SourceRecord;
use crate::summary::Verbosity;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Options shared by every host adapter, collected from the CLI.
///
/// Which fields are required depends on the adapter; the registry validates
/// them at construction time.
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    /// Repository server, e.g. `github.com`, or an explicit `http(s)://`
    /// base used verbatim (mock servers).
    pub uri: String,
    /// Commit hash or tag the index refers to.
    pub commit: String,
    /// Repository account (GitHub, Codebase).
    pub account: Option<String>,
    /// Repository name (GitHub).
    pub repo: Option<String>,
    /// Project ID (GitLab).
    pub project_id: Option<String>,
    /// REST API version (GitLab, Bitbucket, Codebase).
    pub api: Option<String>,
    /// REST API sudo user (GitLab).
    pub sudo: Option<String>,
    /// Project key (Bitbucket).
    pub project_key: Option<String>,
    /// Repository slug (Bitbucket).
    pub repo_slug: Option<String>,
    /// Repository domain (Codebase).
    pub domain: Option<String>,
    /// Project permalink (Codebase).
    pub proj_permalink: Option<String>,
    /// Repository permalink (Codebase).
    pub repo_permalink: Option<String>,
}

impl HostOptions {
    pub(crate) fn require(
        &self,
        host: &'static str,
        option: &'static str,
        value: &Option<String>,
    ) -> Result<String> {
        value
            .clone()
            .ok_or(SrcSrvError::MissingHostOption { host, option })
    }
}

/// Capability set every hosting-provider adapter implements.
///
/// The default `write_entry` emits the five-field index line; variants may
/// decorate but must preserve the field order and the `*` delimiter. The
/// delimiter is not escaped: a path containing `*` corrupts its own line,
/// a limitation inherited from the SRCSRV stream format.
pub trait HostAdapter: std::fmt::Debug {
    /// Registry key and summary label.
    fn name(&self) -> &'static str;

    /// One-time setup before the adapter serves requests. Not on the hot
    /// path; production adapters have nothing to do here.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Writes the adapter's variable block into the index header, including
    /// the SRCSRVCMD line that re-enters this tool in fetch mode.
    fn write_header(&self, out: &mut dyn Write, build_base: &str) -> Result<()>;

    /// Contributes the adapter's argument values to the execution summary.
    /// At verbose level this includes the credential variable's raw value.
    fn summarize(&self, arguments: &mut Map<String, Value>, level: Verbosity);

    /// Writes one source file entry line.
    fn write_entry(&self, out: &mut dyn Write, record: &SourceRecord) -> Result<()> {
        let line = format!(
            "{}*{}*{}*{}*{}",
            record.build_path,
            record.repo_dir,
            record.file_name,
            record.pdb_hash,
            record.repo_blob_hash.as_deref().unwrap_or(""),
        );
        writeln!(out, "{line}")?;
        debug!("{}", line);
        Ok(())
    }

    /// Retrieves one file from the provider and materializes it in the
    /// cache. Any non-2xx response at any step is fatal: the error
    /// propagates before the cache is touched.
    fn fetch(
        &self,
        repo_dir: &str,
        file_name: &str,
        pdb_hash: &str,
        cache: &SourceCache,
    ) -> Result<PathBuf>;
}

/// Creates the adapter registered under `name`.
///
/// Adapters are selected by configuration string only; there is no dynamic
/// lookup of caller-supplied type names.
///
/// # Errors
///
/// Returns `UnknownHost` for an unregistered name and `MissingHostOption`
/// when the adapter's required options are absent.
pub fn create_host(name: &str, options: HostOptions) -> Result<Box<dyn HostAdapter>> {
    match name.to_ascii_lowercase().as_str() {
        "github" => Ok(Box::new(GitHub::new(options)?)),
        "gitlab" => Ok(Box::new(GitLab::new(options)?)),
        "bitbucket" => Ok(Box::new(Bitbucket::new(options)?)),
        "codebase" => Ok(Box::new(Codebase::new(options)?)),
        other => Err(SrcSrvError::UnknownHost(other.to_string())),
    }
}

/// Normalizes a server URI argument: strips an `https://` scheme and any
/// path suffix, leaving just the server name. An explicit `http://` base
/// survives untouched so tests can point adapters at a mock server.
pub fn normalize_uri(uri: &str) -> String {
    if uri.starts_with("http://") {
        return uri.trim_end_matches('/').to_string();
    }
    let uri = uri.strip_prefix("https://").unwrap_or(uri);
    match uri.find('/') {
        Some(pos) if pos > 0 => uri[..pos].to_string(),
        _ => uri.to_string(),
    }
}

/// Whether the URI option is an explicit base URL rather than a server name.
pub(crate) fn explicit_base(uri: &str) -> Option<&str> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Some(uri.trim_end_matches('/'))
    } else {
        None
    }
}

/// Performs one blocking GET and returns the response bytes.
///
/// No timeout and no retry: a hung remote stalls this fetch invocation
/// only. Non-2xx responses are fatal.
pub(crate) fn get_bytes(
    url: &str,
    headers: &[(&str, &str)],
    cred: &Option<Credential>,
) -> Result<Vec<u8>> {
    let response = send(url, headers, cred)?;
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| SrcSrvError::HttpTransport {
            url: url.to_string(),
            source: e,
        })
}

/// Performs one blocking GET and parses the response as JSON.
pub(crate) fn get_json(
    url: &str,
    headers: &[(&str, &str)],
    cred: &Option<Credential>,
) -> Result<Value> {
    let response = send(url, headers, cred)?;
    response.json().map_err(|e| SrcSrvError::HttpTransport {
        url: url.to_string(),
        source: e,
    })
}

fn send(
    url: &str,
    headers: &[(&str, &str)],
    cred: &Option<Credential>,
) -> Result<reqwest::blocking::Response> {
    let client = reqwest::blocking::Client::builder()
        .build()
        .map_err(|e| SrcSrvError::HttpTransport {
            url: url.to_string(),
            source: e,
        })?;
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request = Credential::apply(cred, request);

    let response = request.send().map_err(|e| SrcSrvError::HttpTransport {
        url: url.to_string(),
        source: e,
    })?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SrcSrvError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        });
    }
    debug!("REST API call: {}", url);
    Ok(response)
}
