//! Codebase adapter.
//!
//! Single-step retrieval against the blob endpoint.
//! <https://support.codebasehq.com/kb/repositories/files>

use crate::auth::Credential;
use crate::cache::SourceCache;
use crate::error::Result;
use crate::host::{explicit_base, get_bytes, HostAdapter, HostOptions};
use crate::summary::Verbosity;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::PathBuf;

/// Environment variable holding the Codebase credential.
pub const CODEBASE_AUTH_VAR: &str = "SRCSRV_CODEBASE_AUTH";

const JSON_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json"),
    ("Content-type", "application/json"),
];

/// Codebase hosting adapter.
#[derive(Debug)]
pub struct Codebase {
    uri: String,
    commit: String,
    api: String,
    account: String,
    domain: Option<String>,
    proj_permalink: String,
    repo_permalink: String,
}

impl Codebase {
    /// Builds the adapter, validating required options.
    ///
    /// # Errors
    ///
    /// Returns `MissingHostOption` if `--proj-permalink` or
    /// `--repo-permalink` is absent.
    pub fn new(options: HostOptions) -> Result<Self> {
        let proj_permalink =
            options.require("codebase", "proj-permalink", &options.proj_permalink)?;
        let repo_permalink =
            options.require("codebase", "repo-permalink", &options.repo_permalink)?;
        Ok(Self {
            proj_permalink,
            repo_permalink,
            api: options.api.clone().unwrap_or_else(|| "api3".to_string()),
            account: options
                .account
                .clone()
                .unwrap_or_else(|| super::DEFAULT_ACCOUNT.to_string()),
            domain: options.domain.clone(),
            uri: options.uri,
            commit: options.commit,
        })
    }

    fn file_url(&self, repo_dir: &str, file_name: &str) -> String {
        let base = match explicit_base(&self.uri) {
            Some(base) => base.to_string(),
            None => format!("https://{}.{}", self.api, self.uri),
        };
        format!(
            "{}/{}/{}/blob/{}/{}{}",
            base, self.proj_permalink, self.repo_permalink, self.commit, repo_dir, file_name,
        )
    }
}

impl HostAdapter for Codebase {
    fn name(&self) -> &'static str {
        "codebase"
    }

    fn write_header(&self, out: &mut dyn Write, build_base: &str) -> Result<()> {
        writeln!(
            out,
            "SRCSRVCMD=srcsrv fetch %cb_host% %cb_uri% %cb_api% %cb_acct% %cb_project% \
             %cb_repo% %cb_commit% --cache=%srcsrvtrg% %var2% %var3% %var4%"
        )?;
        writeln!(out, "CB_BASE={build_base}")?;
        writeln!(out, "CB_HOST=--host=codebase")?;
        writeln!(out, "CB_URI=--uri={}", self.uri)?;
        writeln!(out, "CB_COMMIT=--commit={}", self.commit)?;
        writeln!(out, "CB_API=--api={}", self.api)?;
        writeln!(out, "CB_ACCT=--account={}", self.account)?;
        writeln!(out, "CB_PROJECT=--proj-permalink={}", self.proj_permalink)?;
        writeln!(out, "CB_REPO=--repo-permalink={}", self.repo_permalink)?;
        Ok(())
    }

    fn summarize(&self, arguments: &mut Map<String, Value>, level: Verbosity) {
        arguments.insert("--domain".to_string(), json!(self.domain));
        arguments.insert("--account".to_string(), json!(self.account));
        arguments.insert("--proj-permalink".to_string(), json!(self.proj_permalink));
        arguments.insert("--repo-permalink".to_string(), json!(self.repo_permalink));
        super::summarize_auth(arguments, CODEBASE_AUTH_VAR, level);
    }

    fn fetch(
        &self,
        repo_dir: &str,
        file_name: &str,
        pdb_hash: &str,
        cache: &SourceCache,
    ) -> Result<PathBuf> {
        let cred = Credential::resolve(CODEBASE_AUTH_VAR)?;
        let url = self.file_url(repo_dir, file_name);
        let origin = format!(
            "{}/{}/{}/{}",
            self.uri, self.proj_permalink, self.repo_permalink, repo_dir
        );

        cache.materialize(file_name, pdb_hash, &origin, &self.commit, || {
            get_bytes(&url, JSON_HEADERS, &cred)
        })
    }
}
