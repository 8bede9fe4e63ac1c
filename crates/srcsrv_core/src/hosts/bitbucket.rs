//! Bitbucket adapter.
//!
//! Single-step retrieval against the raw source endpoint.
//! <https://developer.atlassian.com/cloud/bitbucket/rest/api-group-source/#raw-file-contents>

use crate::auth::Credential;
use crate::cache::SourceCache;
use crate::error::Result;
use crate::host::{explicit_base, get_bytes, HostAdapter, HostOptions};
use crate::summary::Verbosity;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::PathBuf;

/// Environment variable holding the Bitbucket credential.
pub const BITBUCKET_AUTH_VAR: &str = "SRCSRV_BITBUCKET_AUTH";

/// Bitbucket hosting adapter.
#[derive(Debug)]
pub struct Bitbucket {
    uri: String,
    commit: String,
    api: String,
    project_key: String,
    repo_slug: String,
}

impl Bitbucket {
    /// Builds the adapter, validating required options.
    ///
    /// A non-numeric `--api` value falls back to `2.0`, matching the REST
    /// version scheme of the hosted service.
    ///
    /// # Errors
    ///
    /// Returns `MissingHostOption` if `--project-key` or `--repo-slug` is
    /// absent.
    pub fn new(options: HostOptions) -> Result<Self> {
        let project_key = options.require("bitbucket", "project-key", &options.project_key)?;
        let repo_slug = options.require("bitbucket", "repo-slug", &options.repo_slug)?;
        let api = options
            .api
            .clone()
            .filter(|v| v.parse::<f64>().is_ok())
            .unwrap_or_else(|| "2.0".to_string());
        Ok(Self {
            project_key,
            repo_slug,
            api,
            uri: options.uri,
            commit: options.commit,
        })
    }

    fn file_url(&self, repo_dir: &str, file_name: &str) -> String {
        let base = match explicit_base(&self.uri) {
            Some(base) => base.to_string(),
            None => format!("https://api.{}", self.uri),
        };
        format!(
            "{}/{}/repositories/{}/{}/src/{}/{}{}",
            base, self.api, self.project_key, self.repo_slug, self.commit, repo_dir, file_name,
        )
    }
}

impl HostAdapter for Bitbucket {
    fn name(&self) -> &'static str {
        "bitbucket"
    }

    fn write_header(&self, out: &mut dyn Write, build_base: &str) -> Result<()> {
        writeln!(
            out,
            "SRCSRVCMD=srcsrv fetch %bb_host% %bb_uri% %bb_api% %bb_project% %bb_repo_slug% \
             %bb_commit% --cache=%srcsrvtrg% %var2% %var3% %var4%"
        )?;
        writeln!(out, "BB_BASE={build_base}")?;
        writeln!(out, "BB_HOST=--host=bitbucket")?;
        writeln!(out, "BB_URI=--uri={}", self.uri)?;
        writeln!(out, "BB_COMMIT=--commit={}", self.commit)?;
        writeln!(out, "BB_API=--api={}", self.api)?;
        writeln!(out, "BB_PROJECT=--project-key={}", self.project_key)?;
        writeln!(out, "BB_REPO_SLUG=--repo-slug={}", self.repo_slug)?;
        Ok(())
    }

    fn summarize(&self, arguments: &mut Map<String, Value>, level: Verbosity) {
        arguments.insert("--api".to_string(), json!(self.api));
        arguments.insert("--project-key".to_string(), json!(self.project_key));
        arguments.insert("--repo-slug".to_string(), json!(self.repo_slug));
        super::summarize_auth(arguments, BITBUCKET_AUTH_VAR, level);
    }

    fn fetch(
        &self,
        repo_dir: &str,
        file_name: &str,
        pdb_hash: &str,
        cache: &SourceCache,
    ) -> Result<PathBuf> {
        let cred = Credential::resolve(BITBUCKET_AUTH_VAR)?;
        let url = self.file_url(repo_dir, file_name);
        let origin = format!(
            "{}/{}/{}/{}",
            self.uri, self.project_key, self.repo_slug, repo_dir
        );

        cache.materialize(file_name, pdb_hash, &origin, &self.commit, || {
            get_bytes(&url, &[], &cred)
        })
    }
}
