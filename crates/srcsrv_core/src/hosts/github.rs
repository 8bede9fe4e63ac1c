//! GitHub and GitHub Enterprise adapter.
//!
//! Single-step retrieval: one GET against the repository contents endpoint
//! with the raw media type.
//! <https://docs.github.com/en/rest/repos/contents#get-repository-content>

use crate::auth::Credential;
use crate::cache::SourceCache;
use crate::error::Result;
use crate::host::{explicit_base, get_bytes, HostAdapter, HostOptions};
use crate::summary::Verbosity;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::PathBuf;

/// Environment variable holding the GitHub credential.
pub const GITHUB_AUTH_VAR: &str = "SRCSRV_GITHUB_AUTH";

/// GitHub hosting adapter.
#[derive(Debug)]
pub struct GitHub {
    uri: String,
    commit: String,
    account: String,
    repo: String,
}

impl GitHub {
    /// Builds the adapter, validating required options.
    ///
    /// # Errors
    ///
    /// Returns `MissingHostOption` if `--repo` is absent.
    pub fn new(options: HostOptions) -> Result<Self> {
        let repo = options.require("github", "repo", &options.repo)?;
        Ok(Self {
            account: options
                .account
                .clone()
                .unwrap_or_else(|| super::DEFAULT_ACCOUNT.to_string()),
            repo,
            uri: options.uri,
            commit: options.commit,
        })
    }

    fn api_base(&self) -> String {
        match explicit_base(&self.uri) {
            Some(base) => base.to_string(),
            None => format!("https://api.{}", self.uri),
        }
    }

    fn file_url(&self, repo_dir: &str, file_name: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}{}?ref={}",
            self.api_base(),
            self.account,
            self.repo,
            repo_dir,
            file_name,
            self.commit,
        )
    }
}

impl HostAdapter for GitHub {
    fn name(&self) -> &'static str {
        "github"
    }

    fn write_header(&self, out: &mut dyn Write, build_base: &str) -> Result<()> {
        writeln!(
            out,
            "SRCSRVCMD=srcsrv fetch %gh_host% %gh_uri% %gh_commit% %gh_acct% %gh_repo% \
             --cache=%srcsrvtrg% %var2% %var3% %var4%"
        )?;
        writeln!(out, "GH_BASE={build_base}")?;
        writeln!(out, "GH_HOST=--host=github")?;
        writeln!(out, "GH_URI=--uri={}", self.uri)?;
        writeln!(out, "GH_COMMIT=--commit={}", self.commit)?;
        writeln!(out, "GH_ACCT=--account={}", self.account)?;
        writeln!(out, "GH_REPO=--repo={}", self.repo)?;
        Ok(())
    }

    fn summarize(&self, arguments: &mut Map<String, Value>, level: Verbosity) {
        arguments.insert("--account".to_string(), json!(self.account));
        arguments.insert("--repo".to_string(), json!(self.repo));
        super::summarize_auth(arguments, GITHUB_AUTH_VAR, level);
    }

    fn fetch(
        &self,
        repo_dir: &str,
        file_name: &str,
        pdb_hash: &str,
        cache: &SourceCache,
    ) -> Result<PathBuf> {
        let cred = Credential::resolve(GITHUB_AUTH_VAR)?;
        let url = self.file_url(repo_dir, file_name);
        let origin = format!("{}/{}/{}/{}", self.uri, self.account, self.repo, repo_dir);

        cache.materialize(file_name, pdb_hash, &origin, &self.commit, || {
            get_bytes(&url, &[("Accept", "application/vnd.github.raw")], &cred)
        })
    }
}
