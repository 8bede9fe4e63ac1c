//! CLI commands.

use clap::Args;
use srcsrv_core::HostOptions;

pub mod fetch;
pub mod index;

/// Host selection and adapter options shared by both commands.
///
/// Which options are required depends on `--host`; the adapter registry
/// validates them, so here everything but the host name is optional.
#[derive(Args, Debug)]
pub struct HostArgs {
    /// Hosting provider (github, gitlab, bitbucket, codebase)
    #[arg(long)]
    pub host: String,

    /// Repository server, e.g. github.com
    #[arg(long)]
    pub uri: String,

    /// Repository account (github, codebase)
    #[arg(long)]
    pub account: Option<String>,

    /// Repository name (github)
    #[arg(long)]
    pub repo: Option<String>,

    /// Project ID (gitlab)
    #[arg(long)]
    pub project_id: Option<String>,

    /// REST API version or subdomain (gitlab, bitbucket, codebase)
    #[arg(long)]
    pub api: Option<String>,

    /// REST API sudo user (gitlab)
    #[arg(long)]
    pub sudo: Option<String>,

    /// Project key (bitbucket)
    #[arg(long)]
    pub project_key: Option<String>,

    /// Repository slug (bitbucket)
    #[arg(long)]
    pub repo_slug: Option<String>,

    /// Repository domain (codebase)
    #[arg(long)]
    pub domain: Option<String>,

    /// Project permalink (codebase)
    #[arg(long)]
    pub proj_permalink: Option<String>,

    /// Repository permalink (codebase)
    #[arg(long)]
    pub repo_permalink: Option<String>,
}

impl HostArgs {
    /// Assembles the adapter options for a given commit.
    pub fn to_options(&self, commit: String) -> HostOptions {
        HostOptions {
            uri: srcsrv_core::normalize_uri(&self.uri),
            commit,
            account: self.account.clone(),
            repo: self.repo.clone(),
            project_id: self.project_id.clone(),
            api: self.api.clone(),
            sudo: self.sudo.clone(),
            project_key: self.project_key.clone(),
            repo_slug: self.repo_slug.clone(),
            domain: self.domain.clone(),
            proj_permalink: self.proj_permalink.clone(),
            repo_permalink: self.repo_permalink.clone(),
        }
    }
}
