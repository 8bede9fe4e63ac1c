//! GitLab adapter.
//!
//! Two-step retrieval: the file endpoint resolves path+ref to a blob id,
//! then the blob endpoint returns the raw content.
//! <https://docs.gitlab.com/ee/api/repository_files.html>

use crate::auth::Credential;
use crate::cache::SourceCache;
use crate::error::{Result, SrcSrvError};
use crate::host::{explicit_base, get_bytes, get_json, HostAdapter, HostOptions};
use crate::summary::Verbosity;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::PathBuf;

/// Environment variable holding the GitLab credential.
pub const GITLAB_AUTH_VAR: &str = "SRCSRV_GITLAB_AUTH";

const ACCEPT_JSON: &[(&str, &str)] = &[("Accept", "application/json")];

/// GitLab hosting adapter.
#[derive(Debug)]
pub struct GitLab {
    uri: String,
    commit: String,
    project_id: String,
    api: String,
    sudo: Option<String>,
}

impl GitLab {
    /// Builds the adapter, validating required options.
    ///
    /// # Errors
    ///
    /// Returns `MissingHostOption` if `--project-id` is absent.
    pub fn new(options: HostOptions) -> Result<Self> {
        let project_id = options.require("gitlab", "project-id", &options.project_id)?;
        Ok(Self {
            project_id,
            api: options.api.clone().unwrap_or_else(|| "v4".to_string()),
            sudo: options.sudo.clone(),
            uri: options.uri,
            commit: options.commit,
        })
    }

    fn api_base(&self) -> String {
        match explicit_base(&self.uri) {
            Some(base) => base.to_string(),
            None => format!("https://{}", self.uri),
        }
    }

    fn file_info_url(&self, repo_dir: &str, file_name: &str) -> String {
        let mut url = format!(
            "{}/api/{}/projects/{}/repository/files/{}?ref={}",
            self.api_base(),
            self.api,
            self.project_id,
            encode_path(&format!("{repo_dir}{file_name}")),
            self.commit,
        );
        if let Some(sudo) = &self.sudo {
            url.push_str(&format!("&sudo={sudo}"));
        }
        url
    }

    fn blob_url(&self, blob_id: &str) -> String {
        format!(
            "{}/api/{}/projects/{}/repository/blobs/{}/raw",
            self.api_base(),
            self.api,
            self.project_id,
            blob_id,
        )
    }
}

impl HostAdapter for GitLab {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn write_header(&self, out: &mut dyn Write, build_base: &str) -> Result<()> {
        let sudo_var = if self.sudo.is_some() { " %gl_sudo%" } else { "" };
        writeln!(
            out,
            "SRCSRVCMD=srcsrv fetch %gl_host% %gl_uri% %gl_api% %gl_project%{sudo_var} \
             %gl_commit% --cache=%srcsrvtrg% %var2% %var3% %var4%"
        )?;
        writeln!(out, "GL_BASE={build_base}")?;
        writeln!(out, "GL_HOST=--host=gitlab")?;
        writeln!(out, "GL_URI=--uri={}", self.uri)?;
        writeln!(out, "GL_COMMIT=--commit={}", self.commit)?;
        writeln!(out, "GL_PROJECT=--project-id={}", self.project_id)?;
        writeln!(out, "GL_API=--api={}", self.api)?;
        if let Some(sudo) = &self.sudo {
            writeln!(out, "GL_SUDO=--sudo={sudo}")?;
        }
        Ok(())
    }

    fn summarize(&self, arguments: &mut Map<String, Value>, level: Verbosity) {
        arguments.insert("--api".to_string(), json!(self.api));
        arguments.insert("--project-id".to_string(), json!(self.project_id));
        arguments.insert("--sudo".to_string(), json!(self.sudo));
        super::summarize_auth(arguments, GITLAB_AUTH_VAR, level);
    }

    fn fetch(
        &self,
        repo_dir: &str,
        file_name: &str,
        pdb_hash: &str,
        cache: &SourceCache,
    ) -> Result<PathBuf> {
        let cred = Credential::resolve(GITLAB_AUTH_VAR)?;
        let info_url = self.file_info_url(repo_dir, file_name);
        let origin = format!("{}/{}/{}", self.uri, self.project_id, repo_dir);

        cache.materialize(file_name, pdb_hash, &origin, &self.commit, || {
            // First resolve the path at this ref to a blob, then read it.
            let info = get_json(&info_url, ACCEPT_JSON, &cred)?;
            let blob_id = info
                .get("blob_id")
                .and_then(Value::as_str)
                .ok_or_else(|| SrcSrvError::HttpResponseShape {
                    url: info_url.clone(),
                    reason: "no blob_id field".to_string(),
                })?;
            get_bytes(&self.blob_url(blob_id), ACCEPT_JSON, &cred)
        })
    }
}

/// Percent-encodes every byte outside the unreserved set, including `/`,
/// as the repository-files endpoint requires.
fn encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len() * 3);
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
