//! Publishing the synchronized graph as a pull request.
//!
//! The reconciliation core hands over a finished serialization; this module
//! has no awareness of graphs or wikibases. It talks to the GitHub REST API:
//! read the base branch head, create the sync branch from it, commit the
//! file, open the pull request. Failures propagate; nothing is retried.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::config::HostingConfig;
use crate::error::{HostingError, SyncResult};

const COMMIT_MESSAGE: &str = "ontology synchronization";
const PULL_REQUEST_TITLE: &str = "Ontology synchronization";

/// An opened pull request.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

/// Minimal GitHub REST v3 client with token auth.
pub struct GithubClient {
    api_base: String,
    token: String,
    http: ureq::Agent,
}

impl GithubClient {
    /// Client against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base("https://api.github.com", token)
    }

    /// Client against a different API base (GitHub Enterprise, tests).
    pub fn with_base(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            http: ureq::Agent::new(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.http
            .request(method, &format!("{}{path}", self.api_base))
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "sesh-sync")
    }

    fn get(&self, path: &str) -> Result<Value, HostingError> {
        let response = self
            .request("GET", path)
            .call()
            .map_err(|e| HostingError::Request {
                message: e.to_string(),
            })?;
        response.into_json().map_err(|e| HostingError::Response {
            message: format!("response is not JSON: {e}"),
        })
    }

    fn send(&self, method: &str, path: &str, body: Value) -> Result<Value, HostingError> {
        let response =
            self.request(method, path)
                .send_json(body)
                .map_err(|e| HostingError::Request {
                    message: e.to_string(),
                })?;
        response.into_json().map_err(|e| HostingError::Response {
            message: format!("response is not JSON: {e}"),
        })
    }

    /// Commit sha at the head of a branch.
    pub fn branch_head(&self, repository: &str, branch: &str) -> Result<String, HostingError> {
        let document = self.get(&format!("/repos/{repository}/branches/{branch}"))?;
        document
            .get("commit")
            .and_then(|c| c.get("sha"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HostingError::Response {
                message: format!("no commit sha for branch {branch}"),
            })
    }

    /// Create a branch pointing at a commit sha.
    pub fn create_branch(
        &self,
        repository: &str,
        name: &str,
        sha: &str,
    ) -> Result<(), HostingError> {
        self.send(
            "POST",
            &format!("/repos/{repository}/git/refs"),
            json!({ "ref": format!("refs/heads/{name}"), "sha": sha }),
        )?;
        tracing::info!(branch = name, "created branch");
        Ok(())
    }

    /// Commit a file to a branch through the contents API.
    pub fn create_file(
        &self,
        repository: &str,
        path: &str,
        content: &str,
        branch: &str,
    ) -> Result<(), HostingError> {
        self.send(
            "PUT",
            &format!("/repos/{repository}/contents/{path}"),
            json!({
                "message": COMMIT_MESSAGE,
                "content": BASE64.encode(content.as_bytes()),
                "branch": branch,
            }),
        )?;
        tracing::info!(file = path, branch, "created file");
        Ok(())
    }

    /// Open a pull request from `head` into `base`.
    pub fn open_pull_request(
        &self,
        repository: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, HostingError> {
        let document = self.send(
            "POST",
            &format!("/repos/{repository}/pulls"),
            json!({ "title": title, "body": body, "head": head, "base": base }),
        )?;
        let number = document
            .get("number")
            .and_then(Value::as_u64)
            .ok_or_else(|| HostingError::Response {
                message: "pull request response has no number".to_string(),
            })?;
        let url = document
            .get("html_url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::info!(number, "opened pull request");
        Ok(PullRequest { number, url })
    }

    /// Full publish flow: branch from the base head, commit the
    /// serialization, open the pull request.
    pub fn publish(&self, hosting: &HostingConfig, content: &str) -> SyncResult<PullRequest> {
        let sha = self.branch_head(&hosting.repository, &hosting.base_branch)?;
        self.create_branch(&hosting.repository, &hosting.sync_branch, &sha)?;
        self.create_file(
            &hosting.repository,
            &hosting.file_path,
            content,
            &hosting.sync_branch,
        )?;
        let body = format!(
            "Synchronized ontology changes from `{}` into `{}`.",
            hosting.sync_branch, hosting.base_branch
        );
        let pull_request = self.open_pull_request(
            &hosting.repository,
            PULL_REQUEST_TITLE,
            &body,
            &hosting.sync_branch,
            &hosting.base_branch,
        )?;
        Ok(pull_request)
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}
