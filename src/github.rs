use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::error::Error;

/// Production API endpoint. Tests swap it out via
/// [`GithubClient::with_base_url`].
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Object-creation responses only ever matter for the new object's sha.
#[derive(Debug, Deserialize)]
struct ShaObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Branch {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
}

/// Authenticated wrapper over one repository's REST sub-resources.
///
/// One method per endpoint the tool touches. Every call is synchronous,
/// carries `Accept: application/vnd.github+json` plus a bearer token, and
/// times out after [`REQUEST_TIMEOUT`]. Shas are opaque 40-hex strings
/// returned by the API, never computed locally.
pub struct GithubClient {
    http: Client,
    base_url: String,
    username: String,
    repo_name: String,
}

impl GithubClient {
    /// Client against the real GitHub API.
    pub fn new(cfg: &Config) -> Result<Self, Error> {
        Self::with_base_url(cfg, DEFAULT_API_BASE)
    }

    /// Client against an arbitrary API base.
    pub fn with_base_url(cfg: &Config, base_url: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("kommitter/", env!("CARGO_PKG_VERSION"))),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.token))
            .map_err(|e| Error::Unexpected(e.into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: cfg.username.clone(),
            repo_name: cfg.repo_name.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.username, self.repo_name, endpoint
        )
    }

    /// GET the branch resource and return the sha of its tip commit.
    pub fn branch_tip_sha(&self, branch: &str) -> Result<String, Error> {
        let resp = self.http.get(self.url(&format!("branches/{branch}"))).send()?;
        let parsed: Branch = check_status(resp, &format!("branch `{branch}`"))?.json()?;
        Ok(parsed.commit.sha)
    }

    /// POST a new blob; returns its sha.
    pub fn create_blob(&self, content: &str, encoding: &str) -> Result<String, Error> {
        self.create_object("git/blobs", &json!({ "content": content, "encoding": encoding }))
    }

    /// POST a tree holding exactly one blob entry at `file_path`, layered on
    /// `base_tree_sha` so every other path is carried over; returns its sha.
    pub fn create_tree(
        &self,
        file_path: &str,
        blob_sha: &str,
        base_tree_sha: &str,
    ) -> Result<String, Error> {
        let body = json!({
            "base_tree": base_tree_sha,
            "tree": [{
                "path": file_path,
                "mode": "100644",
                "type": "blob",
                "sha": blob_sha,
            }],
        });
        self.create_object("git/trees", &body)
    }

    /// POST a commit with exactly one parent; returns its sha.
    pub fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, Error> {
        let body = json!({
            "message": message,
            "tree": tree_sha,
            "parents": [parent_sha],
        });
        self.create_object("git/commits", &body)
    }

    /// PATCH the branch ref to point at `sha`.
    pub fn update_ref(&self, branch: &str, sha: &str) -> Result<(), Error> {
        let resp = self
            .http
            .patch(self.url(&format!("git/refs/heads/{branch}")))
            .json(&json!({ "sha": sha }))
            .send()?;
        check_status(resp, &format!("ref `heads/{branch}`"))?;
        Ok(())
    }

    fn create_object(&self, endpoint: &str, body: &serde_json::Value) -> Result<String, Error> {
        let resp = self.http.post(self.url(endpoint)).json(body).send()?;
        let what = format!("repository `{}/{}`", self.username, self.repo_name);
        let parsed: ShaObject = check_status(resp, &what)?.json()?;
        Ok(parsed.sha)
    }
}

/// Pass a 2xx response through, map anything else onto the error taxonomy:
/// 401/403 are auth failures, 404 names the missing resource, the rest keep
/// status and body verbatim.
fn check_status(resp: Response, what: &str) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth { status, body },
        StatusCode::NOT_FOUND => Error::NotFound {
            what: what.to_string(),
        },
        _ => Error::Api { status, body },
    })
}
