//! GitHub REST client implementing the Gangway hosting traits.
//!
//! File content is fetched with the `application/vnd.github.raw` media type,
//! so no base64 envelope decoding is involved; directory listings use the
//! JSON media type. A 404 on a content read is data (`None` / empty listing),
//! never an error.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use gangway_core::{
    ChangedFile, CheckReporter, CheckResult, HostError, HostResult, PlatformActions,
    PullRequestEvent, PullRequestState, RepoHost, RepoRef,
};

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// GitHub API configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL (overridable for GitHub Enterprise or test servers)
    pub api_url: String,
    /// Installation or personal access token (optional for public reads)
    pub token: Option<String>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            token: std::env::var("GITHUB_TOKEN").ok(),
            user_agent: format!("gangway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GitHubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API base URL
    pub fn new(api_url: &str) -> Self {
        GitHubConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
            user_agent: format!("gangway/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// GitHub REST client
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    /// Create a new client
    pub fn new(config: GitHubConfig) -> HostResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| HostError::Request(err.to_string()))?;
        Ok(GitHubClient { config, http })
    }

    /// Create a client from environment variables
    pub fn from_env() -> HostResult<Self> {
        Self::new(GitHubConfig::from_env())
    }

    /// Fetch pull request metadata and map it to a pipeline event.
    pub async fn pull_request_event(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> HostResult<PullRequestEvent> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.config.api_url, repo.owner, repo.name, number
        );
        let response = self.get(&url, JSON_MEDIA_TYPE).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status, response).await);
        }

        let pr: PullRequestPayload = response
            .json()
            .await
            .map_err(|err| HostError::Malformed(err.to_string()))?;
        Ok(pr.into_event(repo.clone()))
    }

    async fn get(&self, url: &str, accept: &str) -> HostResult<reqwest::Response> {
        debug!(url, "GET");
        let mut request = self.http.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        request
            .send()
            .await
            .map_err(|err| HostError::Request(err.to_string()))
    }

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        body: &serde_json::Value,
    ) -> HostResult<()> {
        let mut request = request.header(ACCEPT, JSON_MEDIA_TYPE).json(body);
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request
            .send()
            .await
            .map_err(|err| HostError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status, response).await);
        }
        Ok(())
    }

    async fn status_error(&self, status: StatusCode, response: reqwest::Response) -> HostError {
        let message = response.text().await.unwrap_or_default();
        HostError::Response {
            status: status.as_u16(),
            message,
        }
    }

    fn contents_url(&self, repo: &RepoRef, path: &str, revision: Option<&str>) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url, repo.owner, repo.name, path
        );
        if let Some(revision) = revision {
            url.push_str(&format!("?ref={revision}"));
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    state: String,
    head: HeadPayload,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

impl PullRequestPayload {
    fn into_event(self, repo: RepoRef) -> PullRequestEvent {
        let state = if self.state == "open" {
            PullRequestState::Open
        } else {
            PullRequestState::Closed
        };
        PullRequestEvent {
            number: self.number,
            state,
            revision: self.head.sha,
            author_login: self.user.login,
            repo,
        }
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn list_changed_files(
        &self,
        repo: &RepoRef,
        pull_number: u64,
    ) -> HostResult<Vec<ChangedFile>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files?per_page=100",
            self.config.api_url, repo.owner, repo.name, pull_number
        );
        let response = self.get(&url, JSON_MEDIA_TYPE).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status, response).await);
        }

        let files: Vec<PullRequestFile> = response
            .json()
            .await
            .map_err(|err| HostError::Malformed(err.to_string()))?;
        Ok(files
            .into_iter()
            .map(|f| ChangedFile::new(f.filename))
            .collect())
    }

    async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        revision: Option<&str>,
    ) -> HostResult<Option<Vec<u8>>> {
        let url = self.contents_url(repo, path, revision);
        let response = self.get(&url, RAW_MEDIA_TYPE).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.status_error(status, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| HostError::Request(err.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }

    async fn list_folder(
        &self,
        repo: &RepoRef,
        path: &str,
        revision: Option<&str>,
    ) -> HostResult<Vec<String>> {
        let url = self.contents_url(repo, path, revision);
        let response = self.get(&url, JSON_MEDIA_TYPE).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(self.status_error(status, response).await);
        }

        let entries: Vec<ContentEntry> = response
            .json()
            .await
            .map_err(|err| HostError::Malformed(err.to_string()))?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind == "file")
            .map(|entry| entry.name)
            .collect())
    }
}

#[async_trait]
impl CheckReporter for GitHubClient {
    async fn report(
        &self,
        repo: &RepoRef,
        revision: &str,
        result: &CheckResult,
    ) -> HostResult<()> {
        let url = format!(
            "{}/repos/{}/{}/check-runs",
            self.config.api_url, repo.owner, repo.name
        );
        let body = json!({
            "name": result.name,
            "head_sha": revision,
            "status": "completed",
            "conclusion": result.conclusion,
            "completed_at": Utc::now().to_rfc3339(),
            "output": {
                "title": result.title,
                "summary": result.summary,
            },
        });
        self.send_json(self.http.post(&url), &body).await
    }
}

#[async_trait]
impl PlatformActions for GitHubClient {
    async fn post_comment(&self, repo: &RepoRef, pull_number: u64, body: &str) -> HostResult<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.config.api_url, repo.owner, repo.name, pull_number
        );
        self.send_json(self.http.post(&url), &json!({ "body": body }))
            .await
    }

    async fn close_pull_request(&self, repo: &RepoRef, pull_number: u64) -> HostResult<()> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.config.api_url, repo.owner, repo.name, pull_number
        );
        self.send_json(self.http.patch(&url), &json!({ "state": "closed" }))
            .await
    }
}
