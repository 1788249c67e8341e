use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("API request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GitHubError {
    /// Whether a new attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            GitHubError::RequestFailed { status, .. } => reqwest::StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            GitHubError::RateLimitExceeded => true,
            GitHubError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            GitHubError::NotFound(_) | GitHubError::Forbidden(_) | GitHubError::ParseError(_) => {
                false
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Thin client over the GitHub REST API
///
/// Only the two calls the work sources need: listing a user's public
/// repositories and reading a raw file from a repository's contents.
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    retry_config: RetryConfig,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(
            token,
            GITHUB_API_BASE.to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// For GitHub Enterprise or a local stand-in
    pub fn with_base_url(token: Option<String>, base_url: String, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("workfolio/0.1.0"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List a user's repositories, most recently pushed first
    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<GitHubRepo>> {
        let url = format!("{}/users/{}/repos", self.base_url, username);

        with_retry(&self.retry_config, GitHubError::is_transient, || async {
            let response = self
                .request(&url, "application/vnd.github.v3+json")
                .query(&[("per_page", "100"), ("sort", "pushed"), ("direction", "desc")])
                .send()
                .await?;

            let response = check_status(response, username).await?;
            let repos: Vec<GitHubRepo> = response.json().await?;
            debug!("Fetched {} repositories for {}", repos.len(), username);
            Ok(repos)
        })
        .await
    }

    /// Read the localized portfolio description file of a repository
    ///
    /// The file lives at the repository root as
    /// `portfolio-description_{locale}.json`. A missing file surfaces as
    /// [`GitHubError::NotFound`]; callers decide what that means.
    pub async fn get_portfolio_description(
        &self,
        owner: &str,
        repo: &str,
        locale: &str,
    ) -> Result<RawPortfolioDescription> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            owner,
            repo,
            portfolio_description_path(locale)
        );
        let target = format!("{}/{}", owner, repo);

        with_retry(&self.retry_config, GitHubError::is_transient, || async {
            let response = self
                .request(&url, "application/vnd.github.v3.raw")
                .send()
                .await?;

            let response = check_status(response, &target).await?;
            let text = response.text().await?;
            RawPortfolioDescription::from_json(&text)
        })
        .await
    }
}

/// File name of the description override for a locale tag
pub fn portfolio_description_path(locale: &str) -> String {
    format!("portfolio-description_{}.json", locale)
}

async fn check_status(response: reqwest::Response, target: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        reqwest::StatusCode::NOT_FOUND => Err(GitHubError::NotFound(target.to_string())),
        reqwest::StatusCode::TOO_MANY_REQUESTS => Err(GitHubError::RateLimitExceeded),
        reqwest::StatusCode::FORBIDDEN => Err(GitHubError::Forbidden(target.to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(GitHubError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: GitHubOwner,
    pub description: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// Contents of a `portfolio-description_{locale}.json` file, as written by hand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPortfolioDescription {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub starts_open: Option<bool>,
    #[serde(default)]
    pub complexity: Option<String>,
    #[serde(default)]
    pub show_even_archived: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

impl RawPortfolioDescription {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
