// GitHub provider - bridges the API client with the CodeHostingRepository port
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use workfolio_api::{GitHubClient, GitHubError, GitHubRepo, RawPortfolioDescription};

use crate::{
    locale::Locale,
    models::{Complexity, ExtraDescription, SourceRecord},
    sources::CodeHostingRepository,
    telemetry::Logger,
    Error, Result,
};

const SERVICE: &str = "GitHub API";

/// Projects come from one user's public GitHub repositories
pub struct GitHubRepositorySource {
    client: GitHubClient,
    username: String,
    logger: Arc<dyn Logger>,
}

impl GitHubRepositorySource {
    pub fn new(client: GitHubClient, username: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            client,
            username: username.into(),
            logger,
        }
    }
}

#[async_trait]
impl CodeHostingRepository for GitHubRepositorySource {
    async fn fetch_repositories(&self) -> Result<Vec<SourceRecord>> {
        let repos = self
            .client
            .list_user_repos(&self.username)
            .await
            .map_err(|e| {
                self.logger.error(
                    "Failed to fetch GitHub repositories",
                    json!({ "username": self.username, "reason": e.to_string() }),
                );
                Error::source_unavailable(SERVICE, e)
            })?;

        Ok(repos.into_iter().map(github_to_record).collect())
    }

    async fn fetch_extra_description(
        &self,
        owner: &str,
        repo: &str,
        locale: Locale,
    ) -> Result<Option<ExtraDescription>> {
        let context = json!({ "owner": owner, "repo": repo, "locale": locale.as_str() });

        match self
            .client
            .get_portfolio_description(owner, repo, locale.as_str())
            .await
        {
            Ok(raw) => Ok(Some(self.to_extra_description(raw, &context))),
            // Only the default locale's file is mandatory for an override to exist
            Err(GitHubError::NotFound(_)) if !locale.is_default() => {
                Err(Error::LocaleNotSupported(locale))
            }
            Err(GitHubError::NotFound(_)) => Ok(None),
            Err(GitHubError::Forbidden(_)) | Err(GitHubError::RateLimitExceeded) => {
                self.logger.warn(
                    &format!("GitHub rate limit or forbidden when fetching {}/{}", owner, repo),
                    context,
                );
                Ok(None)
            }
            Err(e) => {
                self.logger.error(
                    &format!("Failed to fetch extra portfolio description from {}/{}", owner, repo),
                    json!({ "owner": owner, "repo": repo, "locale": locale.as_str(), "reason": e.to_string() }),
                );
                Ok(None)
            }
        }
    }
}

impl GitHubRepositorySource {
    fn to_extra_description(
        &self,
        raw: RawPortfolioDescription,
        context: &serde_json::Value,
    ) -> ExtraDescription {
        let complexity = raw.complexity.as_deref().and_then(|label| {
            label
                .parse::<Complexity>()
                .map_err(|e| {
                    self.logger
                        .warn(&format!("Ignoring complexity: {}", e), context.clone())
                })
                .ok()
        });

        ExtraDescription {
            title: raw.title,
            custom_description: raw.description,
            custom_topics: raw.tags,
            website_url: raw.website_url,
            complexity,
            starts_open: raw.starts_open,
            show_even_archived: raw.show_even_archived,
            is_hidden: raw.is_hidden,
        }
    }
}

/// Convert a GitHub API repo to our source record
fn github_to_record(gh: GitHubRepo) -> SourceRecord {
    SourceRecord {
        id: gh.id,
        name: gh.name,
        full_name: gh.full_name,
        owner: gh.owner.login,
        description: gh.description,
        html_url: gh.html_url,
        topics: gh.topics,
        created_at: gh.created_at,
        updated_at: gh.updated_at,
        language: gh.language,
        stargazers_count: gh.stargazers_count,
        homepage: gh.homepage,
        archived: gh.archived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ProjectFactory;
    use crate::telemetry::{LogLevel, MemoryLogger};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use workfolio_api::{GitHubOwner, RetryConfig};

    const EN_FILE: &str = "/repos/octo/tool/contents/portfolio-description_en.json";
    const PT_FILE: &str = "/repos/octo/tool/contents/portfolio-description_pt-br.json";

    /// Minimal HTTP server answering canned `(status, body)` per path
    ///
    /// Unknown paths get a 404. Every requested path is recorded.
    struct StubGitHub {
        base_url: String,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl StubGitHub {
        async fn start(routes: Vec<(&str, u16, &str)>) -> Self {
            let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
                routes
                    .into_iter()
                    .map(|(path, status, body)| (path.to_string(), (status, body.to_string())))
                    .collect(),
            );
            let requests = Arc::new(Mutex::new(Vec::new()));
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());

            let recorded = requests.clone();
            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }

                        let request = String::from_utf8_lossy(&buf).to_string();
                        let target = request.split_whitespace().nth(1).unwrap_or("/");
                        let path = target.split('?').next().unwrap_or("/").to_string();
                        recorded.lock().unwrap().push(path.clone());

                        let (status, body) = routes
                            .get(&path)
                            .cloned()
                            .unwrap_or((404, r#"{"message":"Not Found"}"#.to_string()));
                        let response = format!(
                            "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            });

            Self { base_url, requests }
        }

        fn source(&self, logger: Arc<MemoryLogger>) -> GitHubRepositorySource {
            let client =
                GitHubClient::with_base_url(None, self.base_url.clone(), Duration::from_secs(5))
                    .unwrap()
                    .with_retry_config(RetryConfig::disabled());
            GitHubRepositorySource::new(client, "octo", logger)
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn levels(logger: &MemoryLogger) -> Vec<LogLevel> {
        logger.entries().into_iter().map(|entry| entry.level).collect()
    }

    #[tokio::test]
    async fn test_lists_repositories_as_records() {
        let stub = StubGitHub::start(vec![(
            "/users/octo/repos",
            200,
            r#"[{"id": 7, "name": "tool", "full_name": "octo/tool", "owner": {"login": "octo"},
                 "description": "A tool", "html_url": "https://github.com/octo/tool",
                 "homepage": null, "topics": ["cli"], "created_at": null, "updated_at": null,
                 "language": "Rust", "stargazers_count": 1, "archived": false}]"#,
        )])
        .await;

        let records = stub
            .source(Arc::new(MemoryLogger::new()))
            .fetch_repositories()
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner, "octo");
        assert_eq!(records[0].topics, vec!["cli"]);
    }

    #[tokio::test]
    async fn test_failed_listing_is_source_unavailable() {
        let stub = StubGitHub::start(vec![("/users/octo/repos", 500, "oops")]).await;
        let logger = Arc::new(MemoryLogger::new());

        let result = stub.source(logger.clone()).fetch_repositories().await;

        assert!(matches!(result, Err(Error::SourceUnavailable { .. })));
        assert_eq!(levels(&logger), vec![LogLevel::Error]);
    }

    #[tokio::test]
    async fn test_missing_file_for_other_locale_is_locale_not_supported() {
        let stub = StubGitHub::start(vec![]).await;

        let result = stub
            .source(Arc::new(MemoryLogger::new()))
            .fetch_extra_description("octo", "tool", Locale::PtBr)
            .await;

        assert!(matches!(result, Err(Error::LocaleNotSupported(Locale::PtBr))));
        assert_eq!(stub.requests(), vec![PT_FILE]);
    }

    #[tokio::test]
    async fn test_missing_file_for_default_locale_means_no_override() {
        let stub = StubGitHub::start(vec![]).await;
        let logger = Arc::new(MemoryLogger::new());

        let result = stub
            .source(logger.clone())
            .fetch_extra_description("octo", "tool", Locale::En)
            .await;

        assert_eq!(result.unwrap(), None);
        assert!(logger.entries().is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_and_rate_limited_warn_without_override() {
        for status in [403, 429] {
            let stub = StubGitHub::start(vec![(EN_FILE, status, "{}")]).await;
            let logger = Arc::new(MemoryLogger::new());

            let result = stub
                .source(logger.clone())
                .fetch_extra_description("octo", "tool", Locale::En)
                .await;

            assert_eq!(result.unwrap(), None, "status {}", status);
            assert_eq!(levels(&logger), vec![LogLevel::Warn], "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_server_error_and_bad_json_log_errors_without_override() {
        for (status, body) in [(500, "boom"), (200, "{ not json")] {
            let stub = StubGitHub::start(vec![(EN_FILE, status, body)]).await;
            let logger = Arc::new(MemoryLogger::new());

            let result = stub
                .source(logger.clone())
                .fetch_extra_description("octo", "tool", Locale::En)
                .await;

            assert_eq!(result.unwrap(), None, "status {}", status);
            assert_eq!(levels(&logger), vec![LogLevel::Error], "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_project_falls_back_to_english_override() {
        let stub = StubGitHub::start(vec![(
            EN_FILE,
            200,
            r#"{"description": "EN override", "tags": ["a", "b", "a"]}"#,
        )])
        .await;
        let logger = Arc::new(MemoryLogger::new());
        let factory = ProjectFactory::new(Arc::new(stub.source(logger.clone())), logger.clone());

        let project = factory
            .create(
                SourceRecord::new(1, "octo", "tool").with_description("Plain"),
                Locale::PtBr,
            )
            .await
            .unwrap();

        assert_eq!(project.description, "EN override");
        assert_eq!(project.tags, vec!["a", "b"]);
        assert_eq!(stub.requests(), vec![PT_FILE, EN_FILE]);
        assert_eq!(logger.breadcrumbs().len(), 1);
        assert!(logger.errors().is_empty());
    }

    #[test]
    fn test_github_repo_maps_to_record() {
        let gh = GitHubRepo {
            id: 789012,
            name: "portfolio".into(),
            full_name: "octo/portfolio".into(),
            owner: GitHubOwner {
                login: "octo".into(),
            },
            description: Some("Monorepo".into()),
            html_url: "https://github.com/octo/portfolio".into(),
            homepage: Some("https://example.com".into()),
            topics: vec!["svelte".into()],
            created_at: None,
            updated_at: None,
            language: Some("TypeScript".into()),
            stargazers_count: 3,
            archived: true,
        };

        let record = github_to_record(gh);
        assert_eq!(record.owner, "octo");
        assert_eq!(record.name, "portfolio");
        assert_eq!(record.homepage.as_deref(), Some("https://example.com"));
        assert!(record.archived);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_raw_description_maps_and_drops_unknown_complexity() {
        let logger = Arc::new(MemoryLogger::new());
        let client = GitHubClient::new(None).unwrap();
        let source = GitHubRepositorySource::new(client, "octo", logger.clone());

        let extra = source.to_extra_description(
            RawPortfolioDescription {
                title: Some("Title".into()),
                description: Some("Custom".into()),
                tags: vec!["rust".into()],
                complexity: Some("galactic".into()),
                show_even_archived: true,
                ..RawPortfolioDescription::default()
            },
            &json!({ "owner": "octo", "repo": "portfolio" }),
        );

        assert_eq!(extra.custom_description.as_deref(), Some("Custom"));
        assert_eq!(extra.custom_topics, vec!["rust"]);
        assert!(extra.complexity.is_none());
        assert!(extra.show_even_archived);
        assert_eq!(logger.entries().len(), 1);
    }

    #[test]
    fn test_known_complexity_is_kept() {
        let client = GitHubClient::new(None).unwrap();
        let source = GitHubRepositorySource::new(client, "octo", Arc::new(MemoryLogger::new()));

        let extra = source.to_extra_description(
            RawPortfolioDescription {
                complexity: Some("medium".into()),
                ..RawPortfolioDescription::default()
            },
            &serde_json::Value::Null,
        );
        assert_eq!(extra.complexity, Some(Complexity::Medium));
    }
}
