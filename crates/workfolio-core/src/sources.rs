use async_trait::async_trait;
use std::fmt;

use crate::{
    locale::Locale,
    models::{Article, Certification, ExtraDescription, SourceRecord},
    Result,
};

/// Code-hosting provider: the projects source
///
/// Implementations signal a locale they have no content for with
/// [`crate::Error::LocaleNotSupported`]; any other error means the source
/// itself is in trouble.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeHostingRepository: Send + Sync {
    async fn fetch_repositories(&self) -> Result<Vec<SourceRecord>>;

    /// `Ok(None)` when the repository simply has no override
    async fn fetch_extra_description(
        &self,
        owner: &str,
        repo: &str,
        locale: Locale,
    ) -> Result<Option<ExtraDescription>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn fetch_articles(&self, locale: Locale) -> Result<Vec<Article>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationRepository: Send + Sync {
    async fn fetch_certifications(&self, locale: Locale) -> Result<Vec<Certification>>;
}

/// The three upstream sources, named for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkSource {
    Projects,
    Articles,
    Certifications,
}

impl WorkSource {
    pub fn name(&self) -> &'static str {
        match self {
            WorkSource::Projects => "projects",
            WorkSource::Articles => "articles",
            WorkSource::Certifications => "certifications",
        }
    }
}

impl fmt::Display for WorkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
