// Local JSON content: articles exported from Notion and certifications
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{
    factory::ArticleFactory,
    locale::Locale,
    models::{Article, Certification, NotionPage},
    sources::{ArticleRepository, CertificationRepository},
    Error, Result,
};

/// Read `{stem}_{locale}.json` from `dir`
///
/// A missing file means the locale has no content. A file that exists but
/// cannot be read or parsed makes the whole source unavailable.
async fn read_localized<T: DeserializeOwned>(
    dir: &Path,
    stem: &str,
    service: &str,
    locale: Locale,
) -> Result<Vec<T>> {
    let path = dir.join(format!("{}_{}.json", stem, locale));
    debug!("Reading {} from {}", service, path.display());

    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::LocaleNotSupported(locale)),
        Err(e) => return Err(Error::source_unavailable(service, e)),
    };

    serde_json::from_str(&contents).map_err(|e| {
        Error::source_unavailable(service, format!("{}: {}", path.display(), e))
    })
}

/// Articles published on Notion, exported to `articles_{locale}.json`
#[derive(Debug, Clone)]
pub struct LocalArticleRepository {
    data_dir: PathBuf,
}

impl LocalArticleRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl ArticleRepository for LocalArticleRepository {
    async fn fetch_articles(&self, locale: Locale) -> Result<Vec<Article>> {
        let pages: Vec<NotionPage> =
            read_localized(&self.data_dir, "articles", "Notion", locale).await?;
        Ok(ArticleFactory::from_notion_pages(pages))
    }
}

/// Certifications listed in `certifications_{locale}.json`
#[derive(Debug, Clone)]
pub struct LocalCertificationRepository {
    data_dir: PathBuf,
}

impl LocalCertificationRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl CertificationRepository for LocalCertificationRepository {
    async fn fetch_certifications(&self, locale: Locale) -> Result<Vec<Certification>> {
        read_localized(&self.data_dir, "certifications", "certifications", locale).await
    }
}
