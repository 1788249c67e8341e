// Turning raw source records into work items
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

use crate::{
    fallback::with_locale_fallback,
    locale::Locale,
    models::{
        Article, ExtraDescription, NotionPage, PageStatus, Project, ProjectVisibility,
        SourceRecord,
    },
    sources::CodeHostingRepository,
    telemetry::Logger,
    Error, Result,
};

/// Builds projects from repositories, folding in their extra descriptions
pub struct ProjectFactory {
    code_hosting: Arc<dyn CodeHostingRepository>,
    logger: Arc<dyn Logger>,
}

impl ProjectFactory {
    pub fn new(code_hosting: Arc<dyn CodeHostingRepository>, logger: Arc<dyn Logger>) -> Self {
        Self {
            code_hosting,
            logger,
        }
    }

    /// Produce the project for `record` in `locale`
    ///
    /// Only a malformed record is an error. Failing to get the extra
    /// description is logged and the plain repository data is used instead.
    pub async fn create(&self, record: SourceRecord, locale: Locale) -> Result<Project> {
        let project = base_project(&record)?;

        match self.fetch_extra_description(&record, locale).await {
            Some(extra) => Ok(merge_extra_description(project, extra)),
            None => Ok(project),
        }
    }

    async fn fetch_extra_description(
        &self,
        record: &SourceRecord,
        locale: Locale,
    ) -> Option<ExtraDescription> {
        let outcome = with_locale_fallback(locale, "extra description", &*self.logger, |l| {
            self.code_hosting
                .fetch_extra_description(&record.owner, &record.name, l)
        })
        .await;

        match outcome {
            Ok(extra) => extra,
            Err(e) => {
                self.logger.error(
                    "Failed to fetch extra portfolio description",
                    json!({
                        "owner": record.owner,
                        "repo": record.name,
                        "locale": locale.as_str(),
                        "reason": e.to_string(),
                    }),
                );
                None
            }
        }
    }
}

/// Project made from the repository fields alone
pub fn base_project(record: &SourceRecord) -> Result<Project> {
    record.validate()?;

    let tags = if !record.topics.is_empty() {
        record.topics.clone()
    } else {
        record.language.iter().cloned().collect()
    };

    Ok(Project {
        id: format!("gh-{}", record.id),
        title: record.name.clone(),
        description: record.description.clone().unwrap_or_default(),
        tags,
        link: record.html_url.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        website_url: record
            .homepage
            .clone()
            .filter(|homepage| !homepage.trim().is_empty()),
        complexity: None,
        starts_open: None,
        visibility: ProjectVisibility {
            archived: record.archived,
            ..ProjectVisibility::default()
        },
    })
}

/// Apply every field the override actually sets
pub fn merge_extra_description(mut project: Project, extra: ExtraDescription) -> Project {
    if let Some(description) = extra.custom_description {
        project.description = description;
    }
    if let Some(title) = extra.title.filter(|t| !t.trim().is_empty()) {
        project.title = title;
    }
    if !extra.custom_topics.is_empty() {
        project.tags = dedup_tags(extra.custom_topics);
    }
    if extra.website_url.is_some() {
        project.website_url = extra.website_url;
    }
    if extra.complexity.is_some() {
        project.complexity = extra.complexity;
    }
    if extra.starts_open.is_some() {
        project.starts_open = extra.starts_open;
    }
    project.visibility.show_even_archived = extra.show_even_archived;
    project.visibility.hidden = extra.is_hidden;
    project
}

/// Drop repeated tags, keeping the first occurrence of each
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Builds articles from exported Notion pages
pub struct ArticleFactory;

impl ArticleFactory {
    pub fn from_notion_page(page: NotionPage) -> Result<Article> {
        if page.id.trim().is_empty() {
            return Err(Error::InvalidRecord(format!(
                "Notion page {:?} has no id",
                page.title
            )));
        }

        Ok(Article {
            id: format!("notion-{}", page.id),
            title: page.title,
            description: page.description,
            tags: page.tags,
            link: page.url,
            published_at: page.published_at,
        })
    }

    /// Published pages only; drafts never leave the workspace
    ///
    /// Pages without an id are skipped with an error log.
    pub fn from_notion_pages(pages: Vec<NotionPage>) -> Vec<Article> {
        pages
            .into_iter()
            .filter(|page| page.status == PageStatus::Published)
            .filter_map(|page| match Self::from_notion_page(page) {
                Ok(article) => Some(article),
                Err(e) => {
                    error!("Skipping Notion page: {}", e);
                    None
                }
            })
            .collect()
    }
}
