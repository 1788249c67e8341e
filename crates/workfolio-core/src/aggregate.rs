// Fan-out over the three work sources
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::{
    factory::ProjectFactory,
    fallback::with_locale_fallback,
    locale::Locale,
    models::{
        Article, Certification, Project, ProjectVisibility, SourceRecord, WorkItem,
    },
    shuffle::Shuffler,
    sources::{ArticleRepository, CertificationRepository, CodeHostingRepository, WorkSource},
    telemetry::Logger,
    Result,
};

/// What to do with repositories that are archived upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchivedPolicy {
    /// Never list archived repositories
    Hide,
    /// List them only when their extra description sets `showEvenArchived`
    #[default]
    OptIn,
    /// List them like any other repository
    Show,
}

impl ArchivedPolicy {
    pub fn admits(&self, visibility: &ProjectVisibility) -> bool {
        if !visibility.archived {
            return true;
        }
        match self {
            ArchivedPolicy::Hide => false,
            ArchivedPolicy::OptIn => visibility.show_even_archived,
            ArchivedPolicy::Show => true,
        }
    }
}

/// Gathers every public work item for a locale
///
/// Sources are queried concurrently and fail independently: a broken
/// source contributes nothing and is logged, the others still show up.
/// [`WorkItemsService::get_all`] therefore never fails.
pub struct WorkItemsService {
    code_hosting: Arc<dyn CodeHostingRepository>,
    articles: Arc<dyn ArticleRepository>,
    certifications: Arc<dyn CertificationRepository>,
    project_factory: ProjectFactory,
    logger: Arc<dyn Logger>,
    archived_policy: ArchivedPolicy,
    shuffler: Shuffler,
}

impl WorkItemsService {
    pub fn new(
        code_hosting: Arc<dyn CodeHostingRepository>,
        articles: Arc<dyn ArticleRepository>,
        certifications: Arc<dyn CertificationRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            project_factory: ProjectFactory::new(code_hosting.clone(), logger.clone()),
            code_hosting,
            articles,
            certifications,
            logger,
            archived_policy: ArchivedPolicy::default(),
            shuffler: Shuffler::default(),
        }
    }

    pub fn with_archived_policy(mut self, policy: ArchivedPolicy) -> Self {
        self.archived_policy = policy;
        self
    }

    pub fn with_shuffler(mut self, shuffler: Shuffler) -> Self {
        self.shuffler = shuffler;
        self
    }

    pub async fn get_all(&self, locale: Locale) -> Vec<WorkItem> {
        let (repositories, articles, certifications) = tokio::join!(
            self.code_hosting.fetch_repositories(),
            with_locale_fallback(locale, "articles", &*self.logger, |l| {
                self.articles.fetch_articles(l)
            }),
            with_locale_fallback(locale, "certifications", &*self.logger, |l| {
                self.certifications.fetch_certifications(l)
            }),
        );

        let repositories = self.settle(WorkSource::Projects, repositories);
        let articles = self.drop_malformed(
            WorkSource::Articles,
            self.settle(WorkSource::Articles, articles),
            Article::validate,
        );
        let certifications = self.drop_malformed(
            WorkSource::Certifications,
            self.settle(WorkSource::Certifications, certifications),
            Certification::validate,
        );

        let projects = self.build_projects(repositories, locale).await;

        self.logger.info(
            "Aggregated public work items",
            json!({
                "locale": locale.as_str(),
                "projects": projects.len(),
                "articles": articles.len(),
                "certifications": certifications.len(),
            }),
        );

        let mut items: Vec<WorkItem> = projects
            .into_iter()
            .map(WorkItem::Project)
            .chain(articles.into_iter().map(WorkItem::Article))
            .chain(certifications.into_iter().map(WorkItem::Certification))
            .collect();

        self.shuffler.shuffle(&mut items);
        items
    }

    /// Unwrap one source's outcome, degrading a failure to nothing
    fn settle<T>(&self, source: WorkSource, outcome: Result<Vec<T>>) -> Vec<T> {
        match outcome {
            Ok(values) => values,
            Err(e) => {
                self.logger.error(
                    &format!("Failed to fetch {}", source),
                    json!({
                        "source": source.name(),
                        "reason": e.to_string(),
                    }),
                );
                Vec::new()
            }
        }
    }

    fn drop_malformed<T>(
        &self,
        source: WorkSource,
        values: Vec<T>,
        validate: impl Fn(&T) -> Result<()>,
    ) -> Vec<T> {
        values
            .into_iter()
            .filter(|value| match validate(value) {
                Ok(()) => true,
                Err(e) => {
                    self.logger.error(
                        "Skipping malformed record",
                        json!({ "source": source.name(), "reason": e.to_string() }),
                    );
                    false
                }
            })
            .collect()
    }

    async fn build_projects(&self, records: Vec<SourceRecord>, locale: Locale) -> Vec<Project> {
        let outcomes = join_all(
            records
                .into_iter()
                .map(|record| self.project_factory.create(record, locale)),
        )
        .await;

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(project) => Some(project),
                Err(e) => {
                    self.logger.error(
                        "Skipping malformed repository",
                        json!({ "reason": e.to_string() }),
                    );
                    None
                }
            })
            .filter(|project| self.is_presentable(project))
            .collect()
    }

    fn is_presentable(&self, project: &Project) -> bool {
        project.is_visible() && self.archived_policy.admits(&project.visibility)
    }
}
