// Aggregation with a per-locale TTL cache in front
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use workfolio_cache::TtlCache;

use crate::{
    aggregate::WorkItemsService, config::CacheConfig, locale::Locale, models::WorkItem,
    telemetry::Logger, Result,
};

/// Serves public work items, re-aggregating at most once per TTL per locale
///
/// Two concurrent misses for the same locale both aggregate and the later
/// one overwrites the earlier result. Requests are not coalesced.
pub struct PublicWorkService {
    work_items: WorkItemsService,
    cache: TtlCache<Locale, Vec<WorkItem>>,
    logger: Arc<dyn Logger>,
}

impl PublicWorkService {
    pub fn new(work_items: WorkItemsService, ttl: Duration, logger: Arc<dyn Logger>) -> Self {
        Self {
            work_items,
            cache: TtlCache::new(ttl),
            logger,
        }
    }

    pub fn from_config(
        work_items: WorkItemsService,
        config: &CacheConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::new(work_items, config.ttl(), logger)
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    pub async fn get_all(&self, locale: Locale) -> Vec<WorkItem> {
        if let Some(items) = self.cache.get_fresh(&locale) {
            self.logger.add_breadcrumb(
                "Public work cache hit",
                json!({ "locale": locale.as_str(), "itemCount": items.len() }),
            );
            return items;
        }

        let items = self.work_items.get_all(locale).await;
        self.cache.insert(locale, items.clone());
        self.logger.add_breadcrumb(
            "Public work cache updated",
            json!({ "locale": locale.as_str(), "itemCount": items.len() }),
        );
        items
    }

    /// Same as [`PublicWorkService::get_all`] for an unvalidated locale tag
    pub async fn get_all_str(&self, locale: &str) -> Result<Vec<WorkItem>> {
        let locale: Locale = locale.parse()?;
        Ok(self.get_all(locale).await)
    }

    /// Forget the cached items of one locale
    pub fn invalidate(&self, locale: Locale) -> bool {
        self.cache.invalidate(&locale)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRecord;
    use crate::shuffle::Shuffler;
    use crate::sources::{
        MockArticleRepository, MockCertificationRepository, MockCodeHostingRepository,
    };
    use crate::telemetry::MemoryLogger;
    use crate::Error;

    const TTL: Duration = Duration::from_millis(3_600_000);

    fn service_expecting(fetches: usize, logger: Arc<MemoryLogger>) -> PublicWorkService {
        let mut code_hosting = MockCodeHostingRepository::new();
        code_hosting
            .expect_fetch_repositories()
            .times(fetches)
            .returning(|| Ok(vec![SourceRecord::new(1, "octo", "tool").with_description("A tool")]));
        code_hosting
            .expect_fetch_extra_description()
            .returning(|_, _, _| Ok(None));

        let mut articles = MockArticleRepository::new();
        articles.expect_fetch_articles().returning(|_| Ok(vec![]));
        let mut certifications = MockCertificationRepository::new();
        certifications
            .expect_fetch_certifications()
            .returning(|_| Ok(vec![]));

        let work_items = WorkItemsService::new(
            Arc::new(code_hosting),
            Arc::new(articles),
            Arc::new(certifications),
            logger.clone(),
        )
        .with_shuffler(Shuffler::seeded(1));

        PublicWorkService::new(work_items, TTL, logger)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_is_served_from_cache() {
        let logger = Arc::new(MemoryLogger::new());
        let service = service_expecting(1, logger.clone());

        let first = service.get_all(Locale::En).await;
        let second = service.get_all(Locale::En).await;

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);

        let messages: Vec<_> = logger
            .breadcrumbs()
            .into_iter()
            .map(|crumb| crumb.message)
            .collect();
        assert_eq!(
            messages,
            vec!["Public work cache updated", "Public work cache hit"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_new_aggregation() {
        let service = service_expecting(2, Arc::new(MemoryLogger::new()));

        service.get_all(Locale::En).await;
        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        service.get_all(Locale::En).await;
        tokio::time::advance(Duration::from_millis(1)).await;
        service.get_all(Locale::En).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_locales_are_cached_independently() {
        let service = service_expecting(2, Arc::new(MemoryLogger::new()));

        service.get_all(Locale::En).await;
        service.get_all(Locale::PtBr).await;
        service.get_all(Locale::En).await;
        service.get_all(Locale::PtBr).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let service = service_expecting(2, Arc::new(MemoryLogger::new()));

        service.get_all(Locale::En).await;
        assert!(service.invalidate(Locale::En));
        service.get_all(Locale::En).await;
    }

    #[tokio::test]
    async fn test_invalid_locale_is_rejected_before_fetching() {
        let service = service_expecting(0, Arc::new(MemoryLogger::new()));

        let result = service.get_all_str("fr").await;
        assert!(matches!(result, Err(Error::InvalidLocale(ref s)) if s == "fr"));

        let result = service.get_all_str("PT-BR").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_ttl_comes_from_config() {
        let config = CacheConfig { ttl_ms: 5_000 };
        let service = PublicWorkService::from_config(
            service_expecting(0, Arc::new(MemoryLogger::new())).work_items,
            &config,
            Arc::new(MemoryLogger::new()),
        );
        assert_eq!(service.ttl(), Duration::from_secs(5));
    }
}
