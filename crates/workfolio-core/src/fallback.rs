// Locale fallback shared by every locale-dependent source call
use serde_json::json;
use std::future::Future;

use crate::{locale::Locale, telemetry::Logger, Error, Result};

/// Call `fetch` for `locale`, retrying once with the default locale when the
/// source reports the locale as unsupported.
///
/// The retry happens at most once and its outcome is returned as is. Other
/// errors, and unsupported-locale errors for the default locale itself, are
/// returned without a retry.
pub async fn with_locale_fallback<T, F, Fut>(
    locale: Locale,
    subject: &str,
    logger: &dyn Logger,
    mut fetch: F,
) -> Result<T>
where
    F: FnMut(Locale) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match fetch(locale).await {
        Err(err) if should_fall_back(&err, locale) => {
            logger.add_breadcrumb(
                &format!("Falling back to default locale for {}", subject),
                json!({
                    "requestedLocale": locale.as_str(),
                    "fallbackLocale": Locale::DEFAULT.as_str(),
                }),
            );
            fetch(Locale::DEFAULT).await
        }
        outcome => outcome,
    }
}

fn should_fall_back(err: &Error, locale: Locale) -> bool {
    err.is_locale_not_supported() && !locale.is_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryLogger;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_success_does_not_fall_back() {
        let logger = MemoryLogger::new();
        let calls = Mutex::new(Vec::new());

        let result = with_locale_fallback(Locale::PtBr, "articles", &logger, |l| {
            calls.lock().unwrap().push(l);
            async move { Ok::<_, Error>(l.as_str()) }
        })
        .await;

        assert_eq!(result.unwrap(), "pt-br");
        assert_eq!(*calls.lock().unwrap(), vec![Locale::PtBr]);
        assert!(logger.breadcrumbs().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_locale_retries_with_default() {
        let logger = MemoryLogger::new();
        let calls = Mutex::new(Vec::new());

        let result = with_locale_fallback(Locale::PtBr, "articles", &logger, |l| {
            calls.lock().unwrap().push(l);
            async move {
                match l {
                    Locale::En => Ok("english"),
                    other => Err(Error::LocaleNotSupported(other)),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "english");
        assert_eq!(*calls.lock().unwrap(), vec![Locale::PtBr, Locale::En]);

        let crumbs = logger.breadcrumbs();
        assert_eq!(crumbs.len(), 1);
        assert_eq!(crumbs[0].context["requestedLocale"], "pt-br");
        assert_eq!(crumbs[0].context["fallbackLocale"], "en");
    }

    #[tokio::test]
    async fn test_failed_fallback_is_returned_without_another_retry() {
        let logger = MemoryLogger::new();
        let calls = Mutex::new(0);

        let result: Result<()> = with_locale_fallback(Locale::PtBr, "articles", &logger, |l| {
            *calls.lock().unwrap() += 1;
            async move { Err(Error::LocaleNotSupported(l)) }
        })
        .await;

        assert!(matches!(result, Err(Error::LocaleNotSupported(Locale::En))));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_default_locale_is_never_retried() {
        let logger = MemoryLogger::new();
        let calls = Mutex::new(0);

        let result: Result<()> = with_locale_fallback(Locale::En, "articles", &logger, |l| {
            *calls.lock().unwrap() += 1;
            async move { Err(Error::LocaleNotSupported(l)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(logger.breadcrumbs().is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let logger = MemoryLogger::new();
        let calls = Mutex::new(0);

        let result: Result<()> = with_locale_fallback(Locale::PtBr, "articles", &logger, |_| {
            *calls.lock().unwrap() += 1;
            async { Err(Error::source_unavailable("articles", "connection reset")) }
        })
        .await;

        assert!(matches!(result, Err(Error::SourceUnavailable { .. })));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
