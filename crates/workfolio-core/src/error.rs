use thiserror::Error;

use crate::locale::Locale;

/// Everything that can go wrong while gathering public work
///
/// `LocaleNotSupported` is the one kind callers react to (by retrying with
/// the default locale). The rest are reported and degraded around.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Locale not supported by source: {0}")]
    LocaleNotSupported(Locale),

    #[error("Invalid locale: {0:?}")]
    InvalidLocale(String),

    #[error("{service} unavailable: {reason}")]
    SourceUnavailable { service: String, reason: String },

    #[error("Malformed source record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub fn source_unavailable(service: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::SourceUnavailable {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_locale_not_supported(&self) -> bool {
        matches!(self, Error::LocaleNotSupported(_))
    }
}
