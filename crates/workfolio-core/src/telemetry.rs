// Observability port used by the aggregation pipeline
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Where the pipeline reports what it is doing
///
/// Every method is infallible. Reporting never changes the outcome of an
/// aggregation.
pub trait Logger: Send + Sync {
    fn error(&self, message: &str, context: Value);
    fn warn(&self, message: &str, context: Value);
    fn info(&self, message: &str, context: Value);
    /// Record a step that may explain a later failure
    fn add_breadcrumb(&self, message: &str, data: Value);
}

/// Forwards everything to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str, context: Value) {
        error!(%context, "{}", message);
    }

    fn warn(&self, message: &str, context: Value) {
        warn!(%context, "{}", message);
    }

    fn info(&self, message: &str, context: Value) {
        info!(%context, "{}", message);
    }

    fn add_breadcrumb(&self, message: &str, data: Value) {
        debug!(target: "workfolio::breadcrumb", %data, "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Breadcrumb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: Value,
}

/// Keeps every entry in memory so tests can assert on them
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, level: LogLevel, message: &str, context: Value) {
        self.lock().push(LogEntry {
            level,
            message: message.to_string(),
            context,
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    pub fn breadcrumbs(&self) -> Vec<LogEntry> {
        self.at_level(LogLevel::Breadcrumb)
    }

    pub fn errors(&self) -> Vec<LogEntry> {
        self.at_level(LogLevel::Error)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn error(&self, message: &str, context: Value) {
        self.push(LogLevel::Error, message, context);
    }

    fn warn(&self, message: &str, context: Value) {
        self.push(LogLevel::Warn, message, context);
    }

    fn info(&self, message: &str, context: Value) {
        self.push(LogLevel::Info, message, context);
    }

    fn add_breadcrumb(&self, message: &str, data: Value) {
        self.push(LogLevel::Breadcrumb, message, data);
    }
}
