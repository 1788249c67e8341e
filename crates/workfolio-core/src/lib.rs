// Core business logic: sources, factories, aggregation and caching
pub mod aggregate;
pub mod config;
pub mod error;
pub mod factory;
pub mod fallback;
pub mod locale;
pub mod models;
pub mod providers;
pub mod public_work;
pub mod shuffle;
pub mod sources;
pub mod telemetry;

pub use aggregate::{ArchivedPolicy, WorkItemsService};
pub use config::Config;
pub use error::Error;
pub use locale::Locale;
pub use models::{Article, Certification, Complexity, Project, WorkItem, WorkItemType};
pub use public_work::PublicWorkService;
pub use shuffle::Shuffler;
pub use sources::{ArticleRepository, CertificationRepository, CodeHostingRepository};
pub use telemetry::{Logger, MemoryLogger, TracingLogger};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
