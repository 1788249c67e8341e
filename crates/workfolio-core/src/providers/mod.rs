// Concrete sources behind the repository ports
pub mod github;
pub mod local;

pub use github::GitHubRepositorySource;
pub use local::{LocalArticleRepository, LocalCertificationRepository};
