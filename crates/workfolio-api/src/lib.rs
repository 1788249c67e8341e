// HTTP clients for the remote work sources
pub mod github;
pub mod retry;

pub use github::{
    GitHubClient, GitHubError, GitHubOwner, GitHubRepo, RawPortfolioDescription,
};
pub use retry::RetryConfig;
