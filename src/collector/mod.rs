// Collector module: sources of developer posts.

pub mod github;
pub mod stackoverflow;
pub mod traits;

pub use github::GitHubCollector;
pub use stackoverflow::StackOverflowCollector;
pub use traits::{CollectRequest, Collector};
