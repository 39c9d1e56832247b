pub mod cache;
pub mod service;

pub use service::SentimentService;
