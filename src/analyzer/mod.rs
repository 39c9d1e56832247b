// Analyzer module: text classification, forecasting and snapshot post-processing.

pub mod anomaly;
pub mod insights;
pub mod sentiment;
pub mod topics;
pub mod trend;

pub use sentiment::{DevSentimentAnalyzer, HuggingFaceModel, LexiconModel, SentimentModel};
pub use trend::{Forecaster, LinearTrendForecaster};
