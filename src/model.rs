// Core structs: RawPost, Document, SentimentSnapshot, Classification and the per-layer errors
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Github,
    Stackoverflow,
}

/// A post as returned by a collector, before any text processing.
#[derive(Debug, Clone)]
pub struct RawPost {
    pub id: String,
    pub source: Source,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Issue labels or question tags.
    pub labels: Vec<String>,
    /// Comment count for issues, answer count for questions.
    pub comments: u32,
    /// Reactions for issues, vote score for questions.
    pub reactions: i64,
    pub is_answered: Option<bool>,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    Bug,
    Feature,
    Question,
    Other,
}

/// Processed text ready for classification.
#[derive(Debug, Clone)]
pub struct Document {
    pub technology: String,
    pub source: Source,
    pub text: String,
    pub date: NaiveDate,
    pub category: PostCategory,
    pub engagement: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Frustrated,
    Satisfied,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 5] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Frustrated,
        SentimentLabel::Satisfied,
        SentimentLabel::Neutral,
    ];

    /// Position of the label on the 0-100 sentiment scale.
    pub fn numeric_score(self) -> f64 {
        match self {
            SentimentLabel::Satisfied => 90.0,
            SentimentLabel::Positive => 75.0,
            SentimentLabel::Neutral => 50.0,
            SentimentLabel::Negative => 25.0,
            SentimentLabel::Frustrated => 10.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Frustrated => "FRUSTRATED",
            SentimentLabel::Satisfied => "SATISFIED",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrustrationLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatisfactionLevel {
    None,
    Low,
    Medium,
    High,
}

/// Result of classifying a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: SentimentLabel,
    pub score: f64,
    pub confidence: Confidence,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_sentiment: Option<SentimentLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frustration_level: Option<FrustrationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_level: Option<SatisfactionLevel>,
}

impl Classification {
    pub fn neutral(reasoning: &str) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.5,
            confidence: Confidence::Low,
            reasoning: reasoning.to_string(),
            base_sentiment: None,
            base_score: None,
            frustration_level: None,
            satisfaction_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    #[serde(alias = "sentiment_score")]
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
    /// Not enough history to forecast.
    #[serde(rename = "none")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_score: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub trend_direction: TrendDirection,
    pub trend_strength: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub forecast: Vec<ForecastPoint>,
    #[serde(default)]
    pub forecast_days: usize,
}

impl Predictions {
    pub fn unavailable(forecast_days: usize) -> Self {
        Self {
            trend_direction: TrendDirection::Unknown,
            trend_strength: 0.0,
            confidence: 0.0,
            forecast: Vec::new(),
            forecast_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub current_score: f64,
    pub average_score: f64,
    pub trend_change_percent: f64,
    pub volatility: f64,
    pub data_points: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Spike,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyMethod {
    Statistical,
    Window,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub method: AnomalyMethod,
    /// z-score for statistical anomalies, relative change for window anomalies.
    pub deviation: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub keywords: Vec<String>,
    pub top_phrases: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSentiment {
    pub score: f64,
    pub label: SentimentLabel,
    pub distribution: BTreeMap<SentimentLabel, f64>,
    #[serde(default)]
    pub frustration_rate: f64,
    #[serde(default)]
    pub satisfaction_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub github: usize,
    pub stackoverflow: usize,
}

/// Everything the dashboard shows for one technology. Built once per refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub technology: String,
    pub last_updated: DateTime<Utc>,
    pub data_points: usize,
    pub current_sentiment: CurrentSentiment,
    pub historical_data: Vec<HistoryPoint>,
    pub predictions: Predictions,
    #[serde(default)]
    pub trend_analysis: Option<TrendAnalysis>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default)]
    pub topics: TopicSummary,
    #[serde(default)]
    pub categories: BTreeMap<PostCategory, usize>,
    #[serde(default)]
    pub sources: SourceCounts,
}

impl SentimentSnapshot {
    pub fn distribution(&self) -> &BTreeMap<SentimentLabel, f64> {
        &self.current_sentiment.distribution
    }

    /// Checks the ranges the dashboard relies on.
    pub fn validate(&self) -> Result<(), String> {
        for (label, fraction) in &self.current_sentiment.distribution {
            if !fraction.is_finite() || *fraction < 0.0 || *fraction > 1.0 {
                return Err(format!("distribution[{}] = {} is outside [0, 1]", label, fraction));
            }
        }
        let total: f64 = self.current_sentiment.distribution.values().sum();
        if !self.current_sentiment.distribution.is_empty() && (total - 1.0).abs() > 0.01 {
            return Err(format!("distribution sums to {:.3}", total));
        }
        let strength = self.predictions.trend_strength;
        if !strength.is_finite() || !(0.0..=100.0).contains(&strength) {
            return Err(format!("trend_strength {} is outside [0, 100]", strength));
        }
        if self.historical_data.windows(2).any(|w| w[0].date > w[1].date) {
            return Err("historical_data is not ordered by date".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub description: String,
}

impl Insight {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}

// Wire payloads shared by the server and the API client

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologiesResponse {
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub technology: String,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResponse {
    pub comparison: BTreeMap<String, f64>,
    #[serde(default)]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub cached: Vec<String>,
    pub cache_size: usize,
    pub uptime_seconds: u64,
    #[serde(default)]
    pub snapshots_recorded: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub sentiment_model: String,
    pub forecaster: String,
    pub cache_ttl_seconds: u64,
    pub forecast_days: usize,
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("rate limit hit on {0}")]
    RateLimited(&'static str),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        CollectorError::Http(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("model error: {0}")]
    Model(String),
    #[error("insufficient data: need {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No data available for {0}")]
    NoData(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(distribution: &[(SentimentLabel, f64)]) -> SentimentSnapshot {
        SentimentSnapshot {
            technology: "react".into(),
            last_updated: Utc::now(),
            data_points: 10,
            current_sentiment: CurrentSentiment {
                score: 60.0,
                label: SentimentLabel::Positive,
                distribution: distribution.iter().copied().collect(),
                frustration_rate: 0.1,
                satisfaction_rate: 0.0,
            },
            historical_data: vec![],
            predictions: Predictions::unavailable(7),
            trend_analysis: None,
            anomalies: vec![],
            topics: TopicSummary::default(),
            categories: BTreeMap::new(),
            sources: SourceCounts::default(),
        }
    }

    #[test]
    fn labels_serialize_upper_case() {
        let json = serde_json::to_string(&SentimentLabel::Frustrated).unwrap();
        assert_eq!(json, "\"FRUSTRATED\"");
        let direction = serde_json::to_string(&TrendDirection::Unknown).unwrap();
        assert_eq!(direction, "\"none\"");
    }

    #[test]
    fn history_point_accepts_legacy_field_name() {
        let point: HistoryPoint =
            serde_json::from_str(r#"{"date":"2024-03-01","sentiment_score":61.5}"#).unwrap();
        assert_eq!(point.score, 61.5);
    }

    #[test]
    fn validate_rejects_out_of_range_fraction() {
        let snapshot = snapshot_with(&[(SentimentLabel::Positive, 1.4)]);
        assert!(snapshot.validate().is_err());

        let ok = snapshot_with(&[
            (SentimentLabel::Positive, 0.72),
            (SentimentLabel::Negative, 0.18),
            (SentimentLabel::Frustrated, 0.10),
        ]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unordered_history() {
        let mut snapshot = snapshot_with(&[(SentimentLabel::Neutral, 1.0)]);
        snapshot.historical_data = vec![
            HistoryPoint { date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), score: 50.0 },
            HistoryPoint { date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), score: 40.0 },
        ];
        assert!(snapshot.validate().is_err());
    }
}
