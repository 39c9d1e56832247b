use crate::model::{
    AnalysisError, Classification, Confidence, FrustrationLevel, SatisfactionLevel, SentimentLabel,
};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest input passed to the base model, in characters.
const MAX_MODEL_CHARS: usize = 512;

static URLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("Valid URL regex"));
static CODE_BLOCKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[\s\S]*?```").expect("Valid code block regex"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`]*`").expect("Valid inline code regex"));

const CRITICAL_FRUSTRATION: &[&str] = &["wtf", "garbage", "terrible", "useless", "worst"];
const HIGH_FRUSTRATION: &[&str] = &["bug", "broken", "crash", "error", "failed", "doesn't work"];
const MEDIUM_FRUSTRATION: &[&str] = &["issue", "problem", "confused", "struggling", "help"];

const HIGH_SATISFACTION: &[&str] = &["love", "amazing", "awesome", "excellent", "perfect"];
const MEDIUM_SATISFACTION: &[&str] = &["good", "nice", "works", "helpful", "thanks"];

/// Polarity reported by the base classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseSentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

/// The pretrained text classifier the rule layer sits on.
#[async_trait::async_trait]
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;
    async fn classify(&self, text: &str) -> Result<BaseSentiment, AnalysisError>;
}

/// Word-list polarity model, used when no hosted model is configured.
pub struct LexiconModel;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "love", "excellent", "awesome", "amazing", "nice", "helpful", "thanks",
    "thank", "works", "working", "fast", "easy", "clean", "perfect", "fixed", "solved",
    "improved", "happy", "best", "elegant", "powerful", "simple", "glad", "recommend",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "broken", "bug", "crash", "error", "fail", "failed", "failing", "slow", "hard",
    "confusing", "confused", "issue", "problem", "wrong", "terrible", "awful", "hate",
    "annoying", "unclear", "regression", "leak", "stuck", "cannot", "can't", "doesn't",
    "unable", "worse", "worst", "useless",
];

impl LexiconModel {
    pub fn new() -> Self {
        Self
    }

    fn score(text: &str) -> BaseSentiment {
        let lower = text.to_lowercase();
        let (mut positive, mut negative) = (0usize, 0usize);
        for token in lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
        {
            if POSITIVE_WORDS.contains(&token) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&token) {
                negative += 1;
            }
        }

        let total = positive + negative;
        if total == 0 || positive == negative {
            return BaseSentiment { label: SentimentLabel::Neutral, score: 0.5 };
        }
        let margin = positive.abs_diff(negative) as f64 / total as f64;
        let label = if positive > negative {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        };
        BaseSentiment { label, score: 0.5 + 0.5 * margin }
    }
}

#[async_trait::async_trait]
impl SentimentModel for LexiconModel {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn classify(&self, text: &str) -> Result<BaseSentiment, AnalysisError> {
        Ok(Self::score(text))
    }
}

#[derive(Debug, Deserialize)]
struct HfLabel {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfResponse {
    Nested(Vec<Vec<HfLabel>>),
    Flat(Vec<HfLabel>),
}

/// Hosted transformer classifier behind the Hugging Face inference API.
pub struct HuggingFaceModel {
    client: Client,
    endpoint: String,
    model: String,
    token: Option<String>,
}

impl HuggingFaceModel {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api-inference.huggingface.co";

    pub fn new(endpoint: &str, model: &str, token: Option<String>) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| AnalysisError::Model(e.to_string()))?;
        if token.is_none() {
            warn!("⚠️ No HF_TOKEN set, hosted model calls may be throttled");
        }
        info!("🤖 Using hosted sentiment model {}", model);
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token,
        })
    }
}

#[async_trait::async_trait]
impl SentimentModel for HuggingFaceModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn classify(&self, text: &str) -> Result<BaseSentiment, AnalysisError> {
        let url = format!("{}/models/{}", self.endpoint, self.model);
        let mut request = self.client.post(&url).json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::Model(format!("request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            return Err(AnalysisError::Model(format!("inference API [{}]: {}", status, body)));
        }

        let labels = match response
            .json::<HfResponse>()
            .await
            .map_err(|e| AnalysisError::Model(format!("bad response: {}", e)))?
        {
            HfResponse::Nested(mut outer) => outer.pop().unwrap_or_default(),
            HfResponse::Flat(labels) => labels,
        };

        let best = labels
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| AnalysisError::Model("empty classification".into()))?;
        let label = match best.label.to_uppercase().as_str() {
            "POSITIVE" | "LABEL_1" => SentimentLabel::Positive,
            "NEGATIVE" | "LABEL_0" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        };
        Ok(BaseSentiment { label, score: best.score })
    }
}

/// Aggregate over a batch of classifications.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentSummary {
    /// Mean label position on the 0-100 scale.
    pub sentiment_score: f64,
    /// Mean classifier score in [0, 1].
    pub average_confidence: f64,
    pub distribution: BTreeMap<SentimentLabel, f64>,
    pub frustration_rate: f64,
    pub satisfaction_rate: f64,
    pub total: usize,
    pub dominant: SentimentLabel,
}

/// Developer-specific rule layer on top of a base classifier.
pub struct DevSentimentAnalyzer {
    model: Arc<dyn SentimentModel>,
}

impl DevSentimentAnalyzer {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Drops URLs and code, collapses whitespace and truncates to the model limit.
    pub fn preprocess_text(text: &str) -> String {
        let text = URLS.replace_all(text, "");
        let text = CODE_BLOCKS.replace_all(&text, "");
        let text = INLINE_CODE.replace_all(&text, "");
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(MAX_MODEL_CHARS).collect()
    }

    pub fn detect_frustration_level(text: &str) -> (FrustrationLevel, f64) {
        let lower = text.to_lowercase();
        let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();

        if count(CRITICAL_FRUSTRATION) >= 1 {
            return (FrustrationLevel::Critical, 0.95);
        }
        match count(HIGH_FRUSTRATION) {
            0 => {}
            1 => return (FrustrationLevel::Medium, 0.65),
            _ => return (FrustrationLevel::High, 0.85),
        }
        if count(MEDIUM_FRUSTRATION) >= 2 {
            return (FrustrationLevel::Medium, 0.70);
        }
        (FrustrationLevel::Low, 0.30)
    }

    pub fn detect_satisfaction_level(text: &str) -> (SatisfactionLevel, f64) {
        let lower = text.to_lowercase();
        let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();

        if count(HIGH_SATISFACTION) >= 1 {
            return (SatisfactionLevel::High, 0.90);
        }
        match count(MEDIUM_SATISFACTION) {
            0 => (SatisfactionLevel::None, 0.40),
            1 => (SatisfactionLevel::Low, 0.60),
            _ => (SatisfactionLevel::Medium, 0.75),
        }
    }

    pub async fn analyze(&self, text: &str) -> Classification {
        if text.trim().chars().count() < 5 {
            return Classification::neutral("Text too short for analysis");
        }
        let clean = Self::preprocess_text(text);
        if clean.is_empty() {
            return Classification::neutral("No meaningful text after preprocessing");
        }

        let base = match self.model.classify(&clean).await {
            Ok(base) => base,
            Err(e) => {
                warn!("❌ Sentiment model {} failed: {}", self.model.name(), e);
                return Classification::neutral("Analysis failed");
            }
        };

        let (frustration, frustration_score) = Self::detect_frustration_level(text);
        let (satisfaction, satisfaction_score) = Self::detect_satisfaction_level(text);

        let (label, score, confidence, reasoning) = match (frustration, satisfaction) {
            (FrustrationLevel::Critical | FrustrationLevel::High, _) => (
                SentimentLabel::Frustrated,
                frustration_score,
                Confidence::High,
                format!("{} frustration detected", capitalize(frustration)),
            ),
            (_, SatisfactionLevel::High) => (
                SentimentLabel::Satisfied,
                satisfaction_score,
                Confidence::High,
                "High satisfaction detected".to_string(),
            ),
            _ => (
                base.label,
                base.score,
                Confidence::Medium,
                "Base model classification".to_string(),
            ),
        };

        Classification {
            label,
            score,
            confidence,
            reasoning,
            base_sentiment: Some(base.label),
            base_score: Some(base.score),
            frustration_level: Some(frustration),
            satisfaction_level: Some(satisfaction),
        }
    }

    /// Classifies texts with up to `batch_size` model calls in flight; output order matches input.
    pub async fn batch_analyze(&self, texts: &[String], batch_size: usize) -> Vec<Classification> {
        debug!("Analyzing {} texts in batches of {}", texts.len(), batch_size);
        let results: Vec<Classification> = stream::iter(texts.iter().cloned())
            .map(|text| async move { self.analyze(&text).await })
            .buffered(batch_size.max(1))
            .collect()
            .await;
        info!("✅ Completed analysis of {} texts", results.len());
        results
    }

    pub fn aggregate(results: &[Classification]) -> SentimentSummary {
        if results.is_empty() {
            return SentimentSummary {
                sentiment_score: SentimentLabel::Neutral.numeric_score(),
                average_confidence: 0.5,
                distribution: BTreeMap::new(),
                frustration_rate: 0.0,
                satisfaction_rate: 0.0,
                total: 0,
                dominant: SentimentLabel::Neutral,
            };
        }

        let total = results.len() as f64;
        let mut counts: BTreeMap<SentimentLabel, usize> = BTreeMap::new();
        for result in results {
            *counts.entry(result.label).or_insert(0) += 1;
        }

        let mut dominant = SentimentLabel::Neutral;
        let mut best = 0;
        for (label, count) in &counts {
            if *count > best {
                best = *count;
                dominant = *label;
            }
        }
        let rate = |label: SentimentLabel| *counts.get(&label).unwrap_or(&0) as f64 / total;

        SentimentSummary {
            sentiment_score: results.iter().map(|r| r.label.numeric_score()).sum::<f64>() / total,
            average_confidence: results.iter().map(|r| r.score).sum::<f64>() / total,
            distribution: counts.iter().map(|(label, count)| (*label, *count as f64 / total)).collect(),
            frustration_rate: rate(SentimentLabel::Frustrated),
            satisfaction_rate: rate(SentimentLabel::Satisfied),
            total: results.len(),
            dominant,
        }
    }
}

fn capitalize(level: FrustrationLevel) -> &'static str {
    match level {
        FrustrationLevel::Critical => "Critical",
        FrustrationLevel::High => "High",
        FrustrationLevel::Medium => "Medium",
        FrustrationLevel::Low => "Low",
    }
}
