use crate::collector::traits::{CollectRequest, Collector, polite_delay};
use crate::config::TechnologyConfig;
use crate::model::{CollectorError, RawPost, Source};
use crate::utils::strip_html;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const STACKEXCHANGE_API: &str = "https://api.stackexchange.com/2.3";

#[derive(Debug, Deserialize)]
struct QuestionsPage {
    #[serde(default)]
    items: Vec<Question>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    quota_remaining: Option<i64>,
    #[serde(default)]
    error_id: Option<i64>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Question {
    question_id: u64,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    answer_count: u32,
    #[serde(default)]
    is_answered: bool,
    creation_date: i64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    #[serde(default)]
    display_name: Option<String>,
}

/// Collects recent questions for a technology's Stack Overflow tag.
pub struct StackOverflowCollector {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    page_delay: Duration,
}

impl StackOverflowCollector {
    pub fn new(api_key: Option<String>) -> Result<Self, CollectorError> {
        Self::with_base_url(STACKEXCHANGE_API, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Result<Self, CollectorError> {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("⚠️ No Stack Exchange key. Limited to 300 requests/day");
        }
        let client = Client::builder()
            .user_agent("DevPulse/0.1")
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            page_delay: Duration::from_millis(100),
        })
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    async fn fetch_page(
        &self,
        tag: &str,
        request: &CollectRequest,
        page: u32,
    ) -> Result<QuestionsPage, CollectorError> {
        let now = Utc::now();
        let from = now - chrono::Duration::days(request.days);
        let mut params = vec![
            ("site", "stackoverflow".to_string()),
            ("fromdate", from.timestamp().to_string()),
            ("todate", now.timestamp().to_string()),
            ("tagged", tag.to_string()),
            ("sort", "creation".to_string()),
            ("order", "desc".to_string()),
            ("pagesize", request.max_items.clamp(1, 100).to_string()),
            ("filter", "withbody".to_string()),
            ("page", page.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }

        let response = self
            .client
            .get(format!("{}/questions", self.base_url))
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Errors come back as JSON with error_id, usually with a 400 status
        let data: QuestionsPage = serde_json::from_slice(&bytes).map_err(|e| {
            if status.is_success() {
                CollectorError::InvalidResponse(e.to_string())
            } else {
                CollectorError::Api { status: status.as_u16(), message: e.to_string() }
            }
        })?;

        if let Some(error_id) = data.error_id {
            let message = data.error_message.clone().unwrap_or_else(|| "Unknown error".into());
            if error_id == 502 {
                return Err(CollectorError::RateLimited("Stack Exchange"));
            }
            return Err(CollectorError::Api { status: status.as_u16(), message });
        }
        if let Some(quota) = data.quota_remaining {
            if quota < 10 {
                warn!("⚠️ Low Stack Exchange quota: {} requests remaining", quota);
            }
        }
        Ok(data)
    }
}

#[async_trait::async_trait]
impl Collector for StackOverflowCollector {
    fn source(&self) -> Source {
        Source::Stackoverflow
    }

    async fn collect(
        &self,
        technology: &TechnologyConfig,
        request: &CollectRequest,
    ) -> Result<Vec<RawPost>, CollectorError> {
        let Some(tag) = technology.stackoverflow_tag.as_deref() else {
            debug!("No Stack Overflow tag mapped for {}", technology.name);
            return Ok(Vec::new());
        };

        info!("📥 Collecting Stack Overflow questions for tag: {}", tag);
        let mut results = Vec::new();
        let mut page = 1;

        while results.len() < request.max_items {
            let data = match self.fetch_page(tag, request, page).await {
                Ok(data) => data,
                Err(e) if results.is_empty() => return Err(e),
                Err(e) => {
                    warn!("❌ [stackoverflow] Page {} for {} failed, keeping partial data: {}", page, tag, e);
                    break;
                }
            };
            if data.items.is_empty() {
                break;
            }

            for q in data.items {
                let Some(created_at) = DateTime::<Utc>::from_timestamp(q.creation_date, 0) else {
                    continue;
                };
                results.push(RawPost {
                    id: q.question_id.to_string(),
                    source: Source::Stackoverflow,
                    title: strip_html(&q.title),
                    body: strip_html(&q.body),
                    created_at,
                    labels: q.tags,
                    comments: q.answer_count,
                    reactions: q.score,
                    is_answered: Some(q.is_answered),
                    author: q
                        .owner
                        .and_then(|o| o.display_name)
                        .unwrap_or_else(|| "anonymous".into()),
                });
            }
            debug!("  Page {}: {} questions total", page, results.len());

            if !data.has_more {
                break;
            }
            page += 1;
            sleep(polite_delay(self.page_delay)).await;
        }

        results.truncate(request.max_items);
        info!("✅ Collected {} questions for {}", results.len(), tag);
        Ok(results)
    }
}
