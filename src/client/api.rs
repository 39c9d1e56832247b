use crate::config::AppConfig;
use crate::model::{
    AnalyzeRequest, ApiError, Classification, CompareRequest, CompareResponse, HealthResponse,
    Insight, InsightsResponse, ModelInfo, SentimentSnapshot, StatsResponse, TechnologiesResponse,
};
use once_cell::sync::OnceCell;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

static SHARED: OnceCell<ApiClient> = OnceCell::new();

/// Typed client for the DevPulse HTTP API. One method per route, one request per call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::Network(format!("invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Network(format!("invalid base URL {}", base_url)));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Client for the configured `api_url` and `request_timeout_seconds`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, Duration::from_secs(config.request_timeout_seconds))
    }

    /// Process-wide client, built from `config` on first use.
    pub fn shared(config: &AppConfig) -> Result<&'static ApiClient, ApiError> {
        SHARED.get_or_try_init(|| ApiClient::from_config(config))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);
        Self::decode(self.client.get(url).send().await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T, ApiError> {
        debug!("POST {}", url);
        Self::decode(self.client.post(url).json(body).send().await?).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get(self.endpoint(&["api", "health"])).await
    }

    pub async fn get_technologies(&self) -> Result<Vec<String>, ApiError> {
        let response: TechnologiesResponse = self.get(self.endpoint(&["api", "technologies"])).await?;
        Ok(response.technologies)
    }

    /// Snapshot for `technology`; `refresh=true` is sent only when forced.
    pub async fn get_sentiment(&self, technology: &str, force_refresh: bool) -> Result<SentimentSnapshot, ApiError> {
        let mut url = self.endpoint(&["api", "sentiment", technology]);
        if force_refresh {
            url.query_pairs_mut().append_pair("refresh", "true");
        }
        let snapshot: SentimentSnapshot = self.get(url).await?;
        snapshot.validate().map_err(ApiError::Decode)?;
        Ok(snapshot)
    }

    pub async fn get_insights(&self, technology: &str) -> Result<Vec<Insight>, ApiError> {
        let response: InsightsResponse = self.get(self.endpoint(&["api", "insights", technology])).await?;
        Ok(response.insights)
    }

    pub async fn post_compare(&self, technologies: &[String]) -> Result<CompareResponse, ApiError> {
        let request = CompareRequest { technologies: technologies.to_vec() };
        self.post(self.endpoint(&["api", "compare"]), &request).await
    }

    pub async fn post_analyze(&self, text: &str) -> Result<Classification, ApiError> {
        let request = AnalyzeRequest { text: text.to_string() };
        self.post(self.endpoint(&["api", "analyze"]), &request).await
    }

    pub async fn get_stats(&self) -> Result<StatsResponse, ApiError> {
        self.get(self.endpoint(&["api", "stats"])).await
    }

    /// Best effort: any failure is logged and reported as `None`.
    pub async fn get_model_info(&self) -> Option<ModelInfo> {
        match self.get(self.endpoint(&["api", "model-info"])).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("⚠️ Model info unavailable: {}", e);
                None
            }
        }
    }
}
