use crate::client::api::ApiClient;
use crate::client::LOAD_ERROR;
use crate::model::{ApiError, Insight, SentimentSnapshot};
use crate::utils::normalize_key;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The two calls one dashboard view depends on.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    async fn get_sentiment(&self, technology: &str, force_refresh: bool) -> Result<SentimentSnapshot, ApiError>;
    async fn get_insights(&self, technology: &str) -> Result<Vec<Insight>, ApiError>;
}

#[async_trait::async_trait]
impl DashboardApi for ApiClient {
    async fn get_sentiment(&self, technology: &str, force_refresh: bool) -> Result<SentimentSnapshot, ApiError> {
        ApiClient::get_sentiment(self, technology, force_refresh).await
    }

    async fn get_insights(&self, technology: &str) -> Result<Vec<Insight>, ApiError> {
        ApiClient::get_insights(self, technology).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What one dashboard view shows for the selected technology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub technology: String,
    pub sentiment: Option<SentimentSnapshot>,
    pub insights: Vec<Insight>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ViewState {
    pub fn new(technology: &str) -> Self {
        Self { technology: normalize_key(technology), ..Self::default() }
    }

    pub fn phase(&self) -> FetchPhase {
        if self.loading {
            FetchPhase::Loading
        } else if self.error.is_some() {
            FetchPhase::Failed
        } else if self.sentiment.is_some() {
            FetchPhase::Ready
        } else {
            FetchPhase::Idle
        }
    }
}

/// Fetch cycle driver for one view. Every cycle gets a sequence number and only
/// the latest cycle may write its results into the state.
pub struct DashboardHook {
    api: Arc<dyn DashboardApi>,
    state: Mutex<ViewState>,
    generation: AtomicU64,
}

impl DashboardHook {
    pub fn new(api: Arc<dyn DashboardApi>, technology: &str) -> Self {
        Self {
            api,
            state: Mutex::new(ViewState::new(technology)),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn technology(&self) -> String {
        self.state.lock().await.technology.clone()
    }

    /// Switches the view to `technology` and loads it. Returns whether this
    /// cycle's results were applied.
    pub async fn select(&self, technology: &str) -> bool {
        let technology = normalize_key(technology);
        let seq = {
            let mut state = self.state.lock().await;
            if state.technology != technology {
                *state = ViewState::new(&technology);
            }
            state.loading = true;
            state.error = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        self.run_cycle(seq, &technology, false).await
    }

    /// Reloads the current technology, asking the server to recompute.
    pub async fn refresh(&self) -> bool {
        let (seq, technology) = {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
            (self.generation.fetch_add(1, Ordering::SeqCst) + 1, state.technology.clone())
        };
        self.run_cycle(seq, &technology, true).await
    }

    async fn run_cycle(&self, seq: u64, technology: &str, force_refresh: bool) -> bool {
        let (sentiment, insights) = tokio::join!(
            self.api.get_sentiment(technology, force_refresh),
            self.api.get_insights(technology)
        );

        let mut state = self.state.lock().await;
        // sequence numbers are only taken under the state lock
        if self.generation.load(Ordering::SeqCst) != seq || state.technology != technology {
            debug!("Discarding stale results for {} (cycle {})", technology, seq);
            return false;
        }

        match sentiment {
            Ok(snapshot) => {
                state.sentiment = Some(snapshot);
                state.error = None;
                match insights {
                    Ok(insights) => state.insights = insights,
                    Err(e) => warn!("⚠️ Insights for {} unavailable: {}", technology, e),
                }
            }
            Err(e) => {
                warn!("❌ Failed to load sentiment for {}: {}", technology, e);
                state.sentiment = None;
                state.error = Some(LOAD_ERROR.to_string());
            }
        }
        state.loading = false;
        true
    }
}
