// Test helpers shared by the HTTP-facing modules
use crate::aggregator::SentimentService;
use crate::analyzer::{DevSentimentAnalyzer, LexiconModel, LinearTrendForecaster};
use crate::collector::{CollectRequest, Collector};
use crate::config::{AppConfig, TechnologyConfig};
use crate::model::{
    CollectorError, CurrentSentiment, Predictions, RawPost, SentimentLabel, SentimentSnapshot,
    Source, SourceCounts, TopicSummary,
};
use crate::storage::SqliteStorage;
use axum::Router;
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Serves the router on an ephemeral local port and returns its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// One post per day for `days` days; "cobol" fails, everything else has data.
pub struct FakeCollector {
    source: Source,
    days: i64,
    calls: AtomicUsize,
}

impl FakeCollector {
    pub fn new(source: Source, days: i64) -> Arc<Self> {
        Arc::new(Self { source, days, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Collector for FakeCollector {
    fn source(&self) -> Source {
        self.source
    }

    async fn collect(
        &self,
        technology: &TechnologyConfig,
        _request: &CollectRequest,
    ) -> Result<Vec<RawPost>, CollectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if technology.name == "cobol" {
            return Err(CollectorError::Api { status: 404, message: "unknown".into() });
        }
        let now = Utc::now();
        Ok((0..self.days)
            .map(|day| RawPost {
                id: format!("{}-{}", technology.name, day),
                source: self.source,
                title: if day % 3 == 0 {
                    "Build is broken after upgrade, crash on start".into()
                } else {
                    "Great docs, works nicely".into()
                },
                body: "Details about the setup".into(),
                created_at: now - Duration::days(day),
                labels: Vec::new(),
                comments: 1,
                reactions: 0,
                is_answered: None,
                author: "dev".into(),
            })
            .collect())
    }
}

pub fn test_service(
    collectors: Vec<Arc<dyn Collector>>,
    storage: Option<Arc<Mutex<SqliteStorage>>>,
) -> SentimentService {
    let config = Arc::new(AppConfig::default());
    SentimentService::new(
        config.clone(),
        collectors,
        DevSentimentAnalyzer::new(Arc::new(LexiconModel::new())),
        Arc::new(LinearTrendForecaster::new(config.min_history_points)),
        storage,
    )
}

/// Minimal valid snapshot for `technology` with the given distribution.
pub fn sample_snapshot(technology: &str, distribution: &[(SentimentLabel, f64)]) -> SentimentSnapshot {
    let distribution: BTreeMap<SentimentLabel, f64> = distribution.iter().copied().collect();
    let score = distribution.iter().map(|(label, share)| label.numeric_score() * share).sum::<f64>();
    SentimentSnapshot {
        technology: technology.into(),
        last_updated: Utc::now(),
        data_points: 50,
        current_sentiment: CurrentSentiment {
            score,
            label: SentimentLabel::Neutral,
            frustration_rate: distribution.get(&SentimentLabel::Frustrated).copied().unwrap_or(0.0),
            satisfaction_rate: distribution.get(&SentimentLabel::Satisfied).copied().unwrap_or(0.0),
            distribution,
        },
        historical_data: Vec::new(),
        predictions: Predictions::unavailable(7),
        trend_analysis: None,
        anomalies: Vec::new(),
        topics: TopicSummary::default(),
        categories: BTreeMap::new(),
        sources: SourceCounts::default(),
    }
}
