use crate::aggregator::cache::SnapshotCache;
use crate::analyzer::trend::analyze_trend;
use crate::analyzer::{anomaly, insights, topics, DevSentimentAnalyzer, Forecaster};
use crate::collector::{CollectRequest, Collector};
use crate::config::{AppConfig, TechnologyConfig};
use crate::model::{
    Classification, CompareResponse, CurrentSentiment, Insight, ModelInfo, Predictions, RawPost,
    SentimentSnapshot, ServiceError, Source, SourceCounts, StatsResponse,
};
use crate::processor::{category_breakdown, daily_history, process_posts};
use crate::storage::SqliteStorage;
use crate::utils::normalize_key;
use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const TOPIC_COUNT: usize = 10;

/// Builds, caches and serves sentiment snapshots per technology.
pub struct SentimentService {
    config: Arc<AppConfig>,
    collectors: Vec<Arc<dyn Collector>>,
    analyzer: DevSentimentAnalyzer,
    forecaster: Arc<dyn Forecaster>,
    cache: SnapshotCache,
    storage: Option<Arc<Mutex<SqliteStorage>>>,
    started_at: Instant,
}

impl SentimentService {
    pub fn new(
        config: Arc<AppConfig>,
        collectors: Vec<Arc<dyn Collector>>,
        analyzer: DevSentimentAnalyzer,
        forecaster: Arc<dyn Forecaster>,
        storage: Option<Arc<Mutex<SqliteStorage>>>,
    ) -> Self {
        let cache = SnapshotCache::new(Duration::from_secs(config.cache_ttl_seconds));
        Self {
            config,
            collectors,
            analyzer,
            forecaster,
            cache,
            storage,
            started_at: Instant::now(),
        }
    }

    pub fn technologies(&self) -> Vec<String> {
        self.config.technology_names()
    }

    /// Cached snapshot unless expired or `force_refresh`; otherwise a fresh one.
    pub async fn get_snapshot(
        &self,
        technology: &str,
        force_refresh: bool,
    ) -> Result<Arc<SentimentSnapshot>, ServiceError> {
        let key = normalize_key(technology);
        if key.is_empty() {
            return Err(ServiceError::InvalidInput("technology must not be empty".into()));
        }

        if !force_refresh {
            if let Some(snapshot) = self.cache.get(&key).await {
                debug!("[cache] hit for {}", key);
                return Ok(snapshot);
            }
        }

        info!("🔄 Building sentiment snapshot for {} (forced: {})", key, force_refresh);
        let snapshot = Arc::new(self.build_snapshot(&key).await?);
        self.cache.put(&key, snapshot.clone()).await;

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.lock().await.record_snapshot(&snapshot) {
                warn!("❌ [storage] Failed to record snapshot for {}: {}", key, e);
            }
        }

        Ok(snapshot)
    }

    fn technology_config(&self, key: &str) -> TechnologyConfig {
        self.config.technology(key).cloned().unwrap_or_else(|| {
            // untracked technologies are looked up by Stack Overflow tag only
            TechnologyConfig {
                name: key.to_string(),
                github_repo: None,
                stackoverflow_tag: Some(key.to_string()),
            }
        })
    }

    async fn collect(&self, technology: &TechnologyConfig) -> Vec<RawPost> {
        let request = CollectRequest {
            days: self.config.lookback_days,
            max_items: self.config.max_items_per_source,
        };
        let results = join_all(
            self.collectors
                .iter()
                .map(|collector| async move { (collector.source(), collector.collect(technology, &request).await) }),
        )
        .await;

        let mut posts = Vec::new();
        for (source, result) in results {
            match result {
                Ok(batch) => posts.extend(batch),
                Err(e) => warn!("❌ [{:?}] Collection for {} failed: {}", source, technology.name, e),
            }
        }
        posts
    }

    async fn build_snapshot(&self, key: &str) -> Result<SentimentSnapshot, ServiceError> {
        let technology = self.technology_config(key);
        let posts = self.collect(&technology).await;
        if posts.is_empty() {
            warn!("📭 No posts collected for {}", key);
            return Err(ServiceError::NoData(key.to_string()));
        }

        let documents = process_posts(&posts, key);
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let results = self.analyzer.batch_analyze(&texts, self.config.batch_size).await;
        let summary = DevSentimentAnalyzer::aggregate(&results);
        let history = daily_history(&documents, &results);

        let forecast_days = self.config.forecast_days;
        let predictions = if history.len() >= self.config.min_history_points {
            match self.forecaster.forecast(&history, forecast_days) {
                Ok(predictions) => predictions,
                Err(e) => {
                    warn!("⚠️ Forecast for {} unavailable: {}", key, e);
                    Predictions::unavailable(forecast_days)
                }
            }
        } else {
            debug!(
                "Only {} days of history for {}, skipping forecast",
                history.len(),
                key
            );
            Predictions::unavailable(forecast_days)
        };

        let sources = SourceCounts {
            github: posts.iter().filter(|p| p.source == Source::Github).count(),
            stackoverflow: posts.iter().filter(|p| p.source == Source::Stackoverflow).count(),
        };

        let snapshot = SentimentSnapshot {
            technology: key.to_string(),
            last_updated: Utc::now(),
            data_points: summary.total,
            current_sentiment: CurrentSentiment {
                score: summary.sentiment_score,
                label: summary.dominant,
                distribution: summary.distribution,
                frustration_rate: summary.frustration_rate,
                satisfaction_rate: summary.satisfaction_rate,
            },
            trend_analysis: analyze_trend(&history),
            anomalies: anomaly::detect(&history),
            historical_data: history,
            predictions,
            topics: topics::extract_topics(&texts, TOPIC_COUNT),
            categories: category_breakdown(&documents),
            sources,
        };

        info!(
            "✅ Snapshot for {}: score {:.1} from {} posts",
            key, snapshot.current_sentiment.score, snapshot.data_points
        );
        Ok(snapshot)
    }

    pub async fn insights(&self, technology: &str) -> Result<Vec<Insight>, ServiceError> {
        let snapshot = self.get_snapshot(technology, false).await?;
        Ok(insights::generate(&snapshot))
    }

    /// Current score per technology; technologies without data are listed as missing.
    pub async fn compare(&self, technologies: &[String]) -> Result<CompareResponse, ServiceError> {
        let mut seen = HashSet::new();
        let keys: Vec<String> = technologies
            .iter()
            .map(|t| normalize_key(t))
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        if keys.is_empty() {
            return Err(ServiceError::InvalidInput("technologies must not be empty".into()));
        }

        let results = join_all(keys.iter().map(|key| self.get_snapshot(key, false))).await;

        let mut comparison = BTreeMap::new();
        let mut missing = Vec::new();
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(snapshot) => {
                    comparison.insert(key, snapshot.current_sentiment.score);
                }
                Err(e) => {
                    debug!("Comparison skips {}: {}", key, e);
                    missing.push(key);
                }
            }
        }
        Ok(CompareResponse { comparison, missing })
    }

    pub async fn analyze_text(&self, text: &str) -> Result<Classification, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("text must not be empty".into()));
        }
        Ok(self.analyzer.analyze(text).await)
    }

    pub async fn stats(&self) -> StatsResponse {
        let cached = self.cache.keys().await;
        let snapshots_recorded = match &self.storage {
            Some(storage) => match storage.lock().await.count_snapshots() {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!("❌ [storage] Failed to count snapshots: {}", e);
                    None
                }
            },
            None => None,
        };
        StatsResponse {
            cache_size: cached.len(),
            cached,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            snapshots_recorded,
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            sentiment_model: self.analyzer.model_name().to_string(),
            forecaster: self.forecaster.name().to_string(),
            cache_ttl_seconds: self.cache.ttl().as_secs(),
            forecast_days: self.config.forecast_days,
        }
    }

    /// Loads the latest stored snapshot per technology that is still within the TTL.
    pub async fn warm_cache(&self) -> usize {
        let Some(storage) = &self.storage else {
            return 0;
        };
        let snapshots = match storage.lock().await.latest_snapshots() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!("❌ [storage] Failed to load stored snapshots: {}", e);
                return 0;
            }
        };

        let mut restored = 0;
        for snapshot in snapshots {
            let age = (Utc::now() - snapshot.last_updated).to_std().unwrap_or_default();
            if age >= self.cache.ttl() {
                continue;
            }
            let key = snapshot.technology.clone();
            self.cache.insert_with_age(&key, Arc::new(snapshot), age).await;
            restored += 1;
        }
        info!("♻️ Restored {} cached snapshots from storage", restored);
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SentimentLabel, TrendDirection};
    use crate::test_support::{FakeCollector, test_service as service};

    #[tokio::test]
    async fn cached_snapshot_is_reused() {
        let github = FakeCollector::new(Source::Github, 14);
        let so = FakeCollector::new(Source::Stackoverflow, 14);
        let service = service(vec![github.clone(), so.clone()], None);

        let first = service.get_snapshot("React", false).await.unwrap();
        let second = service.get_snapshot("react", false).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(github.calls(), 1);
        assert_eq!(so.calls(), 1);
        assert_eq!(first.technology, "react");
        assert_eq!(first.data_points, 28);
        assert_eq!(first.sources.github, 14);
        assert_ne!(first.predictions.trend_direction, TrendDirection::Unknown);
        assert!(first.validate().is_ok());
    }

    #[tokio::test]
    async fn force_refresh_replaces_cache() {
        let github = FakeCollector::new(Source::Github, 5);
        let service = service(vec![github.clone()], None);

        let first = service.get_snapshot("vue", false).await.unwrap();
        let refreshed = service.get_snapshot("vue", true).await.unwrap();
        let cached = service.get_snapshot("vue", false).await.unwrap();

        assert_eq!(github.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert!(Arc::ptr_eq(&refreshed, &cached));
        // five days of history is below the forecasting minimum
        assert_eq!(refreshed.predictions.trend_direction, TrendDirection::Unknown);
    }

    #[tokio::test]
    async fn no_posts_is_no_data() {
        let service = service(vec![FakeCollector::new(Source::Github, 0)], None);
        assert!(matches!(
            service.get_snapshot("svelte", false).await,
            Err(ServiceError::NoData(tech)) if tech == "svelte"
        ));
        assert!(matches!(
            service.get_snapshot("   ", false).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn compare_lists_missing_technologies() {
        let service = service(vec![FakeCollector::new(Source::Stackoverflow, 3)], None);
        let response = service
            .compare(&["react".to_string(), "cobol".to_string()])
            .await
            .unwrap();
        assert!(response.comparison.contains_key("react"));
        assert_eq!(response.missing, vec!["cobol".to_string()]);
        assert!(matches!(service.compare(&[]).await, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn compare_collapses_repeated_technologies() {
        let collector = FakeCollector::new(Source::Stackoverflow, 3);
        let service = service(vec![collector.clone()], None);
        let request: Vec<String> = ["cobol", "react", " COBOL "].iter().map(|s| s.to_string()).collect();

        let response = service.compare(&request).await.unwrap();
        assert_eq!(response.missing, vec!["cobol".to_string()]);
        assert_eq!(response.comparison.len(), 1);
        assert_eq!(collector.calls(), 2);
    }

    #[tokio::test]
    async fn analyze_text_and_model_info() {
        let service = service(Vec::new(), None);
        let result = service.analyze_text("This is total garbage").await.unwrap();
        assert_eq!(result.label, SentimentLabel::Frustrated);
        assert!(matches!(service.analyze_text("  ").await, Err(ServiceError::InvalidInput(_))));

        let info = service.model_info();
        assert_eq!(info.sentiment_model, "lexicon");
        assert_eq!(info.forecaster, "linear-weekly");
        assert_eq!(info.cache_ttl_seconds, 21600);
        assert_eq!(info.forecast_days, 7);
    }

    #[tokio::test]
    async fn snapshots_are_recorded_and_restored() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new(":memory:").unwrap()));
        let first = service(vec![FakeCollector::new(Source::Github, 4)], Some(storage.clone()));
        first.get_snapshot("django", false).await.unwrap();

        let stats = first.stats().await;
        assert_eq!(stats.cached, vec!["django".to_string()]);
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.snapshots_recorded, Some(1));

        let collector = FakeCollector::new(Source::Github, 4);
        let restarted = service(vec![collector.clone()], Some(storage));
        assert_eq!(restarted.warm_cache().await, 1);
        restarted.get_snapshot("django", false).await.unwrap();
        assert_eq!(collector.calls(), 0);
    }
}
