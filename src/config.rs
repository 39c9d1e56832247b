use crate::model::ConfigError;
use crate::utils::normalize_key;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TechnologyConfig {
    pub name: String,
    #[serde(default)]
    pub github_repo: Option<String>,
    #[serde(default)]
    pub stackoverflow_tag: Option<String>,
}

impl TechnologyConfig {
    fn new(name: &str, github_repo: Option<&str>, stackoverflow_tag: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            github_repo: github_repo.map(str::to_string),
            stackoverflow_tag: stackoverflow_tag.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBackend {
    #[default]
    Lexicon,
    Huggingface,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_url: String,
    pub request_timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub lookback_days: i64,
    pub max_items_per_source: usize,
    pub forecast_days: usize,
    pub min_history_points: usize,
    pub batch_size: usize,
    pub db_path: String,
    pub sentiment_backend: SentimentBackend,
    pub huggingface_model: String,
    pub poll_interval_seconds: u64,
    pub technologies: Vec<TechnologyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            api_url: DEFAULT_API_URL.into(),
            request_timeout_seconds: 10,
            cache_ttl_seconds: 6 * 60 * 60,
            lookback_days: 30,
            max_items_per_source: 50,
            forecast_days: 7,
            min_history_points: 10,
            batch_size: 16,
            db_path: "devpulse.db".into(),
            sentiment_backend: SentimentBackend::Lexicon,
            huggingface_model: "distilbert-base-uncased-finetuned-sst-2-english".into(),
            poll_interval_seconds: 60,
            technologies: default_technologies(),
        }
    }
}

impl AppConfig {
    /// Case-insensitive lookup of a tracked technology.
    pub fn technology(&self, name: &str) -> Option<&TechnologyConfig> {
        let key = normalize_key(name);
        self.technologies.iter().find(|t| normalize_key(&t.name) == key)
    }

    pub fn technology_names(&self) -> Vec<String> {
        self.technologies.iter().map(|t| t.name.clone()).collect()
    }

    /// Applies DEVPULSE_* environment overrides on top of the file values.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DEVPULSE_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(bind) = std::env::var("DEVPULSE_BIND") {
            if !bind.trim().is_empty() {
                self.bind_addr = bind;
            }
        }
        if let Ok(db) = std::env::var("DEVPULSE_DB") {
            if !db.trim().is_empty() {
                self.db_path = db;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("request_timeout_seconds must be positive".into()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid("poll_interval_seconds must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".into()));
        }
        if self.min_history_points < 2 {
            return Err(ConfigError::Invalid("min_history_points must be at least 2".into()));
        }
        if self.technologies.iter().any(|t| t.name.trim().is_empty()) {
            return Err(ConfigError::Invalid("technology names must not be empty".into()));
        }
        Ok(())
    }
}

/// Tracked technologies with their GitHub repository and Stack Overflow tag.
pub fn default_technologies() -> Vec<TechnologyConfig> {
    vec![
        TechnologyConfig::new("react", Some("facebook/react"), Some("reactjs")),
        TechnologyConfig::new("vue", Some("vuejs/core"), Some("vue.js")),
        TechnologyConfig::new("angular", Some("angular/angular"), Some("angular")),
        TechnologyConfig::new("svelte", None, Some("svelte")),
        TechnologyConfig::new("nextjs", Some("vercel/next.js"), Some("next.js")),
        TechnologyConfig::new("typescript", Some("microsoft/TypeScript"), Some("typescript")),
        TechnologyConfig::new("python", Some("python/cpython"), Some("python")),
        TechnologyConfig::new("django", Some("django/django"), Some("django")),
        TechnologyConfig::new("flask", Some("pallets/flask"), Some("flask")),
        TechnologyConfig::new("rust", None, Some("rust")),
    ]
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads the JSON config; a missing file yields the defaults.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let mut config = if Path::new(path).exists() {
        let content = fs::read_to_string(path)?;
        let config = parse_config(&content)?;
        info!("⚙️ Loaded config from {}", path);
        config
    } else {
        warn!("⚠️ Config file {} not found, using defaults", path);
        AppConfig::default()
    };
    config.apply_env();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(r#"{ "cache_ttl_seconds": 60, "forecast_days": 3 }"#).unwrap();
        assert_eq!(config.cache_ttl_seconds, 60);
        assert_eq!(config.forecast_days, 3);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.sentiment_backend, SentimentBackend::Lexicon);
        assert!(config.technology("react").is_some());
    }

    #[test]
    fn technology_lookup_ignores_case() {
        let config = AppConfig::default();
        let react = config.technology("  React ").unwrap();
        assert_eq!(react.github_repo.as_deref(), Some("facebook/react"));
        assert!(config.technology("cobol").is_none());
    }

    #[test]
    fn custom_technologies_replace_defaults() {
        let config = parse_config(
            r#"{ "technologies": [ { "name": "zig", "stackoverflow_tag": "zig" } ],
                 "sentiment_backend": "huggingface" }"#,
        )
        .unwrap();
        assert_eq!(config.technology_names(), vec!["zig".to_string()]);
        assert!(config.technology("zig").unwrap().github_repo.is_none());
        assert_eq!(config.sentiment_backend, SentimentBackend::Huggingface);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            parse_config(r#"{ "batch_size": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_config(r#"{ "poll_interval_seconds": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(parse_config("{ not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("does/not/exist/config.json").unwrap();
        assert_eq!(config.max_items_per_source, 50);
    }
}
