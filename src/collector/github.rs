use crate::collector::traits::{CollectRequest, Collector, polite_delay};
use crate::config::TechnologyConfig;
use crate::model::{CollectorError, RawPost, Source};
use crate::utils::parse_datetime;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const GITHUB_API: &str = "https://api.github.com";
const PER_PAGE: usize = 50;

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    id: u64,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    created_at: String,
    #[serde(default)]
    comments: u32,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    #[serde(default)]
    user: Option<GitHubUser>,
    #[serde(default)]
    reactions: Option<GitHubReactions>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubReactions {
    #[serde(default)]
    total_count: i64,
}

/// Collects issues (pull requests excluded) from a technology's GitHub repository.
pub struct GitHubCollector {
    client: Client,
    base_url: String,
    page_delay: Duration,
}

impl GitHubCollector {
    pub fn new(token: Option<String>) -> Result<Self, CollectorError> {
        Self::with_base_url(GITHUB_API, token)
    }

    pub fn with_base_url(base_url: &str, token: Option<String>) -> Result<Self, CollectorError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                    .map_err(|e| CollectorError::Http(format!("invalid token header: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
                info!("✅ GitHub API authenticated");
            }
            None => warn!("⚠️ No GitHub token found. Using unauthenticated requests."),
        }

        let client = Client::builder()
            .user_agent("DevPulse/0.1")
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_delay: Duration::from_secs(1),
        })
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    async fn fetch_page(
        &self,
        url: &str,
        since: &str,
        page: u32,
    ) -> Result<Vec<GitHubIssue>, CollectorError> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("state", "all".to_string()),
                ("since", since.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CollectorError::RateLimited("GitHub"));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "unknown".into());
            return Err(CollectorError::Api { status: status.as_u16(), message });
        }

        response
            .json::<Vec<GitHubIssue>>()
            .await
            .map_err(|e| CollectorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Collector for GitHubCollector {
    fn source(&self) -> Source {
        Source::Github
    }

    async fn collect(
        &self,
        technology: &TechnologyConfig,
        request: &CollectRequest,
    ) -> Result<Vec<RawPost>, CollectorError> {
        let Some(repo) = technology.github_repo.as_deref() else {
            debug!("No GitHub repository mapped for {}", technology.name);
            return Ok(Vec::new());
        };

        let since = (Utc::now() - chrono::Duration::days(request.days)).to_rfc3339();
        let url = format!("{}/repos/{}/issues", self.base_url, repo);
        let mut results = Vec::new();
        let mut page = 1;

        while results.len() < request.max_items {
            let issues = match self.fetch_page(&url, &since, page).await {
                Ok(issues) => issues,
                Err(e) if results.is_empty() => return Err(e),
                Err(e) => {
                    warn!("❌ [github] Page {} of {} failed, keeping partial data: {}", page, repo, e);
                    break;
                }
            };
            let page_len = issues.len();

            for issue in issues {
                if issue.pull_request.is_some() {
                    continue;
                }
                let Some(created_at) = parse_datetime(&issue.created_at) else {
                    debug!("Skipping issue #{} with bad timestamp {}", issue.number, issue.created_at);
                    continue;
                };
                results.push(RawPost {
                    id: issue.id.to_string(),
                    source: Source::Github,
                    title: issue.title,
                    body: issue.body.unwrap_or_default(),
                    created_at,
                    labels: issue.labels.into_iter().map(|l| l.name).collect(),
                    comments: issue.comments,
                    reactions: issue.reactions.map(|r| r.total_count).unwrap_or(0),
                    is_answered: None,
                    author: issue.user.map(|u| u.login).unwrap_or_else(|| "unknown".into()),
                });
                if results.len() >= request.max_items {
                    break;
                }
            }

            if page_len < PER_PAGE {
                break;
            }
            page += 1;
            if results.len() < request.max_items {
                sleep(polite_delay(self.page_delay)).await;
            }
        }

        info!("✅ Collected {} issues from {}", results.len(), repo);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::get};
    use serde_json::json;

    fn react() -> TechnologyConfig {
        TechnologyConfig {
            name: "react".into(),
            github_repo: Some("facebook/react".into()),
            stackoverflow_tag: None,
        }
    }

    #[tokio::test]
    async fn skips_pull_requests_and_maps_fields() {
        let router = Router::new().route(
            "/repos/facebook/react/issues",
            get(|| async {
                Json(json!([
                    {
                        "id": 1, "number": 10, "title": "useEffect fires twice",
                        "body": "It is broken", "state": "open",
                        "created_at": "2024-05-01T10:00:00Z", "comments": 4,
                        "labels": [{ "name": "Type: Bug" }],
                        "user": { "login": "dan" },
                        "reactions": { "total_count": 7 }
                    },
                    {
                        "id": 2, "number": 11, "title": "Bump deps", "body": null,
                        "state": "open", "created_at": "2024-05-02T10:00:00Z",
                        "pull_request": { "url": "x" }
                    }
                ]))
            }),
        );
        let base = spawn_router(router).await;
        let collector = GitHubCollector::with_base_url(&base, None)
            .unwrap()
            .with_page_delay(Duration::ZERO);

        let posts = collector
            .collect(&react(), &CollectRequest { days: 30, max_items: 50 })
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "useEffect fires twice");
        assert_eq!(posts[0].labels, vec!["Type: Bug".to_string()]);
        assert_eq!(posts[0].reactions, 7);
        assert_eq!(posts[0].author, "dan");
    }

    #[tokio::test]
    async fn rate_limit_on_first_page_is_an_error() {
        let router = Router::new().route(
            "/repos/facebook/react/issues",
            get(|| async { (AxumStatus::FORBIDDEN, "rate limited") }),
        );
        let base = spawn_router(router).await;
        let collector = GitHubCollector::with_base_url(&base, None).unwrap();

        let result = collector
            .collect(&react(), &CollectRequest { days: 30, max_items: 50 })
            .await;
        assert!(matches!(result, Err(CollectorError::RateLimited("GitHub"))));
    }

    #[tokio::test]
    async fn unmapped_technology_yields_nothing() {
        let collector = GitHubCollector::with_base_url("http://127.0.0.1:9", None).unwrap();
        let svelte = TechnologyConfig {
            name: "svelte".into(),
            github_repo: None,
            stackoverflow_tag: Some("svelte".into()),
        };
        let posts = collector
            .collect(&svelte, &CollectRequest { days: 30, max_items: 50 })
            .await
            .unwrap();
        assert!(posts.is_empty());
    }
}
