pub mod error;
pub mod types;

pub use error::{Result, WikipediaError};
pub use types::{Article, SearchHit, SearchResponse};

use std::time::Duration;

const API_BASE: &str = "https://en.wikipedia.org/w/api.php";
const ARTICLE_BASE: &str = "https://en.wikipedia.org/";

/// Outcome of one search call: the top article, if any, and the
/// spelling suggestion MediaWiki returned alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub article: Option<Article>,
    pub suggestion: Option<String>,
}

pub struct WikipediaClient {
    client: reqwest::Client,
    api_base: String,
}

impl WikipediaClient {
    pub fn new() -> Result<Self> {
        Self::with_api_base(API_BASE)
    }

    /// Point the client at another MediaWiki install (or a test server).
    pub fn with_api_base(api_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("OpenKnowledge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.to_string(),
        })
    }

    /// Full-text search returning at most one article.
    pub async fn search(&self, term: &str) -> Result<SearchOutcome> {
        tracing::debug!(term, "wikipedia: search");

        let resp = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("formatversion", "2"),
                ("srlimit", "1"),
                ("srsearch", term),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WikipediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = resp.json().await?;

        Ok(SearchOutcome {
            article: body.first_hit().map(|hit| Article {
                title: hit.title.clone(),
                url: article_url(hit.pageid),
            }),
            suggestion: body.suggestion().map(str::to_string),
        })
    }
}

/// Stable article url keyed by page id.
pub fn article_url(pageid: u64) -> String {
    format!("{ARTICLE_BASE}?curid={pageid}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/w/api.php")
    }

    fn mediawiki() -> Router {
        Router::new().route(
            "/w/api.php",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let body = match params.get("srsearch").map(String::as_str) {
                    Some("graph theory") => serde_json::json!({
                        "query": {
                            "searchinfo": { "totalhits": 1 },
                            "search": [{ "ns": 0, "title": "Graph theory", "pageid": 12401 }]
                        }
                    }),
                    Some("grpah theory") => serde_json::json!({
                        "query": {
                            "searchinfo": { "totalhits": 0, "suggestion": "graph theory" },
                            "search": []
                        }
                    }),
                    _ => serde_json::json!({ "query": { "searchinfo": { "totalhits": 0 }, "search": [] } }),
                };
                Json(body)
            }),
        )
    }

    #[test]
    fn article_url_uses_curid() {
        assert_eq!(article_url(42), "https://en.wikipedia.org/?curid=42");
    }

    #[tokio::test]
    async fn direct_hit_is_resolved() {
        let base = serve(mediawiki()).await;
        let client = WikipediaClient::with_api_base(&base).unwrap();

        let outcome = client.search("graph theory").await.unwrap();
        assert_eq!(
            outcome.article,
            Some(Article {
                title: "Graph theory".into(),
                url: "https://en.wikipedia.org/?curid=12401".into(),
            })
        );
        assert_eq!(outcome.suggestion, None);
    }

    #[tokio::test]
    async fn typo_yields_suggestion_without_article() {
        let base = serve(mediawiki()).await;
        let client = WikipediaClient::with_api_base(&base).unwrap();

        let outcome = client.search("grpah theory").await.unwrap();
        assert_eq!(outcome.article, None);
        assert_eq!(outcome.suggestion.as_deref(), Some("graph theory"));
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let router = Router::new().route(
            "/w/api.php",
            get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = serve(router).await;
        let client = WikipediaClient::with_api_base(&base).unwrap();

        let err = client.search("anything").await.unwrap_err();
        assert!(matches!(err, WikipediaError::Api { status: 503, .. }));
    }
}
