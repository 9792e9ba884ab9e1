pub mod error;
pub mod types;

pub use error::{HnError, Result};
pub use types::{Hit, SearchResponse};

use std::time::Duration;

const BASE_URL: &str = "https://hn.algolia.com/api/v1";

pub struct HnClient {
    client: reqwest::Client,
    base_url: String,
}

impl HnClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(6))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search stories by relevance. Algolia matches the query against title
    /// and text, popular stories first.
    pub async fn search_stories(&self, query: &str, hits_per_page: usize) -> Result<Vec<Hit>> {
        tracing::debug!(query, hits_per_page, "hn: searching stories");

        let page_size = hits_per_page.to_string();
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("query", query),
                ("tags", "story"),
                ("hitsPerPage", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = resp.json().await?;
        tracing::debug!(query, count = body.hits.len(), "hn: search complete");
        Ok(body.hits)
    }
}
