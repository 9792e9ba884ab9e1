pub mod error;

pub use error::{ArxivError, Result};

use std::time::Duration;

const BASE_URL: &str = "http://export.arxiv.org/api/query";

/// One paper record from the Atom export feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    /// Abstract page url; arXiv uses it as the entry id.
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
}

pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("OpenKnowledge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Relevance-ordered search. `start` is the zero-based offset into the
    /// full result list; fewer than `max_results` papers means the end was reached.
    pub async fn search(&self, query: &str, start: usize, max_results: usize) -> Result<Vec<Paper>> {
        tracing::debug!(query, start, max_results, "arxiv: search");

        let search_query = format!("all:{query}");
        let start = start.to_string();
        let max_results = max_results.to_string();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", start.as_str()),
                ("max_results", max_results.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ArxivError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        parse_feed(&bytes)
    }
}

/// Parse an arXiv Atom response into papers, in feed order.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Paper>> {
    let feed = feed_rs::parser::parse(bytes)?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id.trim().to_string();
            if !id.starts_with("http") {
                return None;
            }
            let title = collapse_whitespace(&entry.title?.content);
            let summary = entry
                .summary
                .map(|s| collapse_whitespace(&s.content))
                .filter(|s| !s.is_empty());
            Some(Paper { id, title, summary })
        })
        .collect())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Router};
    use std::collections::HashMap;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:graph theory</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-01-01T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/1001.0001v2</id>
    <updated>2010-01-01T00:00:00Z</updated>
    <published>2010-01-01T00:00:00Z</published>
    <title>A Survey of
      Spectral Graph Theory</title>
    <summary>  We survey the
  spectral side of things.  </summary>
    <link href="http://arxiv.org/abs/1001.0001v2" rel="alternate" type="text/html"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/1001.0002v1</id>
    <updated>2010-01-02T00:00:00Z</updated>
    <published>2010-01-02T00:00:00Z</published>
    <title>Random Graphs</title>
    <summary></summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_in_order_with_clean_text() {
        let papers = parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].id, "http://arxiv.org/abs/1001.0001v2");
        assert_eq!(papers[0].title, "A Survey of Spectral Graph Theory");
        assert_eq!(papers[0].summary.as_deref(), Some("We survey the spectral side of things."));
        assert_eq!(papers[1].title, "Random Graphs");
        assert_eq!(papers[1].summary, None);
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(parse_feed(b"<html>nope"), Err(ArxivError::Parse(_))));
    }

    #[tokio::test]
    async fn search_passes_paging_parameters() {
        let router = Router::new().route(
            "/api/query",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params["search_query"], "all:graph theory");
                assert_eq!(params["start"], "5");
                assert_eq!(params["max_results"], "10");
                assert_eq!(params["sortBy"], "relevance");
                FEED
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let client = ArxivClient::with_base_url(&format!("http://{addr}/api/query")).unwrap();
        let papers = client.search("graph theory", 5, 10).await.unwrap();
        assert_eq!(papers.len(), 2);
    }
}
