use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use tracing::{debug, info};

use openknowledge_common::OpenKnowledgeError;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Paragraph fallback keeps this many words.
const PARAGRAPH_WORDS: usize = 50;

static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaResult {
    pub url: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Raw HTML of a page. Non-2xx responses are errors.
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(OpenKnowledgeError::UpstreamApi {
                status: status.as_u16(),
                message: url.to_string(),
            }
            .into());
        }
        Ok(resp.text().await?)
    }
}

/// Short page descriptions for urls already known to be alive.
pub struct MetadataEnricher {
    fetcher: Arc<dyn PageFetcher>,
    max_workers: usize,
}

impl MetadataEnricher {
    pub fn new(timeout: Duration, max_workers: usize) -> Result<Self> {
        Ok(Self::with_fetcher(
            Arc::new(HttpPageFetcher::new(timeout)?),
            max_workers,
        ))
    }

    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, max_workers: usize) -> Self {
        Self {
            fetcher,
            max_workers: max_workers.max(1),
        }
    }

    pub async fn describe(&self, url: &str) -> MetaResult {
        let description = match self.fetcher.fetch_html(url).await {
            Ok(html) => extract_description(&html),
            Err(e) => {
                debug!(url, error = %e, "meta: fetch failed");
                None
            }
        };
        MetaResult {
            url: url.to_string(),
            description,
        }
    }

    /// One entry per input url; failed fetches map to `None`.
    pub async fn fetch_meta(&self, urls: &HashSet<String>) -> HashMap<String, Option<String>> {
        let results: HashMap<String, Option<String>> = stream::iter(urls.iter().cloned())
            .map(|url| async move { self.describe(&url).await })
            .buffer_unordered(self.max_workers)
            .map(|meta| (meta.url, meta.description))
            .collect()
            .await;

        let described = results.values().filter(|d| d.is_some()).count();
        info!(urls = urls.len(), described, "meta: enrichment complete");
        results
    }
}

/// `<meta name="description">` if present and non-blank, else the first
/// paragraph cut to fifty words.
pub fn extract_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let meta = document
        .select(&META_DESCRIPTION)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty());
    if let Some(content) = meta {
        return Some(content.to_string());
    }

    let paragraph = document.select(&PARAGRAPH).next()?;
    let text = paragraph.text().collect::<String>();
    let words: Vec<&str> = text.split_whitespace().take(PARAGRAPH_WORDS).collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}
