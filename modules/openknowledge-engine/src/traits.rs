// Seams between the source adapters and the outside world.
//
// Encyclopedia, ForumApi, NewsSearch, PaperSearch: one per upstream, each
//   implemented for its REST client crate.
// SemanticRanker: picks forum topics and scores posts against a query.
// LinkFilter, DescriptionSource: the probe crate's prober and enricher.
//
// Every adapter holds these as `Arc<dyn ...>` so tests swap in the mocks
// from `crate::testing` with no network.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;

use arxiv_client::{ArxivClient, Paper};
use hn_client::{HnClient, Hit};
use openknowledge_probe::{LivenessProber, MetadataEnricher};
use reddit_client::{Comment, Post, RedditClient};
use wikipedia_client::{SearchOutcome, WikipediaClient};

// ---------------------------------------------------------------------------
// Upstreams
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Top article for `term`, plus the upstream's spelling suggestion.
    async fn search(&self, term: &str) -> Result<SearchOutcome>;
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn search(&self, term: &str) -> Result<SearchOutcome> {
        Ok(self.search(term).await?)
    }
}

#[async_trait]
pub trait ForumApi: Send + Sync {
    async fn search_posts(&self, topic: &str, query: &str, limit: usize) -> Result<Vec<Post>>;

    /// Comments on `post`, highest score first.
    async fn top_comments(&self, post: &Post, limit: usize) -> Result<Vec<Comment>>;
}

#[async_trait]
impl ForumApi for RedditClient {
    async fn search_posts(&self, topic: &str, query: &str, limit: usize) -> Result<Vec<Post>> {
        Ok(self.search_posts(topic, query, limit).await?)
    }

    async fn top_comments(&self, post: &Post, limit: usize) -> Result<Vec<Comment>> {
        Ok(self.top_comments(post, limit).await?)
    }
}

#[async_trait]
pub trait NewsSearch: Send + Sync {
    async fn search(&self, query: &str, hits: usize) -> Result<Vec<Hit>>;
}

#[async_trait]
impl NewsSearch for HnClient {
    async fn search(&self, query: &str, hits: usize) -> Result<Vec<Hit>> {
        Ok(self.search_stories(query, hits).await?)
    }
}

#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// Relevance-ordered records starting at zero-based `start`.
    async fn search(&self, query: &str, start: usize, max_results: usize) -> Result<Vec<Paper>>;
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, start: usize, max_results: usize) -> Result<Vec<Paper>> {
        Ok(self.search(query, start, max_results).await?)
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SemanticRanker: Send + Sync {
    /// The `top_k` candidate topics closest to `query`, best first.
    async fn rank(&self, query: &str, top_k: usize) -> Result<Vec<String>>;

    /// Similarity of each text to `query`, in input order.
    async fn similarity(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

#[async_trait]
pub trait LinkFilter: Send + Sync {
    /// The live subset of `urls`.
    async fn filter_live(&self, urls: &HashSet<String>) -> HashSet<String>;
}

#[async_trait]
impl LinkFilter for LivenessProber {
    async fn filter_live(&self, urls: &HashSet<String>) -> HashSet<String> {
        self.filter_live(urls).await
    }
}

#[async_trait]
pub trait DescriptionSource: Send + Sync {
    /// Exactly one entry per input url.
    async fn fetch_meta(&self, urls: &HashSet<String>) -> HashMap<String, Option<String>>;
}

#[async_trait]
impl DescriptionSource for MetadataEnricher {
    async fn fetch_meta(&self, urls: &HashSet<String>) -> HashMap<String, Option<String>> {
        self.fetch_meta(urls).await
    }
}
