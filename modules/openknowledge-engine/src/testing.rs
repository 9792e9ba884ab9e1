// Test doubles for the engine.
//
// One mock per trait seam, all in-memory and deterministic:
// - MockEncyclopedia (Encyclopedia): term → article / suggestion
// - MockForum (ForumApi): topic → posts, post id → comments
// - MockNews (NewsSearch): query → hits
// - MockPapers (PaperSearch): one ordered record list, sliced per call
// - StaticLinkFilter (LinkFilter), MockDescriptions (DescriptionSource)
// - FixedEmbedder (TextEmbedder), FixedRanker (SemanticRanker)
// - ScriptedSource (SingleShotSource): fixed delay then a fixed outcome,
//   for driving the coordinator directly.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use arxiv_client::Paper;
use hn_client::Hit;
use openknowledge_common::{Query, Resource, ResourceBatch, SourceId};
use reddit_client::{Comment, Post};
use wikipedia_client::{article_url, Article, SearchOutcome};

use crate::embedder::TextEmbedder;
use crate::sources::SingleShotSource;
use crate::traits::{
    DescriptionSource, Encyclopedia, ForumApi, LinkFilter, NewsSearch, PaperSearch, SemanticRanker,
};

// ---------------------------------------------------------------------------
// MockEncyclopedia
// ---------------------------------------------------------------------------

/// Unregistered terms return no article and no suggestion.
#[derive(Default)]
pub struct MockEncyclopedia {
    articles: HashMap<String, Article>,
    suggestions: HashMap<String, String>,
    fail: bool,
    searched: Mutex<Vec<String>>,
}

impl MockEncyclopedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_article(mut self, term: &str, title: &str, pageid: u64) -> Self {
        self.articles.insert(
            term.to_string(),
            Article {
                title: title.to_string(),
                url: article_url(pageid),
            },
        );
        self
    }

    pub fn on_suggestion(mut self, term: &str, suggestion: &str) -> Self {
        self.suggestions
            .insert(term.to_string(), suggestion.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encyclopedia for MockEncyclopedia {
    async fn search(&self, term: &str) -> Result<SearchOutcome> {
        self.searched.lock().unwrap().push(term.to_string());
        if self.fail {
            bail!("encyclopedia unavailable");
        }
        Ok(SearchOutcome {
            article: self.articles.get(term).cloned(),
            suggestion: self.suggestions.get(term).cloned(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockForum
// ---------------------------------------------------------------------------

/// Errors for topics with no registered posts; posts with no registered
/// comments have none.
#[derive(Default)]
pub struct MockForum {
    posts: HashMap<String, Vec<Post>>,
    comments: HashMap<String, Vec<Comment>>,
    searches: Mutex<Vec<(String, String, usize)>>,
}

impl MockForum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts as `(id, title)`, in upstream relevance order.
    pub fn on_posts(mut self, topic: &str, posts: &[(&str, &str)]) -> Self {
        let posts = posts
            .iter()
            .map(|(id, title)| Post {
                id: id.to_string(),
                subreddit: topic.to_string(),
                title: title.to_string(),
                selftext: String::new(),
                permalink: format!("/r/{topic}/comments/{id}"),
                score: 0,
            })
            .collect();
        self.posts.insert(topic.to_string(), posts);
        self
    }

    /// Comments as `(body, score)`, in any order.
    pub fn on_comments(mut self, post_id: &str, comments: &[(&str, i64)]) -> Self {
        let comments = comments
            .iter()
            .map(|(body, score)| Comment {
                body: Some(body.to_string()),
                score: *score,
            })
            .collect();
        self.comments.insert(post_id.to_string(), comments);
        self
    }

    /// Every `(topic, query, limit)` passed to `search_posts`.
    pub fn searches(&self) -> Vec<(String, String, usize)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForumApi for MockForum {
    async fn search_posts(&self, topic: &str, query: &str, limit: usize) -> Result<Vec<Post>> {
        self.searches
            .lock()
            .unwrap()
            .push((topic.to_string(), query.to_string(), limit));
        match self.posts.get(topic) {
            Some(posts) => Ok(posts.iter().take(limit).cloned().collect()),
            None => bail!("MockForum: no posts registered for {topic}"),
        }
    }

    async fn top_comments(&self, post: &Post, limit: usize) -> Result<Vec<Comment>> {
        let mut comments = self.comments.get(&post.id).cloned().unwrap_or_default();
        comments.sort_by(|a, b| b.score.cmp(&a.score));
        comments.truncate(limit);
        Ok(comments)
    }
}

// ---------------------------------------------------------------------------
// MockNews
// ---------------------------------------------------------------------------

/// Unregistered queries return no hits. An empty url string means a
/// text-only story.
#[derive(Default)]
pub struct MockNews {
    hits: HashMap<String, Vec<Hit>>,
    fail: bool,
    searched: Mutex<Vec<(String, usize)>>,
}

impl MockNews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits as `(title, url)`.
    pub fn on_search(mut self, query: &str, hits: &[(&str, &str)]) -> Self {
        let hits = hits
            .iter()
            .enumerate()
            .map(|(i, (title, url))| Hit {
                object_id: i.to_string(),
                title: Some(title.to_string()),
                url: (!url.is_empty()).then(|| url.to_string()),
                points: None,
            })
            .collect();
        self.hits.insert(query.to_string(), hits);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn searched(&self) -> Vec<(String, usize)> {
        self.searched.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsSearch for MockNews {
    async fn search(&self, query: &str, hits: usize) -> Result<Vec<Hit>> {
        self.searched.lock().unwrap().push((query.to_string(), hits));
        if self.fail {
            bail!("news search unavailable");
        }
        Ok(self
            .hits
            .get(query)
            .map(|h| h.iter().take(hits).cloned().collect())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockPapers
// ---------------------------------------------------------------------------

pub fn paper(id: &str, title: &str, summary: Option<&str>) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        summary: summary.map(str::to_string),
    }
}

/// Serves `records[start..start + max_results]` regardless of the query.
pub struct MockPapers {
    records: Vec<Paper>,
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockPapers {
    pub fn new(records: Vec<Paper>) -> Self {
        Self {
            records,
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// `n` distinct papers, `http://arxiv.org/abs/0000.NNNN`.
    pub fn numbered(n: usize) -> Self {
        Self::new(
            (0..n)
                .map(|i| {
                    paper(
                        &format!("http://arxiv.org/abs/0000.{i:04}"),
                        &format!("Paper {i}"),
                        Some(&format!("Abstract of paper {i}")),
                    )
                })
                .collect(),
        )
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaperSearch for MockPapers {
    async fn search(&self, _query: &str, start: usize, max_results: usize) -> Result<Vec<Paper>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            bail!("paper search unavailable");
        }
        Ok(self
            .records
            .iter()
            .skip(start)
            .take(max_results)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

pub struct StaticLinkFilter {
    alive: Option<HashSet<String>>,
}

impl StaticLinkFilter {
    pub fn all_alive() -> Self {
        Self { alive: None }
    }

    pub fn alive(urls: &[&str]) -> Self {
        Self {
            alive: Some(urls.iter().map(|u| u.to_string()).collect()),
        }
    }
}

#[async_trait]
impl LinkFilter for StaticLinkFilter {
    async fn filter_live(&self, urls: &HashSet<String>) -> HashSet<String> {
        match &self.alive {
            None => urls.clone(),
            Some(alive) => urls.intersection(alive).cloned().collect(),
        }
    }
}

#[derive(Default)]
pub struct MockDescriptions {
    descriptions: HashMap<String, String>,
}

impl MockDescriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_url(mut self, url: &str, description: &str) -> Self {
        self.descriptions
            .insert(url.to_string(), description.to_string());
        self
    }
}

#[async_trait]
impl DescriptionSource for MockDescriptions {
    async fn fetch_meta(&self, urls: &HashSet<String>) -> HashMap<String, Option<String>> {
        urls.iter()
            .map(|u| (u.clone(), self.descriptions.get(u).cloned()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FixedEmbedder
// ---------------------------------------------------------------------------

/// Deterministic embedder. Registered texts get exact vectors; unmatched
/// texts get a hash-based unit vector.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
    batch_calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn on_text(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.hash_vector(text))
    }

    fn hash_vector(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vec = vec![0.0f32; self.dimension];
        for v in vec.iter_mut() {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *v = ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl TextEmbedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

// ---------------------------------------------------------------------------
// FixedRanker
// ---------------------------------------------------------------------------

/// Ranks topics in registration order. Similarity is 1.0 for the
/// preferred text and 0.0 for everything else.
pub struct FixedRanker {
    topics: Vec<String>,
    preferred: Option<String>,
}

impl FixedRanker {
    pub fn new(topics: &[&str]) -> Self {
        Self {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            preferred: None,
        }
    }

    pub fn prefer(mut self, text: &str) -> Self {
        self.preferred = Some(text.to_string());
        self
    }
}

#[async_trait]
impl SemanticRanker for FixedRanker {
    async fn rank(&self, _query: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self.topics.iter().take(top_k).cloned().collect())
    }

    async fn similarity(&self, _query: &str, texts: &[String]) -> Result<Vec<f32>> {
        Ok(texts
            .iter()
            .map(|t| {
                if self.preferred.as_deref() == Some(t.as_str()) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

enum Script {
    Urls(Vec<String>),
    Fail(String),
    Panic,
}

/// Single-shot source that sleeps, then succeeds, fails or panics.
pub struct ScriptedSource {
    id: SourceId,
    delay: Duration,
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn ok(id: SourceId, delay_ms: u64, urls: &[&str]) -> Self {
        Self::scripted(
            id,
            delay_ms,
            Script::Urls(urls.iter().map(|u| u.to_string()).collect()),
        )
    }

    pub fn failing(id: SourceId, delay_ms: u64, message: &str) -> Self {
        Self::scripted(id, delay_ms, Script::Fail(message.to_string()))
    }

    pub fn panicking(id: SourceId, delay_ms: u64) -> Self {
        Self::scripted(id, delay_ms, Script::Panic)
    }

    fn scripted(id: SourceId, delay_ms: u64, script: Script) -> Self {
        Self {
            id,
            delay: Duration::from_millis(delay_ms),
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SingleShotSource for ScriptedSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self, _query: &Query) -> Result<ResourceBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match &self.script {
            Script::Urls(urls) => Ok(urls.iter().map(|u| Resource::new(self.id, u)).collect()),
            Script::Fail(message) => bail!("{message}"),
            Script::Panic => panic!("scripted panic in {}", self.id),
        }
    }
}
