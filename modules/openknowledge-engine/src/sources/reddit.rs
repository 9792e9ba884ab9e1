// Forum pipeline: rank topics -> search posts per topic -> keep the posts
// closest to the query -> pull links from their best comments -> drop
// dead links. Topics are worked concurrently; output is in topic-rank
// order, then post order, then comment-score order.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use openknowledge_common::{Query, Resource, ResourceBatch, SourceId};
use reddit_client::Post;

use super::SingleShotSource;
use crate::links::extract_urls_from;
use crate::traits::{ForumApi, LinkFilter, SemanticRanker};

const FRAMING: &str = "Resources to learn";

/// Comments scanned per post.
const COMMENTS_PER_POST: usize = 50;

/// Candidate posts fetched per kept post before semantic re-ranking.
const CANDIDATE_FACTOR: usize = 3;

pub struct ForumSource {
    forum: Arc<dyn ForumApi>,
    ranker: Arc<dyn SemanticRanker>,
    links: Arc<dyn LinkFilter>,
    topics: usize,
    posts_per_topic: usize,
}

impl ForumSource {
    pub fn new(
        forum: Arc<dyn ForumApi>,
        ranker: Arc<dyn SemanticRanker>,
        links: Arc<dyn LinkFilter>,
        topics: usize,
        posts_per_topic: usize,
    ) -> Self {
        Self {
            forum,
            ranker,
            links,
            topics,
            posts_per_topic,
        }
    }

    /// Live links for one topic, in post order then comment-score order.
    async fn topic_links(&self, topic: &str, framed: &str) -> Result<Vec<String>> {
        let posts = self.best_posts(topic, framed).await?;
        debug!(topic, posts = posts.len(), "reddit: posts selected");

        let mut links = Vec::new();
        for post in &posts {
            links.extend(self.post_links(post).await?);
        }
        Ok(links)
    }

    async fn best_posts(&self, topic: &str, framed: &str) -> Result<Vec<Post>> {
        let candidates = self
            .forum
            .search_posts(topic, framed, CANDIDATE_FACTOR * self.posts_per_topic)
            .await
            .with_context(|| format!("post search in {topic}"))?;
        if candidates.len() <= 1 {
            return Ok(candidates);
        }

        let headlines: Vec<String> = candidates.iter().map(Post::headline).collect();
        let scores = self
            .ranker
            .similarity(framed, &headlines)
            .await
            .context("post similarity")?;

        let mut scored: Vec<(Post, f32)> = candidates.into_iter().zip(scores).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(self.posts_per_topic)
            .map(|(post, _)| post)
            .collect())
    }

    async fn post_links(&self, post: &Post) -> Result<Vec<String>> {
        let comments = self
            .forum
            .top_comments(post, COMMENTS_PER_POST)
            .await
            .with_context(|| format!("comments for post {}", post.id))?;

        let urls = extract_urls_from(comments.iter().filter_map(|c| c.body.as_deref()));
        if urls.is_empty() {
            return Ok(urls);
        }

        let candidates: HashSet<String> = urls.iter().cloned().collect();
        let live = self.links.filter_live(&candidates).await;
        Ok(urls.into_iter().filter(|u| live.contains(u)).collect())
    }
}

#[async_trait]
impl SingleShotSource for ForumSource {
    fn id(&self) -> SourceId {
        SourceId::Reddit
    }

    async fn fetch(&self, query: &Query) -> Result<ResourceBatch> {
        let topics = self
            .ranker
            .rank(query.as_str(), self.topics)
            .await
            .context("topic ranking")?;
        info!(query = %query, topics = ?topics, "reddit: searching topics");

        let framed = query.framed(FRAMING);
        let per_topic = join_all(topics.iter().map(|t| self.topic_links(t, &framed))).await;

        let mut failed = 0;
        let mut links = Vec::new();
        for (topic, result) in topics.iter().zip(per_topic) {
            match result {
                Ok(found) => links.extend(found),
                Err(e) => {
                    failed += 1;
                    warn!(topic, error = %e, "reddit: topic failed, skipping");
                }
            }
        }
        if failed > 0 && failed == topics.len() {
            anyhow::bail!("all {failed} topics failed");
        }

        let batch: ResourceBatch = links
            .iter()
            .map(|url| Resource::new(SourceId::Reddit, url))
            .collect();
        info!(query = %query, links = batch.len(), "reddit: search complete");
        Ok(batch)
    }
}
