pub mod arxiv;
pub mod hacker_news;
pub mod reddit;
pub mod wikipedia;

pub use arxiv::PaperSource;
pub use hacker_news::NewsSource;
pub use reddit::ForumSource;
pub use wikipedia::EncyclopediaSource;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use openknowledge_common::{Query, Resource, ResourceBatch, SourceId, SourceKind};

/// Adapter that answers a query with one batch.
#[async_trait]
pub trait SingleShotSource: Send + Sync {
    fn id(&self) -> SourceId;
    async fn fetch(&self, query: &Query) -> Result<ResourceBatch>;
}

/// Adapter that answers a query as a sequence of batches. The caller keeps
/// the cursor between calls and stops once `has_more` is false.
#[async_trait]
pub trait IncrementalSource: Send + Sync {
    fn id(&self) -> SourceId;
    async fn next(&self, query: &Query, cursor: Cursor) -> Result<Page>;
}

/// Paging state for an incremental source. Opaque to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// Zero-based upstream offset of the next page to request.
    pub offset: usize,
    /// Records handed out so far.
    pub delivered: usize,
    /// Canonical urls already buffered or delivered.
    pub seen: HashSet<String>,
    /// Fetched but not yet delivered.
    pub buffered: VecDeque<Resource>,
    /// The upstream returned a short page; no further requests.
    pub upstream_done: bool,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub batch: ResourceBatch,
    pub has_more: bool,
    pub cursor: Cursor,
}

#[derive(Clone)]
pub enum SourceAdapter {
    SingleShot(Arc<dyn SingleShotSource>),
    Incremental(Arc<dyn IncrementalSource>),
}

impl SourceAdapter {
    pub fn id(&self) -> SourceId {
        match self {
            SourceAdapter::SingleShot(s) => s.id(),
            SourceAdapter::Incremental(s) => s.id(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceAdapter::SingleShot(_) => SourceKind::SingleShot,
            SourceAdapter::Incremental(_) => SourceKind::Incremental,
        }
    }
}
