use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_url;
use crate::error::OpenKnowledgeError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// The upstream a resource was discovered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Wikipedia,
    Reddit,
    HackerNews,
    Arxiv,
}

impl SourceId {
    /// Label used on the wire and in logs.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::Wikipedia => "WikiMedia",
            SourceId::Reddit => "Reddit",
            SourceId::HackerNews => "HackerNews",
            SourceId::Arxiv => "Arxiv",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// One call, one batch.
    SingleShot,
    /// Re-invoked with a cursor until it reports no more data.
    Incremental,
}

/// Lifecycle of one source within a single query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Exhausted,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Exhausted | TaskState::Failed)
    }
}

/// Per-source bookkeeping owned by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTask {
    pub source: SourceId,
    pub kind: SourceKind,
    pub state: TaskState,
}

impl SourceTask {
    pub fn new(source: SourceId, kind: SourceKind) -> Self {
        Self {
            source,
            kind,
            state: TaskState::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A trimmed, non-empty search term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Result<Self, OpenKnowledgeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OpenKnowledgeError::Validation("query must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The query with a natural-language framing prefixed, e.g. `"Learn graph theory"`.
    pub fn framed(&self, prefix: &str) -> String {
        format!("{} {}", prefix.trim_end(), self.0)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A learning resource. `url` is kept as the upstream gave it; identity is
/// its canonical form alone.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub title: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub source: SourceId,
    #[serde(skip)]
    key: String,
}

impl Resource {
    pub fn new(source: SourceId, url: &str) -> Self {
        let url = url.trim();
        Self {
            title: None,
            url: url.to_string(),
            description: None,
            source,
            key: canonical_url(url),
        }
    }

    /// Canonical url used for equality and deduplication.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = title.trim();
        self.title = (!title.is_empty()).then(|| title.to_string());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Three-line rendering consumed by the transport layer.
    pub fn formatted(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.title.as_deref().unwrap_or(UNTITLED),
            self.url,
            self.description.as_deref().unwrap_or(NO_DESCRIPTION),
        )
    }
}

pub const UNTITLED: &str = "(untitled)";
pub const NO_DESCRIPTION: &str = "(no description)";

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Ordered resources from one adapter invocation. Never holds two resources
/// with the same url; the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceBatch(Vec<Resource>);

impl ResourceBatch {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn single(resource: Resource) -> Self {
        Self(vec![resource])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.0.iter()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.0.iter().map(|r| r.url.as_str()).collect()
    }

    pub fn into_inner(self) -> Vec<Resource> {
        self.0
    }
}

impl FromIterator<Resource> for ResourceBatch {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        Self(
            iter.into_iter()
                .filter(|r| seen.insert(r.key.clone()))
                .collect(),
        )
    }
}

impl IntoIterator for ResourceBatch {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Stream events
// ---------------------------------------------------------------------------

/// One emission of the coordinator: a batch attributed to its source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub source: SourceId,
    pub batch: ResourceBatch,
}

/// Transport-facing shape of a [`SourceEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub source: String,
    pub resources: Vec<String>,
}

impl From<&SourceEvent> for StreamEvent {
    fn from(event: &SourceEvent) -> Self {
        Self {
            source: event.source.label().to_string(),
            resources: event.batch.iter().map(Resource::formatted).collect(),
        }
    }
}
