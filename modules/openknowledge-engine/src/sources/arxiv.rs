use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use arxiv_client::Paper;
use openknowledge_common::{Query, Resource, ResourceBatch, SourceId};

use super::{Cursor, IncrementalSource, Page};
use crate::traits::PaperSearch;

/// Abstracts are cut to this many characters.
const SUMMARY_CHARS: usize = 200;

/// Papers one at a time, most relevant first, at most `limit` in total.
/// Each call returns a batch of one; the cursor buffers the rest of the
/// upstream page and keeps one record of lookahead so the last record is
/// already marked as the end.
pub struct PaperSource {
    papers: Arc<dyn PaperSearch>,
    limit: usize,
    page_size: usize,
}

impl PaperSource {
    pub fn new(papers: Arc<dyn PaperSearch>, limit: usize) -> Self {
        Self {
            papers,
            limit,
            page_size: limit.max(1),
        }
    }

    /// Upstream records requested per call.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Buffer until two records are on hand (one to hand out, one to prove
    /// there is more) or the upstream or the limit runs out.
    async fn fill(&self, query: &Query, cursor: &mut Cursor) -> Result<()> {
        while cursor.buffered.len() < 2
            && !cursor.upstream_done
            && cursor.delivered + cursor.buffered.len() < self.limit
        {
            let papers = self
                .papers
                .search(query.as_str(), cursor.offset, self.page_size)
                .await
                .with_context(|| format!("paper search at offset {}", cursor.offset))?;
            debug!(offset = cursor.offset, count = papers.len(), "arxiv: page fetched");

            cursor.offset += papers.len();
            if papers.len() < self.page_size {
                cursor.upstream_done = true;
            }

            for paper in papers {
                let resource = paper_resource(paper);
                if cursor.seen.insert(resource.key().to_string()) {
                    cursor.buffered.push_back(resource);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IncrementalSource for PaperSource {
    fn id(&self) -> SourceId {
        SourceId::Arxiv
    }

    async fn next(&self, query: &Query, mut cursor: Cursor) -> Result<Page> {
        self.fill(query, &mut cursor).await?;

        let batch = match cursor.buffered.pop_front() {
            Some(resource) if cursor.delivered < self.limit => {
                cursor.delivered += 1;
                ResourceBatch::single(resource)
            }
            _ => ResourceBatch::empty(),
        };

        let has_more = cursor.delivered < self.limit
            && (!cursor.buffered.is_empty() || !cursor.upstream_done);
        // a full page may have been the last one; look ahead before promising more
        let has_more = has_more && {
            self.fill(query, &mut cursor).await?;
            !cursor.buffered.is_empty()
        };

        Ok(Page {
            batch,
            has_more,
            cursor,
        })
    }
}

fn paper_resource(paper: Paper) -> Resource {
    let description = paper.summary.map(|s| {
        let cut: String = s.trim().chars().take(SUMMARY_CHARS).collect();
        format!("{cut}...")
    });
    Resource::new(SourceId::Arxiv, &paper.id)
        .with_title(paper.title)
        .with_description(description)
}
