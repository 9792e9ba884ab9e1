// Fan-out / fan-in over the registered sources.
//
// Every source gets one task on its lane. The coordinator then waits on
// whichever task finishes first and emits its batch straight away.
// Incremental sources are re-submitted with the cursor they returned
// until they report no more data. A failed or panicked task retires its
// source and nothing else.
//
// Dropping the returned stream does not cancel tasks already running;
// they finish and their results are discarded.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use tracing::{debug, info, warn};

use openknowledge_common::{
    OpenKnowledgeError, Query, ResourceBatch, SourceEvent, SourceId, SourceTask, TaskState,
};

use crate::executor::{Executor, Lane, TaskHandle};
use crate::sources::{Cursor, IncrementalSource, Page, SingleShotSource, SourceAdapter};

/// One adapter and the lane it runs on.
#[derive(Clone)]
pub struct RegisteredSource {
    pub adapter: SourceAdapter,
    pub lane: Lane,
}

enum Fetched {
    Batch(ResourceBatch),
    Page(Page),
}

#[derive(Clone)]
pub struct StreamCoordinator {
    executor: Executor,
    sources: Vec<RegisteredSource>,
}

impl StreamCoordinator {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            sources: Vec::new(),
        }
    }

    pub fn single_shot<S>(mut self, source: S, lane: Lane) -> Self
    where
        S: SingleShotSource + 'static,
    {
        self.sources.push(RegisteredSource {
            adapter: SourceAdapter::SingleShot(Arc::new(source)),
            lane,
        });
        self
    }

    pub fn incremental<S>(mut self, source: S, lane: Lane) -> Self
    where
        S: IncrementalSource + 'static,
    {
        self.sources.push(RegisteredSource {
            adapter: SourceAdapter::Incremental(Arc::new(source)),
            lane,
        });
        self
    }

    pub fn register(mut self, source: RegisteredSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.adapter.id()).collect()
    }

    /// Lazily run every source for `query`. Events arrive in completion
    /// order; the stream ends once every source is exhausted or failed.
    pub fn start(&self, query: Query) -> impl Stream<Item = SourceEvent> + Send + 'static {
        let executor = self.executor.clone();
        let sources = self.sources.clone();

        async_stream::stream! {
            let mut tasks: Vec<SourceTask> = sources
                .iter()
                .map(|s| SourceTask::new(s.adapter.id(), s.adapter.kind()))
                .collect();
            let mut pending = FuturesUnordered::new();

            info!(query = %query, sources = sources.len(), "search: starting sources");
            for (idx, source) in sources.iter().enumerate() {
                pending.push(tagged(idx, dispatch(&executor, source, &query, Cursor::default())));
                tasks[idx].state = TaskState::Running;
            }

            let mut emitted = 0usize;
            while let Some((idx, outcome)) = pending.next().await {
                let source = &sources[idx];
                let task = &mut tasks[idx];
                if task.state.is_terminal() {
                    continue;
                }

                match outcome {
                    Ok(Fetched::Batch(batch)) => {
                        task.state = TaskState::Exhausted;
                        debug!(source = %task.source, count = batch.len(), "search: source finished");
                        emitted += 1;
                        yield SourceEvent { source: task.source, batch };
                    }
                    Ok(Fetched::Page(page)) => {
                        task.state = TaskState::Completed;
                        if page.has_more {
                            pending.push(tagged(idx, dispatch(&executor, source, &query, page.cursor)));
                            task.state = TaskState::Running;
                        } else {
                            task.state = TaskState::Exhausted;
                            debug!(source = %task.source, "search: source exhausted");
                        }
                        emitted += 1;
                        yield SourceEvent { source: task.source, batch: page.batch };
                    }
                    Err(e) => {
                        task.state = TaskState::Failed;
                        let failure = OpenKnowledgeError::source_failure(task.source, &e);
                        warn!(source = %task.source, error = %failure, "search: source failed");
                    }
                }
            }

            let failed = tasks.iter().filter(|t| t.state == TaskState::Failed).count();
            info!(query = %query, events = emitted, failed, "search: all sources retired");
        }
    }
}

async fn tagged(idx: usize, handle: TaskHandle<Fetched>) -> (usize, anyhow::Result<Fetched>) {
    (idx, handle.await)
}

fn dispatch(
    executor: &Executor,
    source: &RegisteredSource,
    query: &Query,
    cursor: Cursor,
) -> TaskHandle<Fetched> {
    let query = query.clone();
    match &source.adapter {
        SourceAdapter::SingleShot(adapter) => {
            let adapter = adapter.clone();
            executor.submit(source.lane, async move {
                adapter.fetch(&query).await.map(Fetched::Batch)
            })
        }
        SourceAdapter::Incremental(adapter) => {
            let adapter = adapter.clone();
            executor.submit(source.lane, async move {
                adapter.next(&query, cursor).await.map(Fetched::Page)
            })
        }
    }
}
