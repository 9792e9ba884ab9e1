// Where adapter work runs.
//
// Lane::Cooperative: a plain tokio task on the shared scheduler.
// Lane::Pool: a dedicated blocking thread drives the future to completion,
// at most `workers` at a time.
//
// Both lanes hand back the same TaskHandle, so the coordinator never needs
// to know where a task ran.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use anyhow::{anyhow, Context as _, Result};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Cooperative,
    Pool,
}

/// Completion handle for a submitted task. Resolves to the task's own
/// result; a panic or cancellation inside the task becomes an `Err`.
pub struct TaskHandle<T> {
    inner: JoinHandle<Result<T>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner)
            .poll(cx)
            .map(|joined| joined.unwrap_or_else(|e| Err(join_failure(e))))
    }
}

fn join_failure(err: JoinError) -> anyhow::Error {
    if !err.is_panic() {
        return anyhow!("task cancelled: {err}");
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow!("task panicked: {message}")
}

/// Bounded set of blocking threads, each running one future with
/// `Handle::block_on`.
#[derive(Clone)]
pub struct WorkerPool {
    runtime: Handle,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(runtime: Handle, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn submit<F, T>(&self, fut: F) -> TaskHandle<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let permits = self.permits.clone();
        let runtime = self.runtime.clone();

        let inner = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .context("worker pool closed")?;
            tokio::task::spawn_blocking(move || runtime.block_on(fut))
                .await
                .map_err(join_failure)?
        });

        TaskHandle { inner }
    }
}

#[derive(Clone)]
pub struct Executor {
    pool: WorkerPool,
}

impl Executor {
    /// Must be called from inside a tokio runtime.
    pub fn new(pool_workers: usize) -> Result<Self> {
        let runtime = Handle::try_current().context("executor needs a tokio runtime")?;
        Ok(Self {
            pool: WorkerPool::new(runtime, pool_workers),
        })
    }

    pub fn with_pool(pool: WorkerPool) -> Self {
        Self { pool }
    }

    pub fn submit<F, T>(&self, lane: Lane, fut: F) -> TaskHandle<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        match lane {
            Lane::Cooperative => TaskHandle {
                inner: tokio::spawn(fut),
            },
            Lane::Pool => self.pool.submit(fut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn explode(message: &'static str) -> Result<()> {
        panic!("{message}")
    }

    #[tokio::test]
    async fn cooperative_task_returns_its_result() {
        let executor = Executor::new(2).unwrap();
        let value = executor
            .submit(Lane::Cooperative, async { Ok(41 + 1) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn task_error_passes_through() {
        let executor = Executor::new(2).unwrap();
        let err = executor
            .submit(Lane::Cooperative, async { Err::<(), _>(anyhow!("upstream 503")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream 503");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panics_become_errors_on_both_lanes() {
        let executor = Executor::new(2).unwrap();

        let coop = executor
            .submit(Lane::Cooperative, explode("boom"))
            .await
            .unwrap_err();
        assert!(coop.to_string().contains("boom"), "{coop}");

        let pooled = executor
            .submit(Lane::Pool, explode("pool boom"))
            .await
            .unwrap_err();
        assert!(pooled.to_string().contains("pool boom"), "{pooled}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pool_runs_timers_and_bounds_concurrency() {
        let executor = Executor::new(2).unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                executor.submit(Lane::Pool, async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results, vec![0, 1, 2, 3, 4, 5]);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn executor_outside_runtime_is_an_error() {
        assert!(Executor::new(1).is_err());
    }
}
