// Two-phase dead-link filter: a raw TCP connect weeds out dead hosts cheaply,
// then an HTTP probe confirms the page itself answers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use tokio::net::TcpStream;
use tracing::{debug, info};

use openknowledge_common::{host_and_port, OpenKnowledgeError};

#[derive(Debug, Clone, Copy)]
pub struct ProbeSettings {
    pub tcp_timeout: Duration,
    pub http_timeout: Duration,
    pub max_workers: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            tcp_timeout: Duration::from_secs(2),
            http_timeout: Duration::from_secs(3),
            max_workers: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessResult {
    pub url: String,
    pub alive: bool,
}

// ---------------------------------------------------------------------------
// Phase checks
// ---------------------------------------------------------------------------

/// Phase 1: does the host accept connections at all?
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    async fn reachable(&self, url: &str) -> bool;
}

/// Phase 2: does the page answer with a non-error status?
#[async_trait]
pub trait StatusCheck: Send + Sync {
    async fn responds(&self, url: &str) -> bool;
}

pub struct TcpReachability {
    timeout: Duration,
}

impl TcpReachability {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Connect to the url's host on 443 (https) or 80, honouring an explicit port.
    pub async fn connect(&self, url: &str) -> Result<(), OpenKnowledgeError> {
        let (host, port) = host_and_port(url)
            .ok_or_else(|| OpenKnowledgeError::ProbeInconclusive(url.to_string()))?;

        match tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(OpenKnowledgeError::Network(format!("{host}:{port}: {e}"))),
            Err(_) => Err(OpenKnowledgeError::NetworkTimeout(format!("{host}:{port}"))),
        }
    }
}

#[async_trait]
impl ReachabilityCheck for TcpReachability {
    async fn reachable(&self, url: &str) -> bool {
        match self.connect(url).await {
            Ok(()) => true,
            Err(e) => {
                debug!(url, error = %e, "probe: tcp check failed");
                false
            }
        }
    }
}

pub struct HttpStatusCheck {
    client: reqwest::Client,
}

impl HttpStatusCheck {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// HEAD the url; servers that refuse HEAD get one GET whose body is never read.
    pub async fn status(&self, url: &str) -> Result<StatusCode, OpenKnowledgeError> {
        let head = self.client.head(url).send().await.map_err(classify)?;
        if head.status() != StatusCode::METHOD_NOT_ALLOWED {
            return Ok(head.status());
        }

        let get = self.client.get(url).send().await.map_err(classify)?;
        Ok(get.status())
    }
}

#[async_trait]
impl StatusCheck for HttpStatusCheck {
    async fn responds(&self, url: &str) -> bool {
        match self.status(url).await {
            Ok(status) => status.as_u16() < 400,
            Err(e) => {
                debug!(url, error = %e, "probe: http check failed");
                false
            }
        }
    }
}

fn classify(err: reqwest::Error) -> OpenKnowledgeError {
    if err.is_timeout() {
        OpenKnowledgeError::NetworkTimeout(err.to_string())
    } else {
        OpenKnowledgeError::Network(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// LivenessProber
// ---------------------------------------------------------------------------

pub struct LivenessProber {
    reachability: Arc<dyn ReachabilityCheck>,
    status: Arc<dyn StatusCheck>,
    max_workers: usize,
}

impl LivenessProber {
    /// Prober backed by real TCP and HTTP checks.
    pub fn new(settings: ProbeSettings) -> Result<Self> {
        Ok(Self::with_checks(
            Arc::new(TcpReachability::new(settings.tcp_timeout)),
            Arc::new(HttpStatusCheck::new(settings.http_timeout)?),
            settings.max_workers,
        ))
    }

    pub fn with_checks(
        reachability: Arc<dyn ReachabilityCheck>,
        status: Arc<dyn StatusCheck>,
        max_workers: usize,
    ) -> Self {
        Self {
            reachability,
            status,
            max_workers: max_workers.max(1),
        }
    }

    pub async fn probe(&self, url: &str) -> LivenessResult {
        let alive = self.reachability.reachable(url).await && self.status.responds(url).await;
        LivenessResult {
            url: url.to_string(),
            alive,
        }
    }

    /// The subset of `urls` that pass both phases. At most `max_workers`
    /// probes are in flight; each probe is bounded by its own timeouts.
    pub async fn filter_live(&self, urls: &HashSet<String>) -> HashSet<String> {
        if urls.is_empty() {
            return HashSet::new();
        }

        let live: HashSet<String> = stream::iter(urls.iter().cloned())
            .map(|url| async move { self.probe(&url).await })
            .buffer_unordered(self.max_workers)
            .filter_map(|result| async move { result.alive.then_some(result.url) })
            .collect()
            .await;

        info!(checked = urls.len(), live = live.len(), "probe: liveness filter complete");
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct AllowList {
        allowed: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl AllowList {
        fn new(allowed: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReachabilityCheck for AllowList {
        async fn reachable(&self, url: &str) -> bool {
            self.calls.lock().unwrap().push(url.to_string());
            self.allowed.contains(url)
        }
    }

    #[async_trait]
    impl StatusCheck for AllowList {
        async fn responds(&self, url: &str) -> bool {
            self.calls.lock().unwrap().push(url.to_string());
            self.allowed.contains(url)
        }
    }

    fn urls(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn keeps_exactly_the_urls_passing_both_phases() {
        let input = urls(&[
            "https://a.example",
            "https://b.example",
            "https://c.example",
            "https://d.example",
            "https://e.example",
        ]);
        let tcp = AllowList::new(&["https://a.example", "https://b.example", "https://c.example"]);
        let http = AllowList::new(&["https://b.example", "https://c.example", "https://e.example"]);
        let prober = LivenessProber::with_checks(tcp.clone(), http.clone(), 3);

        let live = prober.filter_live(&input).await;

        assert_eq!(live, urls(&["https://b.example", "https://c.example"]));
        assert!(live.is_subset(&input));
        assert_eq!(tcp.calls().len(), 5);
        // tcp-dead urls never reach the http phase
        let mut http_calls = http.calls();
        http_calls.sort();
        assert_eq!(
            http_calls,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[tokio::test]
    async fn all_refused_yields_empty_set() {
        let input = urls(&["https://a.example", "https://b.example"]);
        let prober = LivenessProber::with_checks(AllowList::new(&[]), AllowList::new(&[]), 4);
        assert!(prober.filter_live(&input).await.is_empty());
    }

    #[tokio::test]
    async fn empty_input_does_no_work() {
        let tcp = AllowList::new(&[]);
        let prober = LivenessProber::with_checks(tcp.clone(), AllowList::new(&[]), 4);
        assert!(prober.filter_live(&HashSet::new()).await.is_empty());
        assert!(tcp.calls().is_empty());
    }

    struct SlowCheck {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ReachabilityCheck for SlowCheck {
        async fn reachable(&self, _url: &str) -> bool {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn never_exceeds_max_workers() {
        let slow = Arc::new(SlowCheck {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let input: HashSet<String> = (0..12).map(|i| format!("https://{i}.example")).collect();
        let prober = LivenessProber::with_checks(slow.clone(), AllowList::new(&[]), 3);

        prober.filter_live(&input).await;

        let peak = slow.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded max_workers");
        assert!(peak >= 2, "probes should overlap, peak was {peak}");
    }

    #[tokio::test]
    async fn url_without_host_is_inconclusive() {
        let tcp = TcpReachability::new(Duration::from_millis(100));
        let err = tcp.connect("mailto:someone@example.com").await.unwrap_err();
        assert!(matches!(err, OpenKnowledgeError::ProbeInconclusive(_)));
        assert!(!tcp.reachable("not a url").await);
    }
}
