use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{OpenKnowledgeError, Result};

/// Reddit application credentials (app-only OAuth).
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// OpenAI-compatible embeddings endpoint backing the semantic ranker.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Upstream credentials
    pub reddit: Option<RedditCredentials>,
    pub embedding: Option<EmbeddingSettings>,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Liveness probing
    pub probe_tcp_timeout: Duration,
    pub probe_http_timeout: Duration,
    pub probe_max_workers: usize,

    // Metadata enrichment
    pub meta_timeout: Duration,
    pub meta_max_workers: usize,

    // Blocking adapter pool
    pub pool_workers: usize,

    // Per-source limits
    pub hn_hits: usize,
    pub hn_include_meta: bool,
    pub reddit_subreddits: usize,
    pub reddit_posts: usize,
    pub arxiv_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reddit: None,
            embedding: None,
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            probe_tcp_timeout: Duration::from_secs(2),
            probe_http_timeout: Duration::from_secs(3),
            probe_max_workers: 10,
            meta_timeout: Duration::from_secs(3),
            meta_max_workers: 10,
            pool_workers: 4,
            hn_hits: 10,
            hn_include_meta: true,
            reddit_subreddits: 2,
            reddit_posts: 2,
            arxiv_results: 5,
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment.
    /// Unset tuning knobs fall back to defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let reddit = match (
            optional_env("REDDIT_CLIENT_ID"),
            optional_env("REDDIT_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(RedditCredentials {
                client_id,
                client_secret,
                user_agent: optional_env("REDDIT_USER_AGENT")
                    .unwrap_or_else(|| format!("openknowledge/{}", env!("CARGO_PKG_VERSION"))),
            }),
            _ => None,
        };

        let embedding = optional_env("EMBEDDING_API_KEY").map(|api_key| EmbeddingSettings {
            api_key,
            base_url: optional_env("EMBEDDING_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
        });

        Ok(Self {
            reddit,
            embedding,
            api_host: optional_env("API_HOST").unwrap_or(defaults.api_host),
            api_port: parsed_env("API_PORT", defaults.api_port)?,
            probe_tcp_timeout: secs_env("PROBE_TCP_TIMEOUT_SECS", defaults.probe_tcp_timeout)?,
            probe_http_timeout: secs_env("PROBE_HTTP_TIMEOUT_SECS", defaults.probe_http_timeout)?,
            probe_max_workers: parsed_env("PROBE_MAX_WORKERS", defaults.probe_max_workers)?,
            meta_timeout: secs_env("META_TIMEOUT_SECS", defaults.meta_timeout)?,
            meta_max_workers: parsed_env("META_MAX_WORKERS", defaults.meta_max_workers)?,
            pool_workers: parsed_env("POOL_WORKERS", defaults.pool_workers)?,
            hn_hits: parsed_env("HN_HITS", defaults.hn_hits)?,
            hn_include_meta: parsed_env("HN_INCLUDE_META", defaults.hn_include_meta)?,
            reddit_subreddits: parsed_env("REDDIT_SUBREDDITS", defaults.reddit_subreddits)?,
            reddit_posts: parsed_env("REDDIT_POSTS", defaults.reddit_posts)?,
            arxiv_results: parsed_env("ARXIV_RESULTS", defaults.arxiv_results)?,
        })
    }

    /// Log the loaded configuration with secrets redacted.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(4).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }

        tracing::info!("Config loaded:");
        match &self.reddit {
            Some(r) => {
                tracing::info!("  REDDIT_CLIENT_ID: {}", preview(&r.client_id));
                tracing::info!("  REDDIT_CLIENT_SECRET: {}", preview(&r.client_secret));
                tracing::info!("  REDDIT_USER_AGENT: {}", r.user_agent);
            }
            None => tracing::info!("  REDDIT_CLIENT_ID: <not set>"),
        }
        match &self.embedding {
            Some(e) => {
                tracing::info!("  EMBEDDING_API_KEY: {}", preview(&e.api_key));
                tracing::info!("  EMBEDDING_BASE_URL: {}", e.base_url);
                tracing::info!("  EMBEDDING_MODEL: {}", e.model);
            }
            None => tracing::info!("  EMBEDDING_API_KEY: <not set>"),
        }
        tracing::info!(
            tcp_timeout = ?self.probe_tcp_timeout,
            http_timeout = ?self.probe_http_timeout,
            max_workers = self.probe_max_workers,
            "  probe"
        );
        tracing::info!(
            timeout = ?self.meta_timeout,
            max_workers = self.meta_max_workers,
            "  metadata"
        );
        tracing::info!(pool_workers = self.pool_workers, "  executor");
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| OpenKnowledgeError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

fn secs_env(key: &str, default: Duration) -> Result<Duration> {
    parsed_env(key, default.as_secs()).map(Duration::from_secs)
}
