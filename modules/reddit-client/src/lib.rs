pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{Comment, Post};

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use types::{Listing, TokenResponse};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Refresh the token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Read-only client. One handle is meant to be built by the caller and
/// shared across queries; the app-only token is cached inside it.
pub struct RedditClient {
    client: reqwest::Client,
    credentials: Credentials,
    auth_url: String,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_endpoints(credentials, AUTH_URL, API_BASE)
    }

    pub fn with_endpoints(credentials: Credentials, auth_url: &str, api_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(credentials.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            credentials,
            auth_url: auth_url.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Search one subreddit, relevance-sorted.
    pub async fn search_posts(&self, subreddit: &str, query: &str, limit: usize) -> Result<Vec<Post>> {
        tracing::debug!(subreddit, query, limit, "reddit: searching posts");

        let limit = limit.to_string();
        let listing: Listing<Post> = self
            .get_json(
                &format!("/r/{subreddit}/search"),
                &[
                    ("q", query),
                    ("restrict_sr", "1"),
                    ("sort", "relevance"),
                    ("limit", limit.as_str()),
                    ("raw_json", "1"),
                ],
            )
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|t| t.kind == "t3")
            .map(|t| t.data)
            .collect())
    }

    /// Top-level comments of a post, highest score first.
    pub async fn top_comments(&self, post: &Post, limit: usize) -> Result<Vec<Comment>> {
        let limit_param = limit.to_string();
        let pages: Vec<serde_json::Value> = self
            .get_json(
                &format!("/r/{}/comments/{}", post.subreddit, post.id),
                &[
                    ("sort", "top"),
                    ("depth", "1"),
                    ("limit", limit_param.as_str()),
                    ("raw_json", "1"),
                ],
            )
            .await?;

        let comments_page = pages
            .into_iter()
            .nth(1)
            .ok_or_else(|| RedditError::Parse("comments response missing comment listing".into()))?;
        let listing: Listing<Comment> = serde_json::from_value(comments_page)?;

        let mut comments: Vec<Comment> = listing
            .data
            .children
            .into_iter()
            .filter(|t| t.kind == "t1" && t.data.body.is_some())
            .map(|t| t.data)
            .collect();
        comments.sort_by(|a, b| b.score.cmp(&a.score));
        comments.truncate(limit);
        Ok(comments)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.access_token().await?;
        let resp = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(ref cached) = *guard {
            if Instant::now() < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        tracing::debug!("reddit: requesting app-only token");
        let resp = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RedditError::Auth {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = resp.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}
