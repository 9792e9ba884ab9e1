use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use arxiv_client::ArxivClient;
use hn_client::HnClient;
use openknowledge_common::Config;
use openknowledge_probe::{LivenessProber, MetadataEnricher, ProbeSettings};
use reddit_client::{Credentials, RedditClient};
use wikipedia_client::WikipediaClient;

use crate::coordinator::StreamCoordinator;
use crate::embedder::OpenAiEmbedder;
use crate::executor::{Executor, Lane};
use crate::ranker::EmbeddingRanker;
use crate::sources::{EncyclopediaSource, ForumSource, NewsSource, PaperSource};

/// Build the production coordinator: encyclopedia and paper search on the
/// cooperative lane, forum and news on the worker pool. The forum source
/// is left out when its credentials or the embedding backend are missing.
///
/// Must be called from inside a tokio runtime. The returned coordinator
/// owns long-lived client handles and is meant to serve many queries.
pub fn build_coordinator(config: &Config) -> Result<StreamCoordinator> {
    let executor = Executor::new(config.pool_workers)?;

    let prober = Arc::new(
        LivenessProber::new(ProbeSettings {
            tcp_timeout: config.probe_tcp_timeout,
            http_timeout: config.probe_http_timeout,
            max_workers: config.probe_max_workers,
        })
        .context("building liveness prober")?,
    );

    let mut coordinator = StreamCoordinator::new(executor);

    let wikipedia = WikipediaClient::new().context("building wikipedia client")?;
    coordinator = coordinator.single_shot(EncyclopediaSource::new(Arc::new(wikipedia)), Lane::Cooperative);

    match (&config.reddit, &config.embedding) {
        (Some(creds), Some(embedding)) => {
            let reddit = RedditClient::new(Credentials {
                client_id: creds.client_id.clone(),
                client_secret: creds.client_secret.clone(),
                user_agent: creds.user_agent.clone(),
            })
            .context("building reddit client")?;
            let embedder =
                OpenAiEmbedder::new(&embedding.api_key, &embedding.base_url, &embedding.model)
                    .context("building embedder")?;
            let ranker = EmbeddingRanker::new(Arc::new(embedder));

            coordinator = coordinator.single_shot(
                ForumSource::new(
                    Arc::new(reddit),
                    Arc::new(ranker),
                    prober.clone(),
                    config.reddit_subreddits,
                    config.reddit_posts,
                ),
                Lane::Pool,
            );
        }
        (None, _) => warn!("REDDIT_CLIENT_ID/REDDIT_CLIENT_SECRET not set, forum source disabled"),
        (_, None) => warn!("EMBEDDING_API_KEY not set, forum source disabled"),
    }

    let hn = HnClient::new().context("building hacker news client")?;
    let mut news = NewsSource::new(Arc::new(hn), prober, config.hn_hits);
    if config.hn_include_meta {
        let enricher = MetadataEnricher::new(config.meta_timeout, config.meta_max_workers)
            .context("building metadata enricher")?;
        news = news.with_descriptions(Arc::new(enricher));
    }
    coordinator = coordinator.single_shot(news, Lane::Pool);

    let arxiv = ArxivClient::new().context("building arxiv client")?;
    coordinator = coordinator.incremental(
        PaperSource::new(Arc::new(arxiv), config.arxiv_results),
        Lane::Cooperative,
    );

    info!(sources = ?coordinator.sources(), "search coordinator ready");
    Ok(coordinator)
}
