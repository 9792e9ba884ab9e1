use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use openknowledge_common::{Query, Resource, ResourceBatch, SourceId};
use wikipedia_client::Article;

use super::SingleShotSource;
use crate::traits::Encyclopedia;

/// One encyclopedia article for the query. A miss with a spelling
/// suggestion is retried once with the suggestion.
pub struct EncyclopediaSource {
    encyclopedia: Arc<dyn Encyclopedia>,
}

impl EncyclopediaSource {
    pub fn new(encyclopedia: Arc<dyn Encyclopedia>) -> Self {
        Self { encyclopedia }
    }

    async fn lookup(&self, term: &str) -> Result<Option<Article>> {
        let outcome = self
            .encyclopedia
            .search(term)
            .await
            .with_context(|| format!("encyclopedia search for {term:?}"))?;

        if outcome.article.is_some() {
            return Ok(outcome.article);
        }

        let Some(suggestion) = outcome.suggestion.filter(|s| s != term) else {
            return Ok(None);
        };
        debug!(term, suggestion, "wikipedia: no hit, trying suggestion");

        let retry = self
            .encyclopedia
            .search(&suggestion)
            .await
            .with_context(|| format!("encyclopedia search for suggestion {suggestion:?}"))?;
        Ok(retry.article)
    }
}

#[async_trait]
impl SingleShotSource for EncyclopediaSource {
    fn id(&self) -> SourceId {
        SourceId::Wikipedia
    }

    async fn fetch(&self, query: &Query) -> Result<ResourceBatch> {
        let article = self.lookup(query.as_str()).await?;
        info!(query = %query, found = article.is_some(), "wikipedia: lookup complete");

        Ok(article
            .map(|a| ResourceBatch::single(Resource::new(SourceId::Wikipedia, &a.url).with_title(a.title)))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEncyclopedia;

    fn query(q: &str) -> Query {
        Query::parse(q).unwrap()
    }

    #[tokio::test]
    async fn direct_hit_is_one_resource() {
        let wiki = MockEncyclopedia::new().on_article("graph theory", "Graph theory", 12401);
        let source = EncyclopediaSource::new(Arc::new(wiki));

        let batch = source.fetch(&query("graph theory")).await.unwrap();
        assert_eq!(batch.urls(), vec!["https://en.wikipedia.org/?curid=12401"]);
        assert_eq!(batch.iter().next().unwrap().title.as_deref(), Some("Graph theory"));
    }

    #[tokio::test]
    async fn suggestion_is_requeried_once() {
        let wiki = Arc::new(
            MockEncyclopedia::new()
                .on_suggestion("grpah theory", "graph theory")
                .on_article("graph theory", "Graph theory", 12401),
        );
        let source = EncyclopediaSource::new(wiki.clone());

        let batch = source.fetch(&query("grpah theory")).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(wiki.searched(), vec!["grpah theory", "graph theory"]);
    }

    #[tokio::test]
    async fn suggestion_miss_is_empty_not_a_loop() {
        let wiki = Arc::new(
            MockEncyclopedia::new()
                .on_suggestion("aaa", "bbb")
                .on_suggestion("bbb", "ccc"),
        );
        let source = EncyclopediaSource::new(wiki.clone());

        let batch = source.fetch(&query("aaa")).await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(wiki.searched().len(), 2);
    }

    #[tokio::test]
    async fn upstream_error_fails_the_source() {
        let source = EncyclopediaSource::new(Arc::new(MockEncyclopedia::new().failing()));
        assert!(source.fetch(&query("anything")).await.is_err());
    }
}
