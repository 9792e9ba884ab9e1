use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use hn_client::Hit;
use openknowledge_common::{Query, Resource, ResourceBatch, SourceId};

use super::SingleShotSource;
use crate::traits::{DescriptionSource, LinkFilter, NewsSearch};

const FRAMING: &str = "Learn";

/// Story links from the news aggregator. Stories matching "Learn <query>"
/// come first; the raw query tops the list up to `hits`.
pub struct NewsSource {
    news: Arc<dyn NewsSearch>,
    links: Arc<dyn LinkFilter>,
    descriptions: Option<Arc<dyn DescriptionSource>>,
    hits: usize,
}

impl NewsSource {
    pub fn new(news: Arc<dyn NewsSearch>, links: Arc<dyn LinkFilter>, hits: usize) -> Self {
        Self {
            news,
            links,
            descriptions: None,
            hits,
        }
    }

    /// Attach page descriptions to every surviving link.
    pub fn with_descriptions(mut self, descriptions: Arc<dyn DescriptionSource>) -> Self {
        self.descriptions = Some(descriptions);
        self
    }

    async fn candidate_hits(&self, query: &Query) -> Result<Vec<Hit>> {
        let framed = query.framed(FRAMING);
        let mut hits = self
            .news
            .search(&framed, self.hits)
            .await
            .with_context(|| format!("news search for {framed:?}"))?;

        if hits.len() < self.hits {
            let more = self
                .news
                .search(query.as_str(), self.hits - hits.len())
                .await
                .with_context(|| format!("news search for {:?}", query.as_str()))?;
            hits.extend(more);
        }
        Ok(hits)
    }
}

#[async_trait]
impl SingleShotSource for NewsSource {
    fn id(&self) -> SourceId {
        SourceId::HackerNews
    }

    async fn fetch(&self, query: &Query) -> Result<ResourceBatch> {
        let hits = self.candidate_hits(query).await?;

        let candidates: ResourceBatch = hits
            .iter()
            .filter_map(|hit| {
                let url = hit.external_url()?;
                let resource = Resource::new(SourceId::HackerNews, url);
                Some(match &hit.title {
                    Some(title) => resource.with_title(title.as_str()),
                    None => resource,
                })
            })
            .collect();
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let urls: HashSet<String> = candidates.iter().map(|r| r.url.clone()).collect();
        let live = self.links.filter_live(&urls).await;
        let alive: Vec<Resource> = candidates
            .into_iter()
            .filter(|r| live.contains(&r.url))
            .collect();

        let batch: ResourceBatch = match &self.descriptions {
            Some(descriptions) => {
                let meta = descriptions.fetch_meta(&live).await;
                alive
                    .into_iter()
                    .map(|r| {
                        let description = meta.get(&r.url).cloned().flatten();
                        r.with_description(description)
                    })
                    .collect()
            }
            None => alive.into_iter().collect(),
        };

        info!(
            query = %query,
            hits = hits.len(),
            live = batch.len(),
            "hacker news: search complete"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDescriptions, MockNews, StaticLinkFilter};

    fn query(q: &str) -> Query {
        Query::parse(q).unwrap()
    }

    #[tokio::test]
    async fn framed_search_is_topped_up_with_raw_query() {
        let news = Arc::new(
            MockNews::new()
                .on_search("Learn rust", &[("Rust book", "https://doc.rust-lang.org/book/")])
                .on_search(
                    "rust",
                    &[
                        ("Rustlings", "https://github.com/rust-lang/rustlings"),
                        ("Dup of book", "https://doc.rust-lang.org/book/"),
                        ("Ask HN: Rust?", ""),
                    ],
                ),
        );
        let source = NewsSource::new(news.clone(), Arc::new(StaticLinkFilter::all_alive()), 4);

        let batch = source.fetch(&query("rust")).await.unwrap();

        assert_eq!(
            batch.urls(),
            vec!["https://doc.rust-lang.org/book/", "https://github.com/rust-lang/rustlings"]
        );
        assert_eq!(batch.iter().next().unwrap().title.as_deref(), Some("Rust book"));
        assert_eq!(news.searched(), vec![("Learn rust".to_string(), 4), ("rust".to_string(), 3)]);
    }

    #[tokio::test]
    async fn full_framed_page_skips_raw_query() {
        let news = Arc::new(MockNews::new().on_search(
            "Learn go",
            &[("A", "https://a.example"), ("B", "https://b.example")],
        ));
        let source = NewsSource::new(news.clone(), Arc::new(StaticLinkFilter::all_alive()), 2);

        source.fetch(&query("go")).await.unwrap();
        assert_eq!(news.searched().len(), 1);
    }

    #[tokio::test]
    async fn story_urls_are_emitted_as_given() {
        let url = "https://en.wikipedia.org/wiki/Washington,_D.C.";
        let news = Arc::new(MockNews::new().on_search("Learn dc", &[("D.C.", url)]));
        let links = StaticLinkFilter::alive(&[url]);
        let source = NewsSource::new(news, Arc::new(links), 1);

        let batch = source.fetch(&query("dc")).await.unwrap();
        assert_eq!(batch.urls(), vec![url]);
    }

    #[tokio::test]
    async fn dead_links_are_dropped_and_order_kept() {
        let news = Arc::new(MockNews::new().on_search(
            "Learn go",
            &[
                ("C", "https://c.example"),
                ("Dead", "https://dead.example"),
                ("A", "https://a.example"),
            ],
        ));
        let links = StaticLinkFilter::alive(&["https://a.example", "https://c.example"]);
        let source = NewsSource::new(news, Arc::new(links), 3);

        let batch = source.fetch(&query("go")).await.unwrap();
        assert_eq!(batch.urls(), vec!["https://c.example", "https://a.example"]);
    }

    #[tokio::test]
    async fn descriptions_are_attached_when_enabled() {
        let news = Arc::new(MockNews::new().on_search(
            "Learn go",
            &[("A", "https://a.example"), ("B", "https://b.example")],
        ));
        let descriptions = MockDescriptions::new().on_url("https://a.example", "All about A");
        let source = NewsSource::new(news, Arc::new(StaticLinkFilter::all_alive()), 2)
            .with_descriptions(Arc::new(descriptions));

        let batch = source.fetch(&query("go")).await.unwrap();
        let items: Vec<_> = batch.iter().map(|r| r.description.clone()).collect();
        assert_eq!(items, vec![Some("All about A".to_string()), None]);
    }

    #[tokio::test]
    async fn no_hits_is_an_empty_batch() {
        let source = NewsSource::new(
            Arc::new(MockNews::new()),
            Arc::new(StaticLinkFilter::all_alive()),
            5,
        );
        assert!(source.fetch(&query("nothing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_error_fails_the_source() {
        let source = NewsSource::new(
            Arc::new(MockNews::new().failing()),
            Arc::new(StaticLinkFilter::all_alive()),
            5,
        );
        assert!(source.fetch(&query("go")).await.is_err());
    }
}
