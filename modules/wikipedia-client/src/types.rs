use serde::Deserialize;

/// Envelope of `action=query&list=search` with `formatversion=2`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: Option<QueryBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryBlock {
    #[serde(default)]
    pub search: Vec<SearchHit>,
    #[serde(default)]
    pub searchinfo: Option<SearchInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub pageid: u64,
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchInfo {
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// A resolved article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
}

impl SearchResponse {
    pub fn first_hit(&self) -> Option<&SearchHit> {
        self.query.as_ref()?.search.first()
    }

    /// Spelling suggestion MediaWiki offers when the term looks like a typo.
    pub fn suggestion(&self) -> Option<&str> {
        self.query
            .as_ref()?
            .searchinfo
            .as_ref()?
            .suggestion
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}
