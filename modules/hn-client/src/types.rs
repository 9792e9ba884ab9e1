use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One story hit. Ask/Show HN posts have no external `url`.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "objectID", default)]
    pub object_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
}

impl Hit {
    /// The story's external link, if it points at the web.
    pub fn external_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| u.starts_with("http"))
    }
}
