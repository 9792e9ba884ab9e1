use thiserror::Error;

pub type Result<T> = std::result::Result<T, WikipediaError>;

#[derive(Debug, Error)]
pub enum WikipediaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WikipediaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WikipediaError::Parse(err.to_string())
        } else {
            WikipediaError::Network(err.to_string())
        }
    }
}
