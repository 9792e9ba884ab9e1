pub mod canonical;
pub mod config;
pub mod error;
pub mod types;

pub use canonical::{canonical_url, host_and_port};
pub use config::Config;
pub use error::{OpenKnowledgeError, Result};
pub use types::*;
