//! Fatal conditions reported by the command line.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("missing website URL")]
    MissingUrl,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("no site adapter for {0}")]
    NoAdapter(String),
}
