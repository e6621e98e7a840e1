use thiserror::Error;

/// Errors from content extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Nothing readable left after trimming.
    #[error("No content could be extracted from this page")]
    NoContent,

    #[error("Page not reachable: {0}")]
    PageUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExtractResult<T> = Result<T, ExtractError>;
