//! Crate-wide error type.
//!
//! Every fallible boundary funnels into [`ReelError`]. Third-party error
//! types are wrapped as strings at the call site so downstream code never
//! depends on upstream error enums.

use thiserror::Error;

/// Errors surfaced by the scraping pipeline, the vector store, and the chat
/// service.
#[derive(Debug, Error)]
pub enum ReelError {
    /// Required configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The external-IDs lookup failed or returned no usable id.
    #[error("identifier resolution failed: {0}")]
    Resolve(String),

    /// WebDriver session setup or page interaction failed.
    #[error("browser automation failed: {0}")]
    Automation(String),

    /// Review markup could not be parsed or extracted.
    #[error("markup extraction failed: {0}")]
    Markup(String),

    /// The movie catalog could not be read.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A request payload is structurally valid JSON but unusable.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Vector-store persistence failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Embedding generation failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The completion model call failed.
    #[error("completion failed: {0}")]
    Completion(String),

    /// No vector collection exists for the requested movie.
    #[error("no vector collection for movie {0}")]
    NotIndexed(String),

    /// An outbound HTTP request failed.
    #[error("http request failed: {0}")]
    Http(String),

    /// A filesystem operation failed.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ReelError {
    fn from(err: std::io::Error) -> Self {
        ReelError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for ReelError {
    fn from(err: reqwest::Error) -> Self {
        ReelError::Http(err.to_string())
    }
}

impl From<thirtyfour::error::WebDriverError> for ReelError {
    fn from(err: thirtyfour::error::WebDriverError) -> Self {
        ReelError::Automation(err.to_string())
    }
}
