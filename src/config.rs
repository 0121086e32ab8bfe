//! Runtime configuration resolved from the environment.
//!
//! Everything except the TMDB credential has a default matching the layout
//! the scraper and the chat service expect to share: review files under
//! `data/reviews`, one SQLite vector database per movie under
//! `data/collections`, and Ollama models addressed by name. `TMDB_API_KEY`
//! deliberately has no default; components that need it fail fast instead of
//! shipping an embedded credential.

use std::env;
use std::path::PathBuf;

use crate::types::ReelError;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large:latest";
pub const DEFAULT_EMBEDDING_DIMS: usize = 1024;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5001";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Resolved settings shared by the CLI subcommands.
#[derive(Clone, Debug)]
pub struct Settings {
    /// TMDB API key; `None` until supplied via `TMDB_API_KEY`.
    pub tmdb_api_key: Option<String>,
    /// Base URL of the TMDB API.
    pub tmdb_base_url: String,
    /// Endpoint of a running chromedriver-compatible WebDriver server.
    pub webdriver_url: String,
    /// Ollama completion model name.
    pub completion_model: String,
    /// Ollama embedding model name.
    pub embedding_model: String,
    /// Dimensionality of the embedding model's vectors.
    pub embedding_dims: usize,
    /// Socket address the chat service binds to.
    pub bind_addr: String,
    /// Root of the on-disk data layout.
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dims: DEFAULT_EMBEDDING_DIMS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl Settings {
    /// Reads settings from the environment, falling back to defaults for
    /// everything except the TMDB credential.
    pub fn from_env() -> Result<Self, ReelError> {
        let defaults = Settings::default();
        let embedding_dims = match env::var("OLLAMA_EMBEDDING_DIMS") {
            Ok(raw) => raw.parse::<usize>().map_err(|err| {
                ReelError::Config(format!("OLLAMA_EMBEDDING_DIMS is not a count: {err}"))
            })?,
            Err(_) => defaults.embedding_dims,
        };

        Ok(Self {
            tmdb_api_key: env::var("TMDB_API_KEY").ok().filter(|key| !key.is_empty()),
            tmdb_base_url: env::var("TMDB_BASE_URL").unwrap_or(defaults.tmdb_base_url),
            webdriver_url: env::var("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            completion_model: env::var("OLLAMA_COMPLETION_MODEL")
                .unwrap_or(defaults.completion_model),
            embedding_model: env::var("OLLAMA_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dims,
            bind_addr: env::var("REELRAG_BIND_ADDR").unwrap_or(defaults.bind_addr),
            data_dir: env::var("REELRAG_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        })
    }

    /// Directory holding one `{id}_reviews.txt` file per movie.
    pub fn reviews_dir(&self) -> PathBuf {
        self.data_dir.join("reviews")
    }

    /// Append-only log of fetches that came up short.
    pub fn failed_log_path(&self) -> PathBuf {
        self.data_dir.join("failed_reviews.txt")
    }

    /// Directory holding one SQLite vector database per movie.
    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.join("collections")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_credential() {
        let settings = Settings::default();
        assert!(settings.tmdb_api_key.is_none());
        assert_eq!(settings.bind_addr, "0.0.0.0:5001");
        assert_eq!(settings.completion_model, "llama3.1:8b");
        assert_eq!(settings.embedding_model, "mxbai-embed-large:latest");
        assert_eq!(settings.embedding_dims, 1024);
    }

    #[test]
    fn derived_paths_share_the_data_root() {
        let settings = Settings {
            data_dir: PathBuf::from("/tmp/reel"),
            ..Settings::default()
        };
        assert_eq!(settings.reviews_dir(), PathBuf::from("/tmp/reel/reviews"));
        assert_eq!(
            settings.failed_log_path(),
            PathBuf::from("/tmp/reel/failed_reviews.txt")
        );
        assert_eq!(
            settings.collections_dir(),
            PathBuf::from("/tmp/reel/collections")
        );
    }
}
