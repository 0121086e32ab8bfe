//! TMDB external-IDs lookup.
//!
//! The review site keys its pages on IMDb ids while the catalog carries TMDB
//! ids; this resolver bridges the two through TMDB's `external_ids`
//! endpoint. The API key is injected configuration with no default.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::types::ReelError;

/// Client for the TMDB `GET /movie/{id}/external_ids` endpoint.
#[derive(Clone, Debug)]
pub struct TmdbResolver {
    base_url: Url,
    api_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

impl TmdbResolver {
    /// Builds a resolver from settings; the API key is mandatory.
    pub fn from_settings(settings: &Settings) -> Result<Self, ReelError> {
        let api_key = settings
            .tmdb_api_key
            .clone()
            .ok_or_else(|| ReelError::Config("TMDB_API_KEY is not set".into()))?;
        Self::new(&settings.tmdb_base_url, api_key)
    }

    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ReelError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|err| ReelError::Config(format!("invalid TMDB base url: {err}")))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http: Client::new(),
        })
    }

    /// Resolves a TMDB movie id to the IMDb id the review site keys on.
    pub async fn resolve_imdb_id(&self, movie_id: &str) -> Result<String, ReelError> {
        let url = self
            .base_url
            .join(&format!("movie/{movie_id}/external_ids"))
            .map_err(|err| ReelError::Resolve(err.to_string()))?;

        let response = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReelError::Resolve(format!(
                "external_ids request for movie {movie_id} returned {status}"
            )));
        }

        let ids: ExternalIds = response
            .json()
            .await
            .map_err(|err| ReelError::Resolve(err.to_string()))?;

        match ids.imdb_id {
            Some(imdb_id) if !imdb_id.is_empty() => {
                debug!(movie_id, imdb_id = %imdb_id, "resolved imdb id");
                Ok(imdb_id)
            }
            _ => Err(ReelError::Resolve(format!(
                "movie {movie_id} has no imdb id"
            ))),
        }
    }
}
