//! Movie catalog loaded from a CSV dataset.

use std::path::Path;

use serde::Deserialize;

use crate::types::ReelError;

/// One row of the movie catalog.
///
/// The dataset carries far more columns than the pipeline needs; only the id
/// is required, the descriptive fields ride along for logging and for the
/// chat frontends that echo them.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogMovie {
    pub id: u64,
    pub title: Option<String>,
    pub overview: Option<String>,
    #[serde(rename = "vote_average")]
    pub rating: Option<f64>,
    pub genres: Option<String>,
    pub release_date: Option<String>,
    #[serde(rename = "original_language")]
    pub language: Option<String>,
    #[serde(rename = "production_countries")]
    pub country: Option<String>,
}

impl CatalogMovie {
    /// Four-digit year prefix of the release date, when present.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|date| date.get(0..4))
    }
}

/// Reads the whole catalog into memory, in file order.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogMovie>, ReelError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|err| ReelError::Catalog(err.to_string()))?;
    let mut movies = Vec::new();
    for row in reader.deserialize() {
        let movie: CatalogMovie = row.map_err(|err| ReelError::Catalog(err.to_string()))?;
        movies.push(movie);
    }
    Ok(movies)
}
