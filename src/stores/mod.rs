//! Per-movie vector collections on disk.
//!
//! The chat service keeps one collection per movie, named `{id}_reviews`.
//! Here a collection is one SQLite database file, `{id}_reviews.sqlite`,
//! under a shared directory; [`CollectionDir`] maps movie ids to files and
//! owns the create/replace/open-existing policy.

pub mod sqlite;

pub use sqlite::{ReviewChunk, SqliteReviewStore};

use std::path::{Path, PathBuf};

use rig::embeddings::EmbeddingModel;
use tokio::fs;
use tracing::debug;

use crate::types::ReelError;

/// Directory of per-movie SQLite vector databases.
#[derive(Clone, Debug)]
pub struct CollectionDir {
    root: PathBuf,
}

impl CollectionDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Database file backing one movie's collection.
    pub fn collection_path(&self, movie_id: &str) -> PathBuf {
        self.root.join(format!("{movie_id}_reviews.sqlite"))
    }

    /// Creates the collection directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), ReelError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Deletes a movie's collection file so the next open starts empty.
    pub async fn reset(&self, movie_id: &str) -> Result<(), ReelError> {
        let path = self.collection_path(movie_id);
        if path.exists() {
            debug!(movie_id, path = %path.display(), "replacing existing collection");
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    /// Opens a movie's collection, creating the database file if absent.
    pub async fn open_or_create<E>(
        &self,
        movie_id: &str,
        model: &E,
    ) -> Result<SqliteReviewStore<E>, ReelError>
    where
        E: EmbeddingModel + Clone + Send + Sync + 'static,
    {
        self.ensure_root().await?;
        SqliteReviewStore::open(self.collection_path(movie_id), model).await
    }

    /// Opens a movie's collection only if it has been indexed before.
    ///
    /// Opening through SQLite would silently create an empty database, so
    /// the file's existence is checked first and a missing collection is
    /// reported as [`ReelError::NotIndexed`].
    pub async fn open_existing<E>(
        &self,
        movie_id: &str,
        model: &E,
    ) -> Result<SqliteReviewStore<E>, ReelError>
    where
        E: EmbeddingModel + Clone + Send + Sync + 'static,
    {
        let path = self.collection_path(movie_id);
        if !path.exists() {
            return Err(ReelError::NotIndexed(movie_id.to_string()));
        }
        SqliteReviewStore::open(path, model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_files_carry_the_reviews_suffix() {
        let dir = CollectionDir::new("/tmp/collections");
        assert_eq!(
            dir.collection_path("238"),
            PathBuf::from("/tmp/collections/238_reviews.sqlite")
        );
    }
}
