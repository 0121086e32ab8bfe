//! SQLite-backed vector storage for review chunks.
//!
//! Each movie's collection is a standalone SQLite database file holding a
//! `reviews` row table managed by rig-sqlite plus the sqlite-vec embedding
//! table it maintains alongside (`reviews_embeddings`). Similarity search
//! goes through raw SQL because the query embedding is computed by the
//! caller, not re-derived from text by the index layer.

use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::{Deserialize, Serialize};
use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;
use tokio_rusqlite::{Connection, ffi};
use uuid::Uuid;

use crate::types::ReelError;

/// One embedded slice of a movie's review file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewChunk {
    pub id: String,
    pub movie_id: String,
    pub chunk_index: usize,
    pub content: String,
}

impl ReviewChunk {
    pub fn new(movie_id: impl Into<String>, chunk_index: usize, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            movie_id: movie_id.into(),
            chunk_index,
            content: content.into(),
        }
    }
}

impl SqliteVectorStoreTable for ReviewChunk {
    fn name() -> &'static str {
        "reviews"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("movie_id", "TEXT").indexed(),
            Column::new("chunk_index", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("movie_id", Box::new(self.movie_id.clone())),
            ("chunk_index", Box::new(self.chunk_index.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

/// One movie's review collection, backed by a single database file.
#[derive(Clone)]
pub struct SqliteReviewStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, ReviewChunk>,
    /// Clone of the store's connection, for queries rig-sqlite has no API
    /// for (raw cosine search, counts).
    conn: Connection,
}

impl<E> std::fmt::Debug for SqliteReviewStore<E>
where
    E: EmbeddingModel + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteReviewStore").finish_non_exhaustive()
    }
}

impl<E> SqliteReviewStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Opens (creating if needed) the database file at `path` and verifies
    /// that the sqlite-vec extension is loaded.
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, ReelError> {
        Self::register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| ReelError::Storage(err.to_string()))?;
        conn.call(|conn| {
            let result = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match result {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Rusqlite(err)),
            }
        })
        .await
        .map_err(|err| ReelError::Storage(err.to_string()))?;
        // Clone for direct access before the connection moves into the store
        let conn_for_queries = conn.clone();
        let store = SqliteVectorStore::new(conn, model)
            .await
            .map_err(|err| ReelError::Storage(err.to_string()))?;
        Ok(Self {
            inner: store,
            conn: conn_for_queries,
        })
    }

    /// Inserts chunks with their precomputed embeddings.
    pub async fn add_chunks(&self, rows: Vec<(ReviewChunk, Embedding)>) -> Result<(), ReelError> {
        if rows.is_empty() {
            return Ok(());
        }
        let rows: Vec<(ReviewChunk, OneOrMany<Embedding>)> = rows
            .into_iter()
            .map(|(chunk, embedding)| (chunk, OneOrMany::one(embedding)))
            .collect();
        self.inner
            .add_rows(rows)
            .await
            .map_err(|err| ReelError::Storage(err.to_string()))?;
        Ok(())
    }

    /// Returns the `top_k` chunks closest to the query embedding, most
    /// similar first, as `(chunk, cosine similarity)` pairs.
    pub async fn search_similar(
        &self,
        query_embedding: &[f64],
        top_k: usize,
    ) -> Result<Vec<(ReviewChunk, f64)>, ReelError> {
        let embedding_json = serde_json::to_string(query_embedding)
            .map_err(|err| ReelError::Storage(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT c.id, c.movie_id, c.chunk_index, c.content, \
                         vec_distance_cosine(e.embedding, vec_f32(?)) as distance \
                         FROM reviews c \
                         JOIN reviews_embeddings e ON c.rowid = e.rowid \
                         ORDER BY distance ASC \
                         LIMIT {top_k}"
                    ))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([&embedding_json], |row| {
                        let chunk = ReviewChunk {
                            id: row.get(0)?,
                            movie_id: row.get(1)?,
                            chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                            content: row.get(3)?,
                        };
                        let distance: f64 = row.get(4)?;
                        // cosine distance -> similarity
                        Ok((chunk, 1.0 - distance))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| ReelError::Storage(err.to_string()))
    }

    /// Number of chunks stored in this collection.
    pub async fn count(&self) -> Result<usize, ReelError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| ReelError::Storage(err.to_string()))
    }

    fn register_sqlite_vec() -> Result<(), ReelError> {
        use std::sync::Mutex;

        static INIT: Once = Once::new();
        static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

        INIT.call_once(|| {
            let result = unsafe {
                type SqliteExtensionInit = unsafe extern "C" fn(
                    *mut ffi::sqlite3,
                    *mut *mut c_char,
                    *const ffi::sqlite3_api_routines,
                ) -> i32;

                let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
                let init_fn: SqliteExtensionInit =
                    transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
                let rc = ffi::sqlite3_auto_extension(Some(init_fn));
                if rc != 0 {
                    Err(format!(
                        "failed to register sqlite-vec extension (code {rc})"
                    ))
                } else {
                    Ok(())
                }
            };
            *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
        });

        INIT_RESULT
            .lock()
            .expect("init result mutex poisoned")
            .clone()
            .expect("init was called but result not set")
            .map_err(ReelError::Storage)
    }
}
