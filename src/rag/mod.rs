//! Retrieval-augmented chat over per-movie review collections.
//!
//! [`RagEngine`] owns the whole initialize/query lifecycle: reading review
//! files, chunking and embedding them into a movie's collection, and
//! answering questions by retrieving the closest chunks and handing them to
//! the completion model as context.

pub mod chunk;

use std::path::PathBuf;

use rig::completion::{CompletionModel, Message};
use rig::embeddings::{Embedding, EmbeddingModel};
use rig::message::AssistantContent;
use tracing::{debug, info};

use crate::reviews;
use crate::stores::{CollectionDir, ReviewChunk};
use crate::types::ReelError;

/// How many chunks retrieval feeds into the completion model.
pub const RETRIEVAL_TOP_K: usize = 5;

/// Embedding and completion glue around the collection directory.
pub struct RagEngine<E, C> {
    collections: CollectionDir,
    reviews_dir: PathBuf,
    embedding: E,
    completion: C,
}

impl<E, C> RagEngine<E, C>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    C: CompletionModel + Clone + Send + Sync + 'static,
{
    pub fn new(
        collections: CollectionDir,
        reviews_dir: impl Into<PathBuf>,
        embedding: E,
        completion: C,
    ) -> Self {
        Self {
            collections,
            reviews_dir: reviews_dir.into(),
            embedding,
            completion,
        }
    }

    /// Rebuilds a movie's vector collection from its review file.
    ///
    /// The previous collection, if any, is replaced wholesale so repeated
    /// initialization stays idempotent instead of stacking duplicate rows.
    /// Returns the number of chunks indexed.
    pub async fn initialize_movie(&self, movie_id: &str) -> Result<usize, ReelError> {
        let path = reviews::review_path(&self.reviews_dir, movie_id);
        let records = reviews::read_reviews(&path).await?;
        let chunks = chunk::chunk_reviews(&records, chunk::MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ReelError::Storage(format!(
                "review file for movie {movie_id} holds no text"
            )));
        }

        let embeddings = self.embed_chunks(&chunks).await?;

        self.collections.reset(movie_id).await?;
        let store = self.collections.open_or_create(movie_id, &self.embedding).await?;

        let indexed = chunks.len();
        let rows: Vec<(ReviewChunk, Embedding)> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| {
                (ReviewChunk::new(movie_id, index, content), embedding)
            })
            .collect();
        store.add_chunks(rows).await?;

        info!(movie_id, chunks = indexed, "collection rebuilt");
        Ok(indexed)
    }

    /// Answers a question about a movie from its indexed reviews.
    pub async fn answer(&self, movie_id: &str, question: &str) -> Result<String, ReelError> {
        let store = self.collections.open_existing(movie_id, &self.embedding).await?;

        let query = self.embed_one(question).await?;
        let hits = store.search_similar(&query.vec, RETRIEVAL_TOP_K).await?;
        debug!(movie_id, retrieved = hits.len(), "retrieved context chunks");

        let request = self
            .completion
            .completion_request(Message::user(question.to_string()))
            .preamble(build_preamble(&hits))
            .build();
        let response = self
            .completion
            .completion(request)
            .await
            .map_err(|err| ReelError::Completion(err.to_string()))?;

        let answer: String = response
            .choice
            .into_iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if answer.is_empty() {
            return Err(ReelError::Completion("model returned no text".into()));
        }
        Ok(answer)
    }

    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Embedding>, ReelError> {
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(E::MAX_DOCUMENTS) {
            let embedded = self
                .embedding
                .embed_texts(batch.to_vec())
                .await
                .map_err(|err| ReelError::Embedding(err.to_string()))?;
            embeddings.extend(embedded);
        }
        Ok(embeddings)
    }

    async fn embed_one(&self, text: &str) -> Result<Embedding, ReelError> {
        self.embedding
            .embed_texts(vec![text.to_string()])
            .await
            .map_err(|err| ReelError::Embedding(err.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| ReelError::Embedding("embedding model returned no vector".into()))
    }
}

/// Retrieval context ahead of the question, in the shape RAG query engines
/// conventionally use.
fn build_preamble(hits: &[(ReviewChunk, f64)]) -> String {
    let mut context = String::new();
    for (chunk, _) in hits {
        context.push_str(&chunk.content);
        context.push_str("\n\n");
    }
    format!(
        "Context information from movie reviews is below.\n\
         ---------------------\n\
         {context}\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_carries_every_retrieved_chunk() {
        let hits = vec![
            (ReviewChunk::new("238", 0, "Loved the pacing."), 0.9),
            (ReviewChunk::new("238", 1, "The score is haunting."), 0.8),
        ];
        let preamble = build_preamble(&hits);
        assert!(preamble.contains("Loved the pacing."));
        assert!(preamble.contains("The score is haunting."));
        assert!(preamble.starts_with("Context information"));
        assert!(preamble.ends_with("answer the query."));
    }

    #[test]
    fn preamble_with_no_hits_still_instructs() {
        let preamble = build_preamble(&[]);
        assert!(preamble.contains("answer the query."));
    }
}
