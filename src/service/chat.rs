//! `/api/chat` request handlers.
//!
//! The handlers hold the service contract exactly: a missing required field
//! is a 400 with a fixed message, anything else that goes wrong collapses to
//! a 500 with a generic message. Detail only ever reaches the log.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use serde_json::{Value, json};
use tracing::error;

use crate::types::ReelError;

use super::AppState;

/// Metadata keys echoed back by `initialize`.
const CONTEXT_FIELDS: [&str; 7] = [
    "title",
    "overview",
    "rating",
    "genres",
    "release_year",
    "language",
    "country",
];

/// `POST /api/chat/initialize`: rebuild a movie's collection from its review
/// file and acknowledge with the movie's metadata.
pub async fn initialize<E, C>(
    State(state): State<AppState<E, C>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>)
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    C: CompletionModel + Clone + Send + Sync + 'static,
{
    let Some(movie) = body.get("movie") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Movie data is required"})),
        );
    };

    match initialize_inner(&state, movie).await {
        Ok(context) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Chat initialized successfully",
                "context": context,
            })),
        ),
        Err(err) => {
            error!(error = %err, "chat initialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to initialize chat"})),
            )
        }
    }
}

async fn initialize_inner<E, C>(
    state: &AppState<E, C>,
    movie: &Value,
) -> Result<Value, ReelError>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    C: CompletionModel + Clone + Send + Sync + 'static,
{
    let movie_id = movie_id_string(movie.get("id"))
        .ok_or_else(|| ReelError::InvalidPayload("movie payload carries no usable id".into()))?;

    state.engine.initialize_movie(&movie_id).await?;

    let mut context = serde_json::Map::new();
    for field in CONTEXT_FIELDS {
        let value = movie.get(field).ok_or_else(|| {
            ReelError::InvalidPayload(format!("movie payload is missing '{field}'"))
        })?;
        context.insert(field.to_string(), value.clone());
    }
    Ok(Value::Object(context))
}

/// `POST /api/chat/query`: answer a question against a movie's indexed
/// reviews.
pub async fn query<E, C>(
    State(state): State<AppState<E, C>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>)
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    C: CompletionModel + Clone + Send + Sync + 'static,
{
    let movie_id = movie_id_string(body.get("movieId"));
    let question = body
        .get("question")
        .and_then(Value::as_str)
        .map(str::to_string);

    let (Some(movie_id), Some(question)) = (movie_id, question) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Movie ID and question are required"})),
        );
    };

    match state.engine.answer(&movie_id, &question).await {
        Ok(content) => (
            StatusCode::OK,
            Json(json!({"role": "assistant", "content": content})),
        ),
        Err(err) => {
            error!(error = %err, movie_id = %movie_id, "chat query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to process question"})),
            )
        }
    }
}

/// Renders a JSON id (number or non-empty string) the way the filesystem and
/// collection names expect it.
fn movie_id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}
