//! HTTP surface for the review chat service.

pub mod chat;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::rag::RagEngine;
use crate::types::ReelError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState<E, C> {
    pub engine: Arc<RagEngine<E, C>>,
}

impl<E, C> AppState<E, C> {
    pub fn new(engine: RagEngine<E, C>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Builds the `/api/chat` router with a permissive CORS layer, the browser
/// frontends being served from arbitrary origins.
pub fn router<E, C>(state: AppState<E, C>) -> Router
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    C: CompletionModel + Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat/initialize", post(chat::initialize::<E, C>))
        .route("/api/chat/query", post(chat::query::<E, C>))
        .layer(cors)
        .with_state(state)
}

/// Binds and serves the chat endpoints until the process stops.
pub async fn serve<E, C>(state: AppState<E, C>, bind_addr: &str) -> Result<(), ReelError>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    C: CompletionModel + Clone + Send + Sync + 'static,
{
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = bind_addr, "chat service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
