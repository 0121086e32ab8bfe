//! ```text
//! Catalog CSV ──► scrape::batch ──► scrape::fetcher ─┬─► resolver (external-IDs lookup)
//!                                                    ├─► WebDriver session + render hold
//!                                                    └─► markup extraction ──► reviews on disk
//!
//! Review files ──► rag::RagEngine::initialize_movie ──► stores (per-movie sqlite-vec file)
//!
//! HTTP /api/chat ──► service handlers ──► rag::RagEngine::answer ──► local Ollama models
//! ```

pub mod catalog;
pub mod config;
pub mod markup;
pub mod rag;
pub mod resolver;
pub mod reviews;
pub mod scrape;
pub mod service;
pub mod stores;
pub mod types;

pub use types::ReelError;
