//! reelrag command line: fetch one movie's reviews, walk a whole catalog, or
//! serve the chat endpoints.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rig::client::CompletionClient;
use rig::client::EmbeddingsClient;
use rig::client::{Nothing, ProviderClient};
use rig::providers::ollama;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reelrag::ReelError;
use reelrag::catalog;
use reelrag::config::Settings;
use reelrag::rag::RagEngine;
use reelrag::resolver::TmdbResolver;
use reelrag::scrape::batch::{self, BatchOptions};
use reelrag::scrape::fetcher::{FetchOptions, ReviewFetcher};
use reelrag::service::{self, AppState};
use reelrag::stores::CollectionDir;

#[derive(Parser)]
#[command(name = "reelrag", version, about = "Movie-review scraping and retrieval-augmented chat")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch reviews for a single movie by TMDB id
    Fetch {
        /// TMDB movie id
        movie_id: String,
        /// Review count below which the fetch is logged as under target
        #[arg(long, default_value_t = 200)]
        target_reviews: usize,
        /// Run the browser with a visible window
        #[arg(long)]
        show_browser: bool,
        /// Seconds to hold the page open for client-side rendering
        #[arg(long, default_value_t = 40)]
        render_hold_secs: u64,
    },
    /// Walk a catalog CSV, fetching reviews for every movie
    Scrape {
        /// Path to the catalog CSV
        catalog: PathBuf,
        /// Zero-based row to resume from; earlier rows are skipped
        #[arg(long, default_value_t = 0)]
        start_index: usize,
        /// Review count below which a fetch is logged as under target
        #[arg(long, default_value_t = 200)]
        target_reviews: usize,
        /// Run the browser with a visible window
        #[arg(long)]
        show_browser: bool,
        /// Seconds to hold each page open for client-side rendering
        #[arg(long, default_value_t = 40)]
        render_hold_secs: u64,
    },
    /// Serve the chat endpoints over the scraped reviews
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), ReelError> {
    dotenvy::dotenv().ok();
    init_tracing();
    let settings = Settings::from_env()?;

    match Cli::parse().cmd {
        Cmd::Fetch {
            movie_id,
            target_reviews,
            show_browser,
            render_hold_secs,
        } => {
            let fetcher = build_fetcher(
                &settings,
                target_reviews,
                show_browser,
                render_hold_secs,
            )?;
            let fetched = fetcher.try_fetch(&movie_id).await?;
            if fetched {
                info!(movie_id, "fetch finished");
            } else {
                info!(movie_id, "fetch skipped the movie");
            }
        }
        Cmd::Scrape {
            catalog,
            start_index,
            target_reviews,
            show_browser,
            render_hold_secs,
        } => {
            let movies = catalog::load_catalog(&catalog)?;
            let fetcher = build_fetcher(
                &settings,
                target_reviews,
                show_browser,
                render_hold_secs,
            )?;
            let options = BatchOptions {
                start_index,
                ..BatchOptions::default()
            };
            batch::run_batch(&fetcher, &movies, &options).await;
        }
        Cmd::Serve => {
            let client = ollama::Client::from_val(Nothing);
            let embedding = client
                .embedding_model_with_ndims(&settings.embedding_model, settings.embedding_dims);
            let completion = client.completion_model(&settings.completion_model);
            let engine = RagEngine::new(
                CollectionDir::new(settings.collections_dir()),
                settings.reviews_dir(),
                embedding,
                completion,
            );
            service::serve(AppState::new(engine), &settings.bind_addr).await?;
        }
    }
    Ok(())
}

fn build_fetcher(
    settings: &Settings,
    target_reviews: usize,
    show_browser: bool,
    render_hold_secs: u64,
) -> Result<ReviewFetcher, ReelError> {
    let resolver = TmdbResolver::from_settings(settings)?;
    let options = FetchOptions {
        target_reviews,
        show_browser,
        render_hold: Duration::from_secs(render_hold_secs),
        ..FetchOptions::default()
    };
    Ok(ReviewFetcher::new(
        resolver,
        settings.webdriver_url.clone(),
        settings.reviews_dir(),
        settings.failed_log_path(),
        options,
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,reelrag=debug"))
        .expect("static filter directive parses");
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
