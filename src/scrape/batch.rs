//! Sequential catalog walk with bounded retries.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::catalog::CatalogMovie;

use super::fetcher::FetchReviews;

/// Retry and pacing policy for a catalog run.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Zero-based row to resume from; earlier rows are skipped. The resume
    /// point is never persisted, restarting means passing it again.
    pub start_index: usize,
    /// Fetch attempts per movie before it is recorded as failed.
    pub max_attempts: usize,
    /// Pause between failed attempts on the same movie.
    pub retry_delay: Duration,
    /// Pause after every movie, to avoid hammering the review site.
    pub item_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            start_index: 0,
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            item_delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of one catalog run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Rows at or after the start offset that were attempted.
    pub processed: usize,
    /// `(row index, movie id)` for movies that exhausted every attempt.
    pub failed: Vec<(usize, u64)>,
}

/// Walks the catalog strictly in order, fetching each movie's reviews with
/// bounded retries. Nothing here is fatal: a movie that exhausts its
/// attempts is recorded and the walk continues.
pub async fn run_batch<F>(fetcher: &F, movies: &[CatalogMovie], options: &BatchOptions) -> BatchReport
where
    F: FetchReviews + ?Sized,
{
    let mut report = BatchReport::default();

    for (index, movie) in movies.iter().enumerate() {
        if index < options.start_index {
            continue;
        }
        info!(index, movie_id = movie.id, "processing catalog row");
        report.processed += 1;

        let mut attempts = 0usize;
        while attempts < options.max_attempts {
            if fetcher.fetch_reviews(&movie.id.to_string()).await {
                break;
            }
            attempts += 1;
            if attempts < options.max_attempts {
                info!(
                    movie_id = movie.id,
                    attempt = attempts + 1,
                    max_attempts = options.max_attempts,
                    "retrying fetch"
                );
                sleep(options.retry_delay).await;
            }
        }
        if attempts == options.max_attempts {
            warn!(
                movie_id = movie.id,
                attempts, "movie failed after all fetch attempts"
            );
            report.failed.push((index, movie.id));
        }

        sleep(options.item_delay).await;
    }

    if report.failed.is_empty() {
        info!(processed = report.processed, "catalog run finished");
    } else {
        warn!(
            processed = report.processed,
            failed = report.failed.len(),
            "catalog run finished with failures"
        );
        for (index, movie_id) in &report.failed {
            warn!(index, movie_id, "failed movie");
        }
    }
    report
}
