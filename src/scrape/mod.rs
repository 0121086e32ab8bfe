//! Review scraping: per-movie fetch and the catalog-wide batch driver.

pub mod batch;
pub mod fetcher;

pub use batch::{BatchOptions, BatchReport, run_batch};
pub use fetcher::{FetchOptions, FetchReviews, ReviewFetcher};
