//! Browser-driven review collection for one movie.
//!
//! The review site renders its listing client-side and loads the bulk of the
//! reviews only after the second "see more" control is clicked, then keeps
//! streaming content for tens of seconds. The fetch sequence is therefore
//! fixed: resolve the IMDb id, open a WebDriver session, click the second
//! expand control, hold for a configured wall-clock duration with no early
//! exit, capture the page source, extract and persist. The session is torn
//! down on every exit path.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use tracing::{info, warn};

use crate::markup;
use crate::resolver::TmdbResolver;
use crate::reviews;
use crate::types::ReelError;

/// Class of the expandable "see more" controls; the second one expands the
/// full review list.
const EXPAND_CONTROL_CLASS: &str = "ipc-see-more__text";

/// Knobs for a single fetch.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Review count below which the fetch is logged as under target.
    pub target_reviews: usize,
    /// Run the browser with a visible window.
    pub show_browser: bool,
    /// Wall-clock hold after the expand click, giving client-side rendering
    /// time to finish. There is no completion signal to poll.
    pub render_hold: Duration,
    /// Implicit wait applied to element lookups.
    pub implicit_wait: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            target_reviews: 200,
            show_browser: false,
            render_hold: Duration::from_secs(40),
            implicit_wait: Duration::from_secs(2),
        }
    }
}

/// Seam between the batch driver and the browser; lets the retry loop run
/// against a fake in tests.
#[async_trait]
pub trait FetchReviews: Send + Sync {
    /// Returns `true` when the movie's reviews were written to disk.
    async fn fetch_reviews(&self, movie_id: &str) -> bool;
}

/// Scrapes one movie's reviews end to end: resolve, render, expand, hold,
/// extract, persist.
pub struct ReviewFetcher {
    resolver: TmdbResolver,
    webdriver_url: String,
    reviews_dir: PathBuf,
    failure_log: PathBuf,
    options: FetchOptions,
}

impl ReviewFetcher {
    pub fn new(
        resolver: TmdbResolver,
        webdriver_url: impl Into<String>,
        reviews_dir: impl Into<PathBuf>,
        failure_log: impl Into<PathBuf>,
        options: FetchOptions,
    ) -> Self {
        Self {
            resolver,
            webdriver_url: webdriver_url.into(),
            reviews_dir: reviews_dir.into(),
            failure_log: failure_log.into(),
            options,
        }
    }

    /// The fallible body behind [`FetchReviews::fetch_reviews`].
    ///
    /// Resolution failures, session-start failures, and a missing expand
    /// control are soft: they log and return `Ok(false)` so the batch
    /// driver's retry policy applies uniformly. Anything after session
    /// start propagates as an error, with the session still closed.
    pub async fn try_fetch(&self, movie_id: &str) -> Result<bool, ReelError> {
        let imdb_id = match self.resolver.resolve_imdb_id(movie_id).await {
            Ok(imdb_id) => imdb_id,
            Err(err) => {
                warn!(movie_id, error = %err, "could not resolve imdb id, skipping");
                return Ok(false);
            }
        };

        let driver = match self.start_session().await {
            Ok(driver) => driver,
            Err(err) => {
                warn!(movie_id, error = %err, "webdriver session failed to start");
                return Ok(false);
            }
        };

        let outcome = self.collect(&driver, movie_id, &imdb_id).await;
        if let Err(err) = driver.quit().await {
            warn!(movie_id, error = %err, "webdriver session did not shut down cleanly");
        }
        outcome
    }

    async fn start_session(&self) -> Result<WebDriver, ReelError> {
        let mut caps = DesiredCapabilities::chrome();
        if !self.options.show_browser {
            caps.set_headless()?;
            caps.add_arg("--disable-gpu")?;
        }
        let driver = WebDriver::new(&self.webdriver_url, caps).await?;
        Ok(driver)
    }

    async fn collect(
        &self,
        driver: &WebDriver,
        movie_id: &str,
        imdb_id: &str,
    ) -> Result<bool, ReelError> {
        let review_url = format!("https://www.imdb.com/title/{imdb_id}/reviews");
        info!(movie_id, url = %review_url, "loading review page");
        driver.goto(&review_url).await?;
        driver
            .set_implicit_wait_timeout(self.options.implicit_wait)
            .await?;

        let expand_controls = driver.find_all(By::ClassName(EXPAND_CONTROL_CLASS)).await?;
        if expand_controls.len() < 2 {
            info!(
                movie_id,
                found = expand_controls.len(),
                "second expand control not found, skipping movie"
            );
            return Ok(false);
        }
        driver
            .action_chain()
            .move_to_element_center(&expand_controls[1])
            .click()
            .perform()
            .await?;

        tokio::time::sleep(self.options.render_hold).await;

        let page_source = driver.source().await?;
        let collected = markup::collect_reviews(&page_source)?;

        let fetched = collected.len();
        if fetched < self.options.target_reviews {
            warn!(
                movie_id,
                fetched,
                target = self.options.target_reviews,
                "fetched fewer reviews than targeted"
            );
            reviews::append_failure(&self.failure_log, fetched, movie_id, imdb_id).await?;
        } else {
            info!(movie_id, fetched, "review fetch hit target");
        }

        let path = reviews::write_reviews(&self.reviews_dir, movie_id, &collected).await?;
        info!(movie_id, path = %path.display(), "reviews written");
        Ok(true)
    }
}

#[async_trait]
impl FetchReviews for ReviewFetcher {
    async fn fetch_reviews(&self, movie_id: &str) -> bool {
        match self.try_fetch(movie_id).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(movie_id, error = %err, "review fetch failed");
                false
            }
        }
    }
}
