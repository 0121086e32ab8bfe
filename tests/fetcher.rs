//! Fetcher tests against mocked TMDB and WebDriver endpoints.
//!
//! httpmock stands in for chromedriver, speaking just enough of the
//! WebDriver wire protocol for the abort paths: session creation,
//! navigation, timeouts, element lookup, and session teardown.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use reelrag::resolver::TmdbResolver;
use reelrag::scrape::fetcher::{FetchOptions, ReviewFetcher};

const SESSION_ID: &str = "f00bar-session";

fn quick_options() -> FetchOptions {
    FetchOptions {
        render_hold: Duration::from_millis(10),
        implicit_wait: Duration::from_millis(10),
        ..FetchOptions::default()
    }
}

fn fetcher_for(tmdb: &MockServer, webdriver: &MockServer, dir: &TempDir) -> ReviewFetcher {
    let resolver = TmdbResolver::new(&tmdb.base_url(), "test-key").expect("resolver builds");
    ReviewFetcher::new(
        resolver,
        webdriver.base_url(),
        dir.path().join("reviews"),
        dir.path().join("failed_reviews.txt"),
        quick_options(),
    )
}

async fn mock_tmdb_resolution(tmdb: &MockServer, movie_id: &str, imdb_id: &str) {
    let path = format!("/movie/{movie_id}/external_ids");
    tmdb.mock_async(move |when, then| {
        when.method(GET).path(path);
        then.status(200)
            .json_body(json!({"imdb_id": imdb_id}));
    })
    .await;
}

/// Mocks the wire-protocol calls up to the expand-control lookup, answering
/// the element search with `controls` matching elements.
async fn mock_webdriver_session(webdriver: &MockServer, controls: usize) -> httpmock::Mock<'_> {
    webdriver
        .mock_async(|when, then| {
            when.method(POST).path("/session");
            then.status(200).json_body(json!({
                "value": {"sessionId": SESSION_ID, "capabilities": {"browserName": "chrome"}}
            }));
        })
        .await;
    webdriver
        .mock_async(|when, then| {
            when.method(POST).path(format!("/session/{SESSION_ID}/url"));
            then.status(200).json_body(json!({"value": null}));
        })
        .await;
    webdriver
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/session/{SESSION_ID}/timeouts"));
            then.status(200).json_body(json!({"value": null}));
        })
        .await;
    let elements: Vec<_> = (0..controls)
        .map(|index| json!({"element-6066-11e4-a52e-4f735466cecf": format!("elem-{index}")}))
        .collect();
    webdriver
        .mock_async(move |when, then| {
            when.method(POST)
                .path(format!("/session/{SESSION_ID}/elements"));
            then.status(200).json_body(json!({"value": elements}));
        })
        .await;
    // teardown must happen on every exit path
    webdriver
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/session/{SESSION_ID}"));
            then.status(200).json_body(json!({"value": null}));
        })
        .await
}

#[tokio::test]
async fn too_few_expand_controls_aborts_without_writing_anything() {
    let tmdb = MockServer::start_async().await;
    let webdriver = MockServer::start_async().await;
    let dir = TempDir::new().expect("tempdir");

    mock_tmdb_resolution(&tmdb, "238", "tt0068646").await;
    let teardown = mock_webdriver_session(&webdriver, 1).await;

    let fetcher = fetcher_for(&tmdb, &webdriver, &dir);
    let fetched = fetcher.try_fetch("238").await.expect("abort is soft");

    assert!(!fetched, "one expand control is not enough");
    assert!(!dir.path().join("reviews").join("238_reviews.txt").exists());
    assert!(!dir.path().join("failed_reviews.txt").exists());
    teardown.assert_async().await;
}

#[tokio::test]
async fn zero_expand_controls_aborts_the_same_way() {
    let tmdb = MockServer::start_async().await;
    let webdriver = MockServer::start_async().await;
    let dir = TempDir::new().expect("tempdir");

    mock_tmdb_resolution(&tmdb, "680", "tt0110912").await;
    let teardown = mock_webdriver_session(&webdriver, 0).await;

    let fetcher = fetcher_for(&tmdb, &webdriver, &dir);
    let fetched = fetcher.try_fetch("680").await.expect("abort is soft");

    assert!(!fetched);
    assert!(!dir.path().join("reviews").join("680_reviews.txt").exists());
    teardown.assert_async().await;
}

#[tokio::test]
async fn resolution_failure_skips_the_browser_entirely() {
    let tmdb = MockServer::start_async().await;
    let webdriver = MockServer::start_async().await;
    let dir = TempDir::new().expect("tempdir");

    tmdb.mock_async(|when, then| {
        when.method(GET).path("/movie/0/external_ids");
        then.status(404).json_body(json!({"status_message": "not found"}));
    })
    .await;
    let session = webdriver
        .mock_async(|when, then| {
            when.method(POST).path("/session");
            then.status(200).json_body(json!({
                "value": {"sessionId": SESSION_ID, "capabilities": {}}
            }));
        })
        .await;

    let fetcher = fetcher_for(&tmdb, &webdriver, &dir);
    let fetched = fetcher.try_fetch("0").await.expect("skip is soft");

    assert!(!fetched, "unresolvable movies are skipped");
    assert_eq!(session.hits_async().await, 0, "no session may be opened");
}

#[tokio::test]
async fn unreachable_webdriver_is_a_soft_failure() {
    let tmdb = MockServer::start_async().await;
    let dir = TempDir::new().expect("tempdir");

    mock_tmdb_resolution(&tmdb, "603", "tt0133093").await;

    let resolver = TmdbResolver::new(&tmdb.base_url(), "test-key").expect("resolver builds");
    // nothing listens on this port
    let fetcher = ReviewFetcher::new(
        resolver,
        "http://127.0.0.1:9",
        dir.path().join("reviews"),
        dir.path().join("failed_reviews.txt"),
        quick_options(),
    );

    let fetched = fetcher.try_fetch("603").await.expect("session failure is soft");
    assert!(!fetched);
}
