//! Review files on disk.
//!
//! One UTF-8 text file per movie under the reviews directory, each review
//! followed by a blank line, plus a shared append-only log of fetches that
//! came up short of their target.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::types::ReelError;

/// Path of a movie's review file inside `reviews_dir`.
pub fn review_path(reviews_dir: &Path, movie_id: &str) -> PathBuf {
    reviews_dir.join(format!("{movie_id}_reviews.txt"))
}

/// Writes the review set for one movie, replacing any previous file.
pub async fn write_reviews(
    reviews_dir: &Path,
    movie_id: &str,
    reviews: &[String],
) -> Result<PathBuf, ReelError> {
    fs::create_dir_all(reviews_dir).await?;
    let path = review_path(reviews_dir, movie_id);
    let mut body = String::new();
    for review in reviews {
        body.push_str(review);
        body.push_str("\n\n");
    }
    fs::write(&path, body).await?;
    Ok(path)
}

/// Reads a review file back into individual records.
pub async fn read_reviews(path: &Path) -> Result<Vec<String>, ReelError> {
    let data = fs::read_to_string(path).await?;
    Ok(split_records(&data))
}

/// Splits file content on blank lines, dropping empty records.
pub fn split_records(data: &str) -> Vec<String> {
    data.split("\n\n")
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .map(str::to_string)
        .collect()
}

/// Appends one `[count, movie_id, 'imdb_id']` line to the failure log,
/// creating the log's directory on first use.
pub async fn append_failure(
    log_path: &Path,
    fetched: usize,
    movie_id: &str,
    imdb_id: &str,
) -> Result<(), ReelError> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let line = format!("[{fetched}, {movie_id}, '{imdb_id}']\n");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_then_read_roundtrips_records() {
        let dir = tempdir().expect("tempdir");
        let reviews = vec!["First review".to_string(), "Second review".to_string()];

        let path = write_reviews(dir.path(), "238", &reviews)
            .await
            .expect("write succeeds");
        assert_eq!(path, dir.path().join("238_reviews.txt"));

        let raw = tokio::fs::read_to_string(&path).await.expect("file exists");
        assert_eq!(raw, "First review\n\nSecond review\n\n");

        let restored = read_reviews(&path).await.expect("read succeeds");
        assert_eq!(restored, reviews);
    }

    #[tokio::test]
    async fn write_replaces_previous_content() {
        let dir = tempdir().expect("tempdir");
        write_reviews(dir.path(), "238", &["Old review".to_string()])
            .await
            .expect("first write");
        write_reviews(dir.path(), "238", &["New review".to_string()])
            .await
            .expect("second write");

        let restored = read_reviews(&review_path(dir.path(), "238"))
            .await
            .expect("read succeeds");
        assert_eq!(restored, vec!["New review".to_string()]);
    }

    #[test]
    fn split_drops_blank_records() {
        let records = split_records("one\n\n\n\ntwo\n\n");
        assert_eq!(records, vec!["one".to_string(), "two".to_string()]);
        assert!(split_records("").is_empty());
        assert!(split_records("\n\n\n").is_empty());
    }

    #[tokio::test]
    async fn failure_log_appends_python_style_tuples() {
        let dir = tempdir().expect("tempdir");
        let log = dir.path().join("nested").join("failed_reviews.txt");

        append_failure(&log, 12, "238", "tt0068646")
            .await
            .expect("first append");
        append_failure(&log, 0, "680", "tt0110912")
            .await
            .expect("second append");

        let contents = tokio::fs::read_to_string(&log).await.expect("log exists");
        assert_eq!(
            contents,
            "[12, 238, 'tt0068646']\n[0, 680, 'tt0110912']\n"
        );
    }

    #[tokio::test]
    async fn reading_a_missing_file_is_an_io_error() {
        let dir = tempdir().expect("tempdir");
        let err = read_reviews(&review_path(dir.path(), "999"))
            .await
            .expect_err("must fail");
        assert!(matches!(err, ReelError::Io(_)));
    }
}
