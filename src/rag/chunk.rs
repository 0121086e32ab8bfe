//! Splits review records into embedding-sized chunks.

/// Character cap per embedded chunk. Most reviews fit in one chunk; the long
/// tail gets split at whitespace so no single embedding input balloons.
pub const MAX_CHUNK_CHARS: usize = 2000;

/// Splits one review into chunks of at most `max_chars` characters, breaking
/// at whitespace. A single token longer than the cap is hard-split.
pub fn split_review(review: &str, max_chars: usize) -> Vec<String> {
    let trimmed = review.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.chars().count() <= max_chars {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in trimmed.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let mut piece = String::new();
            let mut piece_len = 0usize;
            for ch in word.chars() {
                piece.push(ch);
                piece_len += 1;
                if piece_len == max_chars {
                    chunks.push(std::mem::take(&mut piece));
                    piece_len = 0;
                }
            }
            if piece_len > 0 {
                current = piece;
                current_len = piece_len;
            }
            continue;
        }

        if current_len > 0 && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

/// Chunks every review in order, dropping empty records.
pub fn chunk_reviews(reviews: &[String], max_chars: usize) -> Vec<String> {
    reviews
        .iter()
        .flat_map(|review| split_review(review, max_chars))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reviews_pass_through_whole() {
        let chunks = split_review("  a tidy little review  ", 100);
        assert_eq!(chunks, vec!["a tidy little review".to_string()]);
    }

    #[test]
    fn empty_reviews_produce_nothing() {
        assert!(split_review("   \n  ", 100).is_empty());
        assert!(chunk_reviews(&[], MAX_CHUNK_CHARS).is_empty());
    }

    #[test]
    fn long_reviews_split_at_whitespace_under_the_cap() {
        let review = "word ".repeat(100);
        let chunks = split_review(&review, 30);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
            assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
        }
        assert_eq!(chunks.join(" "), review.trim());
    }

    #[test]
    fn oversized_tokens_are_hard_split() {
        let review = "a".repeat(25);
        let chunks = split_review(&review, 10);
        assert_eq!(
            chunks,
            vec!["a".repeat(10), "a".repeat(10), "a".repeat(5)]
        );
    }

    #[test]
    fn chunking_preserves_review_order() {
        let reviews = vec!["first".to_string(), String::new(), "second".to_string()];
        let chunks = chunk_reviews(&reviews, MAX_CHUNK_CHARS);
        assert_eq!(chunks, vec!["first".to_string(), "second".to_string()]);
    }
}
