//! Sentiment scoring of finished posts.

use std::panic::{AssertUnwindSafe, catch_unwind};

use postcrew_shared::SentimentScores;
use tracing::warn;

/// Only the opening of a post is scored.
pub const SENTIMENT_SAMPLE_CHARS: usize = 1000;

/// Score the first [`SENTIMENT_SAMPLE_CHARS`] characters of `text`.
///
/// Returns `None` for empty text or when the analyzer fails.
pub fn score(text: &str) -> Option<SentimentScores> {
    let sample: String = text.chars().take(SENTIMENT_SAMPLE_CHARS).collect();
    if sample.trim().is_empty() {
        return None;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(&sample);
        let get = |key: &str| scores.get(key).copied();
        Some(SentimentScores {
            positive: get("pos")?,
            neutral: get("neu")?,
            negative: get("neg")?,
            compound: get("compound")?,
        })
    }));

    match result {
        Ok(Some(scores)) => Some(scores),
        Ok(None) => {
            warn!("sentiment analyzer returned incomplete scores");
            None
        }
        Err(_) => {
            warn!("sentiment analysis failed");
            None
        }
    }
}
