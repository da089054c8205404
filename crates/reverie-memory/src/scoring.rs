//! Retrieval scoring.
//!
//! A record's score for a query is the plain sum of three terms:
//!
//! ```text
//! score = cosine(query, record.embedding)                 relevance  [-1, 1]
//!       + exp(-hours_since(record.last_accessed_at) / 24)  recency    (0, 1]
//!       + record.importance / 10                           importance [0, 1]
//! ```
//!
//! Summing keeps a highly important but momentarily irrelevant memory in
//! contention instead of zeroing it out.

use chrono::{DateTime, Utc};

use crate::stream::MemoryRecord;

/// Characteristic scale of the recency decay, in hours.
pub const RECENCY_DECAY_HOURS: f64 = 24.0;

/// Importance ratings are divided by this to land in `[0, 1]`.
pub const IMPORTANCE_SCALE: f32 = 10.0;

/// Compute the cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or exactly `0.0` if either vector has
/// zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Fractional hours from `then` to `now`, never negative.
pub fn hours_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - then).num_milliseconds() as f64;
    (millis / 3_600_000.0).max(0.0)
}

/// Exponential recency term with a one-day characteristic decay.
pub fn recency(last_accessed_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    (-hours_since(last_accessed_at, now) / RECENCY_DECAY_HOURS).exp() as f32
}

/// Score `record` against `query_embedding` at the moment `now`.
pub fn score(query_embedding: &[f32], record: &MemoryRecord, now: DateTime<Utc>) -> f32 {
    cosine_similarity(query_embedding, record.embedding())
        + recency(record.last_accessed_at(), now)
        + record.importance() / IMPORTANCE_SCALE
}
