//! The Memory Stream.
//!
//! An append-only, in-process log of [`MemoryRecord`]s. Every record is
//! created by [`MemoryStore::append`], which first obtains an embedding and
//! an importance rating from the injected [`Reasoner`]; either call failing
//! leaves the log untouched. Records are never removed or reordered, so a
//! record's position is its identity.
//!
//! After creation only `last_accessed_at` moves, and only forward, when a
//! retrieval scans the record (see [`crate::retrieval`]).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reverie_memory::MemoryStore;
//! use reverie_types::ModelSettings;
//! use reverie_types::testing::ScriptedReasoner;
//!
//! let reasoner = Arc::new(ScriptedReasoner::new().with_completion(|_| Ok("4".into())));
//! let mut store = MemoryStore::new(reasoner, ModelSettings::default());
//!
//! let record = store.append("Isabella is planning a Valentine's Day party").unwrap();
//! assert_eq!(record.importance(), 4.0);
//! assert_eq!(record.created_at(), record.last_accessed_at());
//! assert_eq!(store.recent(10).len(), 1);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reverie_types::{Clock, MemoryError, ModelSettings, Reasoner, ReasonerError, SystemClock};
use serde::Serialize;
use tracing::{debug, info};

use crate::importance::rate_importance;

// ─────────────────────────────────────────────────────────────────────────────
// MemoryRecord
// ─────────────────────────────────────────────────────────────────────────────

/// A single observation or derived insight held by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    description: String,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    importance: f32,
    embedding: Vec<f32>,
}

impl MemoryRecord {
    pub(crate) fn new(
        description: String,
        importance: f32,
        embedding: Vec<f32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            description,
            created_at: now,
            last_accessed_at: now,
            importance,
            embedding,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.last_accessed_at
    }

    /// Salience rating in `[0, 10]`.
    pub fn importance(&self) -> f32 {
        self.importance
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    /// Mark the record as accessed at `now`; never moves the time backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// Owner of the memory log and the only place records are mutated.
///
/// Mutating operations take `&mut self`; share a store between threads by
/// wrapping it in `Arc<Mutex<MemoryStore>>`.
pub struct MemoryStore {
    reasoner: Arc<dyn Reasoner>,
    clock: Arc<dyn Clock>,
    models: ModelSettings,
    records: Vec<MemoryRecord>,
}

impl MemoryStore {
    /// Create an empty store that timestamps records with the system clock.
    pub fn new(reasoner: Arc<dyn Reasoner>, models: ModelSettings) -> Self {
        Self {
            reasoner,
            clock: Arc::new(SystemClock),
            models,
            records: Vec::new(),
        }
    }

    /// Replace the clock used for timestamps and recency scoring.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn models(&self) -> &ModelSettings {
        &self.models
    }

    /// Embed and rate `description`, then append it as a new record.
    ///
    /// # Errors
    ///
    /// * [`MemoryError::EmbeddingFailure`] – the embedding call failed or
    ///   returned an empty vector.
    /// * [`MemoryError::DimensionMismatch`] – the embedding's length differs
    ///   from the records already stored.
    /// * [`MemoryError::ImportanceRatingFailure`] /
    ///   [`MemoryError::ImportanceParseFailure`] – see
    ///   [`rate_importance`](crate::importance::rate_importance).
    ///
    /// The store is unchanged on every error path.
    pub fn append(&mut self, description: impl Into<String>) -> Result<&MemoryRecord, MemoryError> {
        let description = description.into();
        let embedding = self.embed(&description)?;
        self.check_dimension(&embedding)?;
        let importance = rate_importance(
            self.reasoner.as_ref(),
            &self.models.completion_model,
            &description,
        )?;

        // Keep creation order chronological even if the wall clock steps back.
        let mut now = self.clock.now();
        if let Some(last) = self.records.last() {
            now = now.max(last.created_at);
        }

        let record = MemoryRecord::new(description, importance, embedding, now);
        self.records.push(record);
        let index = self.records.len() - 1;
        info!(index, importance, "memory appended");
        Ok(&self.records[index])
    }

    /// The last `min(n, len)` records, oldest first. Does not touch access
    /// times.
    pub fn recent(&self, n: usize) -> &[MemoryRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// The whole log, oldest first.
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&MemoryRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimension shared by every record, once one exists.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.len())
    }

    // -------------------------------------------------------------------------
    // Crate-internal helpers used by retrieval
    // -------------------------------------------------------------------------

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [MemoryRecord] {
        &mut self.records
    }

    pub(crate) fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let embedding = self
            .reasoner
            .embed(&self.models.embedding_model, text)
            .map_err(MemoryError::EmbeddingFailure)?;
        if embedding.is_empty() {
            return Err(MemoryError::EmbeddingFailure(ReasonerError::BadResponse(
                "empty embedding vector".into(),
            )));
        }
        if let Some(pos) = embedding.iter().position(|x| !x.is_finite()) {
            return Err(MemoryError::EmbeddingFailure(ReasonerError::BadResponse(
                format!("non-finite embedding component at {pos}"),
            )));
        }
        debug!(dimension = embedding.len(), "embedded text");
        Ok(embedding)
    }

    pub(crate) fn check_dimension(&self, embedding: &[f32]) -> Result<(), MemoryError> {
        match self.dimension() {
            Some(expected) if expected != embedding.len() => Err(MemoryError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use reverie_types::testing::{ManualClock, ScriptedReasoner};

    fn store_with(reasoner: ScriptedReasoner) -> (MemoryStore, Arc<ScriptedReasoner>) {
        let reasoner = Arc::new(reasoner);
        let store = MemoryStore::new(reasoner.clone(), ModelSettings::default());
        (store, reasoner)
    }

    #[test]
    fn append_sets_access_time_to_creation_time() {
        let (mut store, _) = store_with(ScriptedReasoner::new());
        let record = store.append("ate breakfast").unwrap();
        assert_eq!(record.last_accessed_at(), record.created_at());
        assert_eq!(record.description(), "ate breakfast");
        assert_eq!(record.importance(), 5.0);
        assert_eq!(record.embedding().len(), 26);
    }

    #[test]
    fn append_embeds_then_rates() {
        let (mut store, reasoner) = store_with(ScriptedReasoner::new());
        store.append("went for a run").unwrap();
        assert_eq!(reasoner.embedded_texts(), vec!["went for a run".to_string()]);
        assert_eq!(reasoner.completion_calls().len(), 1);
    }

    #[test]
    fn append_embedding_failure_leaves_store_unchanged() {
        let (mut store, reasoner) = store_with(
            ScriptedReasoner::new().with_embedding(|_| Err(ReasonerError::Transport("down".into()))),
        );
        let err = store.append("x").unwrap_err();
        assert!(matches!(err, MemoryError::EmbeddingFailure(_)));
        assert!(store.is_empty());
        // Rating is never requested once embedding has failed.
        assert!(reasoner.completion_calls().is_empty());
    }

    #[test]
    fn append_rating_failure_leaves_store_unchanged() {
        let (mut store, _) = store_with(
            ScriptedReasoner::new().with_completion(|_| Err(ReasonerError::Transport("down".into()))),
        );
        let err = store.append("x").unwrap_err();
        assert!(matches!(err, MemoryError::ImportanceRatingFailure(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn append_unparseable_rating_leaves_store_unchanged() {
        let (mut store, _) =
            store_with(ScriptedReasoner::new().with_completion(|_| Ok("very".into())));
        let err = store.append("x").unwrap_err();
        assert!(matches!(err, MemoryError::ImportanceParseFailure { .. }));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn append_rejects_empty_embedding() {
        let (mut store, _) = store_with(ScriptedReasoner::new().with_embedding(|_| Ok(vec![])));
        let err = store.append("x").unwrap_err();
        assert!(matches!(
            err,
            MemoryError::EmbeddingFailure(ReasonerError::BadResponse(_))
        ));
    }

    #[test]
    fn append_rejects_non_finite_embedding() {
        let (mut store, reasoner) = store_with(ScriptedReasoner::new().with_embedding(|text| {
            match text {
                "bad" => Ok(vec![f32::NAN, 0.0]),
                "worse" => Ok(vec![1.0, f32::INFINITY]),
                _ => Ok(vec![1.0, 0.0]),
            }
        }));
        store.append("good").unwrap();

        for text in ["bad", "worse"] {
            let err = store.append(text).unwrap_err();
            assert!(matches!(
                err,
                MemoryError::EmbeddingFailure(ReasonerError::BadResponse(_))
            ));
        }
        assert_eq!(store.len(), 1);
        // Only the good record was rated.
        assert_eq!(reasoner.completion_calls().len(), 1);
    }

    #[test]
    fn append_rejects_dimension_change() {
        let (mut store, _) = store_with(
            ScriptedReasoner::new().with_embedding(|text| Ok(vec![1.0; text.len()])),
        );
        store.append("abc").unwrap();
        let err = store.append("abcd").unwrap_err();
        assert_eq!(
            err,
            MemoryError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.dimension(), Some(3));
    }

    #[test]
    fn creation_order_is_chronological_even_if_clock_steps_back() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let (store, _) = store_with(ScriptedReasoner::new());
        let mut store = store.with_clock(clock.clone());

        store.append("first").unwrap();
        clock.set(start - Duration::minutes(5));
        store.append("second").unwrap();

        let records = store.records();
        assert!(records[1].created_at() >= records[0].created_at());
        assert_eq!(records[1].created_at(), records[1].last_accessed_at());
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let (mut store, _) = store_with(ScriptedReasoner::new());
        for d in ["a", "b", "c", "d"] {
            store.append(d).unwrap();
        }
        let recent: Vec<&str> = store.recent(2).iter().map(|r| r.description()).collect();
        assert_eq!(recent, vec!["c", "d"]);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn recent_larger_than_store_returns_everything_untouched() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let (store, _) = store_with(ScriptedReasoner::new());
        let mut store = store.with_clock(clock.clone());
        store.append("one").unwrap();
        clock.advance(Duration::minutes(1));
        store.append("two").unwrap();
        let before: Vec<_> = store.records().iter().map(|r| r.last_accessed_at()).collect();

        clock.advance(Duration::hours(1));
        let all = store.recent(100);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].description(), "one");
        assert_eq!(all[1].description(), "two");

        let after: Vec<_> = store.records().iter().map(|r| r.last_accessed_at()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn touch_never_moves_backwards() {
        let now = Utc::now();
        let mut record = MemoryRecord::new("x".into(), 1.0, vec![1.0], now);
        record.touch(now - Duration::hours(1));
        assert_eq!(record.last_accessed_at(), now);
        record.touch(now + Duration::hours(1));
        assert_eq!(record.last_accessed_at(), now + Duration::hours(1));
    }

    #[test]
    fn record_serializes_to_json() {
        let record = MemoryRecord::new("x".into(), 2.5, vec![0.5], Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["description"], "x");
        assert_eq!(json["importance"], 2.5);
    }
}
