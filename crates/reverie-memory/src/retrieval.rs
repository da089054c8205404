//! Ranked retrieval over the memory stream.
//!
//! A retrieval embeds the query once, captures a single `now`, scores every
//! scanned record with [`score`], marks each scanned record as accessed at
//! that `now`, and returns the full ranking (highest score first, ties in
//! insertion order). Every scanned record is touched, not only the ones a
//! caller goes on to use.

use reverie_types::MemoryError;
use tracing::debug;

use crate::scoring::score;
use crate::stream::{MemoryRecord, MemoryStore};

/// One record paired with its score for a single retrieval call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedMemory {
    /// Position of the record in the store.
    pub index: usize,
    /// The record as it was when scored (before its access time moved).
    pub record: MemoryRecord,
    pub score: f32,
}

impl MemoryStore {
    /// Rank every record in the store against `query`.
    ///
    /// An empty store yields an empty ranking, but the query is still
    /// embedded so an embedding failure still surfaces.
    ///
    /// # Errors
    ///
    /// [`MemoryError::EmbeddingFailure`] if the query cannot be embedded,
    /// [`MemoryError::DimensionMismatch`] if its embedding does not match the
    /// stored records. No access time changes on error.
    pub fn retrieve(&mut self, query: &str) -> Result<Vec<RetrievedMemory>, MemoryError> {
        let end = self.len();
        self.retrieve_within(query, end)
    }

    /// [`retrieve`](Self::retrieve), keeping only the first `k` results.
    ///
    /// Every record is still scanned and touched.
    pub fn retrieve_top(
        &mut self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedMemory>, MemoryError> {
        let mut ranked = self.retrieve(query)?;
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Rank only the records at positions `0..end` against `query`.
    ///
    /// Records at or past `end` are neither scored nor touched. `end` is
    /// clamped to the store length.
    pub fn retrieve_within(
        &mut self,
        query: &str,
        end: usize,
    ) -> Result<Vec<RetrievedMemory>, MemoryError> {
        let query_embedding = self.embed(query)?;
        let end = end.min(self.len());
        if end == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(&query_embedding)?;

        let now = self.now();
        let mut ranked: Vec<RetrievedMemory> = self.records_mut()[..end]
            .iter_mut()
            .enumerate()
            .map(|(index, record)| {
                let retrieved = RetrievedMemory {
                    index,
                    record: record.clone(),
                    score: score(&query_embedding, record, now),
                };
                record.touch(now);
                retrieved
            })
            .collect();

        // `sort_by` is stable: equal scores keep insertion order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            scanned = end,
            top_score = ranked.first().map(|r| r.score),
            "retrieved memories"
        );
        Ok(ranked)
    }
}
