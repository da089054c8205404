//! `reverie-memory` – The Memory Stream.
//!
//! An agent's unbounded, append-only log of observations and insights, with
//! ranked semantic recall.
//!
//! # Modules
//!
//! - [`stream`] – [`MemoryStore`][stream::MemoryStore] and
//!   [`MemoryRecord`][stream::MemoryRecord]: the log itself. Appending a
//!   memory embeds it and has it rated for importance, all or nothing.
//! - [`importance`] – the rating prompt and the tolerant parse of its
//!   free-text reply.
//! - [`scoring`] – cosine relevance, one-day exponential recency decay and
//!   normalised importance, summed into a retrieval score.
//! - [`retrieval`] – [`RetrievedMemory`][retrieval::RetrievedMemory] and the
//!   `retrieve*` methods on the store, which rank records and mark every
//!   scanned record as accessed.

pub mod importance;
pub mod retrieval;
pub mod scoring;
pub mod stream;

pub use retrieval::RetrievedMemory;
pub use scoring::{cosine_similarity, score};
pub use stream::{MemoryRecord, MemoryStore};
