//! `reverie-types` – shared vocabulary for the Reverie memory stack.
//!
//! Holds the contract every component uses to reach the reasoning/embedding
//! service ([`Reasoner`]), the chat message shapes sent across it, the
//! [`Clock`] the store reads time from, and the [`MemoryError`] taxonomy that
//! every core operation surfaces.
//!
//! Deterministic doubles for tests live in [`testing`].

pub mod testing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling temperature used by every core prompt.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

// ─────────────────────────────────────────────────────────────────────────────
// Chat messages
// ─────────────────────────────────────────────────────────────────────────────

/// The role of a participant in a single-turn completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reasoner contract
// ─────────────────────────────────────────────────────────────────────────────

/// Failure reported by a [`Reasoner`] implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReasonerError {
    /// The request never produced a usable reply (network, HTTP status, …).
    #[error("transport error: {0}")]
    Transport(String),
    /// A reply arrived but did not have the expected shape.
    #[error("unexpected response format: {0}")]
    BadResponse(String),
}

/// The remote text-completion and vector-embedding capability.
///
/// Both calls block until the service answers or fails. Implementations must
/// not retry on their own; every failure is handed straight back to the
/// caller.
pub trait Reasoner: Send + Sync {
    /// Single-turn completion of `messages` with `model`.
    fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ReasonerError>;

    /// Embed one text into a fixed-dimension vector with `model`.
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ReasonerError>;
}

/// Model names used for the two halves of the [`Reasoner`] contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub completion_model: String,
    pub embedding_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            completion_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Source of "now" for record timestamps and recency scoring.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error taxonomy
// ─────────────────────────────────────────────────────────────────────────────

/// The reflection step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionStage {
    /// Generating high-level questions from recent memories.
    Questions,
    /// Synthesising insights for one question.
    Insights,
}

impl std::fmt::Display for ReflectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReflectionStage::Questions => write!(f, "questions"),
            ReflectionStage::Insights => write!(f, "insights"),
        }
    }
}

/// Errors surfaced by store, retrieval and reflection operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("embedding request failed: {0}")]
    EmbeddingFailure(#[source] ReasonerError),

    #[error("importance rating request failed: {0}")]
    ImportanceRatingFailure(#[source] ReasonerError),

    #[error("importance rating is not a number in [0, 10]: {response:?}")]
    ImportanceParseFailure { response: String },

    #[error("completion failed while generating {stage}: {source}")]
    CompletionFailure {
        stage: ReflectionStage,
        #[source]
        source: ReasonerError,
    },

    #[error("reflection produced no {stage}")]
    EmptyReflectionResult { stage: ReflectionStage },

    #[error("embedding has {actual} dimensions, store holds {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn chat_message_constructors_set_role() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::user("u").content, "u");
    }

    #[test]
    fn default_models_are_set() {
        let models = ModelSettings::default();
        assert!(!models.completion_model.is_empty());
        assert!(!models.embedding_model.is_empty());
    }

    #[test]
    fn memory_error_display_names_the_step() {
        let err = MemoryError::CompletionFailure {
            stage: ReflectionStage::Insights,
            source: ReasonerError::Transport("connection refused".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("insights"));
        assert!(msg.contains("connection refused"));

        let err = MemoryError::ImportanceParseFailure {
            response: "very important".into(),
        };
        assert!(err.to_string().contains("very important"));

        let err = MemoryError::EmptyReflectionResult {
            stage: ReflectionStage::Questions,
        };
        assert_eq!(err.to_string(), "reflection produced no questions");
    }

    #[test]
    fn memory_error_exposes_source() {
        use std::error::Error as _;
        let err = MemoryError::EmbeddingFailure(ReasonerError::BadResponse("empty data".into()));
        let source = err.source().expect("source");
        assert!(source.to_string().contains("empty data"));
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
