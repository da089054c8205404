//! [`Reflector`] – turns recent memories into higher-level insights.
//!
//! One reflection pass:
//!
//! 1. **Questions** – the descriptions of the supplied recent memories are
//!    sent as one prompt asking for the 3 most salient high-level questions.
//!    No parseable question ends the pass with
//!    [`MemoryError::EmptyReflectionResult`].
//! 2. **Collect** – for each question in order, the store is searched for
//!    supporting memories and the model is asked for 5 insights citing the
//!    numbered statements. Nothing is written in this step.
//! 3. **Commit** – every insight of that question is appended to the store
//!    (embedded and rated like any other memory) before the next question
//!    is collected.
//!
//! Retrieval during a pass only ranks the records that existed when the pass
//! started, so insights written for an earlier question never feed back into
//! a later one.
//!
//! # Failure policy
//!
//! The first error ends the pass. Insights already committed stay in the
//! store; nothing is rolled back and nothing is retried.

use std::sync::Arc;

use reverie_memory::{MemoryRecord, MemoryStore, RetrievedMemory};
use reverie_types::{
    ChatMessage, DEFAULT_TEMPERATURE, MemoryError, ModelSettings, Reasoner, ReflectionStage,
};
use tracing::{debug, info, instrument, warn};

use crate::parser::{ListMode, parse_list};

/// Number of most recent memories reflected on when the caller does not
/// choose a window.
pub const DEFAULT_REFLECTION_WINDOW: usize = 100;

pub const QUESTIONS_PROMPT: &str = "Given only the information provided below, what are the 3 most \
salient high-level questions we can answer about the subjects in the statements? \
List one question per line.";

pub const INSIGHTS_PROMPT: &str = "What 5 high-level insights can you infer from the given \
statements? List one insight per line. (example format: Insight (because of statements 1, 2, 3))";

/// Outcome of a completed reflection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionReport {
    /// Questions generated in step 1, in the order they were processed.
    pub questions: Vec<String>,
    /// Insights appended to the store, in commit order.
    pub insights: Vec<String>,
}

/// Drives reflection passes against a [`MemoryStore`].
pub struct Reflector {
    reasoner: Arc<dyn Reasoner>,
    models: ModelSettings,
}

impl Reflector {
    pub fn new(reasoner: Arc<dyn Reasoner>, models: ModelSettings) -> Self {
        Self { reasoner, models }
    }

    /// Reflect on the `window` most recent memories of `store`.
    pub fn reflect_recent(
        &self,
        store: &mut MemoryStore,
        window: usize,
    ) -> Result<ReflectionReport, MemoryError> {
        let recent = store.recent(window).to_vec();
        self.reflect(&recent, store)
    }

    /// Run one reflection pass over `recent`, writing insights into `store`.
    ///
    /// A question whose insight reply parses to an empty list is not an
    /// error: it is logged at `warn`, contributes nothing, and the pass moves
    /// on to the next question. Only an empty question list is reported as
    /// [`MemoryError::EmptyReflectionResult`].
    ///
    /// # Errors
    ///
    /// * [`MemoryError::CompletionFailure`] – the question or insight
    ///   completion failed; `stage` says which.
    /// * [`MemoryError::EmptyReflectionResult`] – no question could be parsed.
    /// * Any error of [`MemoryStore::retrieve_within`] or
    ///   [`MemoryStore::append`].
    ///
    /// Insights appended before the error remain in the store.
    #[instrument(skip_all, fields(recent = recent.len(), store_len = store.len()))]
    pub fn reflect(
        &self,
        recent: &[MemoryRecord],
        store: &mut MemoryStore,
    ) -> Result<ReflectionReport, MemoryError> {
        let statements: Vec<&str> = recent.iter().map(MemoryRecord::description).collect();
        let questions = self.generate_questions(&statements)?;
        if questions.is_empty() {
            return Err(MemoryError::EmptyReflectionResult {
                stage: ReflectionStage::Questions,
            });
        }
        info!(count = questions.len(), "reflection questions generated");

        let baseline = store.len();
        let mut committed = Vec::new();
        for question in &questions {
            let evidence = store.retrieve_within(question, baseline)?;
            let insights = self.generate_insights(question, &evidence)?;
            if insights.is_empty() {
                warn!(question = %question, "no insights parsed; skipping question");
                continue;
            }

            for insight in insights {
                store.append(insight.as_str())?;
                committed.push(insight);
            }
            debug!(question = %question, committed = committed.len(), "question committed");
        }

        info!(insights = committed.len(), "reflection pass complete");
        Ok(ReflectionReport {
            questions,
            insights: committed,
        })
    }

    fn generate_questions(&self, statements: &[&str]) -> Result<Vec<String>, MemoryError> {
        let messages = [
            ChatMessage::system(QUESTIONS_PROMPT),
            ChatMessage::user(statements.join("\n")),
        ];
        let reply = self
            .reasoner
            .complete(&self.models.completion_model, &messages, DEFAULT_TEMPERATURE)
            .map_err(|source| MemoryError::CompletionFailure {
                stage: ReflectionStage::Questions,
                source,
            })?;
        Ok(parse_list(&reply, ListMode::Questions))
    }

    fn generate_insights(
        &self,
        question: &str,
        evidence: &[RetrievedMemory],
    ) -> Result<Vec<String>, MemoryError> {
        let numbered: Vec<String> = evidence
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {}", i + 1, m.record.description()))
            .collect();
        let messages = [
            ChatMessage::system(INSIGHTS_PROMPT),
            ChatMessage::user(format!(
                "Statements about the question \"{question}\":\n{}",
                numbered.join("\n")
            )),
        ];
        let reply = self
            .reasoner
            .complete(&self.models.completion_model, &messages, DEFAULT_TEMPERATURE)
            .map_err(|source| MemoryError::CompletionFailure {
                stage: ReflectionStage::Insights,
                source,
            })?;
        Ok(parse_list(&reply, ListMode::Insights))
    }
}
