//! Deterministic stand-ins for the [`Reasoner`] and [`Clock`] contracts.
//!
//! ```rust
//! use reverie_types::testing::ScriptedReasoner;
//! use reverie_types::{ChatMessage, Reasoner};
//!
//! let reasoner = ScriptedReasoner::new().with_completion(|_| Ok("7".to_string()));
//! let reply = reasoner.complete("m", &[ChatMessage::user("hi")], 1.0).unwrap();
//! assert_eq!(reply, "7");
//! assert_eq!(reasoner.completion_calls().len(), 1);
//! ```

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::{ChatMessage, Clock, Reasoner, ReasonerError};

type CompleteFn = dyn Fn(&[ChatMessage]) -> Result<String, ReasonerError> + Send + Sync;
type EmbedFn = dyn Fn(&str) -> Result<Vec<f32>, ReasonerError> + Send + Sync;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A 26-dimensional letter-frequency vector; stable, cheap and good enough
/// to make similar texts land near each other.
pub fn letter_histogram(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 26];
    for c in text.chars().filter(char::is_ascii_alphabetic) {
        v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    v
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptedReasoner
// ─────────────────────────────────────────────────────────────────────────────

/// A [`Reasoner`] whose replies come from closures, recording every call.
///
/// Defaults: every completion answers `"5"` and every embedding is the
/// [`letter_histogram`] of the text.
pub struct ScriptedReasoner {
    complete: Box<CompleteFn>,
    embed: Box<EmbedFn>,
    completions: Mutex<Vec<Vec<ChatMessage>>>,
    embedded: Mutex<Vec<String>>,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self {
            complete: Box::new(|_| Ok("5".to_string())),
            embed: Box::new(|text| Ok(letter_histogram(text))),
            completions: Mutex::new(Vec::new()),
            embedded: Mutex::new(Vec::new()),
        }
    }

    /// Replace the completion behaviour.
    pub fn with_completion<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String, ReasonerError> + Send + Sync + 'static,
    {
        self.complete = Box::new(f);
        self
    }

    /// Replace the embedding behaviour.
    pub fn with_embedding<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<f32>, ReasonerError> + Send + Sync + 'static,
    {
        self.embed = Box::new(f);
        self
    }

    /// Messages of every completion request, in call order.
    pub fn completion_calls(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.completions).clone()
    }

    /// Every text sent for embedding, in call order.
    pub fn embedded_texts(&self) -> Vec<String> {
        lock(&self.embedded).clone()
    }
}

impl Default for ScriptedReasoner {
    fn default() -> Self {
        Self::new()
    }
}

impl Reasoner for ScriptedReasoner {
    fn complete(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, ReasonerError> {
        lock(&self.completions).push(messages.to_vec());
        (self.complete)(messages)
    }

    fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, ReasonerError> {
        lock(&self.embedded).push(text.to_string());
        (self.embed)(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ManualClock
// ─────────────────────────────────────────────────────────────────────────────

/// A [`Clock`] that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_letters_case_insensitively() {
        let v = letter_histogram("Abba!");
        assert_eq!(v.len(), 26);
        assert_eq!(v[0], 2.0);
        assert_eq!(v[1], 2.0);
        assert_eq!(v.iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn scripted_reasoner_records_calls() {
        let r = ScriptedReasoner::new();
        r.embed("m", "hello").unwrap();
        r.complete("m", &[ChatMessage::user("rate")], 1.0).unwrap();
        assert_eq!(r.embedded_texts(), vec!["hello".to_string()]);
        assert_eq!(r.completion_calls()[0][0].content, "rate");
    }

    #[test]
    fn scripted_reasoner_propagates_errors() {
        let r = ScriptedReasoner::new()
            .with_embedding(|_| Err(ReasonerError::Transport("down".into())));
        assert!(r.embed("m", "x").is_err());
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
