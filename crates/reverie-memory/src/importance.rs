//! Importance rating.
//!
//! A new memory is rated on a 1–10 scale (mundane to poignant) by a single
//! completion. The reply is free text, so extracting the number is its own
//! step with its own failure ([`MemoryError::ImportanceParseFailure`]); a
//! reply that cannot be read as a rating never turns into a default score.

use reverie_types::{ChatMessage, DEFAULT_TEMPERATURE, MemoryError, Reasoner};
use tracing::debug;

/// Upper bound of the importance scale.
pub const MAX_IMPORTANCE: f32 = 10.0;

pub const IMPORTANCE_PROMPT: &str = "On a scale of 1 to 10, where 1 is mundane (e.g., brushing teeth) \
and 10 is poignant (e.g., a life-changing event), rate the importance of the given memory. \
Output a single number only, e.g., 7.5. Include no other comment or opinion.";

/// Ask `reasoner` to rate `description` and parse the reply.
///
/// # Errors
///
/// [`MemoryError::ImportanceRatingFailure`] if the completion call fails,
/// [`MemoryError::ImportanceParseFailure`] if the reply holds no usable
/// rating.
pub fn rate_importance(
    reasoner: &dyn Reasoner,
    model: &str,
    description: &str,
) -> Result<f32, MemoryError> {
    let messages = [
        ChatMessage::system(IMPORTANCE_PROMPT),
        ChatMessage::user(description),
    ];
    let reply = reasoner
        .complete(model, &messages, DEFAULT_TEMPERATURE)
        .map_err(MemoryError::ImportanceRatingFailure)?;
    let rating = parse_importance(&reply)?;
    debug!(rating, "rated memory importance");
    Ok(rating)
}

/// Extract a rating in `[0, 10]` from a model reply.
///
/// The whole trimmed reply is tried first. Failing that, the first word that
/// reads as a number once surrounding punctuation and sentence periods are
/// stripped (`"Rating: 7."`, `"I'd rate it 7.5."`). For `"8/10"` only the
/// numerator counts. Numbers that restate the scale are skipped: a number
/// followed by `to`, or preceded by `to` or `of` (`"On a scale of 1 to 10, 7"`
/// is 7, `"7 out of 10"` is 7).
pub fn parse_importance(response: &str) -> Result<f32, MemoryError> {
    let trimmed = response.trim();
    let value = trimmed
        .parse::<f32>()
        .ok()
        .or_else(|| first_rating_word(trimmed));

    match value {
        Some(v) if v.is_finite() && (0.0..=MAX_IMPORTANCE).contains(&v) => Ok(v),
        _ => Err(MemoryError::ImportanceParseFailure {
            response: response.to_string(),
        }),
    }
}

fn first_rating_word(text: &str) -> Option<f32> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_is = |i: usize, expected: &str| {
        words.get(i).is_some_and(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .eq_ignore_ascii_case(expected)
        })
    };

    words
        .iter()
        .enumerate()
        .filter(|&(i, _)| {
            let bounds_scale = word_is(i + 1, "to")
                || i.checked_sub(1)
                    .is_some_and(|p| word_is(p, "to") || word_is(p, "of"));
            !bounds_scale
        })
        .find_map(|(_, word)| number_in(word))
}

fn number_in(word: &str) -> Option<f32> {
    let numerator = word.split('/').next()?;
    numerator
        .trim_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .trim_end_matches('.')
        .parse::<f32>()
        .ok()
}
