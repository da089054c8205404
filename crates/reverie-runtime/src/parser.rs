//! Tolerant list extraction from free-form model output.
//!
//! Models asked for "3 questions" or "5 insights" answer with numbered lines,
//! bullets, blank lines and trailing citations in no fixed layout.
//! [`parse_list`] turns such a reply into a plain list of items and never
//! fails: input with nothing usable yields an empty list, and it is up to
//! the caller to decide whether that is an error.
//!
//! Per line:
//!
//! 1. Trim; skip blank lines.
//! 2. Strip one leading enumeration marker (`1. `, `2) `, `10. `) or bullet
//!    (`- `, `* `, `• `).
//! 3. [`ListMode::Insights`] only: cut at the first `(` to drop citations
//!    such as `(because of statements 1, 2)`.
//! 4. Trim again; skip the line if nothing is left.
//!
//! ```rust
//! use reverie_runtime::parser::{ListMode, parse_list};
//!
//! let reply = "1. Insight text (because of statements 1, 2)\n\n2) Another one";
//! assert_eq!(
//!     parse_list(reply, ListMode::Insights),
//!     vec!["Insight text".to_string(), "Another one".to_string()],
//! );
//! ```

/// Which kind of list is being extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Questions,
    /// Like [`ListMode::Questions`], and drops everything from the first `(`.
    Insights,
}

const BULLETS: [&str; 3] = ["- ", "* ", "• "];

/// Extract one item per non-blank line of `text`.
pub fn parse_list(text: &str, mode: ListMode) -> Vec<String> {
    text.lines().filter_map(|line| parse_line(line, mode)).collect()
}

fn parse_line(line: &str, mode: ListMode) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut item = strip_marker(line);
    if mode == ListMode::Insights
        && let Some(idx) = item.find('(')
    {
        item = &item[..idx];
    }

    let item = item.trim();
    (!item.is_empty()).then(|| item.to_string())
}

/// Remove a leading `<digits>('.'|')')` marker followed by whitespace or the
/// end of the line, or a bullet.
fn strip_marker(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        return match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            Some(after) if after.is_empty() || after.starts_with(char::is_whitespace) => {
                after.trim_start()
            }
            _ => line,
        };
    }

    BULLETS
        .iter()
        .find_map(|bullet| line.strip_prefix(*bullet))
        .map_or(line, str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_marker_is_stripped() {
        assert_eq!(
            parse_list("1. Hello world", ListMode::Questions),
            vec!["Hello world"]
        );
    }

    #[test]
    fn insight_marker_and_citation_are_stripped() {
        assert_eq!(
            parse_list(
                "2) Insight text (because of statements 1, 2)",
                ListMode::Insights
            ),
            vec!["Insight text"]
        );
    }

    #[test]
    fn blank_input_yields_nothing_in_either_mode() {
        for text in ["", "   ", "\n\n  \t\n"] {
            assert!(parse_list(text, ListMode::Questions).is_empty());
            assert!(parse_list(text, ListMode::Insights).is_empty());
        }
    }

    #[test]
    fn questions_keep_parentheses() {
        assert_eq!(
            parse_list("3. What does Klaus (the student) study?", ListMode::Questions),
            vec!["What does Klaus (the student) study?"]
        );
    }

    #[test]
    fn unnumbered_and_blank_lines_are_handled() {
        let reply = "\n  What is Maria passionate about?  \r\n\r\n2. Who does Klaus spend time with?\n";
        assert_eq!(
            parse_list(reply, ListMode::Questions),
            vec![
                "What is Maria passionate about?",
                "Who does Klaus spend time with?"
            ]
        );
    }

    #[test]
    fn multi_digit_markers_and_bullets_are_stripped() {
        let reply = "10. tenth\n- dashed\n* starred\n• dotted";
        assert_eq!(
            parse_list(reply, ListMode::Questions),
            vec!["tenth", "dashed", "starred", "dotted"]
        );
    }

    #[test]
    fn marker_requires_trailing_whitespace() {
        assert_eq!(parse_list("3.5 hours of sleep", ListMode::Questions), vec!["3.5 hours of sleep"]);
        assert_eq!(parse_list("1.Hello", ListMode::Questions), vec!["1.Hello"]);
    }

    #[test]
    fn bare_markers_are_dropped() {
        let reply = "1. First question?\n2.\n3)\n4. Last question?";
        assert_eq!(
            parse_list(reply, ListMode::Questions),
            vec!["First question?", "Last question?"]
        );
        assert!(parse_list("5.", ListMode::Insights).is_empty());
    }

    #[test]
    fn citation_only_lines_are_dropped() {
        assert!(parse_list("4. (because of statements 3)", ListMode::Insights).is_empty());
    }

    #[test]
    fn insight_without_citation_is_kept_whole() {
        assert_eq!(
            parse_list("Klaus is dedicated to his research", ListMode::Insights),
            vec!["Klaus is dedicated to his research"]
        );
    }
}
