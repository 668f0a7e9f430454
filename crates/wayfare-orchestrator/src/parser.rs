//! Tag parsing for tagged recommendation streams.
//!
//! A tagged body interleaves `<reasoning>…</reasoning>` and
//! `<response>…</response>` spans with free text. The parser is re-run over
//! the whole buffer after every fragment, so a marker split across two
//! fragments is simply not recognized until its closing half arrives. Until
//! then its raw characters, markers included, stay in `visible`. That lag is
//! accepted; nothing is ever corrupted by it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opening marker of a reasoning span.
pub const REASONING_OPEN: &str = "<reasoning>";

static REASONING_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<reasoning>(.*?)</reasoning>").expect("valid reasoning pattern"));

static RESPONSE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<response>(.*?)</response>").expect("valid response pattern"));

static REASONING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?reasoning>").expect("valid reasoning marker pattern"));

static RESPONSE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?response>").expect("valid response marker pattern"));

/// The display-ready split of a tagged buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedView {
    /// Inner text of every closed reasoning span, in order, with any
    /// markers nested inside a span removed.
    pub reasoning: String,
    /// Inner text of every closed response span, or the buffer minus closed
    /// reasoning spans when no response span has closed yet.
    pub visible: String,
    #[serde(default)]
    open_reasoning: bool,
}

impl ParsedView {
    /// Whether the buffer holds a reasoning marker that never closed.
    ///
    /// Markers quoted inside a closed response span do not count.
    pub const fn has_open_reasoning(&self) -> bool {
        self.open_reasoning
    }
}

/// Derives a [`ParsedView`] from the full text received so far.
///
/// Stateless: the output depends only on the buffer passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagStreamParser;

impl TagStreamParser {
    /// Creates a parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Recomputes the view for `raw`.
    pub fn update(&self, raw: &str) -> ParsedView {
        let reasoning = inner_texts(&REASONING_SPAN, &REASONING_MARKER, raw);
        let without_reasoning = REASONING_SPAN.replace_all(raw, "");
        let open_reasoning = RESPONSE_SPAN.replace_all(&without_reasoning, "").contains(REASONING_OPEN);

        let visible = if RESPONSE_SPAN.is_match(raw) {
            inner_texts(&RESPONSE_SPAN, &RESPONSE_MARKER, raw)
        } else {
            without_reasoning.into_owned()
        };

        ParsedView { reasoning, visible, open_reasoning }
    }
}

fn inner_texts(span: &Regex, marker: &Regex, raw: &str) -> String {
    span.captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| marker.replace_all(m.as_str(), ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedView {
        TagStreamParser::new().update(raw)
    }

    #[test]
    fn test_reasoning_and_response() {
        let view = parse("<reasoning>Hi</reasoning><response>Stay at X</response>");
        assert_eq!(view.reasoning, "Hi");
        assert_eq!(view.visible, "Stay at X");
    }

    #[test]
    fn test_unterminated_reasoning_leaks_literal_text() {
        let view = parse("<reasoning>Thinking");
        assert_eq!(view.reasoning, "");
        assert_eq!(view.visible, "<reasoning>Thinking");
        assert!(view.has_open_reasoning());
    }

    #[test]
    fn test_no_tags_passes_through() {
        let view = parse("Hotel Lutetia is central.");
        assert_eq!(view.reasoning, "");
        assert_eq!(view.visible, "Hotel Lutetia is central.");
    }

    #[test]
    fn test_closed_reasoning_removed_without_response() {
        let view = parse("Intro <reasoning>budget is tight</reasoning>Try a hostel");
        assert_eq!(view.reasoning, "budget is tight");
        assert_eq!(view.visible, "Intro Try a hostel");
        assert!(!view.has_open_reasoning());
    }

    #[test]
    fn test_multiple_spans_concatenate_in_order() {
        let raw = "<reasoning>a</reasoning><response>1</response>\
                   <reasoning>b</reasoning>junk<response>2</response>";
        let view = parse(raw);
        assert_eq!(view.reasoning, "ab");
        assert_eq!(view.visible, "12");
    }

    #[test]
    fn test_spans_cross_newlines() {
        let view = parse("<reasoning>line one\nline two</reasoning><response>- A\n- B\n</response>");
        assert_eq!(view.reasoning, "line one\nline two");
        assert_eq!(view.visible, "- A\n- B\n");
    }

    #[test]
    fn test_open_response_shows_raw_remainder() {
        let view = parse("<reasoning>r</reasoning><response>Stay at");
        assert_eq!(view.reasoning, "r");
        assert_eq!(view.visible, "<response>Stay at");
    }

    #[test]
    fn test_partial_closing_marker_not_recognized() {
        let view = parse("<reasoning>Hi</reason");
        assert_eq!(view.reasoning, "");
        assert_eq!(view.visible, "<reasoning>Hi</reason");

        let view = parse("<reasoning>Hi</reasoning>");
        assert_eq!(view.reasoning, "Hi");
        assert_eq!(view.visible, "");
    }

    #[test]
    fn test_open_reasoning_after_closed_response() {
        let view = parse("<response>Stay at X</response><reasoning>also consider");
        assert_eq!(view.visible, "Stay at X");
        assert!(view.has_open_reasoning());
    }

    #[test]
    fn test_marker_quoted_in_response_is_not_open_reasoning() {
        let view = parse("<response>Wrap notes in <reasoning> tags</response>");
        assert_eq!(view.visible, "Wrap notes in <reasoning> tags");
        assert!(!view.has_open_reasoning());
    }

    #[test]
    fn test_nested_markers_stripped_from_inner_text() {
        let view = parse("<reasoning>a<reasoning>b</reasoning><response>x<response>y</response>");
        assert_eq!(view.reasoning, "ab");
        assert_eq!(view.visible, "xy");
        assert!(!view.has_open_reasoning());
    }

    #[test]
    fn test_update_is_idempotent() {
        let parser = TagStreamParser::new();
        let raw = "<reasoning>x</reasoning>tail<response>y";
        assert_eq!(parser.update(raw), parser.update(raw));
    }

    #[test]
    fn test_reasoning_only_grows_across_prefixes() {
        let raw = "<reasoning>Near the Louvre</reasoning><response>Stay at Hôtel X</response>";
        let parser = TagStreamParser::new();
        let full = parser.update(raw);

        let mut previous = String::new();
        for (idx, _) in raw.char_indices() {
            let view = parser.update(&raw[..idx]);
            assert!(full.reasoning.starts_with(&view.reasoning), "prefix ending at {idx}");
            assert!(view.reasoning.len() >= previous.len());
            previous = view.reasoning;
        }
        assert_eq!(full.visible, "Stay at Hôtel X");
    }
}
