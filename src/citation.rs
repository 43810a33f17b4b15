//! Splitting answers into plain text and inline citation markers.
//!
//! An answer such as `"It is blue [1]."` is turned into
//! `[Text("It is blue "), CitationRef(1), Text(".")]`. Only `[` + digits + `]` counts as
//! a marker. Anything else in brackets stays literal text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// One piece of a parsed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSegment {
    /// Literal answer text, never empty.
    Text(String),
    /// A 1-based reference to the n-th source excerpt, written `[n]` in the answer.
    CitationRef(usize),
}

impl AnswerSegment {
    /// Returns the citation number if this segment is a marker.
    pub fn citation(&self) -> Option<usize> {
        match self {
            Self::CitationRef(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for AnswerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(content) => f.write_str(content),
            Self::CitationRef(n) => write!(f, "[{n}]"),
        }
    }
}

/// `[` + a canonical positive integer + `]`.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([1-9][0-9]*)\]").expect("citation pattern is valid"));

/// Parses an answer into an ordered sequence of segments.
///
/// Total over arbitrary input. The empty string yields an empty sequence, and
/// [`render`] of the result always reproduces the input exactly.
///
/// Only canonical positive integers are markers. `[0]`, zero-padded numbers such as
/// `[007]` and numbers that overflow `u32` stay literal text, because rendering them
/// as a `CitationRef` would not give back the original bytes.
///
/// # Examples
///
/// ```
/// use minirag::citation::{AnswerSegment, parse};
///
/// let segments = parse("[12] is the answer");
/// assert_eq!(
///     segments,
///     vec![
///         AnswerSegment::CitationRef(12),
///         AnswerSegment::Text(" is the answer".to_string()),
///     ]
/// );
/// ```
pub fn parse(answer: &str) -> Vec<AnswerSegment> {
    let mut segments = Vec::new();
    let mut text_start = 0;

    for captures in MARKER.captures_iter(answer) {
        let (Some(marker), Some(digits)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let Ok(number) = digits.as_str().parse::<u32>() else {
            continue;
        };

        if text_start < marker.start() {
            segments.push(AnswerSegment::Text(
                answer[text_start..marker.start()].to_string(),
            ));
        }
        segments.push(AnswerSegment::CitationRef(number as usize));
        text_start = marker.end();
    }

    if text_start < answer.len() {
        segments.push(AnswerSegment::Text(answer[text_start..].to_string()));
    }

    segments
}

/// Joins segments back into answer text, writing each citation as `[n]`.
pub fn render(segments: &[AnswerSegment]) -> String {
    segments.iter().map(ToString::to_string).collect()
}
