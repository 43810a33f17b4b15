//! Renderable view of a session: the answer with citation badges, the numbered source
//! cards, the query metrics and the upload summary.
//!
//! Views borrow from the [`Session`] and carry already-formatted text, so the terminal
//! UI and the one-shot commands print the same strings.

use std::fmt;

use crate::citation::AnswerSegment;
use crate::models::{QueryResult, UploadResult};
use crate::session::Session;

/// One piece of the rendered answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPiece<'a> {
    /// Plain answer text.
    Text(&'a str),
    /// A citation marker. `linked` is false when no excerpt has this number.
    Badge {
        number: usize,
        linked: bool,
        active: bool,
    },
}

/// One entry of the numbered source list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCard<'a> {
    pub number: usize,
    pub title: &'a str,
    pub origin: &'a str,
    /// Present only when the excerpt has a structural label.
    pub section: Option<&'a str>,
    /// Relevance as a percentage, e.g. `"92.0%"`.
    pub relevance: String,
    pub expanded: bool,
    /// Excerpt body, present only while expanded.
    pub text: Option<&'a str>,
}

/// Formatted timing, token and cost figures of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetrics {
    pub elapsed: String,
    pub tokens: String,
    pub cost: String,
}

impl QueryMetrics {
    pub fn from_result(result: &QueryResult) -> Self {
        Self {
            elapsed: format!("{:.0}ms", result.elapsed_ms()),
            tokens: format!("{} tokens", group_thousands(result.total_tokens())),
            cost: format!("${:.6}", result.estimated_cost_usd()),
        }
    }
}

impl fmt::Display for QueryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.elapsed, self.tokens, self.cost)
    }
}

/// Formatted outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub chunks: String,
    pub tokens: String,
}

impl UploadSummary {
    pub fn from_result(result: &UploadResult) -> Self {
        Self {
            chunks: group_thousands(result.chunks_created()),
            tokens: group_thousands(result.total_tokens()),
        }
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Upload successful: {} chunks created, {} total tokens",
            self.chunks, self.tokens
        )
    }
}

/// Everything needed to draw a successful query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView<'a> {
    pub pieces: Vec<AnswerPiece<'a>>,
    pub sources: Vec<SourceCard<'a>>,
    pub metrics: QueryMetrics,
}

impl<'a> AnswerView<'a> {
    /// Assembles the view of the current answer, or `None` when there is no answer.
    pub fn from_session(session: &'a Session) -> Option<Self> {
        let result = session.query_result()?;
        let sources = session.sources();
        let selected = session.selection();

        let pieces = session
            .answer_segments()
            .iter()
            .map(|segment| match segment {
                AnswerSegment::Text(text) => AnswerPiece::Text(text.as_str()),
                AnswerSegment::CitationRef(number) => AnswerPiece::Badge {
                    number: *number,
                    linked: sources.contains(*number),
                    active: selected == Some(*number),
                },
            })
            .collect();

        let sources = sources
            .iter()
            .map(|(number, excerpt)| {
                let expanded = selected == Some(number);
                let section = excerpt.section();
                SourceCard {
                    number,
                    title: excerpt.title(),
                    origin: excerpt.origin(),
                    section: (!section.is_empty()).then_some(section),
                    relevance: format_relevance(excerpt.relevance_score()),
                    expanded,
                    text: expanded.then(|| excerpt.text()),
                }
            })
            .collect();

        Some(Self {
            pieces,
            sources,
            metrics: QueryMetrics::from_result(result),
        })
    }

    /// Returns true if the source panel should be drawn at all.
    pub fn shows_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Returns the numbers of badges that link to an excerpt, in answer order.
    pub fn linked_badges(&self) -> Vec<usize> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                AnswerPiece::Badge {
                    number,
                    linked: true,
                    ..
                } => Some(*number),
                _ => None,
            })
            .collect()
    }
}

/// Formats a relevance score in `[0, 1]` as a percentage with one decimal.
pub fn format_relevance(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Formats an integer with comma thousands separators.
///
/// # Examples
///
/// ```
/// use minirag::presentation::group_thousands;
///
/// assert_eq!(group_thousands(999), "999");
/// assert_eq!(group_thousands(1234567), "1,234,567");
/// ```
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
