use super::SourceExcerpt;

/// An answer with the excerpts it cites and the backend's cost metrics.
///
/// Immutable once received. The n-th entry of `sources` is citation `[n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    answer: String,
    sources: Vec<SourceExcerpt>,
    elapsed_ms: f64,
    total_tokens: u64,
    estimated_cost_usd: f64,
}

impl QueryResult {
    /// Creates a new query result. Negative timings and costs are clamped to zero.
    pub fn new(
        answer: impl Into<String>,
        sources: Vec<SourceExcerpt>,
        elapsed_ms: f64,
        total_tokens: u64,
        estimated_cost_usd: f64,
    ) -> Self {
        Self {
            answer: answer.into(),
            sources,
            elapsed_ms: elapsed_ms.max(0.0),
            total_tokens,
            estimated_cost_usd: estimated_cost_usd.max(0.0),
        }
    }

    /// Returns the raw answer text, citation markers included.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns the source excerpts in citation order.
    pub fn sources(&self) -> &[SourceExcerpt] {
        &self.sources
    }

    /// Returns the backend-reported processing time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Returns the tokens spent on the query and the answer.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Returns the backend's cost estimate in US dollars.
    pub fn estimated_cost_usd(&self) -> f64 {
        self.estimated_cost_usd
    }
}
