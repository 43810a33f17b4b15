/// Title used when the backend sends a missing or blank title.
pub const DEFAULT_TITLE: &str = "Unknown";

/// Origin used when the backend omits provenance.
pub const DEFAULT_ORIGIN: &str = "Unknown";

/// A retrieved passage backing an answer.
///
/// Created fresh from every query response and never mutated afterwards.
/// The title is never empty and the relevance score is always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceExcerpt {
    title: String,
    origin: String,
    section: String,
    text: String,
    relevance_score: f64,
}

impl SourceExcerpt {
    /// Creates a new excerpt, applying the title fallback and clamping the score.
    pub fn new(
        title: impl Into<String>,
        origin: impl Into<String>,
        section: impl Into<String>,
        text: impl Into<String>,
        relevance_score: f64,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };

        Self {
            title,
            origin: origin.into(),
            section: section.into(),
            text: text.into(),
            relevance_score: clamp_score(relevance_score),
        }
    }

    /// Returns the document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the provenance identifier (e.g. a filename or `"user_input"`).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the structural label, empty when the chunk has none.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Returns the excerpt body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the relevance score (0.0-1.0).
    pub fn relevance_score(&self) -> f64 {
        self.relevance_score
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Builder for `SourceExcerpt` with the backend's fallbacks for every field.
///
/// # Examples
///
/// ```
/// use minirag::SourceExcerptBuilder;
///
/// let excerpt = SourceExcerptBuilder::new()
///     .title("Notes")
///     .text("The sky is blue.")
///     .relevance_score(0.92)
///     .build();
///
/// assert_eq!(excerpt.title(), "Notes");
/// assert_eq!(excerpt.origin(), "Unknown");
/// assert_eq!(excerpt.section(), "");
/// ```
#[derive(Debug, Default)]
pub struct SourceExcerptBuilder {
    title: Option<String>,
    origin: Option<String>,
    section: Option<String>,
    text: Option<String>,
    relevance_score: Option<f64>,
}

impl SourceExcerptBuilder {
    /// Creates a new `SourceExcerptBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the provenance identifier.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the section label.
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Sets the excerpt body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the relevance score.
    pub fn relevance_score(mut self, score: f64) -> Self {
        self.relevance_score = Some(score);
        self
    }

    /// Builds the `SourceExcerpt`, using fallbacks for unset fields.
    pub fn build(self) -> SourceExcerpt {
        SourceExcerpt::new(
            self.title.unwrap_or_default(),
            self.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            self.section.unwrap_or_default(),
            self.text.unwrap_or_default(),
            self.relevance_score.unwrap_or(0.0),
        )
    }
}
