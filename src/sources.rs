//! Positional lookup from citation number to source excerpt.

use crate::models::SourceExcerpt;

/// Maps citation `n` to the `n`-th excerpt of a query result (1-based).
///
/// Rebuilt from scratch for every new result, never updated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceIndex {
    entries: Vec<SourceExcerpt>,
}

impl SourceIndex {
    /// Builds the index from the response's source list, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use minirag::{SourceExcerptBuilder, SourceIndex};
    ///
    /// let index = SourceIndex::from_sources(vec![
    ///     SourceExcerptBuilder::new().title("A").build(),
    ///     SourceExcerptBuilder::new().title("B").build(),
    /// ]);
    /// assert_eq!(index.get(2).map(|s| s.title()), Some("B"));
    /// assert!(index.get(0).is_none());
    /// ```
    pub fn from_sources(sources: Vec<SourceExcerpt>) -> Self {
        Self { entries: sources }
    }

    /// Returns the excerpt for citation `number`, or `None` when out of range.
    pub fn get(&self, number: usize) -> Option<&SourceExcerpt> {
        number.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Returns true if `number` refers to an excerpt in this index.
    pub fn contains(&self, number: usize) -> bool {
        self.get(number).is_some()
    }

    /// Returns the number of excerpts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no excerpts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(citation number, excerpt)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SourceExcerpt)> {
        self.entries.iter().enumerate().map(|(i, s)| (i + 1, s))
    }
}
