//! Which source excerpt, if any, is currently expanded.
//!
//! Clicking a citation marker in the answer and clicking the matching entry in the
//! source list both go through [`Selection::toggle`], so the two views stay linked.

use crate::sources::SourceIndex;

/// The expanded citation number, or none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection(Option<usize>);

impl Selection {
    /// Nothing expanded.
    pub const NONE: Selection = Selection(None);

    /// Creates a selection of citation `number`.
    pub fn of(number: usize) -> Self {
        Self(Some(number))
    }

    /// Collapses `number` if it is expanded, otherwise expands it exclusively.
    ///
    /// # Examples
    ///
    /// ```
    /// use minirag::Selection;
    ///
    /// let open = Selection::NONE.toggle(2);
    /// assert_eq!(open, Selection::of(2));
    /// assert_eq!(open.toggle(3), Selection::of(3));
    /// assert_eq!(open.toggle(2), Selection::NONE);
    /// ```
    #[must_use]
    pub fn toggle(self, number: usize) -> Self {
        if self.0 == Some(number) {
            Self::NONE
        } else {
            Self::of(number)
        }
    }

    /// Returns the selected number only if it names an excerpt in `index`.
    pub fn resolve(self, index: &SourceIndex) -> Option<usize> {
        self.0.filter(|n| index.contains(*n))
    }
}
