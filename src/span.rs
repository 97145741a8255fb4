//! Wrapper module for [`IndexSpan`], the half-open range used to scope recursive operations
//!
//! Public methods on [`Vector`] and [`Builder`] accept any of the standard library's range types.
//! Those are validated exactly once, at the top of the call, and converted into an `IndexSpan`.
//! From then on, each level of the recursion maps the span into its children's local coordinates
//! with [`IndexSpan::localize`] -- without re-checking bounds at every level.
//!
//! [`Vector`]: crate::Vector
//! [`Builder`]: crate::Builder

#[cfg(feature = "fuzz")]
use arbitrary::Arbitrary;
use std::ops::{Bound, Range, RangeBounds};

use crate::{Error, Result};

/// A half-open range of indexes: `start .. start + count`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fuzz", derive(Arbitrary))]
pub struct IndexSpan {
    start: usize,
    count: usize,
}

impl IndexSpan {
    /// Creates a new span covering `count` indexes, starting at `start`
    pub const fn new(start: usize, count: usize) -> Self {
        IndexSpan { start, count }
    }

    /// Returns the first index in the span
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Returns the number of indexes in the span
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Returns the index one past the end of the span
    pub const fn end_exclusive(&self) -> usize {
        self.start + self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` if `idx` is within the span
    pub const fn contains(&self, idx: usize) -> bool {
        self.start <= idx && idx < self.end_exclusive()
    }

    pub fn to_range(self) -> Range<usize> {
        self.start..self.end_exclusive()
    }

    /// Returns the span, shifted towards zero by `base`
    ///
    /// ## Panics
    ///
    /// This method panics if `base` is greater than the start of the span.
    pub fn offset_by(self, base: usize) -> Self {
        assert!(base <= self.start, "cannot offset span {self:?} by {base}");
        IndexSpan::new(self.start - base, self.count)
    }

    /// Returns the overlap between the two spans, if they overlap at all
    pub fn intersect(self, other: IndexSpan) -> Option<IndexSpan> {
        let start = self.start.max(other.start);
        let end = self.end_exclusive().min(other.end_exclusive());
        (start < end).then(|| IndexSpan::new(start, end - start))
    }

    /// Maps the span onto the local coordinates of a child node that starts at `child_start` and
    /// contains `child_count` values
    ///
    /// Returns `None` if the span doesn't touch the child at all.
    pub fn localize(self, child_start: usize, child_count: usize) -> Option<IndexSpan> {
        self.intersect(IndexSpan::new(child_start, child_count))
            .map(|s| s.offset_by(child_start))
    }

    /// Resolves any standard range type against a sequence of length `len`, checking that it's
    /// in bounds
    pub(crate) fn from_bounds(range: impl RangeBounds<usize>, len: usize) -> Result<Self> {
        let start = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&i) => i.saturating_add(1),
            Bound::Excluded(&i) => i,
            Bound::Unbounded => len,
        };

        if start > end || end > len {
            return Err(Error::RangeOutOfBounds { start, end, len });
        }

        Ok(IndexSpan::new(start, end - start))
    }
}

impl From<Range<usize>> for IndexSpan {
    fn from(range: Range<usize>) -> Self {
        IndexSpan::new(range.start, range.end.saturating_sub(range.start))
    }
}

#[cfg(test)]
mod tests {
    use super::IndexSpan;
    use crate::Error;

    #[test]
    fn localize_maps_into_child() {
        let span = IndexSpan::new(5, 10);
        // child covering 8..16
        assert_eq!(span.localize(8, 8), Some(IndexSpan::new(0, 7)));
        // child covering 0..8
        assert_eq!(span.localize(0, 8), Some(IndexSpan::new(5, 3)));
        // child covering 15..20, just past the end
        assert_eq!(span.localize(15, 5), None);
    }

    #[test]
    fn bounds_are_validated() {
        assert_eq!(IndexSpan::from_bounds(.., 4), Ok(IndexSpan::new(0, 4)));
        assert_eq!(IndexSpan::from_bounds(1..=2, 4), Ok(IndexSpan::new(1, 2)));
        assert_eq!(IndexSpan::from_bounds(4.., 4), Ok(IndexSpan::new(4, 0)));
        assert_eq!(
            IndexSpan::from_bounds(2..5, 4),
            Err(Error::RangeOutOfBounds { start: 2, end: 5, len: 4 })
        );
        assert!(IndexSpan::from_bounds(3..2, 4).is_err());
        assert!(IndexSpan::from_bounds(usize::MAX.., 4).is_err());
        assert!(IndexSpan::from_bounds(..=usize::MAX, 4).is_err());
    }
}
