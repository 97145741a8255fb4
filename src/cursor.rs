//! Wrapper module for [`Cursor`], the fail-fast enumerator over a [`Builder`]

use std::fmt::{self, Debug, Formatter};

use crate::tree::LeafRef;
use crate::{Builder, Error, Result};

/// A forward-only position in a [`Builder`], which detects if the builder is modified
///
/// A `Cursor` doesn't borrow the builder it was created from -- that's passed in on each call to
/// [`next`] instead -- so the builder can be modified while the cursor is still around. The
/// cursor records the builder's [`version`] when it's created; once the builder has changed,
/// every further call to `next` returns [`Error::VersionMismatch`]. To start over, create a new
/// cursor with [`Builder::cursor`].
///
/// The cursor caches the leaf it's currently in, so stepping through the builder only needs to
/// go back to the root once per leaf.
///
/// A cursor should only ever be used with the builder that created it. Using it with a different
/// builder that happens to have the same version produces unspecified (but safe) results.
///
/// ## Examples
///
/// ```
/// use bristlecone::{Builder, Error};
///
/// let mut builder: Builder<i32> = (0..3).collect::<bristlecone::Vector<_>>().to_builder();
/// let mut cursor = builder.cursor();
///
/// assert_eq!(cursor.next(&builder), Ok(Some(&0)));
/// assert_eq!(cursor.next(&builder), Ok(Some(&1)));
///
/// builder.push(3);
/// assert!(matches!(cursor.next(&builder), Err(Error::VersionMismatch { .. })));
/// ```
///
/// [`next`]: Self::next
/// [`version`]: Builder::version
pub struct Cursor<T> {
    version: u64,
    /// The absolute index of the next value to yield
    index: usize,
    /// The leaf containing `index`, if it's been found yet
    leaf: Option<LeafRef<T>>,
}

impl<T> Cursor<T> {
    pub(crate) fn new(version: u64) -> Self {
        Cursor {
            version,
            index: 0,
            leaf: None,
        }
    }

    /// Returns the number of values the cursor has produced so far
    pub fn position(&self) -> usize {
        self.index
    }

    /// Produces the next value in the builder, or `None` if the end was reached
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::VersionMismatch`] if `builder` has been modified since the
    /// cursor was created.
    pub fn next(&mut self, builder: &Builder<T>) -> Result<Option<&T>> {
        if builder.version() != self.version {
            return Err(Error::VersionMismatch {
                expected: self.version,
                actual: builder.version(),
            });
        }

        if self.index >= builder.len() {
            return Ok(None);
        }

        let leaf = match self.leaf.take() {
            Some(leaf) if !leaf.is_exhausted() => leaf,
            _ => LeafRef::find(builder.root(), self.index),
        };

        self.index += 1;
        Ok(self.leaf.insert(leaf).advance())
    }
}

impl<T> Debug for Cursor<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("version", &self.version)
            .field("index", &self.index)
            .finish()
    }
}
