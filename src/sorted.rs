//! Wrapper module for [`SortedVector`], a sorted sequence that allows duplicates
//!
//! Everything here is built from [`Vector::binary_search_by`] and nothing else from the tree. To
//! find the *edge* of a run of equal values (instead of an arbitrary value in the run), the
//! comparison is wrapped so that it never reports a tie: treating equal values as greater than
//! the target sends the search to the start of the run, and treating them as less sends it to the
//! end. Finding one particular duplicate within the run is then a short linear scan.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};

use crate::{Error, Iter, Result, Vector};

/// A persistent sequence that's always kept sorted according to a comparison function `C`
///
/// Values that compare as equal may appear any number of times. They're kept in insertion order,
/// relative to each other: a new value goes after every existing value that compares equal to it.
///
/// Like [`Vector`], a `SortedVector` is immutable. Each "modifying" method returns a new
/// `SortedVector`, sharing as much as possible with the original.
///
/// Two separate notions of equality are used. The comparison function decides *where* a value
/// goes, and `PartialEq` decides which of several values with the same position is the one being
/// looked for -- in [`remove`], [`index_of`], and [`replace`].
///
/// ## Examples
///
/// ```
/// use bristlecone::SortedVector;
///
/// let words: SortedVector<&str> = ["dog", "apple", "chocolate"].into_iter().collect();
/// let words = words.add("banana");
///
/// let all: Vec<_> = words.iter().copied().collect();
/// assert_eq!(all, ["apple", "banana", "chocolate", "dog"]);
/// assert_eq!(words.lower_bound(&"cat"), 2);
/// ```
///
/// [`remove`]: Self::remove
/// [`index_of`]: Self::index_of
/// [`replace`]: Self::replace
pub struct SortedVector<T, C = fn(&T, &T) -> Ordering> {
    values: Vector<T>,
    cmp: C,
}

impl<T: Ord> SortedVector<T> {
    /// Creates a new, empty `SortedVector` using the natural ordering of `T`
    pub fn new() -> Self {
        SortedVector::with_comparer(T::cmp as fn(&T, &T) -> Ordering)
    }
}

impl<T, C: Fn(&T, &T) -> Ordering> SortedVector<T, C> {
    /// Creates a new, empty `SortedVector`, ordered by `cmp`
    pub fn with_comparer(cmp: C) -> Self {
        SortedVector {
            values: Vector::new(),
            cmp,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Returns the smallest value, if there are any
    pub fn min(&self) -> Option<&T> {
        self.values.first()
    }

    /// Returns the largest value, if there are any
    pub fn max(&self) -> Option<&T> {
        self.values.last()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.values.iter()
    }

    /// Returns the underlying [`Vector`]
    pub fn as_vector(&self) -> &Vector<T> {
        &self.values
    }

    pub fn into_vector(self) -> Vector<T> {
        self.values
    }

    /// Returns the index of the first value that doesn't compare less than `value`
    ///
    /// This is the start of the run of values equal to `value`, or the position it would be
    /// inserted at if there aren't any.
    pub fn lower_bound(&self, value: &T) -> usize {
        bound(&self.values, &self.cmp, value, Ordering::Greater)
    }

    /// Returns the index of the first value that compares greater than `value`
    ///
    /// This is one past the end of the run of values equal to `value`.
    pub fn upper_bound(&self, value: &T) -> usize {
        bound(&self.values, &self.cmp, value, Ordering::Less)
    }

    /// Returns true if any value compares equal to `value`
    pub fn contains(&self, value: &T) -> bool {
        let idx = self.lower_bound(value);
        self.values
            .get(idx)
            .is_some_and(|x| (self.cmp)(x, value) == Ordering::Equal)
    }

    /// Returns the index of the first value that both compares equal to `value` and is equal to
    /// it according to `PartialEq`
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let run = self.lower_bound(value)..self.upper_bound(value);
        // The range comes from our own search, so it's always in bounds
        self.values.index_of_in(value, run).ok().flatten()
    }

    /// Like [`index_of`](Self::index_of), but returns the last matching index
    pub fn last_index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let run = self.lower_bound(value)..self.upper_bound(value);
        self.values.last_index_of_in(value, run).ok().flatten()
    }
}

impl<T: Clone, C: Fn(&T, &T) -> Ordering + Clone> SortedVector<T, C> {
    fn with_values(&self, values: Vector<T>) -> Self {
        SortedVector {
            values,
            cmp: self.cmp.clone(),
        }
    }

    /// Returns a new `SortedVector` with `value` added, after any values equal to it
    pub fn add(&self, value: T) -> Self {
        let idx = self.upper_bound(&value);
        let mut builder = self.values.to_builder();
        builder.insert_unchecked(idx, value);
        self.with_values(builder.into_immutable())
    }

    /// Returns a new `SortedVector` with all of `values` added
    pub fn add_range(&self, values: impl IntoIterator<Item = T>) -> Self {
        let mut builder = self.values.to_builder();
        for v in values {
            let idx = bound(&builder, &self.cmp, &v, Ordering::Less);
            builder.insert_unchecked(idx, v);
        }
        self.with_values(builder.into_immutable())
    }

    /// Returns a new `SortedVector` without the first occurrence of `value`
    ///
    /// If there is no such value, the returned `SortedVector` shares its tree with this one.
    pub fn remove(&self, value: &T) -> Self
    where
        T: PartialEq,
    {
        let values = self
            .index_of(value)
            .and_then(|idx| self.values.remove_at(idx).ok())
            .unwrap_or_else(|| self.values.clone());
        self.with_values(values)
    }

    /// Returns a new `SortedVector` with the first occurrence of `old` replaced by `new`
    ///
    /// `new` is placed wherever it belongs in the order, which need not be where `old` was.
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::ValueNotFound`] if there's no occurrence of `old`.
    pub fn replace(&self, old: &T, new: T) -> Result<Self>
    where
        T: PartialEq,
    {
        let idx = self.index_of(old).ok_or(Error::ValueNotFound)?;
        let removed = self.with_values(self.values.remove_at(idx)?);
        Ok(removed.add(new))
    }
}

/// Binary searches for the edge of the run of values equal to `value`, treating ties as `tie`
///
/// A `tie` of `Greater` finds the start of the run, and `Less` finds the end.
fn bound<T>(
    values: &Vector<T>,
    cmp: &impl Fn(&T, &T) -> Ordering,
    value: &T,
    tie: Ordering,
) -> usize {
    let found = values.binary_search_by(|x| match cmp(x, value) {
        Ordering::Equal => tie,
        ord => ord,
    });
    // Ties are never reported, so this is always `Err`
    found.unwrap_or_else(|i| i)
}

impl<T: Ord> Default for SortedVector<T> {
    fn default() -> Self {
        SortedVector::new()
    }
}

impl<T, C: Clone> Clone for SortedVector<T, C> {
    fn clone(&self) -> Self {
        SortedVector {
            values: self.values.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<T: Debug, C> Debug for SortedVector<T, C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.values.fmt(f)
    }
}

impl<T: Ord + Clone> FromIterator<T> for SortedVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SortedVector::new().add_range(iter)
    }
}

impl<'t, T, C> IntoIterator for &'t SortedVector<T, C> {
    type Item = &'t T;
    type IntoIter = Iter<'t, T>;

    fn into_iter(self) -> Iter<'t, T> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::SortedVector;
    use crate::Error;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        key: u32,
        tag: &'static str,
    }

    fn by_key(a: &Entry, b: &Entry) -> std::cmp::Ordering {
        a.key.cmp(&b.key)
    }

    fn entry(key: u32, tag: &'static str) -> Entry {
        Entry { key, tag }
    }

    #[test]
    fn bounds_find_edges_of_runs() {
        let v: SortedVector<u32> = [5, 1, 3, 3, 3, 7, 3].into_iter().collect();
        assert_eq!(v.iter().copied().collect::<Vec<_>>(), [1, 3, 3, 3, 3, 5, 7]);

        assert_eq!(v.lower_bound(&3), 1);
        assert_eq!(v.upper_bound(&3), 5);
        assert_eq!(v.lower_bound(&4), 5);
        assert_eq!(v.upper_bound(&4), 5);
        assert_eq!(v.lower_bound(&0), 0);
        assert_eq!(v.upper_bound(&9), 7);
        assert!(v.contains(&5));
        assert!(!v.contains(&4));
        assert_eq!(v.min(), Some(&1));
        assert_eq!(v.max(), Some(&7));
    }

    #[test]
    fn duplicates_keep_insertion_order() {
        let v = SortedVector::with_comparer(by_key)
            .add(entry(2, "a"))
            .add(entry(1, "b"))
            .add(entry(2, "c"))
            .add(entry(2, "d"));

        let tags: Vec<_> = v.iter().map(|e| e.tag).collect();
        assert_eq!(tags, ["b", "a", "c", "d"]);

        assert_eq!(v.index_of(&entry(2, "c")), Some(2));
        assert_eq!(v.index_of(&entry(2, "z")), None);

        let removed = v.remove(&entry(2, "c"));
        let tags: Vec<_> = removed.iter().map(|e| e.tag).collect();
        assert_eq!(tags, ["b", "a", "d"]);
    }

    #[test]
    fn removing_absent_value_shares_tree() {
        let v: SortedVector<u32> = (0..50).collect();
        let same = v.remove(&100);
        assert!(same.as_vector().ptr_eq(v.as_vector()));
    }

    #[test]
    fn replace_requires_existing_value() {
        let v: SortedVector<u32> = [1, 2, 3].into_iter().collect();
        assert_eq!(v.replace(&4, 0).unwrap_err(), Error::ValueNotFound);

        let v = v.replace(&3, 0).unwrap();
        assert_eq!(v.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn last_index_of_finds_last_duplicate() {
        let v: SortedVector<u32> = [4, 4, 4, 1].into_iter().collect();
        assert_eq!(v.index_of(&4), Some(1));
        assert_eq!(v.last_index_of(&4), Some(3));
    }
}
