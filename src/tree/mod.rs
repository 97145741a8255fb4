//! Wrapper module containing the tree itself -- [`Vector`] and [`Builder`]

#[cfg(feature = "fuzz")]
use arbitrary::{Arbitrary, Unstructured};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::{Deref, RangeBounds};
use std::sync::Arc;

use crate::cursor::Cursor;
use crate::span::IndexSpan;
use crate::{Error, Result};

mod insert;
mod iter;
mod node;
mod remove;
mod search;
mod sort;
#[cfg(test)]
mod tests;

pub(crate) use iter::LeafRef;
pub use iter::{IntoIter, Iter};

#[cfg(any(test, feature = "fuzz"))]
use node::ValidationRules;
use node::{Node, NodePtr};

/// *Raison d'être of the crate*: a persistent, structurally-shared sequence
///
/// A `Vector` is immutable. Every method that "modifies" it instead returns a new `Vector` with
/// the change applied, and leaves the original exactly as it was. Both remain fully usable, and
/// they share every part of the underlying tree that the change didn't touch.
///
/// Internally, a `Vector` is a B+tree with a branching factor of [`CAPACITY`]. Each leaf holds up
/// to [`CAPACITY`] values directly, and each internal node holds up to [`CAPACITY`] children,
/// alongside the position of each child relative to the node. That gives:
///
/// * O(1) [`clone`](Clone::clone) -- it's just a reference count
/// * O(log n) [`get`], [`set`], [`insert`], and [`remove_at`], each of which copies only the
///   O(log n) nodes on the path from the root to the change
/// * O(1) amortized iteration
///
/// A single modification to a `Vector` allocates a new path through the tree. When making many
/// changes in a row, a [`Builder`] is usually better: it copies each shared node at most once,
/// and then modifies it in place for as long as nothing else can see it.
///
/// ## Errors
///
/// Methods that take an index or a range check it before doing anything else, and return an
/// [`Error`] if it's out of bounds. A method that returns an error has no other effect.
///
/// ## Comparers and predicates
///
/// Methods like [`sort_by`] or [`find_index`] take closures, which are called directly from the
/// algorithms in the tree. If one of them panics, the panic propagates to the caller of the
/// method, and -- since `Vector`s are never modified in place -- the original `Vector` is still
/// intact.
///
/// ## Examples
///
/// ```
/// use bristlecone::Vector;
///
/// let fruits: Vector<&str> = ["banana", "apple", "cherry"].into_iter().collect();
/// let sorted = fruits.sort();
///
/// assert_eq!(sorted.to_vec(), ["apple", "banana", "cherry"]);
/// assert_eq!(sorted.binary_search(&"banana"), Ok(1));
/// assert_eq!(fruits[0], "banana");
/// ```
///
/// [`CAPACITY`]: crate::CAPACITY
/// [`get`]: Self::get
/// [`set`]: Self::set
/// [`insert`]: Self::insert
/// [`remove_at`]: Self::remove_at
/// [`sort_by`]: Self::sort_by
/// [`find_index`]: Self::find_index
pub struct Vector<T> {
    root: NodePtr<T>,
}

/// A mutable, in-place editor for a [`Vector`]
///
/// A `Builder` starts out sharing its entire tree with the `Vector` it was created from. The first
/// write to any shared node copies it; after that, the builder owns the copy outright, and further
/// writes to it happen in place. [`to_immutable`] produces a `Vector` from the current state
/// without copying anything -- which makes the nodes shared again, so that the next write to them
/// copies first.
///
/// `Builder` dereferences to [`Vector`], so all of the read-only methods -- [`get`],
/// [`binary_search`], [`iter`], and so on -- are available on it directly.
///
/// Every successful modification increments the builder's [`version`], which is how a [`Cursor`]
/// detects that the builder changed underneath it.
///
/// ## Examples
///
/// ```
/// use bristlecone::{Builder, Vector};
///
/// let mut builder = Builder::new();
/// for i in 0..100 {
///     builder.push(i);
/// }
/// builder.remove_range(10..90).unwrap();
///
/// let v: Vector<i32> = builder.to_immutable();
/// assert_eq!(v.len(), 20);
/// assert_eq!(v[10], 90);
/// ```
///
/// [`to_immutable`]: Self::to_immutable
/// [`version`]: Self::version
/// [`get`]: Vector::get
/// [`binary_search`]: Vector::binary_search
/// [`iter`]: Vector::iter
pub struct Builder<T> {
    vector: Vector<T>,
    version: u64,
}

impl<T> Vector<T> {
    /// Creates a new, empty `Vector`
    pub fn new() -> Self {
        Vector {
            root: Arc::new(Node::Empty),
        }
    }

    /// Returns the number of values in the `Vector`
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both `Vector`s share the same tree, which implies that they're equal
    ///
    /// Operations that turn out to have nothing to do -- removing a value that isn't present, for
    /// example -- return a `Vector` that shares the tree of the original. All empty `Vector`s are
    /// considered to share the same (empty) tree.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root) || (self.is_empty() && other.is_empty())
    }

    /// Returns a reference to the value at `index`, or `None` if it's out of bounds
    pub fn get(&self, index: usize) -> Option<&T> {
        (index < self.len()).then(|| self.root.get(index))
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Returns an iterator over references to every value in the `Vector`
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.root, IndexSpan::new(0, self.len()))
    }

    /// Returns an iterator over the values in `range`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if the range extends beyond the end of the
    /// `Vector`, or if its start is after its end.
    pub fn iter_range(&self, range: impl RangeBounds<usize>) -> Result<Iter<'_, T>> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        Ok(Iter::new(&self.root, span))
    }

    /// Creates a [`Builder`], initially sharing this `Vector`'s tree
    pub fn to_builder(&self) -> Builder<T> {
        Builder {
            vector: self.clone(),
            version: 0,
        }
    }

    /// Returns a new `Vector` of the same shape, with each value converted by `f`
    ///
    /// Runs in O(n) time, and never needs to rebalance: the new tree has exactly the same
    /// structure as the old one.
    pub fn convert_all<U>(&self, mut f: impl FnMut(&T) -> U) -> Vector<U> {
        Vector {
            root: Arc::new(self.root.convert_all(&mut f)),
        }
    }

    /// Binary searches a sorted `Vector` for `value`
    ///
    /// Returns `Ok` with the index of a matching value, or `Err` with the index at which `value`
    /// could be inserted while keeping the `Vector` sorted. If there are multiple matches, any
    /// one of them may be returned. The result is unspecified if the `Vector` isn't sorted.
    ///
    /// ## Examples
    ///
    /// ```
    /// use bristlecone::Vector;
    ///
    /// let v: Vector<&str> = ["apple", "banana", "chocolate", "dog", "food"].into_iter().collect();
    /// assert_eq!(v.binary_search(&"dog"), Ok(3));
    /// assert_eq!(v.binary_search(&"egg"), Err(4));
    /// ```
    pub fn binary_search(&self, value: &T) -> Result<usize, usize>
    where
        T: Ord,
    {
        self.binary_search_by(|x| x.cmp(value))
    }

    /// Binary searches a sorted `Vector` with a comparison function
    ///
    /// `f` should return the ordering of the value it's given *relative to the target*, in the
    /// same manner as [`slice::binary_search_by`]. Refer to [`binary_search`] for more.
    ///
    /// [`binary_search`]: Self::binary_search
    pub fn binary_search_by(&self, mut f: impl FnMut(&T) -> Ordering) -> Result<usize, usize> {
        self.root.binary_search_by(IndexSpan::new(0, self.len()), &mut f)
    }

    /// Like [`binary_search_by`], but only searching within `range`
    ///
    /// Indexes in the result are relative to the start of the `Vector`, not to `range`. An empty
    /// range produces `Err(range.start)`.
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    ///
    /// [`binary_search_by`]: Self::binary_search_by
    pub fn binary_search_range_by(
        &self,
        range: impl RangeBounds<usize>,
        mut f: impl FnMut(&T) -> Ordering,
    ) -> Result<Result<usize, usize>> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        Ok(self.root.binary_search_by(span, &mut f))
    }

    /// Returns the first value satisfying `pred`
    pub fn find(&self, pred: impl FnMut(&T) -> bool) -> Option<&T> {
        self.find_index(pred).map(|i| self.root.get(i))
    }

    /// Returns the last value satisfying `pred`
    pub fn find_last(&self, pred: impl FnMut(&T) -> bool) -> Option<&T> {
        self.find_last_index(pred).map(|i| self.root.get(i))
    }

    /// Returns the index of the first value satisfying `pred`
    pub fn find_index(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.root.find_index(IndexSpan::new(0, self.len()), &mut pred)
    }

    /// Returns the index of the first value in `range` satisfying `pred`
    ///
    /// The returned index is relative to the start of the `Vector`.
    pub fn find_index_in(
        &self,
        range: impl RangeBounds<usize>,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Result<Option<usize>> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        Ok(self.root.find_index(span, &mut pred))
    }

    /// Returns the index of the last value satisfying `pred`
    pub fn find_last_index(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.root.find_last_index(IndexSpan::new(0, self.len()), &mut pred)
    }

    /// Returns the index of the last value in `range` satisfying `pred`
    pub fn find_last_index_in(
        &self,
        range: impl RangeBounds<usize>,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Result<Option<usize>> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        Ok(self.root.find_last_index(span, &mut pred))
    }

    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.root.index_of(IndexSpan::new(0, self.len()), value)
    }

    pub fn index_of_in(&self, value: &T, range: impl RangeBounds<usize>) -> Result<Option<usize>>
    where
        T: PartialEq,
    {
        let span = IndexSpan::from_bounds(range, self.len())?;
        Ok(self.root.index_of(span, value))
    }

    pub fn last_index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.root.last_index_of(IndexSpan::new(0, self.len()), value)
    }

    pub fn last_index_of_in(
        &self,
        value: &T,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<usize>>
    where
        T: PartialEq,
    {
        let span = IndexSpan::from_bounds(range, self.len())?;
        Ok(self.root.last_index_of(span, value))
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// Returns true if any value satisfies `pred`
    pub fn exists(&self, pred: impl FnMut(&T) -> bool) -> bool {
        self.find_index(pred).is_some()
    }

    /// Returns true if every value satisfies `pred`, including when the `Vector` is empty
    pub fn true_for_all(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.find_index(|x| !pred(x)).is_none()
    }

    pub fn for_each(&self, f: impl FnMut(&T)) {
        self.iter().for_each(f)
    }

    /// Copies the values in `range` into `dst`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    ///
    /// ## Panics
    ///
    /// This method panics if the length of `dst` is not equal to the length of `range`.
    pub fn copy_to(&self, range: impl RangeBounds<usize>, dst: &mut [T]) -> Result<()>
    where
        T: Clone,
    {
        let span = IndexSpan::from_bounds(range, self.len())?;
        assert_eq!(
            dst.len(),
            span.count(),
            "destination length does not match range length",
        );

        for (d, v) in dst.iter_mut().zip(Iter::new(&self.root, span)) {
            d.clone_from(v);
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T: Clone> Vector<T> {
    /// Applies a set of changes through a temporary [`Builder`], producing the resulting `Vector`
    fn edit<R>(&self, f: impl FnOnce(&mut Builder<T>) -> Result<R>) -> Result<Self> {
        let mut builder = self.to_builder();
        f(&mut builder)?;
        Ok(builder.into_immutable())
    }

    /// Returns a new `Vector` with the value at `index` replaced by `value`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index >= self.len()`.
    pub fn set(&self, index: usize, value: T) -> Result<Self> {
        self.edit(|b| b.set(index, value))
    }

    /// Returns a new `Vector` with `value` appended to the end
    pub fn add(&self, value: T) -> Self {
        let mut builder = self.to_builder();
        builder.push(value);
        builder.into_immutable()
    }

    /// Returns a new `Vector` with `value` inserted at `index`, shifting everything after it
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index > self.len()`.
    pub fn insert(&self, index: usize, value: T) -> Result<Self> {
        self.edit(|b| b.insert(index, value))
    }

    /// Returns a new `Vector` with all of `values` appended to the end
    pub fn add_range(&self, values: impl IntoIterator<Item = T>) -> Self {
        let mut builder = self.to_builder();
        builder.add_range(values);
        builder.into_immutable()
    }

    /// Returns a new `Vector` with all of `values` inserted at `index`, in order
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index > self.len()`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use bristlecone::Vector;
    ///
    /// let v: Vector<i32> = [0, 1, 2, 3, 8, 9, 10].into_iter().collect();
    /// let v = v.insert_range(4, [4, 5, 6, 7]).unwrap();
    /// assert_eq!(v.to_vec(), (0..=10).collect::<Vec<_>>());
    /// ```
    pub fn insert_range(&self, index: usize, values: impl IntoIterator<Item = T>) -> Result<Self> {
        self.edit(|b| b.insert_range(index, values))
    }

    /// Returns a new `Vector` with the value at `index` removed
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index >= self.len()`.
    pub fn remove_at(&self, index: usize) -> Result<Self> {
        self.edit(|b| b.remove_at(index))
    }

    /// Returns a new `Vector` with every value in `range` removed
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn remove_range(&self, range: impl RangeBounds<usize>) -> Result<Self> {
        self.edit(|b| b.remove_range(range))
    }

    /// Returns a new `Vector` without any of the values that satisfy `pred`
    pub fn remove_all(&self, pred: impl FnMut(&T) -> bool) -> Self {
        let mut builder = self.to_builder();
        builder.remove_all(pred);
        builder.into_immutable()
    }

    /// Returns a new `Vector` with the first value equal to `value` removed, if there is one
    pub fn remove(&self, value: &T) -> Self
    where
        T: PartialEq,
    {
        let mut builder = self.to_builder();
        builder.remove(value);
        builder.into_immutable()
    }

    /// Returns an empty `Vector`
    ///
    /// This is provided for symmetry with [`Builder::clear`]; it's equivalent to [`Vector::new`].
    pub fn clear(&self) -> Self {
        Vector::new()
    }

    /// Returns a new `Vector` containing only the values in `range`
    ///
    /// The new `Vector` is built directly from the values in the range, so it's fully packed, and
    /// shares nothing with the original unless the range covers all of it.
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn get_range(&self, range: impl RangeBounds<usize>) -> Result<Self> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        if span.count() == self.len() {
            return Ok(self.clone());
        }

        let mut root = Arc::new(Node::Empty);
        insert::insert_range(&mut root, 0, Iter::new(&self.root, span).cloned());
        Ok(Vector { root })
    }

    /// Returns a new `Vector`, sorted in ascending order
    pub fn sort(&self) -> Self
    where
        T: Ord,
    {
        self.sort_by(T::cmp)
    }

    /// Returns a new `Vector`, sorted according to `cmp`
    ///
    /// The sort is not stable: values that compare equal may be reordered. If `cmp` doesn't
    /// implement a total order, the resulting order is unspecified (but the `Vector` will still
    /// contain the same values).
    pub fn sort_by(&self, cmp: impl FnMut(&T, &T) -> Ordering) -> Self {
        let mut builder = self.to_builder();
        builder.sort_by(cmp);
        builder.into_immutable()
    }

    /// Returns a new `Vector` with only the values in `range` sorted according to `cmp`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn sort_range_by(
        &self,
        range: impl RangeBounds<usize>,
        cmp: impl FnMut(&T, &T) -> Ordering,
    ) -> Result<Self> {
        self.edit(|b| b.sort_range_by(range, cmp))
    }

    /// Returns a new `Vector`, in reverse order
    pub fn reverse(&self) -> Self {
        let mut builder = self.to_builder();
        builder.reverse();
        builder.into_immutable()
    }

    /// Returns a new `Vector` with the order of the values in `range` reversed
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn reverse_range(&self, range: impl RangeBounds<usize>) -> Result<Self> {
        self.edit(|b| b.reverse_range(range))
    }

    /// Returns a new `Vector` with the same values, stored as compactly as possible
    ///
    /// Refer to [`Builder::trim_excess`] for more information.
    pub fn trim_excess(&self) -> Self {
        let mut builder = self.to_builder();
        builder.trim_excess();
        builder.into_immutable()
    }
}

impl<T> Builder<T> {
    /// Creates a new, empty `Builder`
    pub fn new() -> Self {
        Vector::new().to_builder()
    }

    /// Returns the current version of the builder
    ///
    /// The version starts at zero, and is incremented by every operation that changes the
    /// contents of the builder.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns a `Vector` with the current contents of the builder, in constant time
    ///
    /// The builder remains usable afterwards. Any nodes it modifies from then on are copied
    /// first, so the returned `Vector` is never affected.
    pub fn to_immutable(&self) -> Vector<T> {
        self.vector.clone()
    }

    /// Like [`to_immutable`], but consumes the builder
    ///
    /// [`to_immutable`]: Self::to_immutable
    pub fn into_immutable(self) -> Vector<T> {
        self.vector
    }

    /// Returns a [`Cursor`] positioned at the start of the builder's current contents
    ///
    /// The cursor is bound to the current [`version`](Self::version) of the builder, and fails
    /// once the builder has been modified.
    pub fn cursor(&self) -> Cursor<T> {
        Cursor::new(self.version)
    }

    /// Returns the root of the tree for modification, recording that the builder changed
    fn root_mut(&mut self) -> &mut NodePtr<T> {
        self.version += 1;
        &mut self.vector.root
    }

    pub(crate) fn root(&self) -> &NodePtr<T> {
        &self.vector.root
    }

    /// Checks that `index < bound`, reporting the error in terms of the current length
    fn check_index(&self, index: usize, bound: usize) -> Result<()> {
        match index < bound {
            true => Ok(()),
            false => Err(Error::IndexOutOfRange { index, len: self.len() }),
        }
    }
}

impl<T: Clone> Builder<T> {
    /// Replaces the value at `index` with `value`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index >= self.len()`.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index, self.len())?;
        *Arc::make_mut(self.root_mut()).get_mut(index) = value;
        Ok(())
    }

    /// Returns a mutable reference to the value at `index`, or `None` if it's out of bounds
    ///
    /// This counts as a modification of the builder, even if the value is never written to.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        Some(Arc::make_mut(self.root_mut()).get_mut(index))
    }

    /// Appends `value` to the end
    pub fn push(&mut self, value: T) {
        let len = self.len();
        insert::insert(self.root_mut(), len, value);
    }

    /// Removes the last value and returns it, or `None` if the builder is empty
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        remove::remove_last(self.root_mut())
    }

    /// Inserts `value` at `index`, shifting everything after it
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index > self.len()`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index, self.len() + 1)?;
        insert::insert(self.root_mut(), index, value);
        Ok(())
    }

    /// Appends all of `values` to the end
    pub fn add_range(&mut self, values: impl IntoIterator<Item = T>) {
        let len = self.len();
        self.splice(len, values);
    }

    /// Inserts all of `values` at `index`, in order
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index > self.len()`.
    pub fn insert_range(
        &mut self,
        index: usize,
        values: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        self.check_index(index, self.len() + 1)?;
        self.splice(index, values);
        Ok(())
    }

    /// Inserts `values` at `index`, which must be at most `self.len()`
    fn splice(&mut self, index: usize, values: impl IntoIterator<Item = T>) {
        let mut values = values.into_iter().peekable();
        if values.peek().is_some() {
            insert::insert_range(self.root_mut(), index, values);
        }
    }

    /// Inserts `value` at `index`, where the caller has already established that
    /// `index <= self.len()`
    pub(crate) fn insert_unchecked(&mut self, index: usize, value: T) {
        debug_assert!(index <= self.len());
        insert::insert(self.root_mut(), index, value);
    }

    /// Removes the value at `index` and returns it
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::IndexOutOfRange`] if `index >= self.len()`.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.check_index(index, self.len())?;
        Ok(remove::remove_at(self.root_mut(), index))
    }

    /// Removes every value in `range`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn remove_range(&mut self, range: impl RangeBounds<usize>) -> Result<()> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        if !span.is_empty() {
            remove::remove_range(self.root_mut(), span);
        }
        Ok(())
    }

    /// Removes every value satisfying `pred`, returning the number of values removed
    ///
    /// `pred` is called exactly once for each value, in order. If anything is removed, the
    /// remaining values are rebuilt into a fully packed tree.
    pub fn remove_all(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let Some(first) = self.find_index(&mut pred) else {
            return 0;
        };

        let len = self.len();
        let old = self.vector.clone();
        let kept = old
            .iter()
            .take(first)
            .chain(old.iter().skip(first + 1).filter(|x| !pred(*x)))
            .cloned();

        let mut root = Arc::new(Node::Empty);
        insert::insert_range(&mut root, 0, kept);
        *self.root_mut() = root;
        len - self.len()
    }

    /// Removes the first value equal to `value`, returning whether one was found
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(i) => {
                remove::remove_at(self.root_mut(), i);
                true
            }
            None => false,
        }
    }

    /// Removes every value
    pub fn clear(&mut self) {
        if !self.is_empty() {
            *self.root_mut() = Arc::new(Node::Empty);
        }
    }

    /// Sorts all values in ascending order
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(T::cmp)
    }

    /// Sorts all values according to `cmp`
    ///
    /// Refer to [`Vector::sort_by`] for more information.
    pub fn sort_by(&mut self, mut cmp: impl FnMut(&T, &T) -> Ordering) {
        let span = IndexSpan::new(0, self.len());
        self.sort_span(span, &mut cmp);
    }

    /// Sorts only the values in `range` according to `cmp`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn sort_range_by(
        &mut self,
        range: impl RangeBounds<usize>,
        mut cmp: impl FnMut(&T, &T) -> Ordering,
    ) -> Result<()> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        self.sort_span(span, &mut cmp);
        Ok(())
    }

    fn sort_span(&mut self, span: IndexSpan, cmp: &mut impl FnMut(&T, &T) -> Ordering) {
        if span.count() >= 2 && !self.root().is_sorted_by(span, cmp) {
            Arc::make_mut(self.root_mut()).sort(span, cmp);
        }
    }

    /// Reverses the order of all values
    pub fn reverse(&mut self) {
        self.reverse_span(IndexSpan::new(0, self.len()));
    }

    /// Reverses the order of the values in `range`
    ///
    /// ## Errors
    ///
    /// This method returns [`Error::RangeOutOfBounds`] if `range` is invalid.
    pub fn reverse_range(&mut self, range: impl RangeBounds<usize>) -> Result<()> {
        let span = IndexSpan::from_bounds(range, self.len())?;
        self.reverse_span(span);
        Ok(())
    }

    fn reverse_span(&mut self, span: IndexSpan) {
        if span.count() >= 2 {
            Arc::make_mut(self.root_mut()).reverse(span);
        }
    }

    /// Compacts the tree so that every node is completely full, except the last one on each level
    ///
    /// Repeated insertions and removals in the middle of the tree can leave nodes as little as
    /// half full. This reclaims that space, and also makes iteration and lookups slightly faster.
    /// It doesn't change the values or their order.
    pub fn trim_excess(&mut self) {
        if !self.root().is_trimmed() {
            remove::trim_excess(self.root_mut());
        }
    }
}

#[cfg(any(test, feature = "fuzz"))]
impl<T> Vector<T> {
    /// (*Test-only*) Validates the tree, panicking if any structural invariant doesn't hold
    ///
    /// This checks that the sizes and offsets stored in each node add up, that every node except
    /// the last on its level is at least half full, and that all leaves are at the same depth.
    pub fn validate(&self) {
        let rules = ValidationRules { packed: false };
        self.root.validate(rules, &mut Vec::new(), true, &mut None);
    }

    /// (*Test-only*) Like [`validate`](Self::validate), but additionally requires the tree to be
    /// packed, as it should be after [`trim_excess`](Self::trim_excess)
    pub fn validate_packed(&self) {
        let rules = ValidationRules { packed: true };
        self.root.validate(rules, &mut Vec::new(), true, &mut None);
    }
}

#[cfg(test)]
impl<T: Debug> Vector<T> {
    /// (*Test-only*) Prints the internal structure of the tree
    pub(crate) fn print_tree(&self) {
        println!("{:#?}", self.root);
    }
}

impl<T> Clone for Vector<T> {
    fn clone(&self) -> Self {
        Vector {
            root: Arc::clone(&self.root),
        }
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Vector::new()
    }
}

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<T: Debug> Debug for Vector<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Debug> Debug for Builder<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Builder")
            .field("version", &self.version)
            .field("values", &self.vector)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl<T: Eq> Eq for Vector<T> {}

impl<T: Hash> Hash for Vector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        self.iter().for_each(|v| v.hash(state));
    }
}

impl<T> std::ops::Index<usize> for Vector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {index} out of range for length {}", self.len()),
        }
    }
}

impl<T> Deref for Builder<T> {
    type Target = Vector<T>;

    fn deref(&self) -> &Vector<T> {
        &self.vector
    }
}

impl<T: Clone> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vector::new().add_range(iter)
    }
}

impl<T: Clone> From<Vec<T>> for Vector<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Clone> Extend<T> for Builder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter)
    }
}

impl<'t, T> IntoIterator for &'t Vector<T> {
    type Item = &'t T;
    type IntoIter = Iter<'t, T>;

    fn into_iter(self) -> Iter<'t, T> {
        self.iter()
    }
}

impl<T: Clone> IntoIterator for Vector<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let len = self.len();
        IntoIter::new(self.root, len)
    }
}

#[cfg(feature = "fuzz")]
impl<'a, T: Clone + Arbitrary<'a>> Arbitrary<'a> for Vector<T> {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        u.arbitrary_iter()?.collect()
    }
}
