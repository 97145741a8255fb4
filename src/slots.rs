//! Wrapper module for [`SlotArray`], the inline storage used for node payloads
//!
//! Every node in the tree stores its contents -- either elements (for leaves) or child pointers
//! (for index nodes) -- in a `SlotArray`. The array is exactly [`CAPACITY`] slots wide and lives
//! inline in the node, so a node is a single allocation no matter what it holds.
//!
//! Only the first `len` slots are ever initialized. All of the block primitives here (shifting,
//! splitting, moving a run of slots between two arrays) are written in terms of raw copies, so
//! they never run user code partway through and are therefore trivially panic-safe.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut, Range};
use std::ptr;
use std::slice;

/// The number of slots in every [`SlotArray`], and so the branching factor of the tree
pub const CAPACITY: usize = 8;

/// The minimum number of occupied slots in every node except the last one on its level
pub const MIN_OCCUPANCY: usize = (CAPACITY + 1) / 2;

/// A fixed-capacity, inline array of [`CAPACITY`] slots
///
/// `SlotArray` derefs to the slice of its occupied slots, so indexing outside of `0..len` panics
/// the same way a slice would.
pub(crate) struct SlotArray<T> {
    len: u8,
    slots: [MaybeUninit<T>; CAPACITY],
}

impl<T> SlotArray<T> {
    /// Creates a new, empty `SlotArray`
    pub const fn new() -> Self {
        SlotArray {
            len: 0,
            slots: [const { MaybeUninit::uninit() }; CAPACITY],
        }
    }

    /// Creates a `SlotArray` containing just `val`
    pub fn from_one(val: T) -> Self {
        let mut this = Self::new();
        this.push(val);
        this
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_full(&self) -> bool {
        self.len() == CAPACITY
    }

    /// Returns the number of additional values that can be stored
    pub fn remaining(&self) -> usize {
        CAPACITY - self.len()
    }

    fn ptr(&self) -> *const T {
        self.slots.as_ptr() as *const T
    }

    fn mut_ptr(&mut self) -> *mut T {
        self.slots.as_mut_ptr() as *mut T
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are always initialized
        unsafe { slice::from_raw_parts(self.ptr(), self.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` slots are always initialized
        unsafe { slice::from_raw_parts_mut(self.mut_ptr(), self.len()) }
    }

    /// Adds `val` into the first unoccupied slot
    ///
    /// ## Panics
    ///
    /// This method panics if the array is already full.
    pub fn push(&mut self, val: T) {
        let len = self.len();
        assert!(len < CAPACITY, "cannot push onto a full SlotArray");

        // SAFETY: `len < CAPACITY`, so the slot is in bounds and currently uninitialized.
        unsafe { self.mut_ptr().add(len).write(val) };
        self.len += 1;
    }

    /// Removes and returns the value in the last occupied slot, if there is one
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` was initialized, and decrementing `len` first
        // means we won't read it again.
        Some(unsafe { self.mut_ptr().add(self.len()).read() })
    }

    /// Inserts `val` at `idx`, shifting all later values one slot to the right
    ///
    /// ## Panics
    ///
    /// This method panics if `idx > self.len()` or the array is already full.
    pub fn insert(&mut self, idx: usize, val: T) {
        let len = self.len();
        assert!(idx <= len, "insertion index {idx} out of bounds for length {len}");
        assert!(len < CAPACITY, "cannot insert into a full SlotArray");

        // SAFETY: `idx <= len < CAPACITY`, so both the source and destination of the shift are in
        // bounds. `ptr::copy` handles the overlap.
        unsafe {
            let p = self.mut_ptr().add(idx);
            ptr::copy(p, p.add(1), len - idx);
            p.write(val);
        }
        self.len += 1;
    }

    /// Removes and returns the value at `idx`, shifting all later values one slot to the left
    ///
    /// ## Panics
    ///
    /// This method panics if `idx >= self.len()`.
    pub fn remove(&mut self, idx: usize) -> T {
        let len = self.len();
        assert!(idx < len, "removal index {idx} out of bounds for length {len}");

        // SAFETY: `idx < len`, so the slot is initialized. After reading it out, we shift the
        // tail into its place so that the first `len - 1` slots are initialized again.
        unsafe {
            let p = self.mut_ptr().add(idx);
            let val = p.read();
            ptr::copy(p.add(1), p, len - idx - 1);
            self.len -= 1;
            val
        }
    }

    /// Moves every value at or after `at` into a new `SlotArray`, returning it
    ///
    /// ## Panics
    ///
    /// This method panics if `at > self.len()`.
    pub fn split_off(&mut self, at: usize) -> Self {
        let len = self.len();
        assert!(at <= len, "split index {at} out of bounds for length {len}");

        let mut other = Self::new();
        // SAFETY: the source range `at..len` is initialized and the destination is a fresh array
        // with enough room. Updating both lengths afterwards transfers ownership.
        unsafe { ptr::copy_nonoverlapping(self.ptr().add(at), other.mut_ptr(), len - at) };
        other.len = (len - at) as u8;
        self.len = at as u8;
        other
    }

    /// Moves every value out of `other`, appending them to the end of `self`
    ///
    /// ## Panics
    ///
    /// This method panics if the combined length would exceed [`CAPACITY`].
    pub fn append(&mut self, other: &mut Self) {
        other.move_front_into(self, other.len());
    }

    fn assert_room_for(&self, count: usize) {
        assert!(
            self.len() + count <= CAPACITY,
            "cannot move {count} values into SlotArray with length {}",
            self.len(),
        );
    }

    /// Moves the first `count` values of `self` onto the end of `dst`
    ///
    /// This is the primitive for pulling values from the front of a right-hand sibling.
    ///
    /// ## Panics
    ///
    /// This method panics if `count > self.len()` or if `dst` does not have room for `count` more
    /// values.
    pub fn move_front_into(&mut self, dst: &mut Self, count: usize) {
        let len = self.len();
        assert!(count <= len, "cannot move {count} values out of length {len}");
        dst.assert_room_for(count);

        // SAFETY: the source range `0..count` is initialized and the destination range
        // `dst.len..dst.len + count` is in bounds and uninitialized. The remaining values in
        // `self` are then shifted down with an overlap-aware copy.
        unsafe {
            let p = self.mut_ptr();
            ptr::copy_nonoverlapping(p, dst.mut_ptr().add(dst.len()), count);
            ptr::copy(p.add(count), p, len - count);
        }
        dst.len += count as u8;
        self.len -= count as u8;
    }

    /// Moves the last `count` values of `self` onto the front of `dst`, shifting the existing
    /// values in `dst` to the right
    ///
    /// This is the primitive for pushing values into the front of a right-hand sibling.
    ///
    /// ## Panics
    ///
    /// This method panics if `count > self.len()` or if `dst` does not have room for `count` more
    /// values.
    pub fn move_back_into(&mut self, dst: &mut Self, count: usize) {
        let len = self.len();
        assert!(count <= len, "cannot move {count} values out of length {len}");
        dst.assert_room_for(count);

        // SAFETY: `dst` has room for `count` more values, so shifting its initialized prefix right
        // by `count` stays in bounds. The freed prefix is then filled from the initialized tail of
        // `self`, which is forgotten by decrementing `self.len`.
        unsafe {
            let d = dst.mut_ptr();
            ptr::copy(d, d.add(count), dst.len());
            ptr::copy_nonoverlapping(self.ptr().add(len - count), d, count);
        }
        dst.len += count as u8;
        self.len -= count as u8;
    }

    /// Drops every value at or after `new_len`, leaving those slots unoccupied
    ///
    /// Has no effect if `new_len >= self.len()`.
    pub fn truncate(&mut self, new_len: usize) {
        let len = self.len();
        if new_len >= len {
            return;
        }

        // We set the length *before* dropping, so that a panicking destructor can't lead to a
        // double-drop.
        self.len = new_len as u8;
        // SAFETY: the range `new_len..len` was initialized, and is no longer reachable through
        // `self` now that the length has been updated.
        unsafe {
            let tail = ptr::slice_from_raw_parts_mut(self.mut_ptr().add(new_len), len - new_len);
            ptr::drop_in_place(tail);
        }
    }

    /// Creates a new `SlotArray` by applying `f` to each value
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> SlotArray<U> {
        let mut out = SlotArray::new();
        for v in self.as_slice() {
            out.push(f(v));
        }
        out
    }

    /// Returns the index of the first value in `range` satisfying `pred`
    pub fn find_index(
        &self,
        range: Range<usize>,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Option<usize> {
        let start = range.start;
        self.as_slice()[range].iter().position(|v| pred(v)).map(|i| i + start)
    }

    /// Returns the index of the last value in `range` satisfying `pred`
    pub fn find_last_index(
        &self,
        range: Range<usize>,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Option<usize> {
        let start = range.start;
        self.as_slice()[range].iter().rposition(|v| pred(v)).map(|i| i + start)
    }

    /// Returns the index of the first value in `range` equal to `item`
    pub fn index_of(&self, range: Range<usize>, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.find_index(range, |v| v == item)
    }

    /// Returns the index of the last value in `range` equal to `item`
    pub fn last_index_of(&self, range: Range<usize>, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.find_last_index(range, |v| v == item)
    }

    /// Binary searches `range` with the comparison function `f`, returning `Ok` with the index of
    /// a matching value or `Err` with the index at which a matching value could be inserted
    ///
    /// The indexes are relative to the start of the array, not to `range`. As with the standard
    /// library's version, if there are multiple matches, any one of them may be returned.
    pub fn binary_search_by(
        &self,
        range: Range<usize>,
        f: impl FnMut(&T) -> Ordering,
    ) -> Result<usize, usize> {
        let start = range.start;
        match self.as_slice()[range].binary_search_by(f) {
            Ok(i) => Ok(i + start),
            Err(i) => Err(i + start),
        }
    }

    /// Sorts the values in `range` according to `cmp`
    ///
    /// Runs of two and three values are sorted with an unrolled sorting network; anything longer
    /// uses an insertion sort. With at most [`CAPACITY`] values, neither is worth improving on.
    pub fn sort_by(&mut self, range: Range<usize>, mut cmp: impl FnMut(&T, &T) -> Ordering) {
        fn order<T>(vals: &mut [T], i: usize, j: usize, cmp: &mut impl FnMut(&T, &T) -> Ordering) {
            if cmp(&vals[i], &vals[j]) == Ordering::Greater {
                vals.swap(i, j);
            }
        }

        let vals = &mut self.as_mut_slice()[range];
        match vals.len() {
            0 | 1 => (),
            2 => order(vals, 0, 1, &mut cmp),
            3 => {
                order(vals, 0, 1, &mut cmp);
                order(vals, 0, 2, &mut cmp);
                order(vals, 1, 2, &mut cmp);
            }
            n => {
                for i in 1..n {
                    let mut j = i;
                    while j > 0 && cmp(&vals[j - 1], &vals[j]) == Ordering::Greater {
                        vals.swap(j - 1, j);
                        j -= 1;
                    }
                }
            }
        }
    }
}

impl<T> Default for SlotArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for SlotArray<T> {
    fn drop(&mut self) {
        self.truncate(0);
    }
}

impl<T: Clone> Clone for SlotArray<T> {
    fn clone(&self) -> Self {
        // Pushing one at a time keeps `len` accurate if a `clone` panics partway through.
        self.map(T::clone)
    }
}

impl<T> Deref for SlotArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for SlotArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Debug> Debug for SlotArray<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T> FromIterator<T> for SlotArray<T> {
    /// ## Panics
    ///
    /// Panics if the iterator yields more than [`CAPACITY`] values.
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        let mut this = Self::new();
        for v in iter {
            this.push(v);
        }
        this
    }
}

#[cfg(test)]
mod tests {
    use super::{SlotArray, CAPACITY};
    use std::cell::Cell;
    use std::rc::Rc;

    fn filled(vals: &[i32]) -> SlotArray<i32> {
        vals.iter().copied().collect()
    }

    #[test]
    fn insert_and_remove_shift() {
        let mut s = filled(&[1, 2, 4]);
        s.insert(2, 3);
        s.insert(0, 0);
        assert_eq!(s.as_slice(), [0, 1, 2, 3, 4]);

        assert_eq!(s.remove(1), 1);
        assert_eq!(s.as_slice(), [0, 2, 3, 4]);
        assert_eq!(s.pop(), Some(4));
        assert_eq!(s.as_slice(), [0, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn index_past_len_panics() {
        let s = filled(&[1, 2]);
        let _ = s[2];
    }

    #[test]
    #[should_panic]
    fn push_when_full_panics() {
        let mut s = filled(&[0; CAPACITY]);
        s.push(1);
    }

    #[test]
    fn split_and_append() {
        let mut s = filled(&[0, 1, 2, 3, 4, 5]);
        let mut tail = s.split_off(4);
        assert_eq!(s.as_slice(), [0, 1, 2, 3]);
        assert_eq!(tail.as_slice(), [4, 5]);

        s.append(&mut tail);
        assert_eq!(s.as_slice(), [0, 1, 2, 3, 4, 5]);
        assert_eq!(tail.len(), 0);
    }

    #[test]
    fn move_between_siblings() {
        let mut lhs = filled(&[0, 1]);
        let mut rhs = filled(&[2, 3, 4, 5, 6]);
        rhs.move_front_into(&mut lhs, 2);
        assert_eq!(lhs.as_slice(), [0, 1, 2, 3]);
        assert_eq!(rhs.as_slice(), [4, 5, 6]);

        lhs.move_back_into(&mut rhs, 3);
        assert_eq!(lhs.as_slice(), [0]);
        assert_eq!(rhs.as_slice(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn searches_respect_range() {
        let s = filled(&[5, 1, 5, 2, 5, 3]);
        assert_eq!(s.index_of(1..6, &5), Some(2));
        assert_eq!(s.last_index_of(0..4, &5), Some(2));
        assert_eq!(s.find_index(3..6, |v| *v > 2), Some(4));
        assert_eq!(s.find_last_index(0..2, |v| *v > 9), None);

        let sorted = filled(&[9, 1, 3, 5, 7]);
        assert_eq!(sorted.binary_search_by(1..5, |v| v.cmp(&5)), Ok(3));
        assert_eq!(sorted.binary_search_by(1..5, |v| v.cmp(&4)), Err(3));
        assert_eq!(sorted.binary_search_by(1..5, |v| v.cmp(&0)), Err(1));
    }

    #[test]
    fn sort_small_and_large_runs() {
        let mut two = filled(&[2, 1]);
        two.sort_by(0..2, |a, b| a.cmp(b));
        assert_eq!(two.as_slice(), [1, 2]);

        for perm in [[1, 2, 3], [1, 3, 2], [2, 1, 3], [2, 3, 1], [3, 1, 2], [3, 2, 1]] {
            let mut three = filled(&perm);
            three.sort_by(0..3, |a, b| a.cmp(b));
            assert_eq!(three.as_slice(), [1, 2, 3]);
        }

        let mut s = filled(&[8, 7, 6, 5, 4, 3, 2, 1]);
        s.sort_by(2..7, |a, b| a.cmp(b));
        assert_eq!(s.as_slice(), [8, 7, 2, 3, 4, 5, 6, 1]);
    }

    #[test]
    fn values_are_dropped_exactly_once() {
        struct Counted(Rc<Cell<usize>>);

        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut s: SlotArray<Counted> = (0..6).map(|_| Counted(drops.clone())).collect();
        let tail = s.split_off(3);
        s.truncate(1);
        assert_eq!(drops.get(), 2);
        drop(tail);
        assert_eq!(drops.get(), 5);
        drop(s);
        assert_eq!(drops.get(), 6);
    }
}
