//! Wrapper module for [`Vector`](crate::Vector) iterator types -- [`Iter`] and [`IntoIter`]
//!
//! Both iterators work the same way: they track the range of indexes that are still left to
//! yield, and cache the leaf at each end of that range. A value is produced straight from the
//! cached leaf if possible; only once a leaf runs out do we go back to the root to find the next
//! one. Each descent is O(log n) and happens once per [`CAPACITY`](crate::CAPACITY) values, so
//! iteration is O(1) amortized.

use std::iter::FusedIterator;
use std::sync::Arc;

use super::node::{Node, NodePtr};
use crate::span::IndexSpan;

/// An iterator over references to the values in a [`Vector`]
///
/// This iterator is double-ended, and is produced by the [`iter`] and [`iter_range`] methods.
///
/// [`Vector`]: crate::Vector
/// [`iter`]: crate::Vector::iter
/// [`iter_range`]: crate::Vector::iter_range
pub struct Iter<'t, T> {
    root: &'t Node<T>,
    /// The next index to yield from the front
    front: usize,
    /// One past the next index to yield from the back
    back: usize,
    /// The remainder of the leaf containing `front`, starting at `front`
    fwd: &'t [T],
    /// The portion of the leaf containing `back - 1`, up to and including it
    bkwd: &'t [T],
}

impl<'t, T> Iter<'t, T> {
    pub(super) fn new(root: &'t Node<T>, span: IndexSpan) -> Self {
        Iter {
            root,
            front: span.start(),
            back: span.end_exclusive(),
            fwd: &[],
            bkwd: &[],
        }
    }
}

impl<'t, T> Iterator for Iter<'t, T> {
    type Item = &'t T;

    fn next(&mut self) -> Option<&'t T> {
        if self.front == self.back {
            return None;
        }

        if self.fwd.is_empty() {
            let (leaf, local) = self.root.leaf_containing(self.front);
            self.fwd = &leaf.as_slice()[local..];
        }

        let (item, rest) = self.fwd.split_first()?;
        self.fwd = rest;
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'t, T> DoubleEndedIterator for Iter<'t, T> {
    fn next_back(&mut self) -> Option<&'t T> {
        if self.front == self.back {
            return None;
        }

        if self.bkwd.is_empty() {
            let (leaf, local) = self.root.leaf_containing(self.back - 1);
            self.bkwd = &leaf.as_slice()[..=local];
        }

        let (item, rest) = self.bkwd.split_last()?;
        self.bkwd = rest;
        self.back -= 1;
        Some(item)
    }
}

impl<'t, T> ExactSizeIterator for Iter<'t, T> {}

impl<'t, T> FusedIterator for Iter<'t, T> {}

impl<'t, T> Clone for Iter<'t, T> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

/// An owning iterator over the values in a [`Vector`]
///
/// Because the tree may be shared with other `Vector`s, values are cloned out of it rather than
/// moved. The iterator keeps the tree alive until it's dropped.
///
/// [`Vector`]: crate::Vector
pub struct IntoIter<T> {
    root: NodePtr<T>,
    front: usize,
    back: usize,
    /// The leaf containing `front`
    fwd: Option<LeafRef<T>>,
    /// The leaf containing `back - 1`, and the position *after* `back - 1` within it
    bkwd: Option<(NodePtr<T>, usize)>,
}

impl<T> IntoIter<T> {
    pub(super) fn new(root: NodePtr<T>, len: usize) -> Self {
        IntoIter {
            root,
            front: 0,
            back: len,
            fwd: None,
            bkwd: None,
        }
    }
}

/// Returns the values in a node that's expected to be a leaf
fn leaf_values<T>(node: &Node<T>) -> &[T] {
    node.as_leaf().map(|l| l.as_slice()).unwrap_or(&[])
}

impl<T: Clone> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        let mut leaf = match self.fwd.take() {
            Some(leaf) if !leaf.is_exhausted() => leaf,
            _ => LeafRef::find(&self.root, self.front),
        };

        let item = leaf.advance().cloned();
        self.fwd = Some(leaf);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<T: Clone> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        let (leaf, end) = match self.bkwd.take() {
            Some((leaf, end)) if end > 0 => (leaf, end),
            _ => {
                let (leaf, local) = Node::leaf_ptr_containing(&self.root, self.back - 1);
                (leaf, local + 1)
            }
        };

        let item = leaf_values(&leaf).get(end - 1).cloned();
        self.bkwd = Some((leaf, end - 1));
        self.back -= 1;
        item
    }
}

impl<T: Clone> ExactSizeIterator for IntoIter<T> {}

impl<T: Clone> FusedIterator for IntoIter<T> {}

/// A shared pointer to a leaf, with a position within it
///
/// Holding the pointer keeps the leaf alive (and its values where they are) no matter what happens
/// to the tree it came from.
pub(crate) struct LeafRef<T> {
    leaf: NodePtr<T>,
    pos: usize,
}

impl<T> LeafRef<T> {
    /// Finds the leaf containing `index` in the tree rooted at `root`
    pub(crate) fn find(root: &NodePtr<T>, index: usize) -> Self {
        let (leaf, pos) = Node::leaf_ptr_containing(root, index);
        LeafRef { leaf, pos }
    }

    /// Returns true if the position has moved past the end of the leaf
    pub(crate) fn is_exhausted(&self) -> bool {
        self.pos >= leaf_values(&self.leaf).len()
    }

    /// Returns the value at the current position, and moves the position forwards
    pub(crate) fn advance(&mut self) -> Option<&T> {
        let item = leaf_values(&self.leaf).get(self.pos);
        self.pos += 1;
        item
    }
}

impl<T> Clone for LeafRef<T> {
    fn clone(&self) -> Self {
        LeafRef {
            leaf: Arc::clone(&self.leaf),
            pos: self.pos,
        }
    }
}

impl<T> Clone for IntoIter<T> {
    fn clone(&self) -> Self {
        IntoIter {
            root: Arc::clone(&self.root),
            front: self.front,
            back: self.back,
            fwd: self.fwd.clone(),
            bkwd: self.bkwd.clone(),
        }
    }
}
