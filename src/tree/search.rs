//! Searching: binary search over sorted ranges, and linear scans in either direction

use std::cmp::Ordering;
use std::ops::Range;

use super::node::Node;
use crate::slots::SlotArray;
use crate::span::IndexSpan;

impl<T> Node<T> {
    /// Binary searches the values in `span` with `f`, which returns the ordering of a value
    /// relative to the target
    ///
    /// Returns `Ok` with the index of a matching value, or `Err` with the index at which the
    /// target could be inserted to keep the span sorted. Both are relative to this node, not to
    /// the span. If there are multiple matches, any one of them may be returned.
    pub(super) fn binary_search_by(
        &self,
        span: IndexSpan,
        f: &mut impl FnMut(&T) -> Ordering,
    ) -> Result<usize, usize> {
        let node = match self {
            _ if span.is_empty() => return Err(span.start()),
            Node::Empty => return Err(0),
            Node::Leaf(items) => return items.binary_search_by(span.to_range(), &mut *f),
            Node::Index(node) => node,
        };

        // Find the last child whose first value isn't greater than the target. Only the first
        // child in the span can start before it, so we never look at the first value of that one.
        let mut touching = node.children_touching(span);
        let (mut lo, mut hi) = (*touching.start(), *touching.end());
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            match f(node.children[mid].first()) {
                Ordering::Greater => hi = mid - 1,
                Ordering::Less | Ordering::Equal => lo = mid,
            }
        }

        let child = node.child_span(lo);
        match span.localize(child.start(), child.count()) {
            Some(local) => node.children[lo]
                .binary_search_by(local, f)
                .map(|i| i + child.start())
                .map_err(|i| i + child.start()),
            None => unreachable!("child {lo} selected outside of span {span:?}"),
        }
    }

    /// Returns the index of the first value in `span` that satisfies `pred`
    pub(super) fn find_index(
        &self,
        span: IndexSpan,
        pred: &mut impl FnMut(&T) -> bool,
    ) -> Option<usize> {
        let mut leaf = |items: &SlotArray<T>, range: Range<usize>| {
            items.find_index(range, &mut *pred)
        };
        self.scan(span, false, &mut leaf)
    }

    /// Returns the index of the last value in `span` that satisfies `pred`
    pub(super) fn find_last_index(
        &self,
        span: IndexSpan,
        pred: &mut impl FnMut(&T) -> bool,
    ) -> Option<usize> {
        let mut leaf = |items: &SlotArray<T>, range: Range<usize>| {
            items.find_last_index(range, &mut *pred)
        };
        self.scan(span, true, &mut leaf)
    }

    pub(super) fn index_of(&self, span: IndexSpan, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let mut leaf = |items: &SlotArray<T>, range: Range<usize>| items.index_of(range, item);
        self.scan(span, false, &mut leaf)
    }

    pub(super) fn last_index_of(&self, span: IndexSpan, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let mut leaf = |items: &SlotArray<T>, range: Range<usize>| items.last_index_of(range, item);
        self.scan(span, true, &mut leaf)
    }

    /// Visits the leaves touched by `span` in order (or reverse order, if `rev`), returning the
    /// first index produced by `leaf`
    fn scan(
        &self,
        span: IndexSpan,
        rev: bool,
        leaf: &mut impl FnMut(&SlotArray<T>, Range<usize>) -> Option<usize>,
    ) -> Option<usize> {
        let node = match self {
            _ if span.is_empty() => return None,
            Node::Empty => return None,
            Node::Leaf(items) => return leaf(items, span.to_range()),
            Node::Index(node) => node,
        };

        let mut visit = |c: usize| {
            let child = node.child_span(c);
            let local = span.localize(child.start(), child.count())?;
            let found = node.children[c].scan(local, rev, leaf)?;
            Some(found + child.start())
        };

        let mut touching = node.children_touching(span);
        match rev {
            false => touching.find_map(&mut visit),
            true => touching.rev().find_map(&mut visit),
        }
    }
}
