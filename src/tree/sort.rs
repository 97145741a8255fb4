//! In-tree sorting and reversal
//!
//! Sorting happens bottom-up: each leaf touched by the range is sorted on its own (unless it's
//! already in order), and then every index node merges the sorted runs produced by its children. Merging is done in place by
//! swapping individual values through [`Node::get_mut`], so it never needs a scratch buffer and
//! only copies the nodes it actually writes to. The cost of that is a quadratic worst case for the
//! merge, which is acceptable for the sizes this is used with.
//!
//! The resulting sort is not stable.

use std::cmp::Ordering;
use std::sync::Arc;

use super::iter::Iter;
use super::node::Node;
use crate::slots::CAPACITY;
use crate::span::IndexSpan;

impl<T: Clone> Node<T> {
    /// Sorts the values in `span` according to `cmp`
    ///
    /// The caller is expected to have checked that the span is within the bounds of the node.
    pub(super) fn sort(&mut self, span: IndexSpan, cmp: &mut impl FnMut(&T, &T) -> Ordering) {
        if span.count() < 2 {
            return;
        }

        // Boundaries of the sorted runs left by the children, relative to this node: run `i`
        // covers `runs[i]..runs[i + 1]`.
        let mut runs = [0; CAPACITY + 1];
        let mut run_count = 0;

        match self {
            Node::Empty => return,
            Node::Leaf(items) => {
                items.sort_by(span.to_range(), &mut *cmp);
                return;
            }
            Node::Index(node) => {
                for c in node.children_touching(span) {
                    let child = node.child_span(c);
                    let Some(local) = span.localize(child.start(), child.count()) else {
                        continue;
                    };

                    if !node.children[c].is_sorted_by(local, cmp) {
                        Arc::make_mut(&mut node.children[c]).sort(local, cmp);
                    }
                    runs[run_count] = child.start() + local.start();
                    run_count += 1;
                }
            }
        }

        runs[run_count] = span.end_exclusive();
        self.merge_runs(&runs[..=run_count], cmp);
    }

    /// Returns whether the values in `span` are already in order according to `cmp`
    pub(super) fn is_sorted_by(
        &self,
        span: IndexSpan,
        cmp: &mut impl FnMut(&T, &T) -> Ordering,
    ) -> bool {
        let mut values = Iter::new(self, span);
        let Some(mut prev) = values.next() else {
            return true;
        };
        values.all(|x| {
            let in_order = cmp(prev, x) != Ordering::Greater;
            prev = x;
            in_order
        })
    }

    /// Merges adjacent sorted runs pairwise, doubling the width each pass, until the whole range
    /// is a single sorted run
    fn merge_runs(&mut self, runs: &[usize], cmp: &mut impl FnMut(&T, &T) -> Ordering) {
        let count = runs.len() - 1;
        let mut width = 1;
        while width < count {
            let mut i = 0;
            while i + width < count {
                let end = (i + 2 * width).min(count);
                self.merge_pair(runs[i], runs[i + width], runs[end], cmp);
                i += 2 * width;
            }
            width *= 2;
        }
    }

    /// Merges the sorted runs `lo..mid` and `mid..hi` into one, in place
    fn merge_pair(
        &mut self,
        lo: usize,
        mid: usize,
        hi: usize,
        cmp: &mut impl FnMut(&T, &T) -> Ordering,
    ) {
        // Already in order; nothing to do
        if cmp(self.get(mid - 1), self.get(mid)) != Ordering::Greater {
            return;
        }

        for i in lo..mid {
            if cmp(self.get(i), self.get(mid)) != Ordering::Greater {
                continue;
            }

            // The head of the right-hand run is smaller than everything left in the left-hand
            // run. Swap it into place, then sink the displaced value down the right-hand run until
            // that run is sorted again.
            self.swap(i, mid);
            let mut j = mid;
            while j + 1 < hi && cmp(self.get(j), self.get(j + 1)) == Ordering::Greater {
                self.swap(j, j + 1);
                j += 1;
            }
        }
    }

    /// Reverses the order of the values in `span`
    pub(super) fn reverse(&mut self, span: IndexSpan) {
        if span.count() < 2 {
            return;
        }

        if let Node::Leaf(items) = self {
            items[span.to_range()].reverse();
            return;
        }

        let (mut i, mut j) = (span.start(), span.end_exclusive() - 1);
        while i < j {
            self.swap(i, j);
            i += 1;
            j -= 1;
        }
    }
}
