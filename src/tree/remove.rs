//! Removal of values, and compaction of the tree
//!
//! Removing a value can leave its leaf below the minimum occupancy. When that happens, the leaf
//! is rebalanced with the node immediately to its right: either the two are merged into one, or
//! enough values are moved between them that both meet the minimum again. Merging removes a
//! child from the parent, which can in turn leave the *parent* underfull, so the same process
//! repeats on the way back up.
//!
//! Because nodes don't store sibling pointers, the right-hand neighbor of each node on the path
//! is threaded down through the recursion: for every child except the last, it's the child's own
//! next sibling; for the last child, it's the first child of the parent's right-hand neighbor --
//! its "cousin". The last node on every level has no neighbor, and is allowed to be underfull.
//!
//! Compaction (`trim_excess`) uses the same threading to pull values leftwards until every node
//! except the last on each level is completely full.

use std::sync::Arc;

use super::node::{IndexNode, Node, NodePtr};
use crate::slots::{SlotArray, CAPACITY, MIN_OCCUPANCY};
use crate::span::IndexSpan;

/// What happened to a node's right-hand neighbor after rebalancing against it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Neighbor {
    /// The neighbor still has values in it (even if some were moved)
    Kept,
    /// Everything in the neighbor was moved into the node. The caller must remove it.
    Absorbed,
}

/// Removes the value at `index` from the tree rooted at `root`, returning it
///
/// The caller is expected to have checked that `index < root.count()`.
pub(super) fn remove_at<T: Clone>(root: &mut NodePtr<T>, index: usize) -> T {
    let node = Arc::make_mut(root);
    let (val, _) = node.remove_at(index, None);
    node.collapse_root();
    val
}

/// Removes the last value in the tree rooted at `root`, if there is one
pub(super) fn remove_last<T: Clone>(root: &mut NodePtr<T>) -> Option<T> {
    if root.count() == 0 {
        return None;
    }

    let node = Arc::make_mut(root);
    let val = node.remove_last();
    node.collapse_root();
    Some(val)
}

/// Removes every value in `span` from the tree rooted at `root`
///
/// The caller is expected to have checked that the span is within the bounds of the tree.
pub(super) fn remove_range<T: Clone>(root: &mut NodePtr<T>, span: IndexSpan) {
    let len = root.count();
    if span.is_empty() {
        return;
    } else if span.count() == len {
        *root = Arc::new(Node::Empty);
        return;
    }

    let node = Arc::make_mut(root);
    if span.end_exclusive() == len {
        // Removing from the end never requires rebalancing
        for _ in 0..span.count() {
            node.remove_last();
        }
    } else {
        for _ in 0..span.count() {
            node.remove_at(span.start(), None);
        }
    }
    node.collapse_root();
}

/// Compacts the tree rooted at `root` so that every node, except the last on each level, is full
pub(super) fn trim_excess<T: Clone>(root: &mut NodePtr<T>) {
    if root.count() == 0 {
        return;
    }

    let node = Arc::make_mut(root);
    node.trim(false, None);
    node.collapse_root();
}

impl<T> Node<T> {
    /// Returns whether every node in this subtree is completely full
    fn is_packed(&self) -> bool {
        let mut height = 1;
        let mut node = self;
        while let Node::Index(n) = node {
            height += 1;
            node = &n.children[0];
        }
        CAPACITY
            .checked_pow(height)
            .is_some_and(|max| self.count() == max)
    }

    /// Returns whether every node in this subtree is full, except the last one on each level
    pub(super) fn is_trimmed(&self) -> bool {
        match self {
            Node::Index(node) => match node.children.split_last() {
                Some((last, rest)) => rest.iter().all(|c| c.is_packed()) && last.is_trimmed(),
                None => true,
            },
            Node::Empty | Node::Leaf(_) => true,
        }
    }
}

impl<T: Clone> Node<T> {
    /// Removes the value at `index`, rebalancing against `next` -- the node immediately to the
    /// right of this one on the same level -- if this node becomes underfull
    ///
    /// Returns the removed value, along with whether `next` was absorbed into this node.
    pub(super) fn remove_at(
        &mut self,
        index: usize,
        mut next: Option<&mut NodePtr<T>>,
    ) -> (T, Neighbor) {
        let (val, next_touched) = match self {
            Node::Leaf(items) => (items.remove(index), false),
            Node::Index(node) => node.remove_at(index, next.as_deref_mut()),
            Node::Empty => unreachable!("removal of index {index} from an empty node"),
        };

        (val, self.balance_with(next, next_touched))
    }

    /// Removes the last value in the subtree, which must not be empty
    ///
    /// The last node on each level is exempt from the minimum occupancy, so this never needs to
    /// rebalance. Children that become empty are removed.
    pub(super) fn remove_last(&mut self) -> T {
        match self {
            Node::Leaf(items) => match items.pop() {
                Some(v) => v,
                None => unreachable!("empty leaf in tree"),
            },
            Node::Index(node) => {
                let Some(last) = node.children.last_mut() else {
                    unreachable!("empty index node in tree")
                };
                let last = Arc::make_mut(last);
                let val = last.remove_last();
                if last.slot_len() == 0 {
                    node.children.pop();
                }
                node.count -= 1;
                val
            }
            Node::Empty => unreachable!("removal from an empty node"),
        }
    }

    /// Rebalances this node with `next` if either is underfull
    ///
    /// `next` is only checked if `next_touched` is true -- i.e. if it was modified by the current
    /// operation. Otherwise it's assumed to already satisfy the minimum.
    fn balance_with(&mut self, next: Option<&mut NodePtr<T>>, next_touched: bool) -> Neighbor {
        let Some(next) = next else {
            return Neighbor::Kept;
        };

        let this_len = self.slot_len();
        let next_len = next.slot_len();
        if this_len >= MIN_OCCUPANCY && (!next_touched || next_len >= MIN_OCCUPANCY) {
            return Neighbor::Kept;
        }

        debug_println!("rebalancing nodes with {this_len} and {next_len} slots");
        match (self, Arc::make_mut(next)) {
            (Node::Leaf(lhs), Node::Leaf(rhs)) => balance_slots(lhs, rhs),
            (Node::Index(lhs), Node::Index(rhs)) => {
                let result = balance_slots(&mut lhs.children, &mut rhs.children);
                lhs.recompute();
                rhs.recompute();
                result
            }
            _ => unreachable!("neighboring nodes at different heights"),
        }
    }

    /// Moves values from `next` into this node until this node is full, or `next` runs out
    ///
    /// For index nodes, this happens on every level below: children are pulled in from `next` and
    /// every child is trimmed against its own neighbor. `resume` indicates that the earlier
    /// children were already trimmed by a previous call, and only the last child needs to be
    /// revisited (which happens when the previous `next` was drained and removed).
    ///
    /// Returns whether `next` ended up empty, in which case the caller must remove it.
    fn trim(&mut self, resume: bool, next: Option<&mut NodePtr<T>>) -> Neighbor {
        match self {
            Node::Empty => Neighbor::Kept,
            Node::Leaf(items) => {
                let Some(next) = next else {
                    return Neighbor::Kept;
                };
                if items.is_full() {
                    return Neighbor::Kept;
                }

                let rhs = Arc::make_mut(next).as_leaf_mut();
                let count = items.remaining().min(rhs.len());
                rhs.move_front_into(items, count);
                match rhs.len() {
                    0 => Neighbor::Absorbed,
                    _ => Neighbor::Kept,
                }
            }
            Node::Index(node) => node.trim(resume, next),
        }
    }
}

impl<T: Clone> IndexNode<T> {
    /// Removes the value at `index`, threading `next` down to the last child
    ///
    /// Returns the value and whether `next` was modified.
    fn remove_at(&mut self, index: usize, next: Option<&mut NodePtr<T>>) -> (T, bool) {
        let c = self.child_for(index);
        let local = index - self.offsets[c];
        let mut next_touched = false;

        let val = if c + 1 < self.children.len() {
            let (lhs, rhs) = self.children.split_at_mut(c + 1);
            let child = Arc::make_mut(&mut lhs[c]);
            let (val, sibling) = child.remove_at(local, Some(&mut rhs[0]));
            if sibling == Neighbor::Absorbed {
                self.children.remove(c + 1);
            }
            val
        } else if let Some(next) = next.filter(|n| n.slot_len() != 0) {
            let cousins = Arc::make_mut(next).as_index_mut();
            let child = Arc::make_mut(&mut self.children[c]);
            let (val, cousin) = child.remove_at(local, Some(&mut cousins.children[0]));
            if cousin == Neighbor::Absorbed {
                cousins.children.remove(0);
            }
            cousins.recompute();
            next_touched = true;
            val
        } else {
            let child = Arc::make_mut(&mut self.children[c]);
            child.remove_at(local, None).0
        };

        if self.children[c].slot_len() == 0 {
            self.children.remove(c);
        }
        self.recompute();
        (val, next_touched)
    }

    fn trim(&mut self, resume: bool, mut next: Option<&mut NodePtr<T>>) -> Neighbor {
        let mut c = match resume {
            true => self.children.len().saturating_sub(1),
            false => 0,
        };
        let mut resume_child = resume;

        while c < self.children.len() {
            let is_last = c + 1 == self.children.len();

            // Pull in the next child from our neighbor before trimming the last one, so that it
            // has a neighbor of its own to trim against
            if is_last && !self.children.is_full() {
                if let Some(cousins) = next.as_deref_mut().filter(|n| n.slot_len() != 0) {
                    let cousins = Arc::make_mut(cousins).as_index_mut();
                    self.children.push(cousins.children.remove(0));
                    cousins.recompute();
                    continue;
                }
            }

            // Nothing can move into a full subtree
            if self.children[c].is_packed() {
                c += 1;
                resume_child = false;
                continue;
            }

            let drained = if !is_last {
                let (lhs, rhs) = self.children.split_at_mut(c + 1);
                let drained = Arc::make_mut(&mut lhs[c]).trim(resume_child, Some(&mut rhs[0]));
                if drained == Neighbor::Absorbed {
                    self.children.remove(c + 1);
                }
                drained
            } else if let Some(cousins) = next.as_deref_mut().filter(|n| n.slot_len() != 0) {
                let cousins = Arc::make_mut(cousins).as_index_mut();
                let child = Arc::make_mut(&mut self.children[c]);
                let drained = child.trim(resume_child, Some(&mut cousins.children[0]));
                if drained == Neighbor::Absorbed {
                    cousins.children.remove(0);
                }
                cousins.recompute();
                drained
            } else {
                Arc::make_mut(&mut self.children[c]).trim(resume_child, None)
            };

            // If the neighbor was drained, the child might still have room: go around again
            // without advancing, now with a new neighbor.
            match drained {
                Neighbor::Absorbed => resume_child = true,
                Neighbor::Kept => {
                    c += 1;
                    resume_child = false;
                }
            }
        }

        self.recompute();
        match next {
            Some(n) if n.slot_len() == 0 => Neighbor::Absorbed,
            _ => Neighbor::Kept,
        }
    }
}

/// Rebalances two neighboring arrays so that both meet the minimum occupancy, or merges them if
/// everything fits in one
fn balance_slots<E>(lhs: &mut SlotArray<E>, rhs: &mut SlotArray<E>) -> Neighbor {
    if lhs.len() + rhs.len() <= CAPACITY {
        lhs.append(rhs);
        Neighbor::Absorbed
    } else if lhs.len() < MIN_OCCUPANCY {
        let count = MIN_OCCUPANCY - lhs.len();
        rhs.move_front_into(lhs, count);
        Neighbor::Kept
    } else if rhs.len() < MIN_OCCUPANCY {
        let count = MIN_OCCUPANCY - rhs.len();
        lhs.move_back_into(rhs, count);
        Neighbor::Kept
    } else {
        Neighbor::Kept
    }
}

#[cfg(test)]
mod tests {
    use super::{balance_slots, Neighbor};
    use crate::slots::{SlotArray, MIN_OCCUPANCY};

    fn slots(vals: std::ops::Range<u32>) -> SlotArray<u32> {
        vals.collect()
    }

    #[test]
    fn small_neighbors_merge() {
        let mut lhs = slots(0..3);
        let mut rhs = slots(3..8);
        assert_eq!(balance_slots(&mut lhs, &mut rhs), Neighbor::Absorbed);
        assert_eq!(lhs.as_slice(), [0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(rhs.is_empty());
    }

    #[test]
    fn underfull_left_borrows_from_right() {
        let mut lhs = slots(0..3);
        let mut rhs = slots(3..10);
        assert_eq!(balance_slots(&mut lhs, &mut rhs), Neighbor::Kept);
        assert_eq!(lhs.len(), MIN_OCCUPANCY);
        assert_eq!(rhs.as_slice(), [4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn underfull_right_borrows_from_left() {
        let mut lhs = slots(0..8);
        let mut rhs = slots(8..10);
        assert_eq!(balance_slots(&mut lhs, &mut rhs), Neighbor::Kept);
        assert_eq!(lhs.as_slice(), [0, 1, 2, 3, 4, 5]);
        assert_eq!(rhs.as_slice(), [6, 7, 8, 9]);
    }
}
