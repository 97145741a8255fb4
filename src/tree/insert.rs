//! Insertion of single values and of whole ranges
//!
//! Both operations follow the same shape: recurse down to the leaf containing the insertion
//! point, put the new values there, and hand any overflow back up to the parent as brand-new
//! sibling nodes. The parent splices those siblings in after the child that produced them, which
//! may itself overflow, and so on. If the root overflows, the tree grows a new level on top.
//!
//! When inserting at the very end of the tree, a full node isn't split in half; the new values
//! are started in a fresh node instead. That keeps repeated appends from leaving a trail of
//! half-empty nodes behind, and is what makes collecting from an iterator produce a tree that's
//! already packed.

use std::mem;
use std::sync::Arc;

use super::node::{IndexNode, Node, NodePtr};
use crate::slots::{SlotArray, CAPACITY, MIN_OCCUPANCY};

/// The result of inserting a single value into a node
pub(super) enum Insertion<T> {
    /// The value fit; there's nothing more to do
    Fit,
    /// The node overflowed, and this new node must be inserted directly after it
    Split(Node<T>),
}

/// Inserts `item` at `index` in the tree rooted at `root`, growing the tree if required
///
/// The caller is expected to have checked that `index <= root.count()`.
pub(super) fn insert<T: Clone>(root: &mut NodePtr<T>, index: usize, item: T) {
    let is_append = index == root.count();
    let node = Arc::make_mut(root);

    if let Insertion::Split(sibling) = node.insert(is_append, index, item) {
        debug_println!("root split, tree growing by one level");
        let lhs = mem::replace(node, Node::Empty);
        let children = [Arc::new(lhs), Arc::new(sibling)].into_iter().collect();
        *node = Node::Index(IndexNode::from_children(children));
    }
}

/// Inserts every value from `items` at `index` in the tree rooted at `root`, in order
///
/// The caller is expected to have checked that `index <= root.count()`.
pub(super) fn insert_range<T: Clone>(
    root: &mut NodePtr<T>,
    index: usize,
    items: impl IntoIterator<Item = T>,
) {
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        return;
    }

    let is_append = index == root.count();
    let node = Arc::make_mut(root);
    let mut level = node.insert_range(is_append, index, &mut items);
    if level.is_empty() {
        return;
    }

    level.insert(0, mem::replace(node, Node::Empty));
    while level.len() > 1 {
        debug_println!("wrapping {} nodes into a new level", level.len());
        let mut parents = Vec::with_capacity(level.len().div_ceil(CAPACITY));
        let mut children = SlotArray::new();
        for n in level {
            if children.is_full() {
                let full = mem::take(&mut children);
                parents.push(Node::Index(IndexNode::from_children(full)));
            }
            children.push(Arc::new(n));
        }
        parents.push(Node::Index(IndexNode::from_children(children)));
        level = parents;
    }

    if let Some(new_root) = level.pop() {
        *node = new_root;
    }
}

impl<T: Clone> Node<T> {
    pub(super) fn insert(&mut self, is_append: bool, index: usize, item: T) -> Insertion<T> {
        match self {
            Node::Empty => {
                *self = Node::Leaf(SlotArray::from_one(item));
                Insertion::Fit
            }
            Node::Leaf(items) => match insert_slot(items, is_append, index, item) {
                None => Insertion::Fit,
                Some(next) => Insertion::Split(Node::Leaf(next)),
            },
            Node::Index(node) => match node.insert(is_append, index, item) {
                None => Insertion::Fit,
                Some(next) => Insertion::Split(Node::Index(next)),
            },
        }
    }

    /// Inserts all of `items` at `index`, returning any new nodes that must be placed after this
    /// one, in order
    ///
    /// All of the returned nodes are full except possibly the last, and this node is left full if
    /// any were returned. When `is_append` is false, the last two nodes are balanced so that the
    /// last one -- which won't be last on its level -- meets the minimum occupancy.
    pub(super) fn insert_range(
        &mut self,
        is_append: bool,
        index: usize,
        items: &mut impl Iterator<Item = T>,
    ) -> Vec<Node<T>> {
        match self {
            Node::Empty => {
                *self = Node::Leaf(SlotArray::new());
                self.insert_range(is_append, index, items)
            }
            Node::Leaf(slots) => splice_slots(slots, is_append, index, items)
                .into_iter()
                .map(Node::Leaf)
                .collect(),
            Node::Index(node) => {
                let c = node.child_for(index);
                let local = index - node.offsets[c];
                let child = Arc::make_mut(&mut node.children[c]);
                let new_children = child.insert_range(is_append, local, items);

                if new_children.is_empty() {
                    node.recompute();
                    return Vec::new();
                }

                let new_children = new_children.into_iter().map(Arc::new);
                let extra = splice_slots(&mut node.children, is_append, c + 1, new_children);
                node.recompute();
                extra
                    .into_iter()
                    .map(|children| Node::Index(IndexNode::from_children(children)))
                    .collect()
            }
        }
    }
}

impl<T: Clone> IndexNode<T> {
    fn insert(&mut self, is_append: bool, index: usize, item: T) -> Option<IndexNode<T>> {
        let c = self.child_for(index);
        let local = index - self.offsets[c];
        let child = Arc::make_mut(&mut self.children[c]);

        match child.insert(is_append, local, item) {
            Insertion::Fit => {
                self.grow_after(c, 1);
                None
            }
            Insertion::Split(sibling) => {
                let split = insert_slot(&mut self.children, is_append, c + 1, Arc::new(sibling));
                self.recompute();
                split.map(IndexNode::from_children)
            }
        }
    }
}

/// Inserts a single value into `slots`, splitting off a new array if it was already full
///
/// If a split occurs, the value is inserted into whichever half it belongs in, and the new
/// right-hand half is returned.
fn insert_slot<E>(
    slots: &mut SlotArray<E>,
    is_append: bool,
    idx: usize,
    val: E,
) -> Option<SlotArray<E>> {
    if !slots.is_full() {
        slots.insert(idx, val);
        return None;
    }

    if is_append && idx == slots.len() {
        return Some(SlotArray::from_one(val));
    }

    // After the split, the left half holds `split_point` values and the right holds the rest.
    // An index landing exactly on the split point goes on the right, as the first value there.
    let split_point = (CAPACITY + 1) / 2;
    if idx < split_point {
        let next = slots.split_off(split_point - 1);
        slots.insert(idx, val);
        Some(next)
    } else {
        let mut next = slots.split_off(split_point);
        next.insert(idx - split_point, val);
        Some(next)
    }
}

/// Inserts every value from `vals` into `slots` at `at`, spilling over into as many new arrays
/// as required
///
/// The values originally after `at` are placed after the new ones, at the end of the last array.
fn splice_slots<E>(
    slots: &mut SlotArray<E>,
    is_append: bool,
    at: usize,
    vals: impl Iterator<Item = E>,
) -> Vec<SlotArray<E>> {
    let mut tail = slots.split_off(at);
    let mut extra: Vec<SlotArray<E>> = Vec::new();

    for v in vals {
        let dst = match extra.last_mut() {
            Some(last) => last,
            None => &mut *slots,
        };
        if dst.is_full() {
            extra.push(SlotArray::from_one(v));
        } else {
            dst.push(v);
        }
    }

    let dst = match extra.last_mut() {
        Some(last) => last,
        None => &mut *slots,
    };
    if dst.remaining() >= tail.len() {
        dst.append(&mut tail);
    } else {
        let room = dst.remaining();
        tail.move_front_into(dst, room);
        extra.push(tail);
    }

    if !is_append && !extra.is_empty() {
        let n = extra.len();
        let (prev, last) = if n == 1 {
            (&mut *slots, &mut extra[0])
        } else {
            let (init, last) = extra.split_at_mut(n - 1);
            (&mut init[n - 2], &mut last[0])
        };

        if last.len() < MIN_OCCUPANCY {
            prev.move_back_into(last, MIN_OCCUPANCY - last.len());
        }
    }

    extra
}
