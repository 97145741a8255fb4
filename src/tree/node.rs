//! Management of nodes
//!
//! The tree is a B+tree: elements live only in the leaves, and every level above that is made of
//! [`IndexNode`]s, which store pointers to their children alongside a prefix sum of the children's
//! sizes (the "offsets"). All leaves are at the same depth.
//!
//! Nodes are shared between versions of the tree through [`Arc`]s. A node is *frozen* exactly
//! when something other than the current writer can also see it -- i.e. when its strong count is
//! greater than one -- so all writes go through [`Arc::make_mut`], which clones the node first if
//! it's shared. Cloning a node is shallow: a leaf clones its (at most [`CAPACITY`]) elements and
//! an index node just bumps the reference counts of its children. The first write after a share
//! point therefore copies exactly the path from the root down to the change; subsequent writes
//! along the same path find those nodes uniquely owned and mutate them in place.
//!
//! Aside from the root, no node is ever [`Node::Empty`], and no leaf or index node ever has zero
//! slots occupied for longer than a single operation. Every node except the last one on its level
//! holds at least [`MIN_OCCUPANCY`](crate::MIN_OCCUPANCY) slots.
//!
//! Nodes store no parent or sibling pointers (those couldn't be shared between versions), so any
//! algorithm that needs the node immediately to the right -- removal and compaction, notably --
//! passes it down through the recursion explicitly.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

#[cfg(any(test, feature = "fuzz"))]
use crate::slots::MIN_OCCUPANCY;
use crate::slots::{SlotArray, CAPACITY};
use crate::span::IndexSpan;

/// Helper alias for a (possibly shared) pointer to a node
pub(crate) type NodePtr<T> = Arc<Node<T>>;

/// A single node in the tree
#[derive(Clone)]
pub(crate) enum Node<T> {
    /// The root of a tree without any elements. Never appears below the root.
    Empty,
    /// A leaf node, holding between 1 and [`CAPACITY`] elements
    Leaf(SlotArray<T>),
    /// An internal node, holding between 1 and [`CAPACITY`] children
    Index(IndexNode<T>),
}

/// The contents of an internal node
#[derive(Clone)]
pub(crate) struct IndexNode<T> {
    pub(super) children: SlotArray<NodePtr<T>>,
    /// `offsets[i]` is the sum of the sizes of all children before child `i`
    ///
    /// Only the first `children.len()` offsets are meaningful.
    pub(super) offsets: [usize; CAPACITY],
    /// Cached total number of elements in the subtree
    pub(super) count: usize,
}

/// Rules applied by [`Node::validate`]
#[cfg(any(test, feature = "fuzz"))]
#[derive(Debug, Copy, Clone)]
pub(super) struct ValidationRules {
    /// Require every node except the last on each level to be completely full, as it should be
    /// after `trim_excess`
    pub(super) packed: bool,
}

impl<T> Node<T> {
    /// Returns the number of elements in the subtree rooted at this node
    pub(super) fn count(&self) -> usize {
        match self {
            Node::Empty => 0,
            Node::Leaf(items) => items.len(),
            Node::Index(node) => node.count,
        }
    }

    /// Returns the number of occupied slots in the node itself -- elements for a leaf, children
    /// for an index node
    pub(super) fn slot_len(&self) -> usize {
        match self {
            Node::Empty => 0,
            Node::Leaf(items) => items.len(),
            Node::Index(node) => node.children.len(),
        }
    }

    /// Returns the element at `index`
    ///
    /// The caller is expected to have already checked that `index < self.count()`.
    pub(super) fn get(&self, index: usize) -> &T {
        let mut node = self;
        let mut index = index;
        loop {
            match node {
                Node::Leaf(items) => return &items[index],
                Node::Index(n) => {
                    let c = n.child_for(index);
                    index -= n.offsets[c];
                    node = &n.children[c];
                }
                Node::Empty => unreachable!("lookup of index {index} in an empty node"),
            }
        }
    }

    /// Returns the first element in the subtree
    pub(super) fn first(&self) -> &T {
        self.get(0)
    }

    /// Returns the leaf containing `index`, along with the position of `index` within it
    pub(super) fn leaf_containing(&self, index: usize) -> (&SlotArray<T>, usize) {
        let mut node = self;
        let mut index = index;
        loop {
            match node {
                Node::Leaf(items) => return (items, index),
                Node::Index(n) => {
                    let c = n.child_for(index);
                    index -= n.offsets[c];
                    node = &n.children[c];
                }
                Node::Empty => unreachable!("lookup of index {index} in an empty node"),
            }
        }
    }

    /// Like [`leaf_containing`], but returns a shared pointer to the leaf instead of a borrow
    ///
    /// [`leaf_containing`]: Self::leaf_containing
    pub(super) fn leaf_ptr_containing(this: &NodePtr<T>, index: usize) -> (NodePtr<T>, usize) {
        let mut node = this;
        let mut index = index;
        loop {
            match &**node {
                Node::Leaf(_) => return (Arc::clone(node), index),
                Node::Index(n) => {
                    let c = n.child_for(index);
                    index -= n.offsets[c];
                    node = &n.children[c];
                }
                Node::Empty => unreachable!("lookup of index {index} in an empty node"),
            }
        }
    }

    /// Returns the leaf contents, if this is a leaf
    pub(super) fn as_leaf(&self) -> Option<&SlotArray<T>> {
        match self {
            Node::Leaf(items) => Some(items),
            _ => None,
        }
    }

    pub(super) fn as_leaf_mut(&mut self) -> &mut SlotArray<T> {
        match self {
            Node::Leaf(items) => items,
            _ => unreachable!("expected a leaf node"),
        }
    }

    pub(super) fn as_index_mut(&mut self) -> &mut IndexNode<T> {
        match self {
            Node::Index(n) => n,
            _ => unreachable!("expected an index node"),
        }
    }

    /// Produces a tree of the same shape, with each element converted by `f`
    pub(super) fn convert_all<U>(&self, f: &mut impl FnMut(&T) -> U) -> Node<U> {
        match self {
            Node::Empty => Node::Empty,
            Node::Leaf(items) => Node::Leaf(items.map(f)),
            Node::Index(n) => Node::Index(IndexNode {
                children: n.children.map(|c| Arc::new(c.convert_all(f))),
                offsets: n.offsets,
                count: n.count,
            }),
        }
    }
}

impl<T: Clone> Node<T> {
    /// Replaces a root that has become degenerate -- an index node with a single child, or a node
    /// with nothing in it -- until it isn't
    ///
    /// This is the only way the height of the tree ever decreases.
    pub(super) fn collapse_root(&mut self) {
        loop {
            match self {
                Node::Index(n) if n.children.len() == 1 => {
                    let child = n.children.pop().map(Arc::unwrap_or_clone);
                    debug_println!("collapsing root into its only child");
                    *self = child.unwrap_or(Node::Empty);
                }
                Node::Index(n) if n.children.is_empty() => *self = Node::Empty,
                Node::Leaf(items) if items.is_empty() => *self = Node::Empty,
                _ => return,
            }
        }
    }

    /// Returns a mutable reference to the element at `index`, copying any shared nodes on the
    /// way down
    ///
    /// The caller is expected to have already checked that `index < self.count()`.
    pub(super) fn get_mut(&mut self, index: usize) -> &mut T {
        match self {
            Node::Leaf(items) => &mut items[index],
            Node::Index(n) => {
                let c = n.child_for(index);
                let local = index - n.offsets[c];
                Arc::make_mut(&mut n.children[c]).get_mut(local)
            }
            Node::Empty => unreachable!("lookup of index {index} in an empty node"),
        }
    }

    /// Swaps the elements at indexes `i` and `j`
    pub(super) fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }

        let fst = self.get(i).clone();
        let snd = std::mem::replace(self.get_mut(j), fst);
        *self.get_mut(i) = snd;
    }
}

impl<T> IndexNode<T> {
    /// Creates a new index node from its children, computing the offsets
    pub(super) fn from_children(children: SlotArray<NodePtr<T>>) -> Self {
        let mut this = IndexNode {
            children,
            offsets: [0; CAPACITY],
            count: 0,
        };
        this.recompute();
        this
    }

    /// Recalculates all of the offsets and the total count from the children
    pub(super) fn recompute(&mut self) {
        let mut total = 0;
        for (i, c) in self.children.iter().enumerate() {
            self.offsets[i] = total;
            total += c.count();
        }
        self.count = total;
    }

    /// Adjusts the offsets of every child after `child` (and the total count) to account for
    /// `child` having grown by `by` elements
    pub(super) fn grow_after(&mut self, child: usize, by: usize) {
        for off in &mut self.offsets[child + 1..self.children.len()] {
            *off += by;
        }
        self.count += by;
    }

    /// Returns the index of the child containing the element at `index`: the last child whose
    /// offset is not greater than `index`
    ///
    /// An index equal to the size of the node maps to the last child.
    pub(super) fn child_for(&self, index: usize) -> usize {
        let offsets = &self.offsets[..self.children.len()];
        // offsets[0] is always zero, so this is always at least one.
        offsets.partition_point(|&o| o <= index) - 1
    }

    /// Returns the span of the element indexes covered by child `c`, relative to this node
    pub(super) fn child_span(&self, c: usize) -> IndexSpan {
        IndexSpan::new(self.offsets[c], self.children[c].count())
    }

    /// Returns the range of children that intersect with `span`, which must be non-empty
    pub(super) fn children_touching(&self, span: IndexSpan) -> std::ops::RangeInclusive<usize> {
        self.child_for(span.start())..=self.child_for(span.end_exclusive() - 1)
    }
}

#[cfg(any(test, feature = "fuzz"))]
impl<T> Node<T> {
    /// Checks all of the structural invariants of the subtree, panicking if any are violated
    ///
    /// `is_last` is whether this node is the last on its level, and so whether it's exempt from
    /// the minimum occupancy requirement. `leaf_depth` is filled in by the first leaf found, so
    /// that the depths of all other leaves can be compared against it.
    pub(super) fn validate(
        &self,
        rules: ValidationRules,
        path: &mut Vec<usize>,
        is_last: bool,
        leaf_depth: &mut Option<usize>,
    ) {
        let is_root = path.is_empty();
        let len = self.slot_len();

        valid_assert!(path: len <= CAPACITY);
        if !is_root {
            valid_assert!(path: len >= 1);
        }
        if !is_last {
            valid_assert!(path: len >= MIN_OCCUPANCY);
            if rules.packed {
                valid_assert_eq!(path: len, CAPACITY);
            }
        }

        match self {
            Node::Empty => valid_assert!(path: is_root),
            Node::Leaf(_) => match *leaf_depth {
                None => *leaf_depth = Some(path.len()),
                Some(d) => valid_assert_eq!(path: path.len(), d),
            },
            Node::Index(n) => {
                if is_root {
                    valid_assert!(path: len >= 2);
                }

                let mut total = 0;
                for (i, child) in n.children.iter().enumerate() {
                    path.push(i);
                    valid_assert_eq!(path: n.offsets[i], total);
                    valid_assert!(path: !matches!(**child, Node::Empty));
                    total += child.count();
                    child.validate(rules, path, is_last && i + 1 == len, leaf_depth);
                    path.pop();
                }

                valid_assert_eq!(path: n.count, total);
            }
        }
    }
}

impl<T: Debug> Debug for Node<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::Leaf(items) => f.debug_tuple("Leaf").field(items).finish(),
            Node::Index(n) => f
                .debug_struct("Index")
                .field("count", &n.count)
                .field("offsets", &&n.offsets[..n.children.len()])
                .field("children", &n.children)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexNode, Node};
    use crate::slots::SlotArray;
    use std::sync::Arc;

    fn leaf(vals: &[u32]) -> Arc<Node<u32>> {
        Arc::new(Node::Leaf(vals.iter().copied().collect()))
    }

    #[test]
    fn child_lookup_uses_offsets() {
        let node = IndexNode::from_children(
            [leaf(&[0, 1, 2, 3]), leaf(&[4, 5, 6, 7, 8]), leaf(&[9, 10])]
                .into_iter()
                .collect::<SlotArray<_>>(),
        );

        assert_eq!(&node.offsets[..3], [0, 4, 9]);
        assert_eq!(node.count, 11);
        assert_eq!(node.child_for(0), 0);
        assert_eq!(node.child_for(3), 0);
        assert_eq!(node.child_for(4), 1);
        assert_eq!(node.child_for(10), 2);
        // one past the end maps to the last child, for appending
        assert_eq!(node.child_for(11), 2);

        let root = Node::Index(node);
        for i in 0..11 {
            assert_eq!(*root.get(i), i as u32);
        }
        assert_eq!(root.leaf_containing(6).1, 2);
    }

    #[test]
    fn writes_copy_only_shared_nodes() {
        let shared = leaf(&[0, 1, 2, 3]);
        let other = leaf(&[4, 5, 6, 7]);
        let mut root = Node::Index(IndexNode::from_children(
            [shared.clone(), other.clone()].into_iter().collect(),
        ));
        drop(other);

        *root.get_mut(1) = 100;
        *root.get_mut(5) = 500;

        // `shared` was copied, not written through
        assert_eq!(shared.as_leaf().unwrap().as_slice(), [0, 1, 2, 3]);
        assert_eq!(*root.get(1), 100);
        assert_eq!(*root.get(5), 500);
    }

    #[test]
    fn collapse_removes_single_child_roots() {
        let inner = Node::Index(IndexNode::from_children([leaf(&[1, 2])].into_iter().collect()));
        let mut root = Node::Index(IndexNode::from_children(
            [Arc::new(inner)].into_iter().collect(),
        ));
        root.collapse_root();
        assert_eq!(root.as_leaf().unwrap().as_slice(), [1, 2]);
    }
}
