use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use super::{appended, prepended};
use crate::tree::node::{Node, NodePtr};
use crate::Vector;

/// Checks that `v` still holds exactly `0..n`, and is still a valid tree
fn assert_untouched(v: &Vector<usize>, n: usize) {
    v.validate();
    assert!(v.iter().copied().eq(0..n));
}

/// Returns the root's first child, which is shared between versions unless it was written to
fn first_child<T>(v: &Vector<T>) -> &NodePtr<T> {
    match &*v.root {
        Node::Index(node) => &node.children[0],
        _ => panic!("expected the root to be an index node"),
    }
}

#[test]
fn diverging_inserts() {
    let base = prepended(78);
    let left = base.insert(1, 1000).unwrap();
    let right = base.insert_range(60, 2000..2027).unwrap();

    left.validate();
    right.validate();
    assert_untouched(&base, 78);

    assert_eq!(left[1], 1000);
    assert_eq!(left.len(), 79);
    assert_eq!(right[60], 2000);
    assert_eq!(right[87], 60);
}

#[test]
fn diverging_removals() {
    let base = prepended(500);
    let mut front = base.clone();
    let mut back = base.clone();
    for _ in 0..200 {
        front = front.remove_at(0).unwrap();
        back = back.remove_at(back.len() - 1).unwrap();
    }

    front.validate();
    back.validate();
    assert_untouched(&base, 500);
    assert!(front.iter().copied().eq(200..500));
    assert!(back.iter().copied().eq(0..300));
}

#[test]
fn reorderings_leave_original() {
    let base = appended(300);
    let reversed = base.reverse();
    let resorted = reversed.sort();
    let halfway = reversed.reverse_range(..150).unwrap();

    assert_untouched(&base, 300);
    assert!(reversed.iter().copied().eq((0..300).rev()));
    assert!(halfway.iter().take(150).copied().eq(150..300));
    assert_eq!(resorted, base);
    assert!(!resorted.ptr_eq(&base));
}

#[test]
fn set_copies_one_path() {
    let base = appended(1000);
    let changed = base.set(999, 0).unwrap();
    assert_untouched(&base, 1000);
    assert_eq!(changed[999], 0);
    assert_eq!(changed.iter().filter(|&&x| x == 0).count(), 2);
}

#[test]
fn trim_leaves_original() {
    let base = prepended(333);
    let trimmed = base.trim_excess();
    trimmed.validate_packed();
    assert_untouched(&base, 333);
    assert_eq!(trimmed, base);
}

#[test]
fn many_versions_from_one_builder() {
    let mut b = Vector::new().to_builder();
    let mut versions = Vec::new();
    for i in 0..100 {
        b.insert(i / 2, i).unwrap();
        versions.push(b.to_immutable());
    }

    let mut model = Vec::new();
    for (i, v) in versions.iter().enumerate() {
        model.insert(i / 2, i);
        v.validate();
        assert_eq!(v.to_vec(), model, "version {i}");
    }
}

#[test]
fn panicking_comparer_leaves_original() {
    let v: Vector<usize> = (0..500).map(|x| (x * 7919) % 500).collect();
    let before = v.to_vec();

    let calls = Cell::new(0);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        v.sort_by(|a, b| {
            calls.set(calls.get() + 1);
            if calls.get() > 200 {
                panic!("comparer gave up");
            }
            a.cmp(b)
        })
    }));

    assert!(result.is_err());
    v.validate();
    assert_eq!(v.to_vec(), before);
}

#[test]
fn panicking_predicate_leaves_original() {
    let v = prepended(300);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        v.remove_all(|&x| {
            assert!(x < 250, "predicate gave up");
            x % 2 == 0
        })
    }));

    assert!(result.is_err());
    assert_untouched(&v, 300);
}

#[test]
fn shared_across_threads() {
    fn assert_send_sync<S: Send + Sync>() {}
    assert_send_sync::<Vector<usize>>();

    let base = appended(5000);
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let v = base.clone();
            thread::spawn(move || {
                let derived = v.insert(t, 10_000).unwrap().remove_range(..100).unwrap();
                derived.validate();
                (v.iter().sum::<usize>(), derived.len())
            })
        })
        .collect();

    for handle in handles {
        let (sum, len) = handle.join().unwrap();
        assert_eq!(sum, (0..5000).sum::<usize>());
        assert_eq!(len, 4901);
    }
    assert_untouched(&base, 5000);
}

#[test]
fn sorting_in_order_values_shares_tree() {
    let v = appended(1000);
    assert!(v.sort().ptr_eq(&v));

    let mut b = v.to_builder();
    b.set(998, 999).unwrap();
    b.set(999, 998).unwrap();
    let nearly = b.into_immutable();

    let sorted = nearly.sort();
    sorted.validate();
    assert_eq!(sorted, v);
    assert!(Arc::ptr_eq(first_child(&sorted), first_child(&nearly)));
}

#[test]
fn trimming_packed_tree_shares_it() {
    let packed = prepended(1000).trim_excess();
    packed.validate_packed();
    assert!(packed.trim_excess().ptr_eq(&packed));

    let holey = packed.remove_at(900).unwrap();
    let trimmed = holey.trim_excess();
    trimmed.validate_packed();
    assert_eq!(trimmed, holey);
    assert!(Arc::ptr_eq(first_child(&trimmed), first_child(&holey)));
}
