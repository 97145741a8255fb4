use proptest::prelude::*;

use crate::{Builder, Vector};

#[derive(Clone, Debug)]
enum Op {
    Push(u16),
    Insert(usize, u16),
    InsertRange(usize, Vec<u16>),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    Pop,
    Set(usize, u16),
    SortRange(usize, usize),
    ReverseRange(usize, usize),
    RemoveAll(u16),
    Trim,
    /// Save the current contents, to check later that they never change
    Snapshot,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let pos = any::<usize>();
    let val = any::<u16>();
    let op = prop_oneof![
        20 => val.clone().prop_map(Op::Push),
        25 => (pos.clone(), val.clone()).prop_map(|(i, v)| Op::Insert(i, v)),
        6 => (pos.clone(), prop::collection::vec(val.clone(), 0..=40))
            .prop_map(|(i, vs)| Op::InsertRange(i, vs)),
        25 => pos.clone().prop_map(Op::RemoveAt),
        4 => (pos.clone(), 0usize..=30).prop_map(|(i, n)| Op::RemoveRange(i, n)),
        5 => Just(Op::Pop),
        8 => (pos.clone(), val).prop_map(|(i, v)| Op::Set(i, v)),
        2 => (pos.clone(), 0usize..=100).prop_map(|(i, n)| Op::SortRange(i, n)),
        2 => (pos.clone(), 0usize..=100).prop_map(|(i, n)| Op::ReverseRange(i, n)),
        1 => (2u16..7).prop_map(Op::RemoveAll),
        1 => Just(Op::Trim),
        1 => Just(Op::Snapshot),
    ];
    prop::collection::vec(op, 0..=400)
}

/// Converts a position and count into a range that's within `0..len`
fn clamp_range(len: usize, pos: usize, count: usize) -> std::ops::Range<usize> {
    let start = pos % (len + 1);
    start..(start + count).min(len)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut b: Builder<u16> = Builder::new();
        let mut m: Vec<u16> = Vec::new();
        let mut snapshots: Vec<(Vector<u16>, Vec<u16>)> = Vec::new();

        for op in ops {
            let len = m.len();
            match op {
                Op::Push(v) => {
                    b.push(v);
                    m.push(v);
                }
                Op::Insert(i, v) => {
                    let i = i % (len + 1);
                    b.insert(i, v).unwrap();
                    m.insert(i, v);
                }
                Op::InsertRange(i, vs) => {
                    let i = i % (len + 1);
                    b.insert_range(i, vs.iter().copied()).unwrap();
                    m.splice(i..i, vs);
                }
                Op::RemoveAt(i) => {
                    if len == 0 {
                        prop_assert!(b.remove_at(i).is_err());
                    } else {
                        let i = i % len;
                        prop_assert_eq!(b.remove_at(i).unwrap(), m.remove(i));
                    }
                }
                Op::RemoveRange(i, n) => {
                    let range = clamp_range(len, i, n);
                    b.remove_range(range.clone()).unwrap();
                    m.drain(range);
                }
                Op::Pop => {
                    prop_assert_eq!(b.pop(), m.pop());
                }
                Op::Set(i, v) => {
                    if len > 0 {
                        let i = i % len;
                        b.set(i, v).unwrap();
                        m[i] = v;
                    }
                }
                Op::SortRange(i, n) => {
                    let range = clamp_range(len, i, n);
                    b.sort_range_by(range.clone(), Ord::cmp).unwrap();
                    m[range].sort();
                }
                Op::ReverseRange(i, n) => {
                    let range = clamp_range(len, i, n);
                    b.reverse_range(range.clone()).unwrap();
                    m[range].reverse();
                }
                Op::RemoveAll(k) => {
                    let removed = b.remove_all(|x| x % k == 0);
                    m.retain(|x| x % k != 0);
                    prop_assert_eq!(removed, len - m.len());
                }
                Op::Trim => {
                    b.trim_excess();
                    b.validate_packed();
                }
                Op::Snapshot => snapshots.push((b.to_immutable(), m.clone())),
            }

            b.validate();
            prop_assert_eq!(b.len(), m.len());
            prop_assert_eq!(b.to_vec(), m.clone());
        }

        for (v, expected) in snapshots {
            v.validate();
            prop_assert_eq!(v.to_vec(), expected);
        }
    }

    #[test]
    fn prop_sort_matches_vec(vals in prop::collection::vec(any::<u8>(), 0..=200)) {
        let v: Vector<u8> = vals.iter().copied().collect();
        let sorted = v.sort();
        sorted.validate();

        let mut expected = vals.clone();
        expected.sort();
        prop_assert_eq!(sorted.to_vec(), expected);
        prop_assert_eq!(v.to_vec(), vals);
    }

    #[test]
    fn prop_binary_search_contract(
        mut vals in prop::collection::vec(0u16..500, 0..=300),
        target in 0u16..500
    ) {
        vals.sort();
        let v: Vector<u16> = vals.iter().copied().collect();

        match v.binary_search(&target) {
            Ok(i) => {
                prop_assert_eq!(v[i], target);
                prop_assert!(vals.binary_search(&target).is_ok());
            }
            Err(i) => {
                prop_assert_eq!(Err(i), vals.binary_search(&target));
                prop_assert!(vals[..i].iter().all(|&x| x < target));
                prop_assert!(vals[i..].iter().all(|&x| x > target));
            }
        }
    }

    #[test]
    fn prop_get_range_matches_slice(
        n in 0usize..=500,
        pos in any::<usize>(),
        count in 0usize..=500
    ) {
        let v: Vector<usize> = (0..n).collect();
        let range = clamp_range(n, pos, count);
        let sub = v.get_range(range.clone()).unwrap();
        sub.validate_packed();
        prop_assert!(sub.iter().copied().eq(range));
    }
}
