use super::{appended, prepended};
use crate::{Error, Vector, CAPACITY};

/// Small xorshift generator, so that "random" test inputs are reproducible
fn shuffled(n: usize, mut seed: u64) -> Vec<usize> {
    let mut vals: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        vals.swap(i, (seed % (i as u64 + 1)) as usize);
    }
    vals
}

#[test]
fn insert_range_into_middle() {
    let v: Vector<i32> = [0, 1, 2, 3, 8, 9, 10, 11, 12, 13, 14].into_iter().collect();
    let v = v.insert_range(4, [4, 5, 6, 7]).unwrap();
    v.validate();
    assert_eq!(v.to_vec(), (0..=14).collect::<Vec<_>>());
}

#[test]
fn remove_everything_gives_empty() {
    let v: Vector<i32> = (0..10).collect();
    let empty = v.remove_range(0..10).unwrap();
    empty.validate();
    assert!(empty.is_empty());
    assert!(empty.ptr_eq(&Vector::new()));
    assert_eq!(empty, Vector::new());
}

#[test]
fn binary_search_missing_string() {
    let v: Vector<&str> = ["apple", "banana", "chocolate", "dog", "food"]
        .into_iter()
        .collect();
    assert_eq!(v.binary_search(&"egg"), Err(4));
    assert_eq!(v.binary_search(&"apple"), Ok(0));
    assert_eq!(v.binary_search(&"aardvark"), Err(0));
    assert_eq!(v.binary_search(&"zebra"), Err(5));
}

#[test]
fn reverse_subrange_of_strings() {
    let v: Vector<&str> = [
        "dog",
        "apple",
        "joke",
        "banana",
        "chocolate",
        "dog",
        "food",
        "Microsoft",
    ]
    .into_iter()
    .collect();

    let reversed = v.reverse_range(2..7).unwrap();
    assert_eq!(
        reversed.to_vec(),
        ["dog", "apple", "food", "dog", "chocolate", "banana", "joke", "Microsoft"],
    );
    // untouched
    assert_eq!(v[2], "joke");
}

#[test]
fn appends_grow_tree() {
    let mut b = Vector::new().to_builder();
    for i in 0..1000 {
        b.push(i);
        if i % 37 == 0 {
            b.validate();
        }
    }

    let v = b.into_immutable();
    v.validate_packed();
    assert_eq!(v.len(), 1000);
    assert!(v.iter().copied().eq(0..1000));
}

#[test]
fn inserts_at_every_position() {
    for n in [0, 1, CAPACITY - 1, CAPACITY, CAPACITY + 1, 70] {
        let base = appended(n);
        for i in 0..=n {
            let v = base.insert(i, 1000).unwrap();
            v.validate();

            let mut expected: Vec<_> = (0..n).collect();
            expected.insert(i, 1000);
            assert_eq!(v.to_vec(), expected, "n = {n}, i = {i}");
        }
    }
}

#[test]
fn insert_range_larger_than_node() {
    let base = prepended(100);
    base.validate();

    for at in [0, 1, 4, 50, 99, 100] {
        let v = base.insert_range(at, 1000..1100).unwrap();
        v.validate();

        let mut expected: Vec<_> = (0..100).collect();
        expected.splice(at..at, 1000..1100);
        assert_eq!(v.to_vec(), expected, "at = {at}");
    }
}

#[test]
fn remove_from_front_and_middle() {
    let mut v = prepended(300);
    let mut expected: Vec<_> = (0..300).collect();

    let mut i = 0;
    while !v.is_empty() {
        let idx = (i * 7) % v.len();
        v = v.remove_at(idx).unwrap();
        expected.remove(idx);
        v.validate();
        i += 1;
    }

    assert!(expected.is_empty());
    assert!(v.ptr_eq(&Vector::new()));
}

#[test]
fn remove_cascades_through_levels() {
    // Removing from the front of a tree where every node is at the minimum forces merges all the
    // way up
    let mut v = prepended(600);
    v.print_tree();

    enable_debug!();
    for _ in 0..10 {
        v = v.remove_at(0).unwrap();
    }
    disable_debug!();

    for _ in 10..550 {
        v = v.remove_at(0).unwrap();
    }

    v.validate();
    assert!(v.iter().copied().eq(550..600));
}

#[test]
fn remove_range_in_middle() {
    let v = appended(500);
    let removed = v.remove_range(100..400).unwrap();
    removed.validate();
    assert!(removed.iter().copied().eq((0..100).chain(400..500)));

    let tail = v.remove_range(250..).unwrap();
    tail.validate();
    assert!(tail.iter().copied().eq(0..250));

    assert!(v.remove_range(10..10).unwrap().ptr_eq(&v));
}

#[test]
fn trim_excess_packs_tree() {
    let v = prepended(777);
    let trimmed = v.trim_excess();
    trimmed.validate_packed();
    assert_eq!(trimmed, v);

    let mut sparse = appended(2000);
    for i in (0..2000).step_by(3).rev() {
        sparse = sparse.remove_at(i).unwrap();
    }
    sparse.validate();

    let trimmed = sparse.trim_excess();
    trimmed.validate_packed();
    assert_eq!(trimmed, sparse);
}

#[test]
fn sort_permutations() {
    for (n, seed) in [(2, 1), (3, 2), (9, 3), (64, 4), (65, 5), (200, 6), (1000, 7)] {
        let vals = shuffled(n, seed);
        let v: Vector<usize> = vals.iter().copied().collect();
        let sorted = v.sort();
        sorted.validate();
        assert!(sorted.iter().copied().eq(0..n), "n = {n}");
        assert_eq!(v.to_vec(), vals);
    }
}

#[test]
fn sort_with_duplicates_and_comparer() {
    let vals: Vec<usize> = shuffled(300, 99).into_iter().map(|x| x % 17).collect();
    let v = Vector::new().add_range(vals.iter().copied());

    let descending = v.sort_by(|a, b| b.cmp(a));
    let mut expected = vals.clone();
    expected.sort_by(|a, b| b.cmp(a));
    assert_eq!(descending.to_vec(), expected);
}

#[test]
fn sort_subrange() {
    let vals = shuffled(100, 11);
    let v: Vector<usize> = vals.iter().copied().collect();
    let partly = v.sort_range_by(20..70, Ord::cmp).unwrap();
    partly.validate();

    let mut expected = vals;
    expected[20..70].sort();
    assert_eq!(partly.to_vec(), expected);

    // fewer than two values: nothing to do
    assert!(v.sort_range_by(5..6, Ord::cmp).unwrap().ptr_eq(&v));
}

#[test]
fn reverse_whole() {
    let v = prepended(150);
    let r = v.reverse();
    r.validate();
    assert!(r.iter().copied().eq((0..150).rev()));
    assert!(r.iter().rev().copied().eq(0..150));
}

#[test]
fn get_range_is_packed() {
    let v = prepended(400);
    let sub = v.get_range(37..301).unwrap();
    sub.validate_packed();
    assert!(sub.iter().copied().eq(37..301));

    assert!(v.get_range(..).unwrap().ptr_eq(&v));
    assert!(v.get_range(5..5).unwrap().is_empty());
}

#[test]
fn convert_all_keeps_shape() {
    let v = prepended(90);
    let strings = v.convert_all(|x| x.to_string());
    strings.validate();
    assert_eq!(strings[42], "42");
    assert_eq!(strings.len(), 90);
}

#[test]
fn remove_all_matching() {
    let v = appended(300);
    let odd = v.remove_all(|x| x % 2 == 0);
    odd.validate_packed();
    assert!(odd.iter().copied().eq((1..300).step_by(2)));

    assert!(v.remove_all(|&x| x > 1000).ptr_eq(&v));
    assert!(v.remove_all(|_| true).is_empty());
}

#[test]
fn remove_value() {
    let v: Vector<&str> = ["a", "b", "c", "b"].into_iter().collect();
    assert_eq!(v.remove(&"b").to_vec(), ["a", "c", "b"]);
    assert!(v.remove(&"z").ptr_eq(&v));
}

#[test]
fn finders() {
    let v: Vector<usize> = (0..100).collect();
    assert_eq!(v.find(|&x| x > 10 && x % 7 == 0), Some(&14));
    assert_eq!(v.find_last(|&x| x % 7 == 0), Some(&98));
    assert!(v.exists(|&x| x == 50));
    assert!(!v.exists(|&x| x == 500));
    assert!(v.true_for_all(|&x| x < 100));
    assert!(Vector::<usize>::new().true_for_all(|_| false));
    assert!(v.contains(&0));

    let mut sum = 0;
    v.for_each(|x| sum += x);
    assert_eq!(sum, 4950);

    let mut dst = [0; 5];
    v.copy_to(10..15, &mut dst).unwrap();
    assert_eq!(dst, [10, 11, 12, 13, 14]);
}

#[test]
fn out_of_bounds_errors() {
    let v = appended(10);

    assert_eq!(v.insert(11, 0), Err(Error::IndexOutOfRange { index: 11, len: 10 }));
    assert_eq!(v.remove_at(10), Err(Error::IndexOutOfRange { index: 10, len: 10 }));
    assert_eq!(v.set(10, 0), Err(Error::IndexOutOfRange { index: 10, len: 10 }));
    assert_eq!(
        v.remove_range(5..11),
        Err(Error::RangeOutOfBounds { start: 5, end: 11, len: 10 })
    );
    assert!(v.insert_range(12, [1, 2]).is_err());
    assert!(v.sort_range_by(3..20, Ord::cmp).is_err());
    assert!(v.reverse_range(11..).is_err());
    assert!(v.get_range(..=10).is_err());
    assert!(v.iter_range(9..11).is_err());
    assert_eq!(v.get(10), None);
    assert_eq!(v.to_vec(), (0..10).collect::<Vec<_>>());
}

#[test]
#[should_panic]
fn index_out_of_bounds_panics() {
    let v = appended(3);
    let _ = v[3];
}

#[test]
fn double_ended_iteration() {
    let v = prepended(100);

    let mut iter = v.iter_range(10..90).unwrap();
    assert_eq!(iter.len(), 80);
    let mut fwd = Vec::new();
    let mut bkwd = Vec::new();
    while let Some(&x) = iter.next() {
        fwd.push(x);
        if let Some(&y) = iter.next_back() {
            bkwd.push(y);
        }
    }
    bkwd.reverse();
    fwd.extend(bkwd);
    assert!(fwd.into_iter().eq(10..90));

    let owned: Vec<usize> = v.clone().into_iter().rev().collect();
    assert!(owned.into_iter().eq((0..100).rev()));
    assert!(v.into_iter().eq(0..100));
}
