//! Various collections of unit tests
//!
//! Most of the confidence here comes from the randomized tests in `proptests`, which compare every
//! operation against a plain `Vec`. Whenever one of those finds a problem, the minimized case is
//! added to `manual` as well.

use crate::Vector;

/// Tests that old versions are unaffected by changes to new ones
mod cow;
/// Manually-written test cases
mod manual;
/// Randomized comparison against a `Vec`
mod proptests;

/// Helper to build a `Vector` of `0..n`, one insertion at a time, so that the shape of the tree
/// matches what repeated appends produce
fn appended(n: usize) -> Vector<usize> {
    let mut b = Vector::new().to_builder();
    for i in 0..n {
        b.push(i);
    }
    b.into_immutable()
}

/// Helper to build a `Vector` of `0..n` with every node only about half full, by inserting at
/// the front
fn prepended(n: usize) -> Vector<usize> {
    let mut b = Vector::new().to_builder();
    for i in (0..n).rev() {
        b.insert(0, i).unwrap();
    }
    b.into_immutable()
}
