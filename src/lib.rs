//! # Bristlecone -- a vector that never forgets
//!
//! This crate primarily exports a single type -- [`Vector`] -- which is a persistent,
//! structurally-shared sequence: every "modification" produces a new `Vector`, and the original
//! is left exactly as it was. Old versions stay valid (and cheap) for as long as anyone holds on
//! to them.
//!
//! ### Notable features
//!
//! * Values are retrieved by index in O(log n) time, over a tree with a branching factor of 8
//! * O(log n) insertion and removal anywhere in the sequence, and O(1) amortized appends
//! * O(1) snapshots -- cloning a [`Vector`] just bumps a reference count. Producing a modified
//!   version copies only the path from the root down to the change; every other node is shared.
//! * Batched editing with a [`Builder`], which copies each shared node at most once and then
//!   mutates it in place for as long as the builder owns it uniquely
//! * In-tree sorting and binary search, plus a [`SortedVector`] built on top of them
//! * Fail-fast enumeration of a changing [`Builder`] with a version-stamped [`Cursor`]
//!
//! ### Example
//!
//! ```
//! use bristlecone::Vector;
//!
//! let v1: Vector<i32> = (0..10).collect();
//! let v2 = v1.insert(3, 100).unwrap();
//!
//! assert_eq!(v1.len(), 10);
//! assert_eq!(v2.len(), 11);
//! assert_eq!(v2[3], 100);
//! assert_eq!(v1[3], 3); // unchanged
//! ```
//!
//! ### Feature flags
//!
//! * `serde` -- implements `Serialize` and `Deserialize` for [`Vector`], as a plain sequence
//! * `fuzz` -- implements `Arbitrary` for [`Vector`] and [`IndexSpan`], and exposes the internal
//!   `validate` methods used by the fuzzing harness
//!
//! ### Naming
//!
//! This library is named after the [Great Basin bristlecone pine], some of which have been alive
//! for close to five thousand years. Old versions of a `Vector` are similarly hard to get rid of.
//!
//! [Great Basin bristlecone pine]: https://en.wikipedia.org/wiki/Pinus_longaeva

#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
mod macros;

mod cursor;
#[cfg(feature = "serde")]
mod serde;
mod slots;
mod sorted;
mod span;
mod tree;

pub use cursor::Cursor;
pub use slots::{CAPACITY, MIN_OCCUPANCY};
pub use sorted::SortedVector;
pub use span::IndexSpan;
pub use tree::{Builder, IntoIter, Iter, Vector};

/// An error from an operation on a [`Vector`], [`Builder`], [`SortedVector`], or [`Cursor`]
///
/// Every error is reported before the operation changes anything: a failed call leaves all
/// vectors and builders exactly as they were.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("range {start}..{end} out of bounds for length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("value could not be found under the active comparer")]
    ValueNotFound,

    #[error("builder modified during enumeration (expected version {expected}, found {actual})")]
    VersionMismatch { expected: u64, actual: u64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
