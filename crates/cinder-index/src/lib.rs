//! B+ tree page layouts and leaf iteration for CinderDB.
//!
//! This crate provides the typed views layered over buffer pool frames:
//! - Internal node pages: separator keys and child page ids
//! - Leaf node pages: sorted key/record-id entries chained for range scans
//! - A forward iterator over the leaf chain that holds one pin at a time
//!
//! Node pages are views over `PAGE_SIZE` byte buffers; callers obtain the
//! buffer from a pinned frame and are responsible for unpinning (dirty
//! when mutated) once done.

mod internal;
mod iterator;
mod leaf;
mod types;

pub use internal::BTreeInternalPage;
pub use iterator::IndexIterator;
pub use leaf::BTreeLeafPage;
pub use types::{
    NodeType, Rid, INTERNAL_MAX_SIZE, INTERNAL_PAGE_SIZE, LEAF_MAX_SIZE, LEAF_PAGE_SIZE,
};
