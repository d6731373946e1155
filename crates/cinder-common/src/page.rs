//! Page identifiers and size constants for CinderDB storage.

use serde::{Deserialize, Serialize};

/// Page size in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Unique identifier for a page on disk.
///
/// Page ids are allocated from a monotonically increasing counter; the
/// sentinel [`PageId::INVALID`] marks an unoccupied frame or the end of a
/// leaf chain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PageId(pub i32);

impl PageId {
    /// Invalid page id sentinel.
    pub const INVALID: PageId = PageId(-1);

    /// Returns true if this is a valid page id.
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Serializes the page id to 4 little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Deserializes a page id from 4 little-endian bytes.
    pub fn from_le_bytes(buf: [u8; 4]) -> Self {
        Self(i32::from_le_bytes(buf))
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}
