//! Write-ahead log seam.
//!
//! The buffer pool does not interpret log records; it only carries a
//! handle that higher layers use for record handoff.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Log Sequence Number - unique identifier for each log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lsn(pub u64);

impl Lsn {
    /// Invalid/uninitialized LSN.
    pub const INVALID: Lsn = Lsn(0);

    /// First valid LSN.
    pub const FIRST: Lsn = Lsn(1);

    /// Returns true if this is a valid LSN.
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for Lsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lsn:{}", self.0)
    }
}

/// Sink for write-ahead log records.
pub trait LogManager: Send + Sync {
    /// Appends a record to the log, returning its assigned LSN.
    fn append(&self, record: Bytes) -> Lsn;

    /// Returns the most recently assigned LSN.
    fn latest_lsn(&self) -> Lsn;
}

/// In-memory log sink for tests and embedded use.
pub struct MemoryLogManager {
    records: Mutex<Vec<Bytes>>,
    next_lsn: AtomicU64,
}

impl Default for MemoryLogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogManager {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_lsn: AtomicU64::new(Lsn::FIRST.0),
        }
    }

    /// Returns a snapshot of all appended records.
    pub fn records(&self) -> Vec<Bytes> {
        self.records.lock().clone()
    }

    /// Returns the number of appended records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if no records have been appended.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogManager for MemoryLogManager {
    fn append(&self, record: Bytes) -> Lsn {
        let mut records = self.records.lock();
        let lsn = Lsn(self.next_lsn.fetch_add(1, Ordering::AcqRel));
        records.push(record);
        lsn
    }

    fn latest_lsn(&self) -> Lsn {
        let next = self.next_lsn.load(Ordering::Acquire);
        Lsn(next.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsn_validity() {
        assert!(!Lsn::INVALID.is_valid());
        assert!(Lsn::FIRST.is_valid());
        assert!(Lsn(42).is_valid());
    }

    #[test]
    fn test_lsn_display() {
        assert_eq!(Lsn(7).to_string(), "lsn:7");
    }

    #[test]
    fn test_memory_log_append() {
        let log = MemoryLogManager::new();
        assert!(log.is_empty());
        assert_eq!(log.latest_lsn(), Lsn::INVALID);

        let lsn1 = log.append(Bytes::from_static(b"first"));
        let lsn2 = log.append(Bytes::from_static(b"second"));

        assert_eq!(lsn1, Lsn(1));
        assert_eq!(lsn2, Lsn(2));
        assert_eq!(log.latest_lsn(), Lsn(2));
        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].as_ref(), b"first");
        assert_eq!(log.records()[1].as_ref(), b"second");
    }
}
