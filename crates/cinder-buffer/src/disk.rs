//! Disk manager for page-level file I/O.

use cinder_common::page::{PageId, PAGE_SIZE};
use cinder_common::{CinderError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Page-granular storage the buffer pool reads from and writes to.
///
/// Writes are durable on return when fsync is enabled; otherwise the
/// implementation defines the durability point.
pub trait DiskManager: Send + Sync {
    /// Reads a page into the provided buffer.
    fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()>;

    /// Writes a page-sized block for the given page id.
    fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()>;

    /// Advises that a page id is no longer in use. Advisory only; the
    /// default implementation does nothing.
    fn deallocate_page(&self, _page_id: PageId) {}
}

/// Configuration for the file-backed disk manager.
#[derive(Debug, Clone)]
pub struct FileDiskManagerConfig {
    /// Path to the data file.
    pub path: PathBuf,
    /// Enable fsync after writes.
    pub fsync_enabled: bool,
}

impl Default for FileDiskManagerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./cinder.db"),
            fsync_enabled: true,
        }
    }
}

/// Disk manager backed by a single data file.
///
/// Page `n` lives at byte offset `n * PAGE_SIZE`. Reading a page that has
/// never been written zero-fills the buffer; writing past the current end
/// extends the file.
pub struct FileDiskManager {
    config: FileDiskManagerConfig,
    file: Mutex<File>,
}

impl FileDiskManager {
    /// Creates a disk manager, creating the data file if needed.
    pub fn new(config: FileDiskManagerConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&config.path)?;
        Ok(Self {
            config,
            file: Mutex::new(file),
        })
    }

    /// Opens a data file at the given path with default options.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(FileDiskManagerConfig {
            path: path.into(),
            ..Default::default()
        })
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns the number of whole pages currently in the file.
    pub fn num_pages(&self) -> Result<u32> {
        let file = self.file.lock();
        let len = file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    fn offset_of(page_id: PageId) -> u64 {
        (page_id.0 as u64) * (PAGE_SIZE as u64)
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(CinderError::PageNotFound { page_id: page_id.0 });
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;

        // A short read past EOF is a freshly allocated page.
        let mut filled = 0;
        while filled < PAGE_SIZE {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf[filled..].fill(0);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(CinderError::PageNotFound { page_id: page_id.0 });
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        file.write_all(data)?;

        if self.config.fsync_enabled {
            file.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_disk(dir: &tempfile::TempDir) -> FileDiskManager {
        FileDiskManager::new(FileDiskManagerConfig {
            path: dir.path().join("test.db"),
            fsync_enabled: false,
        })
        .unwrap()
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempdir().unwrap();
        let disk = make_disk(&dir);

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0xAB;
        data[PAGE_SIZE - 1] = 0xCD;
        disk.write_page(PageId(0), &data).unwrap();

        let mut read = [0u8; PAGE_SIZE];
        disk.read_page(PageId(0), &mut read).unwrap();
        assert_eq!(read[0], 0xAB);
        assert_eq!(read[PAGE_SIZE - 1], 0xCD);
    }

    #[test]
    fn test_read_unwritten_page_zero_fills() {
        let dir = tempdir().unwrap();
        let disk = make_disk(&dir);

        let mut buf = [0xFFu8; PAGE_SIZE];
        disk.read_page(PageId(7), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_page_id_rejected() {
        let dir = tempdir().unwrap();
        let disk = make_disk(&dir);

        let mut buf = [0u8; PAGE_SIZE];
        assert!(matches!(
            disk.read_page(PageId::INVALID, &mut buf),
            Err(CinderError::PageNotFound { page_id: -1 })
        ));
        assert!(matches!(
            disk.write_page(PageId::INVALID, &buf),
            Err(CinderError::PageNotFound { page_id: -1 })
        ));
    }

    #[test]
    fn test_sparse_pages_are_independent() {
        let dir = tempdir().unwrap();
        let disk = make_disk(&dir);

        let a = [1u8; PAGE_SIZE];
        let b = [2u8; PAGE_SIZE];
        disk.write_page(PageId(0), &a).unwrap();
        disk.write_page(PageId(3), &b).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        disk.read_page(PageId(0), &mut buf).unwrap();
        assert_eq!(buf[0], 1);
        disk.read_page(PageId(3), &mut buf).unwrap();
        assert_eq!(buf[0], 2);
        // The gap reads as zeroes.
        disk.read_page(PageId(1), &mut buf).unwrap();
        assert_eq!(buf[0], 0);

        assert_eq!(disk.num_pages().unwrap(), 4);
    }

    #[test]
    fn test_persistence_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let disk = FileDiskManager::open(&path).unwrap();
            let data = [0x5Au8; PAGE_SIZE];
            disk.write_page(PageId(1), &data).unwrap();
        }

        let disk = FileDiskManager::open(&path).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        disk.read_page(PageId(1), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_deallocate_is_advisory() {
        let dir = tempdir().unwrap();
        let disk = make_disk(&dir);

        let data = [9u8; PAGE_SIZE];
        disk.write_page(PageId(0), &data).unwrap();
        disk.deallocate_page(PageId(0));

        // Bytes are untouched; reuse is the allocator's concern.
        let mut buf = [0u8; PAGE_SIZE];
        disk.read_page(PageId(0), &mut buf).unwrap();
        assert_eq!(buf[0], 9);
    }
}
