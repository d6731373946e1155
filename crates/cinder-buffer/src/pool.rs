//! Buffer pool manager.

use crate::disk::DiskManager;
use crate::frame::{Frame, FrameId};
use crate::hashtable::ExtendibleHashTable;
use crate::replacer::{LruKReplacer, Replacer};
use crate::wal::LogManager;
use cinder_common::page::{PageId, PAGE_SIZE};
use cinder_common::{CinderError, Result, StorageConfig};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use sysinfo::System;

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
    /// K for the LRU-K replacement policy.
    pub replacer_k: usize,
    /// Initial per-bucket capacity of the page directory.
    pub bucket_size: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 1024,
            replacer_k: 2,
            bucket_size: 4,
        }
    }
}

impl From<&StorageConfig> for BufferPoolConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            replacer_k: config.replacer_k,
            bucket_size: config.bucket_size,
        }
    }
}

/// Buffer pool manager.
///
/// Mediates all access to fixed-size disk pages:
/// - Page id to frame id mapping through an extendible hash directory
/// - Free frame list for initial allocation
/// - LRU-K replacement for eviction, with write-back of dirty pages
/// - Pin counting so callers can hold `&Frame` handles across the latch
///
/// Every public operation holds the pool latch for its entire duration;
/// within an operation, replacer and directory updates nest under it
/// (lock order is always pool, then replacer).
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of buffer frames.
    frames: Box<[Frame]>,
    /// Page id to frame id directory.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Page replacement policy.
    replacer: LruKReplacer,
    /// Backing storage.
    disk: Arc<dyn DiskManager>,
    /// Write-ahead log handle, passed through to higher layers.
    log_manager: Option<Arc<dyn LogManager>>,
    /// Monotonic page id allocator.
    next_page_id: AtomicI32,
    /// Pool latch guarding the free list; held for the full duration of
    /// every public operation.
    latch: Mutex<VecDeque<FrameId>>,
}

impl BufferPool {
    /// Creates a new buffer pool.
    pub fn new(
        config: BufferPoolConfig,
        disk: Arc<dyn DiskManager>,
        log_manager: Option<Arc<dyn LogManager>>,
    ) -> Self {
        let pool_size = config.pool_size;
        let frames: Vec<_> = (0..pool_size)
            .map(|i| Frame::new(FrameId(i as u32)))
            .collect();
        let free_list: VecDeque<_> = (0..pool_size).map(|i| FrameId(i as u32)).collect();

        Self {
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: LruKReplacer::new(pool_size, config.replacer_k),
            config,
            frames: frames.into_boxed_slice(),
            disk,
            log_manager,
            next_page_id: AtomicI32::new(0),
            latch: Mutex::new(free_list),
        }
    }

    /// Creates a buffer pool sized to 25% of available system RAM, with a
    /// floor of 1,000 frames.
    pub fn auto_sized(
        disk: Arc<dyn DiskManager>,
        log_manager: Option<Arc<dyn LogManager>>,
    ) -> Self {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_bytes = sys.available_memory() as usize;
        let target_bytes = available_bytes / 4;
        let pool_size = (target_bytes / PAGE_SIZE).max(1_000);

        Self::new(
            BufferPoolConfig {
                pool_size,
                ..Default::default()
            },
            disk,
            log_manager,
        )
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.latch.lock().len()
    }

    /// Checks if a page is resident in the buffer pool.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.find(&page_id).is_some()
    }

    /// Returns the write-ahead log handle, if one was configured.
    pub fn log_manager(&self) -> Option<&Arc<dyn LogManager>> {
        self.log_manager.as_ref()
    }

    /// Allocates a fresh page id.
    fn allocate_page_id(&self) -> PageId {
        PageId(self.next_page_id.fetch_add(1, Ordering::AcqRel))
    }

    /// Obtains a usable frame: the free list first, then eviction.
    ///
    /// An evicted frame's outgoing page is written back if dirty and
    /// unmapped from the directory. Fails with
    /// [`CinderError::PoolExhausted`] when every frame is pinned.
    fn acquire_frame(&self, free_list: &mut VecDeque<FrameId>) -> Result<FrameId> {
        if let Some(frame_id) = free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = self.replacer.evict() else {
            return Err(CinderError::PoolExhausted);
        };
        let frame = &self.frames[frame_id.0 as usize];
        let old_page_id = frame.page_id();

        if old_page_id.is_valid() {
            if frame.is_dirty() {
                let data = frame.read_data();
                if let Err(e) = self.disk.write_page(old_page_id, &data) {
                    // Put the victim back so the frame is not orphaned.
                    drop(data);
                    let _ = self.replacer.record_access(frame_id);
                    self.replacer.set_evictable(frame_id, true);
                    return Err(e);
                }
                drop(data);
                frame.set_dirty(false);
                log::debug!("evicted dirty {old_page_id} from {frame_id}, wrote back");
            } else {
                log::trace!("evicted clean {old_page_id} from {frame_id}");
            }
            self.page_table.remove(&old_page_id);
        }
        Ok(frame_id)
    }

    /// Allocates a fresh page and pins it.
    ///
    /// The returned frame is zeroed, mapped in the directory, and pinned
    /// with count 1. Fails with [`CinderError::PoolExhausted`] when every
    /// frame is pinned.
    pub fn new_page(&self) -> Result<(PageId, &Frame)> {
        let mut free_list = self.latch.lock();
        let frame_id = self.acquire_frame(&mut free_list)?;
        let page_id = self.allocate_page_id();

        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id)?;
        self.replacer.set_evictable(frame_id, false);

        Ok((page_id, frame))
    }

    /// Fetches a page, pinning it.
    ///
    /// On a hit the pin count is incremented; on a miss the page is read
    /// from disk into a free or evicted frame. Fails with
    /// [`CinderError::PoolExhausted`] when every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        let mut free_list = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            frame.pin();
            self.replacer.record_access(frame_id)?;
            self.replacer.set_evictable(frame_id, false);
            return Ok(frame);
        }

        let frame_id = self.acquire_frame(&mut free_list)?;
        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();
        {
            let mut data = frame.write_data();
            if let Err(e) = self.disk.read_page(page_id, &mut **data) {
                drop(data);
                frame.reset();
                free_list.push_back(frame_id);
                return Err(e);
            }
        }
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id)?;
        self.replacer.set_evictable(frame_id, false);
        log::trace!("fetched {page_id} from disk into {frame_id}");

        Ok(frame)
    }

    /// Releases one pin on a page.
    ///
    /// `is_dirty = true` latches the dirty flag; it stays set until a
    /// flush or frame reuse clears it. When the pin count reaches zero the
    /// frame becomes evictable. Returns false if the page is not resident
    /// or was not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _latch = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.0 as usize];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Synchronously writes a page to disk, regardless of its dirty flag,
    /// and clears the flag. Returns false if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let _latch = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.0 as usize];
        {
            let data = frame.read_data();
            self.disk.write_page(page_id, &data)?;
        }
        frame.set_dirty(false);
        Ok(true)
    }

    /// Flushes every resident page.
    pub fn flush_all(&self) -> Result<()> {
        let _latch = self.latch.lock();

        for frame in self.frames.iter() {
            let page_id = frame.page_id();
            if !page_id.is_valid() {
                continue;
            }
            {
                let data = frame.read_data();
                self.disk.write_page(page_id, &data)?;
            }
            frame.set_dirty(false);
        }
        Ok(())
    }

    /// Deletes a page from the pool.
    ///
    /// A non-resident page id is deallocated immediately. A pinned page
    /// cannot be deleted (returns false). Otherwise the frame is written
    /// back if dirty, unmapped, reset, returned to the free list, and the
    /// id is deallocated.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut free_list = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            self.disk.deallocate_page(page_id);
            return Ok(true);
        };
        let frame = &self.frames[frame_id.0 as usize];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        if frame.is_dirty() {
            let data = frame.read_data();
            self.disk.write_page(page_id, &data)?;
            drop(data);
            frame.set_dirty(false);
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id)?;
        frame.reset();
        free_list.push_back(frame_id);
        self.disk.deallocate_page(page_id);
        log::debug!("deleted {page_id}, {frame_id} returned to free list");
        Ok(true)
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let _latch = self.latch.lock();

        let mut resident_pages = 0;
        let mut pinned_frames = 0;
        let mut dirty_frames = 0;
        for frame in self.frames.iter() {
            if frame.page_id().is_valid() {
                resident_pages += 1;
                if frame.is_pinned() {
                    pinned_frames += 1;
                }
                if frame.is_dirty() {
                    dirty_frames += 1;
                }
            }
        }

        BufferPoolStats {
            total_frames: self.config.pool_size,
            free_frames: self.config.pool_size - resident_pages,
            resident_pages,
            pinned_frames,
            dirty_frames,
        }
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of frames without a page.
    pub free_frames: usize,
    /// Number of frames holding a page.
    pub resident_pages: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
}
