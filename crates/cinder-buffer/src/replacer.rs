//! Page replacement policies for the buffer pool.

use crate::frame::FrameId;
use cinder_common::{CinderError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Trait for page replacement algorithms.
pub trait Replacer: Send + Sync {
    /// Records that the given frame was accessed.
    ///
    /// Fails with [`CinderError::InvalidFrame`] if the frame id is outside
    /// the replacer's capacity.
    fn record_access(&self, frame_id: FrameId) -> Result<()>;

    /// Marks a tracked frame as evictable (unpinned) or not. No-op for
    /// untracked frames.
    fn set_evictable(&self, frame_id: FrameId, evictable: bool);

    /// Selects a victim frame for eviction and stops tracking it.
    ///
    /// Returns None if no frames are evictable.
    fn evict(&self) -> Option<FrameId>;

    /// Stops tracking a frame, regardless of its access history.
    ///
    /// No-op for untracked frames; fails with
    /// [`CinderError::FrameNotEvictable`] if the frame is tracked but
    /// currently pinned.
    fn remove(&self, frame_id: FrameId) -> Result<()>;

    /// Returns the number of evictable frames.
    fn size(&self) -> usize;
}

/// Scans a victim list from its oldest end for an evictable frame.
fn find_evictable(list: &VecDeque<u32>, entries: &HashMap<u32, FrameEntry>) -> Option<u32> {
    list.iter().rev().copied().find(|id| entries[id].evictable)
}

/// Per-frame bookkeeping.
struct FrameEntry {
    /// Monotonically increasing access count.
    hit_count: usize,
    /// Whether the buffer pool allows this frame to be evicted.
    evictable: bool,
}

/// Internal state protected by one mutex; every operation is a short
/// critical section.
struct LruKInner {
    /// Access metadata per tracked frame.
    entries: HashMap<u32, FrameEntry>,
    /// Frames with fewer than K accesses, most recent first. Backward
    /// K-distance is infinite for all of them, so the victim scan drains
    /// this list from the back (oldest first access) before touching the
    /// cache list.
    history: VecDeque<u32>,
    /// Frames with at least K accesses, most recently accessed first.
    cache: VecDeque<u32>,
    /// Number of evictable tracked frames.
    curr_size: usize,
}

impl LruKInner {
    /// Removes `frame_id` from whichever list its hit count places it in.
    fn unlink(&mut self, frame_id: u32, hit_count: usize, k: usize) {
        let list = if hit_count < k {
            &mut self.history
        } else {
            &mut self.cache
        };
        if let Some(pos) = list.iter().position(|&id| id == frame_id) {
            list.remove(pos);
        }
    }
}

/// LRU-K replacement policy.
///
/// The eviction key for a frame is the age of its K-th most recent access.
/// Frames that have not yet been touched K times have an infinite backward
/// K-distance and are evicted first, in order of their earliest access
/// (the history list). Once a frame reaches K accesses it graduates to the
/// cache list, which evicts in least-recently-used order.
pub struct LruKReplacer {
    /// Maximum number of frames the replacer tracks.
    replacer_size: usize,
    /// The K in LRU-K.
    k: usize,
    inner: Mutex<LruKInner>,
}

impl LruKReplacer {
    /// Creates a new LRU-K replacer tracking up to `num_frames` frames.
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self {
            replacer_size: num_frames,
            k: k.max(1),
            inner: Mutex::new(LruKInner {
                entries: HashMap::with_capacity(num_frames),
                history: VecDeque::new(),
                cache: VecDeque::new(),
                curr_size: 0,
            }),
        }
    }

    /// Returns the total capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.replacer_size
    }

    /// Returns the configured K.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&self, frame_id: FrameId) -> Result<()> {
        if frame_id.0 as usize >= self.replacer_size {
            return Err(CinderError::InvalidFrame {
                frame_id: frame_id.0,
            });
        }

        let mut inner = self.inner.lock();
        let entry = inner.entries.entry(frame_id.0).or_insert(FrameEntry {
            hit_count: 0,
            evictable: false,
        });
        entry.hit_count += 1;
        let new_count = entry.hit_count;

        if new_count == self.k {
            // K-th access: graduate to the cache list.
            if new_count > 1 {
                inner.unlink(frame_id.0, new_count - 1, self.k);
            }
            inner.cache.push_front(frame_id.0);
        } else if new_count > self.k {
            // Move to cache front.
            inner.unlink(frame_id.0, new_count, self.k);
            inner.cache.push_front(frame_id.0);
        } else if new_count == 1 {
            // First access below K: join the history list. Later sub-K
            // accesses leave the position untouched (ordering is by first
            // access while the backward K-distance stays infinite).
            inner.history.push_front(frame_id.0);
        }
        Ok(())
    }

    fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.get_mut(&frame_id.0) else {
            return;
        };
        if entry.evictable && !evictable {
            entry.evictable = false;
            inner.curr_size -= 1;
        } else if !entry.evictable && evictable {
            entry.evictable = true;
            inner.curr_size += 1;
        }
    }

    fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        // History list first (infinite backward K-distance), oldest entry
        // at the back; then the cache list likewise.
        let victim = find_evictable(&inner.history, &inner.entries)
            .or_else(|| find_evictable(&inner.cache, &inner.entries))?;

        let hit_count = inner.entries[&victim].hit_count;
        inner.unlink(victim, hit_count, self.k);
        inner.entries.remove(&victim);
        inner.curr_size -= 1;
        Some(FrameId(victim))
    }

    fn remove(&self, frame_id: FrameId) -> Result<()> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.get(&frame_id.0) else {
            return Ok(());
        };
        if !entry.evictable {
            return Err(CinderError::FrameNotEvictable {
                frame_id: frame_id.0,
            });
        }
        let hit_count = entry.hit_count;
        inner.unlink(frame_id.0, hit_count, self.k);
        inner.entries.remove(&frame_id.0);
        inner.curr_size -= 1;
        Ok(())
    }

    fn size(&self) -> usize {
        self.inner.lock().curr_size
    }
}
