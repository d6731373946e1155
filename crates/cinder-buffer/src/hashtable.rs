//! Concurrent extendible hash table.
//!
//! Used by the buffer pool as its page id to frame id directory, and usable
//! as a general-purpose lookup structure. The directory is a power-of-two
//! vector of shared bucket handles; splitting a full bucket only redirects
//! the directory slots that pointed at it, and doubling the directory
//! copies handles, so references held across an expansion stay valid.

use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A bucket holding up to `capacity` entries at some local depth.
struct Bucket<K, V> {
    /// Local depth: `2^(global - local)` directory slots share this bucket.
    depth: usize,
    capacity: usize,
    items: Vec<(K, V)>,
}

impl<K: PartialEq, V> Bucket<K, V> {
    fn new(capacity: usize, depth: usize) -> Self {
        Self {
            depth,
            capacity,
            items: Vec::with_capacity(capacity),
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn remove(&mut self, key: &K) -> bool {
        if let Some(pos) = self.items.iter().position(|(k, _)| k == key) {
            self.items.remove(pos);
            true
        } else {
            false
        }
    }
}

type BucketRef<K, V> = Arc<Mutex<Bucket<K, V>>>;

/// Directory state behind the table latch.
struct Directory<K, V> {
    /// log2 of the directory size.
    global_depth: usize,
    /// Number of physically distinct buckets.
    num_buckets: usize,
    dir: Vec<BucketRef<K, V>>,
}

/// Thread-safe extendible hash table.
///
/// One mutex serializes table operations; bucket handles are shared
/// (`Arc`) so directory doubling copies handles rather than buckets.
pub struct ExtendibleHashTable<K, V> {
    bucket_size: usize,
    latch: Mutex<Directory<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V>
where
    K: Hash + PartialEq + Clone,
    V: Clone,
{
    /// Creates a table with a single empty bucket and global depth 0.
    pub fn new(bucket_size: usize) -> Self {
        let bucket_size = bucket_size.max(1);
        Self {
            bucket_size,
            latch: Mutex::new(Directory {
                global_depth: 0,
                num_buckets: 1,
                dir: vec![Arc::new(Mutex::new(Bucket::new(bucket_size, 0)))],
            }),
        }
    }

    fn hash_of(key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Directory slot for a key at the given global depth.
    fn index_of(key: &K, global_depth: usize) -> usize {
        let mask = (1usize << global_depth) - 1;
        (Self::hash_of(key) as usize) & mask
    }

    /// Returns the global depth of the directory.
    pub fn global_depth(&self) -> usize {
        self.latch.lock().global_depth
    }

    /// Returns the local depth of the bucket at the given directory index.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        self.latch.lock().dir[dir_index].lock().depth
    }

    /// Returns the number of physically distinct buckets.
    pub fn num_buckets(&self) -> usize {
        self.latch.lock().num_buckets
    }

    /// Looks up the value associated with a key.
    pub fn find(&self, key: &K) -> Option<V> {
        let inner = self.latch.lock();
        let bucket = inner.dir[Self::index_of(key, inner.global_depth)].clone();
        let bucket = bucket.lock();
        bucket.get(key).cloned()
    }

    /// Removes a key. Returns false if the key was absent.
    pub fn remove(&self, key: &K) -> bool {
        let inner = self.latch.lock();
        let bucket = inner.dir[Self::index_of(key, inner.global_depth)].clone();
        let mut bucket = bucket.lock();
        bucket.remove(key)
    }

    /// Inserts a key-value pair, overwriting any existing value.
    ///
    /// While the target bucket is full: double the directory if the
    /// bucket's local depth has caught up with the global depth, then
    /// split the bucket on hash bit `local_depth`, redirecting every
    /// directory slot that pointed at it.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.latch.lock();

        loop {
            let idx = Self::index_of(&key, inner.global_depth);
            let target = inner.dir[idx].clone();
            let mut bucket = target.lock();

            if let Some(slot) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
                return;
            }
            if !bucket.is_full() {
                bucket.items.push((key, value));
                return;
            }

            // Full bucket: grow the directory if needed, then split.
            let local_depth = bucket.depth;
            if local_depth == inner.global_depth {
                let capacity = inner.dir.len();
                for i in 0..capacity {
                    let handle = inner.dir[i].clone();
                    inner.dir.push(handle);
                }
                inner.global_depth += 1;
                log::debug!(
                    "hash directory doubled to global depth {}",
                    inner.global_depth
                );
            }

            let mask = 1usize << local_depth;
            let zero = Arc::new(Mutex::new(Bucket::new(self.bucket_size, local_depth + 1)));
            let one = Arc::new(Mutex::new(Bucket::new(self.bucket_size, local_depth + 1)));
            for (k, v) in bucket.items.drain(..) {
                let hash = Self::hash_of(&k) as usize;
                if hash & mask != 0 {
                    one.lock().items.push((k, v));
                } else {
                    zero.lock().items.push((k, v));
                }
            }
            drop(bucket);

            for (i, slot) in inner.dir.iter_mut().enumerate() {
                if Arc::ptr_eq(slot, &target) {
                    *slot = if i & mask != 0 { one.clone() } else { zero.clone() };
                }
            }
            inner.num_buckets += 1;
        }
    }
}
