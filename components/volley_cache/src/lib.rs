//! volley_cache component
//!
//! The on-disk response cache described in §4.4: binary-framed entries keyed by an
//! opaque cache key, an in-memory LRU index mirroring what's on disk, and byte-budget
//! pruning.
//!
//! Unlike the teacher's `http_cache` (an in-memory `tokio::sync::Mutex<LruCache<..>>`
//! with no disk component), this cache is genuinely disk-backed and is driven from
//! plain OS threads, not async tasks — §5 describes the pipeline's dispatchers as
//! "parallel threads with shared state under explicit mutual exclusion", so the cache
//! uses `std::sync::Mutex` rather than `tokio::sync::Mutex`. The `lru` crate is kept
//! from the teacher's dependency stack for exactly the role it played there: an
//! access-ordered index, just over headers-on-disk instead of full in-memory bodies.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod filename;
mod format;

use filename::filename_for_key;
use lru::LruCache;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, trace, warn};
use volley_errors::VolleyError;
use volley_types::{CacheEntry, CacheHeader, DEFAULT_MAX_CACHE_BYTES, HYSTERESIS_FACTOR};

struct State {
    index: LruCache<String, CacheHeader>,
    total_bytes: u64,
}

/// The on-disk response cache.
///
/// All mutable state lives behind a single mutex: §4.4's pruning contract needs to
/// read and adjust `total_bytes` and the index atomically with respect to a `put`, so
/// splitting them (as the teacher's `http_cache` does, with one lock for the LRU map
/// and a second `RwLock` for the byte counter) would reopen exactly the race the
/// teacher's two-lock design is prone to.
pub struct DiskCache {
    dir: PathBuf,
    max_bytes: u64,
    state: Mutex<State>,
}

impl DiskCache {
    /// Open (or create) a disk cache rooted at `dir` with the given byte budget.
    ///
    /// `max_bytes` of 0 is rejected in favor of [`volley_types::DEFAULT_MAX_CACHE_BYTES`],
    /// matching the config surface's `-1 = default` convention (§6) translated to an
    /// unsigned type.
    pub fn open(dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, VolleyError> {
        let dir = dir.into();
        let max_bytes = if max_bytes == 0 {
            DEFAULT_MAX_CACHE_BYTES
        } else {
            max_bytes
        };

        let cache = Self {
            dir,
            max_bytes,
            state: Mutex::new(State {
                index: LruCache::new(NonZeroUsize::new(usize::MAX).expect("usize::MAX is nonzero")),
                total_bytes: 0,
            }),
        };
        cache.initialize()?;
        Ok(cache)
    }

    /// Create the cache directory if missing; otherwise scan every file, parse its
    /// header, and populate the in-memory index (§4.4 `initialize()`).
    ///
    /// Files are visited oldest-modified-first so the initial LRU order approximates
    /// access recency rather than directory iteration order.
    fn initialize(&self) -> Result<(), VolleyError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .map_err(|e| VolleyError::CacheError(format!("create cache dir: {e}")))?;
            return Ok(());
        }

        let mut entries: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)
            .map_err(|e| VolleyError::CacheError(format!("read cache dir: {e}")))?
        {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }
            let modified = dir_entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            entries.push((path, modified));
        }
        entries.sort_by_key(|(_, modified)| *modified);

        let mut state = self.state.lock().expect("cache mutex poisoned");
        for (path, _) in entries {
            let file = match fs::File::open(&path) {
                Ok(f) => f,
                Err(_) => continue,
            };
            let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);
            let mut reader = BufReader::new(file);
            match format::read_entry(&mut reader) {
                Ok((mut header, _body)) => {
                    header.file_size = file_size;
                    state.total_bytes += file_size;
                    state.index.put(header.key.clone(), header);
                }
                Err(_) => {
                    warn!(path = %path.display(), "dropping corrupt cache file during initialize");
                    let _ = fs::remove_file(&path);
                }
            }
        }
        debug!(entries = state.index.len(), bytes = state.total_bytes, "cache index initialized");
        Ok(())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(filename_for_key(key))
    }

    /// Look up a cache entry by key.
    ///
    /// Returns `None` on miss or on a read/corruption error; a read error also removes
    /// the bad entry (§4.4 `get()` contract).
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let file = fs::File::open(&path).ok()?;
        let mut reader = BufReader::new(file);
        match format::read_entry(&mut reader) {
            Ok((header, body)) => {
                if header.key != key {
                    // filename collision or corruption: treat as a miss and clean up.
                    trace!(key, "cache filename collision or corrupt header, treating as miss");
                    self.remove(key);
                    return None;
                }
                let mut state = self.state.lock().expect("cache mutex poisoned");
                state.index.get(key); // touch: marks most-recently-used
                drop(state);
                Some(header.into_entry(body))
            }
            Err(_) => {
                self.remove(key);
                None
            }
        }
    }

    /// Write (or overwrite) a cache entry.
    ///
    /// Pruning runs first so the new entry's bytes are accounted for against the
    /// budget (§4.4). If the write fails partway through, the partial file is deleted
    /// and no index entry is added for it.
    pub fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), VolleyError> {
        let path = self.path_for(key);
        let mut buf = Vec::new();
        let header = CacheHeader::from_entry(key, entry, 0);
        format::write_entry(&mut buf, &header, &entry.data)
            .map_err(|e| VolleyError::CacheError(format!("encode cache entry: {e}")))?;
        let size = buf.len() as u64;

        {
            let mut state = self.state.lock().expect("cache mutex poisoned");
            self.prune_locked(&mut state, size);
            if let Some(old) = state.index.pop(key) {
                state.total_bytes = state.total_bytes.saturating_sub(old.file_size);
            }
        }

        let write_result = (|| -> std::io::Result<()> {
            let file = fs::File::create(&path)?;
            let mut writer = BufWriter::new(file);
            std::io::Write::write_all(&mut writer, &buf)?;
            std::io::Write::flush(&mut writer)
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&path);
            return Err(VolleyError::CacheError(format!("write cache entry: {e}")));
        }

        let mut header = header;
        header.file_size = size;
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.index.put(key.to_string(), header);
        state.total_bytes += size;
        Ok(())
    }

    /// Evict least-recently-used entries until `total_bytes + incoming < max_bytes *
    /// HYSTERESIS_FACTOR`, but only if the budget would otherwise be exceeded
    /// (`total_bytes + incoming >= max_bytes`), per §4.4.
    fn prune_locked(&self, state: &mut State, incoming: u64) {
        if state.total_bytes + incoming < self.max_bytes {
            return;
        }
        let target = (self.max_bytes as f64 * HYSTERESIS_FACTOR) as u64;
        while state.total_bytes + incoming >= target {
            match state.index.pop_lru() {
                Some((evicted_key, evicted_header)) => {
                    state.total_bytes = state.total_bytes.saturating_sub(evicted_header.file_size);
                    let _ = fs::remove_file(self.path_for(&evicted_key));
                    trace!(key = %evicted_key, "pruned cache entry");
                }
                None => break,
            }
        }
    }

    /// Delete a cache entry, if present.
    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
        let mut state = self.state.lock().expect("cache mutex poisoned");
        if let Some(old) = state.index.pop(key) {
            state.total_bytes = state.total_bytes.saturating_sub(old.file_size);
        }
    }

    /// Mark an entry as needing revalidation: always clears `soft_ttl`, and also
    /// clears `ttl` when `full_expire` is set (§4.4 `invalidate()`).
    pub fn invalidate(&self, key: &str, full_expire: bool) {
        let Some(mut entry) = self.get(key) else {
            return;
        };
        entry.soft_ttl = 0;
        if full_expire {
            entry.ttl = 0;
        }
        let _ = self.put(key, &entry);
    }

    /// Delete every entry and reset the index.
    pub fn clear(&self) -> Result<(), VolleyError> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        for (key, _) in state.index.iter() {
            let _ = fs::remove_file(self.path_for(key));
        }
        state.index.clear();
        state.total_bytes = 0;
        Ok(())
    }

    /// Current total size of cached entries on disk, in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.state.lock().expect("cache mutex poisoned").total_bytes
    }

    /// Number of entries currently indexed.
    pub fn len(&self) -> usize {
        self.state.lock().expect("cache mutex poisoned").index.len()
    }

    /// `true` iff the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The directory this cache is rooted at.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
