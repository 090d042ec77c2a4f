//! The buffer manager - an LRU-cached, capacity-bounded mapping from
//! `(table, page id)` to resident pages, backed by the disk manager.

use std::collections::HashMap;

use crate::buffer::replacer::LruReplacer;
use crate::buffer::stats::BufferPoolStats;
use crate::common::{PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

struct Frame {
    page: Page,
    dirty: bool,
}

type Key = (String, PageId);

/// Caches table pages in memory, evicting the least-recently-used entry
/// once `capacity` is reached and writing dirty victims back first.
///
/// # Example
/// ```
/// use pageforge::buffer::BufferManager;
/// use pageforge::common::{Row, Value};
/// use tempfile::tempdir;
///
/// let dir = tempdir().unwrap();
/// let mut bm = BufferManager::open(dir.path(), 2).unwrap();
/// let page_id = bm.new_page("widgets").unwrap();
/// let page = bm.get_page_mut("widgets", page_id).unwrap();
/// let mut row = Row::new();
/// row.insert("id", Value::Int(1));
/// assert!(page.try_append_row(row).unwrap());
/// bm.mark_dirty("widgets", page_id);
/// bm.flush_all().unwrap();
/// ```
pub struct BufferManager {
    disk: DiskManager,
    capacity: usize,
    frames: HashMap<Key, Frame>,
    replacer: LruReplacer<Key>,
    stats: BufferPoolStats,
}

impl BufferManager {
    /// Open the buffer manager over a data directory, holding at most
    /// `capacity` pages resident at once.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn open(data_dir: impl Into<std::path::PathBuf>, capacity: usize) -> Result<Self> {
        assert!(capacity > 0, "buffer pool capacity must be > 0");
        Ok(Self {
            disk: DiskManager::new(data_dir)?,
            capacity,
            frames: HashMap::new(),
            replacer: LruReplacer::new(),
            stats: BufferPoolStats::new(),
        })
    }

    fn ensure_resident(&mut self, table: &str, page_id: PageId) -> Result<()> {
        let key = (table.to_string(), page_id);
        if self.frames.contains_key(&key) {
            self.stats.record_hit();
            self.replacer.record_access(key);
            return Ok(());
        }
        self.stats.record_miss();
        let bytes = self.disk.read_page(table, page_id)?;
        self.stats.record_page_read();
        let page = Page::from_bytes(&bytes)?;
        self.insert_frame(key.clone(), page, false)?;
        self.replacer.record_access(key);
        Ok(())
    }

    fn insert_frame(&mut self, key: Key, page: Page, dirty: bool) -> Result<()> {
        if self.frames.len() >= self.capacity && !self.frames.contains_key(&key) {
            self.evict_one()?;
        }
        self.frames.insert(key, Frame { page, dirty });
        Ok(())
    }

    fn evict_one(&mut self) -> Result<()> {
        let Some(victim) = self.replacer.evict() else {
            return Ok(());
        };
        let frame = self.frames.remove(&victim).expect("replacer key must be resident");
        let (table, page_id) = victim;
        if frame.dirty {
            self.write_back(&table, page_id, &frame.page)?;
        }
        self.stats.record_eviction(table, page_id, frame.dirty, "capacity exceeded");
        Ok(())
    }

    fn write_back(&mut self, table: &str, page_id: PageId, page: &Page) -> Result<()> {
        let bytes = page.to_bytes()?;
        self.disk.write_page(table, page_id, &bytes)?;
        self.stats.record_page_written();
        Ok(())
    }

    /// Fetch a page for reading, pulling it from disk on a miss.
    pub fn get_page(&mut self, table: &str, page_id: PageId) -> Result<&Page> {
        self.ensure_resident(table, page_id)?;
        Ok(&self.frames.get(&(table.to_string(), page_id)).expect("just made resident").page)
    }

    /// Fetch a page for mutation. Does not itself mark the page dirty —
    /// callers that actually mutate it must call [`Self::mark_dirty`].
    pub fn get_page_mut(&mut self, table: &str, page_id: PageId) -> Result<&mut Page> {
        self.ensure_resident(table, page_id)?;
        Ok(&mut self.frames.get_mut(&(table.to_string(), page_id)).expect("just made resident").page)
    }

    /// Mark a resident page dirty, so it's written back before eviction
    /// or flush. A no-op if the page isn't currently resident.
    pub fn mark_dirty(&mut self, table: &str, page_id: PageId) {
        if let Some(frame) = self.frames.get_mut(&(table.to_string(), page_id)) {
            frame.dirty = true;
        }
    }

    /// Allocate a new page on disk and insert it into the pool as a
    /// blank, dirty frame (subject to the same eviction bookkeeping as
    /// any other insertion).
    pub fn new_page(&mut self, table: &str) -> Result<PageId> {
        let page_id = self.disk.allocate_page(table)?;
        let key = (table.to_string(), page_id);
        self.insert_frame(key.clone(), Page::new(), true)?;
        self.replacer.record_access(key);
        Ok(page_id)
    }

    /// Write a single resident page back to disk if it's dirty.
    pub fn flush_page(&mut self, table: &str, page_id: PageId) -> Result<()> {
        let key = (table.to_string(), page_id);
        let needs_write = matches!(self.frames.get(&key), Some(f) if f.dirty);
        if needs_write {
            let bytes = self.frames[&key].page.to_bytes()?;
            self.disk.write_page(table, page_id, &bytes)?;
            self.stats.record_page_written();
            self.frames.get_mut(&key).expect("checked above").dirty = false;
        }
        Ok(())
    }

    /// Write back every dirty resident page. Callers should call this on
    /// clean shutdown so no dirty frame is lost.
    pub fn flush_all(&mut self) -> Result<()> {
        let dirty_keys: Vec<Key> = self.frames.iter().filter(|(_, f)| f.dirty).map(|(k, _)| k.clone()).collect();
        for (table, page_id) in dirty_keys {
            self.flush_page(&table, page_id)?;
        }
        Ok(())
    }

    /// Number of pages allocated on disk for `table` (not just resident
    /// in the pool).
    pub fn page_count(&mut self, table: &str) -> Result<u32> {
        self.disk.page_count(table)
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.disk.table_exists(table)
    }

    /// Evict any resident pages for `table` (without write-back — the
    /// caller is dropping the table entirely) and remove its file.
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        let keys: Vec<Key> = self.frames.keys().filter(|(t, _)| t == table).cloned().collect();
        for key in keys {
            self.frames.remove(&key);
            self.replacer.remove(&key);
        }
        self.disk.drop_table(table)
    }

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn resident_len(&self) -> usize {
        self.frames.len()
    }
}
