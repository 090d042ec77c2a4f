//! Disk manager - low-level, per-table file I/O.
//!
//! Each table lives in its own `<data_dir>/<table>.tbl` file, a sequence
//! of fixed-size pages laid out back to back:
//! ```text
//! ┌─────────┬─────────┬─────────┬ ... ┬─────────┐
//! │ Page 0  │ Page 1  │ Page 2  │     │ Page N  │
//! │ (4KB)   │ (4KB)   │ (4KB)   │     │ (4KB)   │
//! └─────────┴─────────┴─────────┴ ... ┴─────────┘
//! ```
//! Page `n` sits at file offset `n * PAGE_SIZE`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};

struct TableFile {
    file: File,
    page_count: u32,
}

/// Owns one open file handle per table and serves raw page reads/writes
/// and page allocation against it.
///
/// `DiskManager` is single-threaded: callers (the buffer manager) are
/// responsible for serializing access.
pub struct DiskManager {
    data_dir: PathBuf,
    tables: HashMap<String, TableFile>,
}

impl DiskManager {
    /// Open a disk manager rooted at `data_dir`, creating the directory
    /// if it doesn't exist yet.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            tables: HashMap::new(),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.tbl"))
    }

    fn ensure_open(&mut self, table: &str) -> Result<&mut TableFile> {
        if !self.tables.contains_key(table) {
            let path = self.table_path(table);
            let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
            let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;
            self.tables.insert(table.to_string(), TableFile { file, page_count });
        }
        Ok(self.tables.get_mut(table).expect("just inserted"))
    }

    /// Number of pages currently allocated for `table`.
    pub fn page_count(&mut self, table: &str) -> Result<u32> {
        Ok(self.ensure_open(table)?.page_count)
    }

    /// Allocate a new, zero-filled page at the end of `table`'s file.
    pub fn allocate_page(&mut self, table: &str) -> Result<PageId> {
        let entry = self.ensure_open(table)?;
        let page_id = PageId::new(entry.page_count);
        let offset = u64::from(page_id.0) * PAGE_SIZE as u64;
        entry.file.seek(SeekFrom::Start(offset))?;
        entry.file.write_all(&[0u8; PAGE_SIZE])?;
        entry.file.sync_all()?;
        entry.page_count += 1;
        Ok(page_id)
    }

    /// Read the raw bytes of `page_id` within `table`.
    pub fn read_page(&mut self, table: &str, page_id: PageId) -> Result<[u8; PAGE_SIZE]> {
        let entry = self.ensure_open(table)?;
        if page_id.0 >= entry.page_count {
            return Err(Error::runtime(format!("{table}: page {page_id} is not allocated")));
        }
        let offset = u64::from(page_id.0) * PAGE_SIZE as u64;
        entry.file.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; PAGE_SIZE];
        entry.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Write `data` to `page_id` within `table` and fsync.
    pub fn write_page(&mut self, table: &str, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let entry = self.ensure_open(table)?;
        if page_id.0 >= entry.page_count {
            return Err(Error::runtime(format!("{table}: page {page_id} is not allocated")));
        }
        let offset = u64::from(page_id.0) * PAGE_SIZE as u64;
        entry.file.seek(SeekFrom::Start(offset))?;
        entry.file.write_all(data)?;
        entry.file.sync_all()?;
        Ok(())
    }

    /// Whether `table` has a backing file on disk already.
    pub fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table) || self.table_path(table).exists()
    }

    /// Remove a table's backing file entirely. Used by `DROP TABLE`.
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        self.tables.remove(table);
        let path = self.table_path(table);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// The root directory this disk manager is serving.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_then_read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut dm = DiskManager::new(dir.path()).unwrap();

        let page_id = dm.allocate_page("widgets").unwrap();
        assert_eq!(page_id, PageId::new(0));

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 42;
        dm.write_page("widgets", page_id, &data).unwrap();

        let back = dm.read_page("widgets", page_id).unwrap();
        assert_eq!(back[0], 42);
    }

    #[test]
    fn test_page_count_tracks_allocations() {
        let dir = tempfile::tempdir().unwrap();
        let mut dm = DiskManager::new(dir.path()).unwrap();
        dm.allocate_page("widgets").unwrap();
        dm.allocate_page("widgets").unwrap();
        assert_eq!(dm.page_count("widgets").unwrap(), 2);
    }

    #[test]
    fn test_read_unallocated_page_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut dm = DiskManager::new(dir.path()).unwrap();
        dm.allocate_page("widgets").unwrap();
        assert!(dm.read_page("widgets", PageId::new(5)).is_err());
    }

    #[test]
    fn test_reopen_recovers_page_count() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut dm = DiskManager::new(dir.path()).unwrap();
            dm.allocate_page("widgets").unwrap();
            dm.allocate_page("widgets").unwrap();
        }
        let mut dm = DiskManager::new(dir.path()).unwrap();
        assert_eq!(dm.page_count("widgets").unwrap(), 2);
    }

    #[test]
    fn test_drop_table_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut dm = DiskManager::new(dir.path()).unwrap();
        dm.allocate_page("widgets").unwrap();
        assert!(dm.table_exists("widgets"));
        dm.drop_table("widgets").unwrap();
        assert!(!dm.table_path("widgets").exists());
    }
}
