//! Row-oriented table storage, built on top of the buffer manager.
//!
//! This is a thin coordination layer: it has no state of its own beyond
//! what the buffer manager already tracks, so it's exposed as a set of
//! free functions rather than a struct.

use crate::buffer::BufferManager;
use crate::common::{Error, PageId, Result, Row};

/// Append `row` to `table`, reusing the last page when it still has room
/// and allocating a fresh page on overflow.
///
/// A row that doesn't fit even a brand-new, otherwise empty page is a
/// runtime bug (callers are expected to keep rows well under `PAGE_SIZE`),
/// reported as [`Error::Runtime`] rather than silently dropped.
pub fn append_row(bm: &mut BufferManager, table: &str, row: Row) -> Result<PageId> {
    let page_count = bm.page_count(table)?;
    if page_count > 0 {
        let last = PageId::new(page_count - 1);
        if bm.get_page_mut(table, last)?.try_append_row(row.clone())? {
            bm.mark_dirty(table, last);
            return Ok(last);
        }
    }
    let fresh = bm.new_page(table)?;
    if !bm.get_page_mut(table, fresh)?.try_append_row(row)? {
        return Err(Error::runtime(format!("row does not fit a fresh page in table '{table}'")));
    }
    bm.mark_dirty(table, fresh);
    Ok(fresh)
}

/// Collect every live row of `table`, in page-id then in-page order.
pub fn seq_scan(bm: &mut BufferManager, table: &str) -> Result<Vec<Row>> {
    let page_count = bm.page_count(table)?;
    let mut rows = Vec::new();
    for i in 0..page_count {
        let page = bm.get_page(table, PageId::new(i))?;
        rows.extend(page.iter_live_rows().cloned());
    }
    Ok(rows)
}

/// Tombstone every live row matching `predicate`. Every visited page is
/// marked dirty unconditionally, whether or not it actually contained a
/// match (a deliberate simplification: see the storage design notes).
pub fn delete_where(bm: &mut BufferManager, table: &str, predicate: impl Fn(&Row) -> bool) -> Result<usize> {
    let page_count = bm.page_count(table)?;
    let mut total = 0;
    for i in 0..page_count {
        let page_id = PageId::new(i);
        let page = bm.get_page_mut(table, page_id)?;
        total += page.mark_deleted(&predicate);
        bm.mark_dirty(table, page_id);
    }
    Ok(total)
}

/// Apply `assign` to every live row matching `predicate`.
pub fn update_where(
    bm: &mut BufferManager,
    table: &str,
    predicate: impl Fn(&Row) -> bool,
    assign: impl Fn(&mut Row),
) -> Result<usize> {
    let page_count = bm.page_count(table)?;
    let mut total = 0;
    for i in 0..page_count {
        let page_id = PageId::new(i);
        let page = bm.get_page_mut(table, page_id)?;
        total += page.update_where(&predicate, &assign);
        bm.mark_dirty(table, page_id);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;

    fn row(id: i64) -> Row {
        let mut r = Row::new();
        r.insert("id", Value::Int(id));
        r
    }

    #[test]
    fn test_append_then_scan_preserves_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut bm = BufferManager::open(dir.path(), 8).unwrap();
        for i in 0..5 {
            append_row(&mut bm, "t", row(i)).unwrap();
        }
        let rows = seq_scan(&mut bm, "t").unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.get("id").unwrap().as_int().unwrap()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_overflow_spills_to_new_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut bm = BufferManager::open(dir.path(), 8).unwrap();
        // A big text value forces each row onto its own page.
        let mut r1 = Row::new();
        r1.insert("blob", Value::Text("x".repeat(3000)));
        let mut r2 = Row::new();
        r2.insert("blob", Value::Text("y".repeat(3000)));
        append_row(&mut bm, "t", r1).unwrap();
        append_row(&mut bm, "t", r2).unwrap();
        assert_eq!(bm.page_count("t").unwrap(), 2);
    }

    #[test]
    fn test_delete_where_tombstones_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut bm = BufferManager::open(dir.path(), 8).unwrap();
        for i in 0..3 {
            append_row(&mut bm, "t", row(i)).unwrap();
        }
        let deleted = delete_where(&mut bm, "t", |r| r.get("id") == Some(&Value::Int(1))).unwrap();
        assert_eq!(deleted, 1);
        let remaining: Vec<i64> = seq_scan(&mut bm, "t").unwrap().iter().map(|r| r.get("id").unwrap().as_int().unwrap()).collect();
        assert_eq!(remaining, vec![0, 2]);
    }

    #[test]
    fn test_update_where_mutates_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut bm = BufferManager::open(dir.path(), 8).unwrap();
        append_row(&mut bm, "t", row(1)).unwrap();
        let updated = update_where(&mut bm, "t", |r| r.get("id") == Some(&Value::Int(1)), |r| r.insert("id", Value::Int(42))).unwrap();
        assert_eq!(updated, 1);
        let rows = seq_scan(&mut bm, "t").unwrap();
        assert_eq!(rows[0].get("id"), Some(&Value::Int(42)));
    }
}
