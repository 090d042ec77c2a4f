//! Property-based coverage of page encode/decode round-tripping through
//! a live buffer pool, complementing the unit-level round-trip test in
//! `storage::page`.

use pageforge::buffer::BufferManager;
use pageforge::common::{PageId, Row, Value};
use proptest::prelude::*;

fn row_strategy() -> impl Strategy<Value = Row> {
    (any::<i64>(), ".{0,40}").prop_map(|(n, text)| {
        let mut row = Row::new();
        row.insert("n", Value::Int(n));
        row.insert("label", Value::Text(text));
        row
    })
}

proptest! {
    #[test]
    fn page_round_trip_preserves_live_rows(rows in prop::collection::vec(row_strategy(), 0..8)) {
        let dir = tempfile::tempdir().unwrap();
        let mut bm = BufferManager::open(dir.path(), 8).unwrap();
        let page_id = bm.new_page("t").unwrap();
        for row in &rows {
            let page = bm.get_page_mut("t", page_id).unwrap();
            prop_assert!(page.try_append_row(row.clone()).unwrap());
            bm.mark_dirty("t", page_id);
        }
        bm.flush_all().unwrap();

        let mut reopened = BufferManager::open(dir.path(), 8).unwrap();
        let restored: Vec<Row> = reopened.get_page("t", PageId::new(0)).unwrap().iter_live_rows().cloned().collect();
        prop_assert_eq!(restored, rows);
    }
}
