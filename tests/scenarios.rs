//! End-to-end scenarios driven entirely through the `Database` facade.

use pageforge::common::config::DatabaseConfig;
use pageforge::exec::ExecResult;
use pageforge::Database;

fn open_with_capacity(capacity: usize) -> Database {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig { data_dir: dir.into_path(), buffer_pool_capacity: capacity };
    Database::open(config).unwrap()
}

fn open() -> Database {
    open_with_capacity(64)
}

fn rows(result: ExecResult) -> Vec<pageforge::Row> {
    match result {
        ExecResult::Rows(rows) => rows,
        other => panic!("expected Rows, got {other:?}"),
    }
}

#[test]
fn scenario_s2_many_inserts_survive_forced_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig { data_dir: dir.into_path(), buffer_pool_capacity: 2 };
    {
        let mut db = Database::open(config.clone()).unwrap();
        db.execute("CREATE TABLE counters(n INT)").unwrap();
        for i in 0..50 {
            assert_eq!(db.execute(&format!("INSERT INTO counters VALUES ({i})")).unwrap(), ExecResult::Affected(1));
        }
        db.close().unwrap();
    }

    let mut reopened = Database::open(config).unwrap();
    let result = rows(reopened.execute("SELECT n FROM counters").unwrap());
    let values: Vec<i64> = result.iter().map(|r| r.get("n").unwrap().as_int().unwrap()).collect();
    assert_eq!(values, (0..50).collect::<Vec<_>>());
}

#[test]
fn scenario_s4_group_by_sum_per_region() {
    let mut db = open();
    db.execute("CREATE TABLE sales(region TEXT, amt INT)").unwrap();
    for (region, amt) in [("N", 10), ("N", 20), ("S", 5)] {
        db.execute(&format!("INSERT INTO sales VALUES ('{region}', {amt})")).unwrap();
    }
    let result = rows(db.execute("SELECT region, SUM(amt) FROM sales GROUP BY region").unwrap());
    assert_eq!(result.len(), 2);
    let totals: std::collections::HashMap<String, i64> = result
        .iter()
        .map(|r| (r.get("region").unwrap().as_text().unwrap().to_string(), r.get_exact("SUM(amt)").unwrap().as_int().unwrap()))
        .collect();
    assert_eq!(totals.get("N"), Some(&30));
    assert_eq!(totals.get("S"), Some(&5));
}

#[test]
fn scenario_s5_inner_join_emits_one_row_per_matching_pair() {
    let mut db = open();
    db.execute("CREATE TABLE s(id INT, cid INT)").unwrap();
    db.execute("CREATE TABLE c(id INT, name TEXT)").unwrap();
    db.execute("INSERT INTO s VALUES (1, 100)").unwrap();
    db.execute("INSERT INTO s VALUES (2, 200)").unwrap();
    db.execute("INSERT INTO c VALUES (100, 'Widgets')").unwrap();
    db.execute("INSERT INTO c VALUES (200, 'Gadgets')").unwrap();

    let result = rows(db.execute("SELECT s.id, c.name FROM s JOIN c ON s.cid = c.id").unwrap());
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].get("id").unwrap().as_int().unwrap(), 1);
    assert_eq!(result[0].get("name").unwrap().as_text().unwrap(), "Widgets");
    assert_eq!(result[1].get("id").unwrap().as_int().unwrap(), 2);
    assert_eq!(result[1].get("name").unwrap().as_text().unwrap(), "Gadgets");
}

#[test]
fn scenario_s6_left_join_null_fills_unmatched_left_rows() {
    let mut db = open();
    db.execute("CREATE TABLE s(id INT, cid INT)").unwrap();
    db.execute("CREATE TABLE c(id INT, name TEXT)").unwrap();
    db.execute("INSERT INTO s VALUES (1, 100)").unwrap();
    db.execute("INSERT INTO s VALUES (2, 999)").unwrap();
    db.execute("INSERT INTO c VALUES (100, 'Widgets')").unwrap();

    let result = rows(db.execute("SELECT s.id, c.name FROM s LEFT JOIN c ON s.cid = c.id").unwrap());
    assert_eq!(result.len(), 2);
    assert_eq!(result[1].get("id").unwrap().as_int().unwrap(), 2);
    assert_eq!(result[1].get("name"), Some(&pageforge::Value::Null));
}

#[test]
fn invariant_idempotent_create_rejection_leaves_catalog_unchanged() {
    let mut db = open();
    db.execute("CREATE TABLE t(x INT)").unwrap();
    assert!(db.execute("CREATE TABLE t(x INT)").is_err());
    db.execute("INSERT INTO t VALUES (1)").unwrap();
    let result = rows(db.execute("SELECT x FROM t").unwrap());
    assert_eq!(result.len(), 1);
}

#[test]
fn invariant_tombstoned_rows_never_resurface() {
    let mut db = open();
    db.execute("CREATE TABLE t(x INT)").unwrap();
    db.execute("INSERT INTO t VALUES (1)").unwrap();
    db.execute("INSERT INTO t VALUES (2)").unwrap();
    db.execute("DELETE FROM t WHERE x = 1").unwrap();
    let result = rows(db.execute("SELECT x FROM t").unwrap());
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get("x").unwrap().as_int().unwrap(), 2);
}

#[test]
fn property_config_defaults_match_spec() {
    let config = DatabaseConfig::default();
    assert_eq!(config.data_dir, std::path::PathBuf::from("data"));
    assert_eq!(config.buffer_pool_capacity, 64);
}

#[test]
fn property_logging_does_not_change_results() {
    // Exercises the facade with no subscriber installed; tracing events are
    // no-ops without one, so results must be identical to a subscribed run.
    let mut db = open();
    db.execute("CREATE TABLE t(x INT)").unwrap();
    db.execute("INSERT INTO t VALUES (7)").unwrap();
    let result = rows(db.execute("SELECT x FROM t").unwrap());
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get("x").unwrap().as_int().unwrap(), 7);
}

#[test]
fn error_display_is_non_empty_for_every_kind() {
    let mut db = open();
    let parse_err = db.execute("SELECT FROM").unwrap_err();
    assert!(!format!("{parse_err}").is_empty());

    db.execute("CREATE TABLE t(x INT)").unwrap();
    let semantic_err = db.execute("SELECT y FROM t").unwrap_err();
    assert!(!format!("{semantic_err}").is_empty());
}

#[test]
fn execute_script_continues_past_a_failed_statement() {
    let mut db = open();
    let script = "CREATE TABLE t(x INT); INSERT INTO t VALUES ('oops'); INSERT INTO t VALUES (1); SELECT x FROM t;";
    let results = db.execute_script(script);
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    match results[3].as_ref().unwrap() {
        ExecResult::Rows(rows) => assert_eq!(rows.len(), 1),
        other => panic!("expected Rows, got {other:?}"),
    }
}

#[test]
fn buffer_eviction_is_capacity_bounded_during_a_large_scan() {
    let mut db = open_with_capacity(1);
    db.execute("CREATE TABLE t(x INT)").unwrap();
    for i in 0..20 {
        db.execute(&format!("INSERT INTO t VALUES ({i})")).unwrap();
    }
    let stats_before = db.buffer_stats();
    assert!(stats_before.evictions > 0);
    let result = rows(db.execute("SELECT x FROM t").unwrap());
    assert_eq!(result.len(), 20);
}
