//! pageforge - an embedded relational database engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Database                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                SQL Layer (sql/)                          │   │
//! │  │    Lexer → Parser → SemanticAnalyzer → Planner            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Execution Layer (exec/)                        │   │
//! │  │   pull-based Operator tree: SeqScan, Filter, Join,        │   │
//! │  │   GroupBy/Aggregate, OrderBy, Project                     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Catalog (catalog/)                          │   │
//! │  │        table/column metadata, itself a table              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Buffer Pool (buffer/)                         │   │
//! │  │        LRU-evicted page cache, hit/miss accounting        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │             Storage Layer (storage/)                     │   │
//! │  │        DiskManager + fixed-size Page + row codec          │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                                                                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - shared primitives: `Row`, `Value`, `Error`, `DatabaseConfig`
//! - [`storage`] - disk I/O and the fixed-size page format
//! - [`buffer`] - the LRU-evicted buffer pool
//! - [`catalog`] - table/column metadata, persisted as an ordinary table
//! - [`sql`] - lexer, parser, semantic analyzer, logical planner
//! - [`exec`] - the pull-based execution engine
//! - [`engine`] - the [`Database`] facade tying the pipeline together
//!
//! # Quick start
//! ```no_run
//! use pageforge::engine::Database;
//! use pageforge::common::config::DatabaseConfig;
//!
//! let mut db = Database::open(DatabaseConfig::default()).unwrap();
//! db.execute("CREATE TABLE student(id INT, name TEXT)").unwrap();
//! db.execute("INSERT INTO student VALUES (1, 'Ada')").unwrap();
//! let result = db.execute("SELECT id, name FROM student").unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod engine;
pub mod exec;
pub mod sql;
pub mod storage;

pub use common::config::PAGE_SIZE;
pub use common::{Error, PageId, Result, Row, Value};
pub use engine::Database;
