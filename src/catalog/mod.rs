//! The system catalog: persisted table/column metadata, itself stored as
//! an ordinary table (`pg_catalog`).

use std::collections::HashMap;

use crate::buffer::BufferManager;
use crate::common::{Error, Result, Row, Value};
use crate::storage::table;

/// Name of the distinguished table the catalog persists itself into.
pub const CATALOG_TABLE: &str = "pg_catalog";

/// The column types this engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    Varchar,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "INT",
            ColumnType::Text => "TEXT",
            ColumnType::Varchar => "VARCHAR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INT" => Some(ColumnType::Int),
            "TEXT" => Some(ColumnType::Text),
            "VARCHAR" => Some(ColumnType::Varchar),
            _ => None,
        }
    }

    /// Whether a runtime [`Value`] is an acceptable fit for this column
    /// type. `Varchar` and `Text` both accept strings; `Null` always
    /// fits (schema enforcement of nullability is not part of this
    /// engine's scope).
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Int, Value::Int(_)) => true,
            (ColumnType::Text | ColumnType::Varchar, Value::Text(_)) => true,
            _ => false,
        }
    }
}

/// One column of a table's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub column_order: i64,
}

/// An immutable copy of the catalog's table → column-schema map, taken
/// once per statement compile so the semantic analyzer is insulated from
/// catalog mutations made by statements compiled after it.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    tables: HashMap<String, (String, Vec<ColumnDef>)>,
}

impl CatalogSnapshot {
    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Whether `name` names an existing table (case-insensitive).
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(&Self::key(name))
    }

    /// The columns of `name`, sorted by declaration order, or `None` if
    /// the table doesn't exist.
    pub fn columns(&self, name: &str) -> Option<&[ColumnDef]> {
        self.tables.get(&Self::key(name)).map(|(_, cols)| cols.as_slice())
    }

    /// Every user table name (excludes [`CATALOG_TABLE`]), in original case.
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .values()
            .map(|(name, _)| name.clone())
            .filter(|n| !n.eq_ignore_ascii_case(CATALOG_TABLE))
            .collect();
        names.sort();
        names
    }
}

/// Persisted table/column metadata.
///
/// On construction it ensures `pg_catalog` exists, bootstrapping it with
/// rows describing its own schema the first time it's touched.
pub struct SystemCatalog;

impl SystemCatalog {
    /// Schema of the catalog table itself: `(table_name, column_name,
    /// column_type, column_order)`.
    fn bootstrap_columns() -> [ColumnDef; 4] {
        [
            ColumnDef { name: "table_name".into(), column_type: ColumnType::Text, column_order: 0 },
            ColumnDef { name: "column_name".into(), column_type: ColumnType::Text, column_order: 1 },
            ColumnDef { name: "column_type".into(), column_type: ColumnType::Text, column_order: 2 },
            ColumnDef { name: "column_order".into(), column_type: ColumnType::Int, column_order: 3 },
        ]
    }

    /// Ensure `pg_catalog` exists on disk, materializing its own
    /// bootstrap schema rows the first time it's seen.
    pub fn ensure_bootstrapped(bm: &mut BufferManager) -> Result<()> {
        if bm.page_count(CATALOG_TABLE)? > 0 {
            return Ok(());
        }
        for col in Self::bootstrap_columns() {
            let row = catalog_row(CATALOG_TABLE, &col);
            table::append_row(bm, CATALOG_TABLE, row)?;
        }
        Ok(())
    }

    /// Register a new table's schema. Rejects a name collision
    /// (case-insensitive) with any existing table.
    pub fn create_table(bm: &mut BufferManager, name: &str, columns: &[ColumnDef]) -> Result<()> {
        let existing = Self::snapshot(bm)?;
        if existing.table_exists(name) {
            return Err(Error::semantic(format!("table '{name}' already exists")));
        }
        for col in columns {
            table::append_row(bm, CATALOG_TABLE, catalog_row(name, col))?;
        }
        Ok(())
    }

    /// Distinct user table names observed in the catalog.
    pub fn list_tables(bm: &mut BufferManager) -> Result<Vec<String>> {
        Ok(Self::snapshot(bm)?.list_tables())
    }

    /// Columns of `name`, sorted by `column_order`.
    pub fn get_table_columns(bm: &mut BufferManager, name: &str) -> Result<Vec<ColumnDef>> {
        Ok(Self::snapshot(bm)?.columns(name).map(<[ColumnDef]>::to_vec).unwrap_or_default())
    }

    /// Copy the full table → columns map once, for a [`CatalogSnapshot`]
    /// handed to a semantic analyzer instance.
    pub fn snapshot(bm: &mut BufferManager) -> Result<CatalogSnapshot> {
        Self::ensure_bootstrapped(bm)?;
        let rows = table::seq_scan(bm, CATALOG_TABLE)?;
        let mut tables: HashMap<String, (String, Vec<ColumnDef>)> = HashMap::new();
        for row in rows {
            let table_name = text_field(&row, "table_name")?;
            let column_name = text_field(&row, "column_name")?;
            let column_type_str = text_field(&row, "column_type")?;
            let column_order = int_field(&row, "column_order")?;
            let column_type = ColumnType::parse(&column_type_str)
                .ok_or_else(|| Error::runtime(format!("catalog row has unrecognized column_type '{column_type_str}'")))?;
            let key = table_name.to_ascii_lowercase();
            let entry = tables.entry(key).or_insert_with(|| (table_name.clone(), Vec::new()));
            entry.1.push(ColumnDef { name: column_name, column_type, column_order });
        }
        for (_, cols) in tables.values_mut() {
            cols.sort_by_key(|c| c.column_order);
        }
        Ok(CatalogSnapshot { tables })
    }
}

fn catalog_row(table_name: &str, col: &ColumnDef) -> Row {
    let mut row = Row::new();
    row.insert("table_name", Value::Text(table_name.to_string()));
    row.insert("column_name", Value::Text(col.name.clone()));
    row.insert("column_type", Value::Text(col.column_type.as_str().to_string()));
    row.insert("column_order", Value::Int(col.column_order));
    row
}

fn text_field(row: &Row, name: &str) -> Result<String> {
    match row.get(name) {
        Some(Value::Text(s)) => Ok(s.clone()),
        other => Err(Error::runtime(format!("catalog row missing text field '{name}': {other:?}"))),
    }
}

fn int_field(row: &Row, name: &str) -> Result<i64> {
    match row.get(name) {
        Some(Value::Int(i)) => Ok(*i),
        other => Err(Error::runtime(format!("catalog row missing int field '{name}': {other:?}"))),
    }
}
