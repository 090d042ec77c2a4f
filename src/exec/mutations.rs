//! Direct (non-`Operator`) execution for statements whose result is a
//! count or an acknowledgment rather than a row stream.

use crate::buffer::BufferManager;
use crate::catalog::{ColumnDef, SystemCatalog};
use crate::common::{Result, Row, Value};
use crate::exec::predicate::eval_condition;
use crate::sql::ast::{CreateTableStmt, DeleteStmt, InsertStmt, UpdateStmt};
use crate::storage::table;

pub fn execute_create_table(bm: &mut BufferManager, stmt: CreateTableStmt) -> Result<()> {
    let columns: Vec<ColumnDef> = stmt
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| ColumnDef { name: c.name.clone(), column_type: c.column_type, column_order: i as i64 })
        .collect();
    SystemCatalog::create_table(bm, &stmt.table, &columns)
}

pub fn execute_insert(bm: &mut BufferManager, stmt: InsertStmt) -> Result<usize> {
    let columns = SystemCatalog::get_table_columns(bm, &stmt.table)?;
    let target_names: Vec<String> = match &stmt.columns {
        Some(names) => names.clone(),
        None => columns.iter().map(|c| c.name.clone()).collect(),
    };

    let mut inserted = 0;
    for values in stmt.rows {
        let mut row = Row::new();
        for col in &columns {
            row.insert(col.name.clone(), Value::Null);
        }
        for (name, literal) in target_names.iter().zip(values.into_iter()) {
            row.insert(name.clone(), literal.to_value());
        }
        table::append_row(bm, &stmt.table, row)?;
        inserted += 1;
    }
    Ok(inserted)
}

pub fn execute_update(bm: &mut BufferManager, stmt: UpdateStmt) -> Result<usize> {
    let filter = stmt.filter;
    let assignments = stmt.assignments;
    table::update_where(
        bm,
        &stmt.table,
        |row: &Row| filter.as_ref().map(|f| eval_condition(f, row)).unwrap_or(true),
        |row: &mut Row| {
            for assignment in &assignments {
                row.insert(assignment.column.clone(), assignment.value.to_value());
            }
        },
    )
}

pub fn execute_delete(bm: &mut BufferManager, stmt: DeleteStmt) -> Result<usize> {
    let filter = stmt.filter;
    table::delete_where(bm, &stmt.table, move |row: &Row| filter.as_ref().map(|f| eval_condition(f, row)).unwrap_or(true))
}
