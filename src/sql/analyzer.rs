//! Semantic analysis: validate an AST against a catalog snapshot.

use std::collections::HashMap;

use crate::catalog::{CatalogSnapshot, ColumnDef, ColumnType};
use crate::common::{Error, Result, Value};
use crate::sql::ast::*;

/// Validates statements against a [`CatalogSnapshot`] taken once at
/// construction, so mutations made by statements compiled afterward are
/// never observed.
pub struct SemanticAnalyzer {
    catalog: CatalogSnapshot,
}

impl SemanticAnalyzer {
    pub fn new(catalog: CatalogSnapshot) -> Self {
        Self { catalog }
    }

    pub fn analyze(&self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::CreateTable(s) => self.analyze_create_table(s),
            Statement::Insert(s) => self.analyze_insert(s),
            Statement::Select(s) => self.analyze_select(s),
            Statement::Update(s) => self.analyze_update(s),
            Statement::Delete(s) => self.analyze_delete(s),
        }
    }

    fn analyze_create_table(&self, stmt: &CreateTableStmt) -> Result<()> {
        if self.catalog.table_exists(&stmt.table) {
            return Err(Error::semantic(format!("table '{}' already exists", stmt.table)));
        }
        let mut seen: Vec<String> = Vec::new();
        for col in &stmt.columns {
            let lower = col.name.to_ascii_lowercase();
            if seen.contains(&lower) {
                return Err(Error::semantic(format!("duplicate column '{}' in table '{}'", col.name, stmt.table)));
            }
            seen.push(lower);
        }
        Ok(())
    }

    fn analyze_insert(&self, stmt: &InsertStmt) -> Result<()> {
        let columns = self
            .catalog
            .columns(&stmt.table)
            .ok_or_else(|| Error::semantic(format!("table '{}' does not exist", stmt.table)))?;

        let target_columns: Vec<&ColumnDef> = match &stmt.columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .find(|c| c.name.eq_ignore_ascii_case(name))
                        .ok_or_else(|| Error::semantic(format!("column '{name}' does not exist on table '{}'", stmt.table)))
                })
                .collect::<Result<Vec<_>>>()?,
            None => columns.iter().collect(),
        };

        for row in &stmt.rows {
            if row.len() != target_columns.len() {
                return Err(Error::semantic(format!(
                    "row has {} value(s) but {} column(s) were targeted",
                    row.len(),
                    target_columns.len()
                )));
            }
            for (literal, col) in row.iter().zip(target_columns.iter()) {
                let value = literal.to_value();
                if !col.column_type.accepts(&value) {
                    return Err(Error::semantic(format!(
                        "value for column '{}' has the wrong type (expected {})",
                        col.name,
                        col.column_type.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// The ordered list of `(alias_or_name, actual_table_name)` reachable
    /// from a `SELECT`'s `FROM`/`JOIN` clauses, in scan order.
    fn reachable_tables(&self, stmt: &SelectStmt) -> Result<Vec<(String, String)>> {
        let mut reachable = Vec::new();
        if !self.catalog.table_exists(&stmt.table) {
            return Err(Error::semantic(format!("table '{}' does not exist", stmt.table)));
        }
        reachable.push((stmt.alias.clone().unwrap_or_else(|| stmt.table.clone()), stmt.table.clone()));
        for join in &stmt.joins {
            if !self.catalog.table_exists(&join.table) {
                return Err(Error::semantic(format!("table '{}' does not exist", join.table)));
            }
            reachable.push((join.alias.clone().unwrap_or_else(|| join.table.clone()), join.table.clone()));
        }
        Ok(reachable)
    }

    /// Resolve a column reference against the reachable-table list,
    /// returning the actual table name that declares it. Qualified
    /// references resolve through the alias map; unqualified ones
    /// succeed only if exactly one reachable table declares the column,
    /// with ambiguity broken deterministically toward the first
    /// reachable table (in FROM/JOIN order) that declares it.
    fn resolve_column(&self, col: &ColumnRef, reachable: &[(String, String)]) -> Result<()> {
        self.resolve_column_type(col, reachable).map(|_| ())
    }

    /// As [`Self::resolve_column`], but also returns the declared type of
    /// the column that was found, so callers can type-check a literal
    /// compared against it.
    fn resolve_column_type(&self, col: &ColumnRef, reachable: &[(String, String)]) -> Result<ColumnType> {
        match col {
            ColumnRef::Qualified(qualifier, name) => {
                let (_, table) = reachable
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(qualifier))
                    .ok_or_else(|| Error::semantic(format!("unknown table qualifier '{qualifier}'")))?;
                let columns = self.catalog.columns(table).expect("reachable table must exist in snapshot");
                columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                    .map(|c| c.column_type)
                    .ok_or_else(|| Error::semantic(format!("column '{qualifier}.{name}' does not exist")))
            }
            ColumnRef::Bare(name) => {
                for (_, table) in reachable {
                    let columns = self.catalog.columns(table).expect("reachable table must exist in snapshot");
                    if let Some(c) = columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
                        return Ok(c.column_type);
                    }
                }
                Err(Error::semantic(format!("column '{name}' does not exist in any reachable table")))
            }
        }
    }

    fn analyze_condition(&self, cond: &Condition, reachable: &[(String, String)]) -> Result<()> {
        match cond {
            Condition::Compare(cmp) => self.analyze_comparison(cmp, reachable),
            Condition::And(a, b) | Condition::Or(a, b) => {
                self.analyze_condition(a, reachable)?;
                self.analyze_condition(b, reachable)
            }
        }
    }

    fn analyze_comparison(&self, cmp: &Comparison, reachable: &[(String, String)]) -> Result<()> {
        let left_type = match &cmp.left {
            Operand::Column(c) => Some(self.resolve_column_type(c, reachable)?),
            Operand::Literal(_) => None,
        };
        let right_type = match &cmp.right {
            Operand::Column(c) => Some(self.resolve_column_type(c, reachable)?),
            Operand::Literal(_) => None,
        };
        // Column-to-column comparisons skip type checking entirely. A
        // literal compared against a column must match that column's
        // type; literal-vs-literal comparisons are never type errors.
        match (&cmp.left, &cmp.right, left_type, right_type) {
            (Operand::Literal(lit), _, _, Some(column_type)) | (_, Operand::Literal(lit), Some(column_type), _) => {
                if !column_type.accepts(&lit.to_value()) {
                    return Err(Error::semantic(format!("literal {lit:?} does not match column type {}", column_type.as_str())));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn analyze_select(&self, stmt: &SelectStmt) -> Result<()> {
        let reachable = self.reachable_tables(stmt)?;

        for join in &stmt.joins {
            self.analyze_condition(&join.on, &reachable)?;
        }
        if let Some(filter) = &stmt.filter {
            self.analyze_condition(filter, &reachable)?;
        }
        if let Some(having) = &stmt.having {
            self.analyze_condition(having, &reachable)?;
        }

        match &stmt.projection {
            Projection::Star => {}
            Projection::Items(items) => {
                for item in items {
                    match item {
                        SelectItem::Column(c) | SelectItem::ColumnAliased(c, _) => {
                            self.resolve_column(c, &reachable)?;
                        }
                        SelectItem::Aggregate(spec) => {
                            if let Some(c) = &spec.arg {
                                self.resolve_column(c, &reachable)?;
                            }
                        }
                    }
                }
            }
        }

        if let Some(group_by) = &stmt.group_by {
            for col in group_by {
                self.resolve_column(col, &reachable)?;
            }
        }
        for key in &stmt.order_by {
            self.resolve_column(&key.column, &reachable)?;
        }

        Ok(())
    }

    fn analyze_update(&self, stmt: &UpdateStmt) -> Result<()> {
        let columns = self
            .catalog
            .columns(&stmt.table)
            .ok_or_else(|| Error::semantic(format!("table '{}' does not exist", stmt.table)))?;
        let by_name: HashMap<String, &ColumnDef> = columns.iter().map(|c| (c.name.to_ascii_lowercase(), c)).collect();

        for assignment in &stmt.assignments {
            let col = by_name
                .get(&assignment.column.to_ascii_lowercase())
                .ok_or_else(|| Error::semantic(format!("column '{}' does not exist on table '{}'", assignment.column, stmt.table)))?;
            let value = assignment.value.to_value();
            if !col.column_type.accepts(&value) {
                return Err(Error::semantic(format!(
                    "value for column '{}' has the wrong type (expected {})",
                    col.name,
                    col.column_type.as_str()
                )));
            }
        }

        if let Some(filter) = &stmt.filter {
            let reachable = vec![(stmt.table.clone(), stmt.table.clone())];
            self.analyze_condition(filter, &reachable)?;
        }
        Ok(())
    }

    fn analyze_delete(&self, stmt: &DeleteStmt) -> Result<()> {
        if !self.catalog.table_exists(&stmt.table) {
            return Err(Error::semantic(format!("table '{}' does not exist", stmt.table)));
        }
        if let Some(filter) = &stmt.filter {
            let reachable = vec![(stmt.table.clone(), stmt.table.clone())];
            self.analyze_condition(filter, &reachable)?;
        }
        Ok(())
    }
}
