//! The pull-based execution engine: turns a [`LogicalPlan`] into a tree
//! of operators and drives it to completion.

pub mod aggregate;
pub mod filter;
pub mod group_by;
pub mod join;
pub mod mutations;
pub mod operator;
pub mod order_by;
pub mod predicate;
pub mod project;
pub mod seq_scan;

use crate::buffer::BufferManager;
use crate::common::{Result, Row};
use crate::sql::plan::LogicalPlan;
use crate::storage::table;

use aggregate::Aggregate;
use filter::Filter;
use join::Join;
use operator::Operator;
use order_by::OrderBy;
use project::Project;
use seq_scan::SeqScan;

/// The uniform shape every statement's execution collapses to.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Rows(Vec<Row>),
    Affected(usize),
    Ack,
}

pub struct Executor;

impl Executor {
    /// Execute one already-planned statement to completion.
    pub fn execute(bm: &mut BufferManager, plan: LogicalPlan) -> Result<ExecResult> {
        match plan {
            LogicalPlan::CreateTable(stmt) => {
                mutations::execute_create_table(bm, stmt)?;
                Ok(ExecResult::Ack)
            }
            LogicalPlan::Insert(stmt) => Ok(ExecResult::Affected(mutations::execute_insert(bm, stmt)?)),
            LogicalPlan::Update(stmt) => Ok(ExecResult::Affected(mutations::execute_update(bm, stmt)?)),
            LogicalPlan::Delete(stmt) => Ok(ExecResult::Affected(mutations::execute_delete(bm, stmt)?)),
            query => {
                let mut root = build_operator(bm, &query)?;
                let mut rows = Vec::new();
                while let Some(row) = root.next()? {
                    rows.push(row);
                }
                Ok(ExecResult::Rows(rows))
            }
        }
    }
}

/// Whether `plan` is a single, not-yet-joined table (a bare `SeqScan`,
/// possibly under one or more `Filter`s), and if so, the alias its rows
/// should be merge-qualified under.
fn primary_alias_if_unjoined(plan: &LogicalPlan) -> Option<String> {
    match plan {
        LogicalPlan::SeqScan { table, alias } => Some(alias.clone().unwrap_or_else(|| table.clone())),
        LogicalPlan::Filter { input, .. } => primary_alias_if_unjoined(input),
        _ => None,
    }
}

fn build_operator(bm: &mut BufferManager, plan: &LogicalPlan) -> Result<Box<dyn Operator>> {
    match plan {
        LogicalPlan::SeqScan { table: name, .. } => {
            let rows = table::seq_scan(bm, name)?;
            Ok(Box::new(SeqScan::new(rows)))
        }
        LogicalPlan::Filter { predicate, input } => {
            let upstream = build_operator(bm, input)?;
            Ok(Box::new(Filter::new(upstream, predicate.clone())))
        }
        LogicalPlan::Project { items, input } => {
            let upstream = build_operator(bm, input)?;
            Ok(Box::new(Project::new(upstream, items.clone())))
        }
        LogicalPlan::Join { kind, on, left, right } => {
            let left_alias = primary_alias_if_unjoined(left);
            let right_alias = primary_alias_if_unjoined(right);
            let left_op = build_operator(bm, left)?;
            let mut right_op = build_operator(bm, right)?;
            let mut right_rows = Vec::new();
            while let Some(row) = right_op.next()? {
                right_rows.push(row);
            }
            Ok(Box::new(Join::new(left_op, left_alias, right_rows, right_alias, *kind, on.clone())))
        }
        LogicalPlan::Aggregate { aggregates, input } => match input.as_ref() {
            LogicalPlan::GroupBy { keys, having, input: upstream_plan } => {
                let mut upstream = build_operator(bm, upstream_plan)?;
                let partitions = group_by::build(upstream.as_mut(), keys, having.as_ref(), aggregates)?;
                Ok(Box::new(Aggregate::new(partitions, aggregates)))
            }
            _ => unreachable!("the planner always wraps Aggregate's input in a GroupBy node"),
        },
        LogicalPlan::OrderBy { keys, input } => {
            let upstream = build_operator(bm, input)?;
            Ok(Box::new(OrderBy::new(upstream, keys)?))
        }
        LogicalPlan::GroupBy { .. } => {
            unreachable!("GroupBy never appears outside an Aggregate's input, by planner construction")
        }
        LogicalPlan::CreateTable(_) | LogicalPlan::Insert(_) | LogicalPlan::Update(_) | LogicalPlan::Delete(_) => {
            unreachable!("mutation statements are handled directly by Executor::execute, never nested in a query plan")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType, SystemCatalog};
    use crate::sql::parser::parse_statement;
    use crate::sql::plan::Planner;

    fn open() -> BufferManager {
        let dir = tempfile::tempdir().unwrap();
        // leak the tempdir so it outlives the function's scope during the test
        let path = dir.into_path();
        BufferManager::open(&path, 8).unwrap()
    }

    fn run(bm: &mut BufferManager, sql: &str) -> ExecResult {
        let stmt = parse_statement(sql).unwrap();
        let plan = Planner::plan(stmt);
        Executor::execute(bm, plan).unwrap()
    }

    #[test]
    fn test_end_to_end_create_insert_select_delete() {
        let mut bm = open();
        SystemCatalog::create_table(
            &mut bm,
            "student",
            &[
                ColumnDef { name: "id".into(), column_type: ColumnType::Int, column_order: 0 },
                ColumnDef { name: "name".into(), column_type: ColumnType::Text, column_order: 1 },
            ],
        )
        .unwrap();

        assert_eq!(run(&mut bm, "INSERT INTO student VALUES (1,'Alice')"), ExecResult::Affected(1));
        assert_eq!(run(&mut bm, "INSERT INTO student VALUES (2,'Bob')"), ExecResult::Affected(1));

        match run(&mut bm, "SELECT id, name FROM student") {
            ExecResult::Rows(rows) => assert_eq!(rows.len(), 2),
            _ => panic!("expected Rows"),
        }

        assert_eq!(run(&mut bm, "DELETE FROM student WHERE id = 1"), ExecResult::Affected(1));
        match run(&mut bm, "SELECT id FROM student") {
            ExecResult::Rows(rows) => assert_eq!(rows.len(), 1),
            _ => panic!("expected Rows"),
        }
    }

    #[test]
    fn test_group_by_aggregate_end_to_end() {
        let mut bm = open();
        SystemCatalog::create_table(
            &mut bm,
            "sales",
            &[
                ColumnDef { name: "region".into(), column_type: ColumnType::Text, column_order: 0 },
                ColumnDef { name: "amt".into(), column_type: ColumnType::Int, column_order: 1 },
            ],
        )
        .unwrap();
        for (region, amt) in [("N", 10), ("N", 20), ("S", 5)] {
            run(&mut bm, &format!("INSERT INTO sales VALUES ('{region}', {amt})"));
        }
        match run(&mut bm, "SELECT region, SUM(amt) FROM sales GROUP BY region") {
            ExecResult::Rows(rows) => assert_eq!(rows.len(), 2),
            _ => panic!("expected Rows"),
        }
    }
}
