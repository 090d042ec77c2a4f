//! Aggregate computation over grouped (or whole-table) partitions.

use crate::common::{Result, Row, Value};
use crate::exec::group_by::GroupByPartition;
use crate::exec::operator::Operator;
use crate::exec::predicate::lookup_value;
use crate::sql::ast::{AggregateFunc, AggregateSpec};

pub struct Aggregate {
    rows: std::vec::IntoIter<Row>,
}

impl Aggregate {
    pub fn new(partitions: Vec<GroupByPartition>, aggregates: &[AggregateSpec]) -> Self {
        let rows: Vec<Row> = partitions.iter().map(|p| compute_row(p, aggregates)).collect();
        Self { rows: rows.into_iter() }
    }
}

impl Operator for Aggregate {
    fn next(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Build one output row for a partition: its group-key columns plus
/// each aggregate's computed, named output.
pub fn compute_row(partition: &GroupByPartition, aggregates: &[AggregateSpec]) -> Row {
    let mut row = Row::new();
    for (name, value) in &partition.key_values {
        row.insert(name.clone(), value.clone());
    }
    for spec in aggregates {
        row.insert(spec.output_name(), compute_one(spec, &partition.rows));
    }
    row
}

fn compute_one(spec: &AggregateSpec, rows: &[Row]) -> Value {
    match spec.func {
        AggregateFunc::Count => match &spec.arg {
            None => Value::Int(rows.len() as i64),
            Some(col) => Value::Int(rows.iter().filter(|r| !lookup_value(r, col).is_null()).count() as i64),
        },
        AggregateFunc::Sum => {
            let col = spec.arg.as_ref().expect("SUM requires a column argument");
            Value::Int(non_null_ints(rows, col).sum())
        }
        AggregateFunc::Avg => {
            let col = spec.arg.as_ref().expect("AVG requires a column argument");
            let values: Vec<i64> = non_null_ints(rows, col).collect();
            if values.is_empty() {
                Value::Int(0)
            } else {
                Value::Int(values.iter().sum::<i64>() / values.len() as i64)
            }
        }
        AggregateFunc::Min => {
            let col = spec.arg.as_ref().expect("MIN requires a column argument");
            non_null_values(rows, col).min_by(|a, b| a.cmp_for_order(b)).unwrap_or(Value::Null)
        }
        AggregateFunc::Max => {
            let col = spec.arg.as_ref().expect("MAX requires a column argument");
            non_null_values(rows, col).max_by(|a, b| a.cmp_for_order(b)).unwrap_or(Value::Null)
        }
    }
}

fn non_null_ints<'a>(rows: &'a [Row], col: &'a crate::sql::ast::ColumnRef) -> impl Iterator<Item = i64> + 'a {
    rows.iter().filter_map(move |r| lookup_value(r, col).as_int())
}

fn non_null_values<'a>(rows: &'a [Row], col: &'a crate::sql::ast::ColumnRef) -> impl Iterator<Item = Value> + 'a {
    rows.iter().filter_map(move |r| {
        let v = lookup_value(r, col);
        if v.is_null() {
            None
        } else {
            Some(v)
        }
    })
}
