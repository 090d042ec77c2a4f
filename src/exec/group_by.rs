//! Partitioning upstream rows by group-key tuple equality.
//!
//! `GroupBy` does not implement [`Operator`](crate::exec::operator::Operator):
//! its output is a partitioned row list, not a plain [`Row`] stream, so it
//! is consumed directly by `Aggregate`'s constructor instead.

use crate::common::{Result, Row, Value};
use crate::exec::aggregate::compute_row;
use crate::exec::operator::Operator;
use crate::exec::predicate::{eval_condition, lookup_value};
use crate::sql::ast::{AggregateSpec, ColumnRef, Condition};

/// One group: its key column values (name-tagged, for re-emission) and
/// the rows that fell into it.
pub struct GroupByPartition {
    pub key_values: Vec<(String, Value)>,
    pub rows: Vec<Row>,
}

/// Drain `upstream`, partition by `keys` (a single all-inclusive
/// partition when `keys` is empty, even if upstream yielded no rows at
/// all), then drop any partition whose computed aggregates fail
/// `having`.
pub fn build(upstream: &mut dyn Operator, keys: &[ColumnRef], having: Option<&Condition>, aggregates: &[AggregateSpec]) -> Result<Vec<GroupByPartition>> {
    let mut rows = Vec::new();
    while let Some(row) = upstream.next()? {
        rows.push(row);
    }

    let mut partitions: Vec<(Vec<Value>, GroupByPartition)> = Vec::new();
    if keys.is_empty() {
        partitions.push((Vec::new(), GroupByPartition { key_values: Vec::new(), rows }));
    } else {
        for row in rows {
            let key_vals: Vec<Value> = keys.iter().map(|k| lookup_value(&row, k)).collect();
            match partitions.iter_mut().find(|(k, _)| *k == key_vals) {
                Some((_, partition)) => partition.rows.push(row),
                None => {
                    let key_values = keys.iter().zip(key_vals.iter()).map(|(k, v)| (k.name().to_string(), v.clone())).collect();
                    partitions.push((key_vals, GroupByPartition { key_values, rows: vec![row] }));
                }
            }
        }
    }

    let mut out = Vec::new();
    for (_, partition) in partitions {
        if let Some(having) = having {
            let computed = compute_row(&partition, aggregates);
            if !eval_condition(having, &computed) {
                continue;
            }
        }
        out.push(partition);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::seq_scan::SeqScan;

    fn row(region: &str, amt: i64) -> Row {
        let mut r = Row::new();
        r.insert("region", Value::Text(region.into()));
        r.insert("amt", Value::Int(amt));
        r
    }

    #[test]
    fn test_partitions_by_key_tuple() {
        let mut scan = SeqScan::new(vec![row("N", 10), row("N", 20), row("S", 5)]);
        let keys = vec![ColumnRef::Bare("region".into())];
        let partitions = build(&mut scan, &keys, None, &[]).unwrap();
        assert_eq!(partitions.len(), 2);
    }

    #[test]
    fn test_empty_upstream_with_no_group_keys_yields_one_partition() {
        let mut scan = SeqScan::new(vec![]);
        let partitions = build(&mut scan, &[], None, &[]).unwrap();
        assert_eq!(partitions.len(), 1);
        assert!(partitions[0].rows.is_empty());
    }
}
