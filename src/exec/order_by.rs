//! Stable sort over fully materialized upstream rows.

use std::cmp::Ordering;

use crate::common::{Result, Row};
use crate::exec::operator::Operator;
use crate::exec::predicate::lookup_value;
use crate::sql::ast::{OrderDirection, OrderKey};

pub struct OrderBy {
    rows: std::vec::IntoIter<Row>,
}

impl OrderBy {
    pub fn new(mut input: Box<dyn Operator>, keys: &[OrderKey]) -> Result<Self> {
        let mut rows = Vec::new();
        while let Some(row) = input.next()? {
            rows.push(row);
        }
        rows.sort_by(|a, b| {
            for key in keys {
                let ordering = lookup_value(a, &key.column).cmp_for_order(&lookup_value(b, &key.column));
                let ordering = match key.direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(Self { rows: rows.into_iter() })
    }
}

impl Operator for OrderBy {
    fn next(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::exec::seq_scan::SeqScan;
    use crate::sql::ast::ColumnRef;

    fn row(x: i64) -> Row {
        let mut r = Row::new();
        r.insert("x", Value::Int(x));
        r
    }

    #[test]
    fn test_desc_uses_real_reversed_comparator() {
        let scan = Box::new(SeqScan::new(vec![row(1), row(3), row(2)]));
        let keys = vec![OrderKey { column: ColumnRef::Bare("x".into()), direction: OrderDirection::Desc }];
        let mut ordered = OrderBy::new(scan, &keys).unwrap();
        let mut out = Vec::new();
        while let Some(r) = ordered.next().unwrap() {
            out.push(r.get("x").unwrap().as_int().unwrap());
        }
        assert_eq!(out, vec![3, 2, 1]);
    }

    #[test]
    fn test_asc_sorts_null_first() {
        let mut with_null = Row::new();
        with_null.insert("x", Value::Null);
        let scan = Box::new(SeqScan::new(vec![row(5), with_null]));
        let keys = vec![OrderKey { column: ColumnRef::Bare("x".into()), direction: OrderDirection::Asc }];
        let mut ordered = OrderBy::new(scan, &keys).unwrap();
        let first = ordered.next().unwrap().unwrap();
        assert_eq!(first.get("x"), Some(&Value::Null));
    }
}
