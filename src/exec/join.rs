//! Nested-loop join with `INNER`/`LEFT`/`RIGHT`/`OUTER` null-fill
//! semantics.
//!
//! The right side is materialized once at construction. `left_alias`/
//! `right_alias` are `Some` only when that side is a single, not-yet-
//! joined table (a bare `SeqScan`, possibly under `Filter`s) — a prior
//! `Join`'s output already carries final qualified keys, so re-prefixing
//! it would double-qualify. The executor computes this from the plan
//! shape when building the operator tree.

use crate::common::{Result, Row, Value};
use crate::exec::operator::Operator;
use crate::exec::predicate::eval_condition;
use crate::sql::ast::{Condition, JoinKind};

pub struct Join {
    kind: JoinKind,
    on: Condition,
    left: Box<dyn Operator>,
    left_alias: Option<String>,
    right_rows: Vec<Row>,
    right_alias: Option<String>,
    right_matched: Vec<bool>,

    left_sample: Option<Row>,
    current_left: Option<Row>,
    current_left_matched: bool,
    right_idx: usize,
    left_done: bool,
    unmatched_right_idx: usize,
}

impl Join {
    pub fn new(
        left: Box<dyn Operator>,
        left_alias: Option<String>,
        right_rows: Vec<Row>,
        right_alias: Option<String>,
        kind: JoinKind,
        on: Condition,
    ) -> Self {
        let right_matched = vec![false; right_rows.len()];
        Self {
            kind,
            on,
            left,
            left_alias,
            right_rows,
            right_alias,
            right_matched,
            left_sample: None,
            current_left: None,
            current_left_matched: false,
            right_idx: 0,
            left_done: false,
            unmatched_right_idx: 0,
        }
    }

    fn merge(&self, left: &Row, right: &Row) -> Row {
        Row::merge_qualified(left, self.left_alias.as_deref(), right, self.right_alias.as_deref())
    }

    fn null_fill(sample: &Row, alias: &Option<String>) -> Row {
        let mut row = Row::new();
        for key in sample.keys() {
            let out_key = match alias {
                Some(a) => format!("{a}.{key}"),
                None => key.clone(),
            };
            row.insert(out_key, Value::Null);
        }
        row
    }

    fn advance_left(&mut self) -> Result<()> {
        match self.left.next()? {
            Some(row) => {
                if self.left_sample.is_none() {
                    self.left_sample = Some(row.clone());
                }
                self.current_left = Some(row);
                self.current_left_matched = false;
                self.right_idx = 0;
            }
            None => {
                self.left_done = true;
                self.current_left = None;
            }
        }
        Ok(())
    }
}

impl Operator for Join {
    fn next(&mut self) -> Result<Option<Row>> {
        loop {
            if self.current_left.is_none() && !self.left_done {
                self.advance_left()?;
            }

            if let Some(left_row) = self.current_left.clone() {
                while self.right_idx < self.right_rows.len() {
                    let ridx = self.right_idx;
                    self.right_idx += 1;
                    let right_row = self.right_rows[ridx].clone();
                    let merged = self.merge(&left_row, &right_row);
                    if eval_condition(&self.on, &merged) {
                        self.current_left_matched = true;
                        self.right_matched[ridx] = true;
                        return Ok(Some(merged));
                    }
                }

                let emit_unmatched_left = matches!(self.kind, JoinKind::Left | JoinKind::Outer) && !self.current_left_matched;
                self.current_left = None;
                if emit_unmatched_left {
                    let null_right = match self.right_rows.first() {
                        Some(sample) => Self::null_fill(sample, &self.right_alias),
                        None => Row::new(),
                    };
                    return Ok(Some(Row::merge_qualified(&left_row, self.left_alias.as_deref(), &null_right, None)));
                }
                continue;
            }

            if matches!(self.kind, JoinKind::Right | JoinKind::Outer) {
                while self.unmatched_right_idx < self.right_rows.len() {
                    let idx = self.unmatched_right_idx;
                    self.unmatched_right_idx += 1;
                    if !self.right_matched[idx] {
                        let right_row = self.right_rows[idx].clone();
                        let null_left = match &self.left_sample {
                            Some(sample) => Self::null_fill(sample, &self.left_alias),
                            None => Row::new(),
                        };
                        return Ok(Some(Row::merge_qualified(&null_left, None, &right_row, self.right_alias.as_deref())));
                    }
                }
            }
            return Ok(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::seq_scan::SeqScan;
    use crate::sql::ast::{ColumnRef, CompareOp, Comparison, Operand};

    fn row(col: &str, v: i64) -> Row {
        let mut r = Row::new();
        r.insert(col, Value::Int(v));
        r
    }

    fn on_cond() -> Condition {
        Condition::Compare(Comparison {
            left: Operand::Column(ColumnRef::Qualified("s".into(), "cid".into())),
            op: CompareOp::Eq,
            right: Operand::Column(ColumnRef::Qualified("c".into(), "id".into())),
        })
    }

    fn left_rows() -> Vec<Row> {
        let mut r0 = Row::new();
        r0.insert("cid", Value::Int(1));
        let mut r1 = Row::new();
        r1.insert("cid", Value::Int(99));
        vec![r0, r1]
    }

    fn right_rows() -> Vec<Row> {
        vec![row("id", 1)]
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let left = Box::new(SeqScan::new(left_rows()));
        let mut join = Join::new(left, Some("s".into()), right_rows(), Some("c".into()), JoinKind::Inner, on_cond());
        let mut out = Vec::new();
        while let Some(r) = join.next().unwrap() {
            out.push(r);
        }
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_exact("s.cid"), Some(&Value::Int(1)));
        assert_eq!(out[0].get_exact("c.id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_left_join_null_fills_unmatched() {
        let left = Box::new(SeqScan::new(left_rows()));
        let mut join = Join::new(left, Some("s".into()), right_rows(), Some("c".into()), JoinKind::Left, on_cond());
        let mut out = Vec::new();
        while let Some(r) = join.next().unwrap() {
            out.push(r);
        }
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].get_exact("c.id"), Some(&Value::Null));
    }

    #[test]
    fn test_right_join_includes_unmatched_right() {
        let mut extra_right = right_rows();
        extra_right.push(row("id", 42));
        let left = Box::new(SeqScan::new(left_rows()));
        let mut join = Join::new(left, Some("s".into()), extra_right, Some("c".into()), JoinKind::Right, on_cond());
        let mut out = Vec::new();
        while let Some(r) = join.next().unwrap() {
            out.push(r);
        }
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].get_exact("c.id"), Some(&Value::Int(42)));
        assert_eq!(out[1].get_exact("s.cid"), Some(&Value::Null));
    }

    #[test]
    fn test_outer_join_does_not_double_emit_matches() {
        let left = Box::new(SeqScan::new(left_rows()));
        let mut join = Join::new(left, Some("s".into()), right_rows(), Some("c".into()), JoinKind::Outer, on_cond());
        let mut out = Vec::new();
        while let Some(r) = join.next().unwrap() {
            out.push(r);
        }
        assert_eq!(out.len(), 2);
    }
}
