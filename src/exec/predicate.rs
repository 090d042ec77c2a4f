//! Shared predicate evaluation, used by `Filter`, `Join`'s `ON` check,
//! `HAVING`, and the direct `Update`/`Delete` executors.

use crate::common::{Row, Value};
use crate::sql::ast::{ColumnRef, CompareOp, Comparison, Condition, Literal, Operand};

/// Resolve a column reference against a row. A qualified reference tries
/// the exact `qualifier.name` key first, then falls back to a bare-name
/// lookup (which itself suffix-matches any qualified key) — this lets a
/// single-table scan's alias resolve even though its rows still carry
/// bare keys. A miss of any kind yields [`Value::Null`].
pub fn lookup_value(row: &Row, column: &ColumnRef) -> Value {
    match column {
        ColumnRef::Bare(name) => row.get(name).cloned().unwrap_or(Value::Null),
        ColumnRef::Qualified(qualifier, name) => {
            let qualified_key = format!("{qualifier}.{name}");
            row.get_exact(&qualified_key).or_else(|| row.get(name)).cloned().unwrap_or(Value::Null)
        }
    }
}

fn eval_operand(operand: &Operand, row: &Row) -> Value {
    match operand {
        Operand::Literal(lit) => literal_value(lit),
        Operand::Column(col) => lookup_value(row, col),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(i) => Value::Int(*i),
        Literal::Text(s) => Value::Text(s.clone()),
    }
}

/// A comparison against `Null` is always false; a kind mismatch
/// (integer vs. string) is also always false.
fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    if left.is_null() || right.is_null() {
        return false;
    }
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        _ => return false,
    };
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => !ordering.is_eq(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Ge => ordering.is_ge(),
    }
}

fn eval_comparison(cmp: &Comparison, row: &Row) -> bool {
    let left = eval_operand(&cmp.left, row);
    let right = eval_operand(&cmp.right, row);
    compare(cmp.op, &left, &right)
}

/// Evaluate a (possibly disjunctive) predicate tree against `row` with
/// ordinary two-valued boolean logic.
pub fn eval_condition(cond: &Condition, row: &Row) -> bool {
    match cond {
        Condition::Compare(cmp) => eval_comparison(cmp, row),
        Condition::And(a, b) => eval_condition(a, row) && eval_condition(b, row),
        Condition::Or(a, b) => eval_condition(a, row) || eval_condition(b, row),
    }
}
