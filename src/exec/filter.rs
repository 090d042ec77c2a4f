//! Predicate filtering over an upstream operator.

use crate::common::{Result, Row};
use crate::exec::operator::Operator;
use crate::exec::predicate::eval_condition;
use crate::sql::ast::Condition;

pub struct Filter {
    input: Box<dyn Operator>,
    predicate: Condition,
}

impl Filter {
    pub fn new(input: Box<dyn Operator>, predicate: Condition) -> Self {
        Self { input, predicate }
    }
}

impl Operator for Filter {
    fn next(&mut self) -> Result<Option<Row>> {
        loop {
            match self.input.next()? {
                None => return Ok(None),
                Some(row) => {
                    if eval_condition(&self.predicate, &row) {
                        return Ok(Some(row));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::exec::seq_scan::SeqScan;
    use crate::sql::ast::{ColumnRef, CompareOp, Comparison, Literal, Operand};

    fn row(id: i64) -> Row {
        let mut r = Row::new();
        r.insert("id", Value::Int(id));
        r
    }

    #[test]
    fn test_filter_keeps_only_matching_rows() {
        let scan = SeqScan::new(vec![row(1), row(2), row(3)]);
        let predicate = Condition::Compare(Comparison {
            left: Operand::Column(ColumnRef::Bare("id".into())),
            op: CompareOp::Gt,
            right: Operand::Literal(Literal::Int(1)),
        });
        let mut filter = Filter::new(Box::new(scan), predicate);
        let mut ids = Vec::new();
        while let Some(r) = filter.next().unwrap() {
            ids.push(r.get("id").unwrap().as_int().unwrap());
        }
        assert_eq!(ids, vec![2, 3]);
    }
}
