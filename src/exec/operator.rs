//! The pull-based iteration protocol every execution operator implements.

use crate::common::{Result, Row};

/// Pull one row at a time until the operator is exhausted.
pub trait Operator {
    fn next(&mut self) -> Result<Option<Row>>;
}
