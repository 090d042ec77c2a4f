//! Sequential scan: the only leaf operator, eagerly materialized at
//! executor construction time (see the crate's design notes on why the
//! engine's single-threaded `&mut BufferManager` ownership rules out a
//! truly lazy, shared-borrow scan).

use crate::common::{Result, Row};
use crate::exec::operator::Operator;

pub struct SeqScan {
    rows: std::vec::IntoIter<Row>,
}

impl SeqScan {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows: rows.into_iter() }
    }
}

impl Operator for SeqScan {
    fn next(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}
