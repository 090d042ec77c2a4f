//! Column projection: rename/select/alias columns from an upstream row.

use crate::common::{Result, Row, Value};
use crate::exec::operator::Operator;
use crate::exec::predicate::lookup_value;
use crate::sql::ast::SelectItem;

pub struct Project {
    input: Box<dyn Operator>,
    items: Vec<SelectItem>,
}

impl Project {
    pub fn new(input: Box<dyn Operator>, items: Vec<SelectItem>) -> Self {
        Self { input, items }
    }
}

impl Operator for Project {
    fn next(&mut self) -> Result<Option<Row>> {
        match self.input.next()? {
            None => Ok(None),
            Some(row) => Ok(Some(project_row(&row, &self.items))),
        }
    }
}

fn project_row(row: &Row, items: &[SelectItem]) -> Row {
    let mut out = Row::new();
    for item in items {
        match item {
            SelectItem::Column(col) => out.insert(col.name().to_string(), lookup_value(row, col)),
            SelectItem::ColumnAliased(col, alias) => out.insert(alias.clone(), lookup_value(row, col)),
            SelectItem::Aggregate(spec) => {
                let name = spec.output_name();
                let value = row.get_exact(&name).cloned().unwrap_or(Value::Null);
                out.insert(name, value);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::seq_scan::SeqScan;
    use crate::sql::ast::ColumnRef;

    #[test]
    fn test_project_renames_with_alias() {
        let mut row = Row::new();
        row.insert("id", Value::Int(1));
        row.insert("name", Value::Text("Alice".into()));
        let scan = SeqScan::new(vec![row]);
        let items = vec![SelectItem::ColumnAliased(ColumnRef::Bare("name".into()), "n".into())];
        let mut project = Project::new(Box::new(scan), items);
        let out = project.next().unwrap().unwrap();
        assert_eq!(out.get_exact("n"), Some(&Value::Text("Alice".into())));
        assert_eq!(out.len(), 1);
    }
}
