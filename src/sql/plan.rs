//! Logical planning: AST → a tree of [`LogicalPlan`] nodes.

use crate::sql::ast::*;

/// A node of the immutable logical plan tree the executor walks
/// bottom-up. Eleven variants, one per operator kind.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    CreateTable(CreateTableStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    SeqScan {
        table: String,
        alias: Option<String>,
    },
    Filter {
        predicate: Condition,
        input: Box<LogicalPlan>,
    },
    Project {
        items: Vec<SelectItem>,
        input: Box<LogicalPlan>,
    },
    Join {
        kind: JoinKind,
        on: Condition,
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
    },
    GroupBy {
        keys: Vec<ColumnRef>,
        having: Option<Condition>,
        input: Box<LogicalPlan>,
    },
    Aggregate {
        aggregates: Vec<AggregateSpec>,
        input: Box<LogicalPlan>,
    },
    OrderBy {
        keys: Vec<OrderKey>,
        input: Box<LogicalPlan>,
    },
}

/// Translates a [`Statement`] into a [`LogicalPlan`] tree.
pub struct Planner;

impl Planner {
    pub fn plan(stmt: Statement) -> LogicalPlan {
        match stmt {
            Statement::CreateTable(s) => LogicalPlan::CreateTable(s),
            Statement::Insert(s) => LogicalPlan::Insert(s),
            Statement::Update(s) => Self::plan_update(s),
            Statement::Delete(s) => Self::plan_delete(s),
            Statement::Select(s) => Self::plan_select(s),
        }
    }

    fn plan_update(stmt: UpdateStmt) -> LogicalPlan {
        LogicalPlan::Update(stmt)
    }

    fn plan_delete(stmt: DeleteStmt) -> LogicalPlan {
        LogicalPlan::Delete(stmt)
    }

    fn plan_select(stmt: SelectStmt) -> LogicalPlan {
        let primary_alias = stmt.alias.clone().unwrap_or_else(|| stmt.table.clone());

        // Flatten a pure AND-conjunction WHERE into pushable leaves; an OR
        // anywhere disables flattening for the whole tree (see module docs
        // on predicate pushdown in the crate's design notes).
        let leaves = stmt.filter.as_ref().and_then(flatten_conjunction);

        let mut remaining: Vec<Condition> = Vec::new();
        let mut primary_leaves: Vec<Condition> = Vec::new();
        let mut join_leaves: Vec<Vec<Condition>> = vec![Vec::new(); stmt.joins.len()];

        match (leaves, &stmt.filter) {
            (Some(leaves), _) => {
                for leaf in leaves {
                    if leaf_belongs_to(&leaf, &primary_alias) {
                        primary_leaves.push(leaf);
                        continue;
                    }
                    let mut pushed = false;
                    for (i, join) in stmt.joins.iter().enumerate() {
                        let alias = join.alias.clone().unwrap_or_else(|| join.table.clone());
                        if leaf_belongs_to(&leaf, &alias) {
                            join_leaves[i].push(leaf.clone());
                            pushed = true;
                            break;
                        }
                    }
                    if !pushed {
                        remaining.push(leaf);
                    }
                }
            }
            (None, Some(cond)) => remaining.push(cond.clone()),
            (None, None) => {}
        }

        let mut plan = LogicalPlan::SeqScan { table: stmt.table.clone(), alias: stmt.alias.clone() };
        plan = wrap_filter(plan, primary_leaves);

        for (i, join) in stmt.joins.into_iter().enumerate() {
            let right_scan = LogicalPlan::SeqScan { table: join.table.clone(), alias: join.alias.clone() };
            let right = wrap_filter(right_scan, std::mem::take(&mut join_leaves[i]));
            plan = LogicalPlan::Join { kind: join.kind, on: join.on, left: Box::new(plan), right: Box::new(right) };
        }

        plan = wrap_filter_all(plan, remaining);

        let aggregates = collect_aggregates(&stmt.projection);
        if stmt.group_by.is_some() || !aggregates.is_empty() {
            plan = LogicalPlan::GroupBy { keys: stmt.group_by.unwrap_or_default(), having: stmt.having, input: Box::new(plan) };
            plan = LogicalPlan::Aggregate { aggregates, input: Box::new(plan) };
        }

        if !stmt.order_by.is_empty() {
            plan = LogicalPlan::OrderBy { keys: stmt.order_by, input: Box::new(plan) };
        }

        if let Projection::Items(items) = stmt.projection {
            plan = LogicalPlan::Project { items, input: Box::new(plan) };
        }

        plan
    }
}

fn wrap_filter(input: LogicalPlan, leaves: Vec<Condition>) -> LogicalPlan {
    match conjoin(leaves) {
        Some(predicate) => LogicalPlan::Filter { predicate, input: Box::new(input) },
        None => input,
    }
}

fn wrap_filter_all(input: LogicalPlan, conditions: Vec<Condition>) -> LogicalPlan {
    let mut plan = input;
    for cond in conditions {
        plan = LogicalPlan::Filter { predicate: cond, input: Box::new(plan) };
    }
    plan
}

fn conjoin(mut leaves: Vec<Condition>) -> Option<Condition> {
    let mut iter = leaves.drain(..);
    let first = iter.next()?;
    Some(iter.fold(first, |acc, leaf| Condition::And(Box::new(acc), Box::new(leaf))))
}

/// Split a condition tree into pushable leaves, but only when it is a
/// pure `AND`-conjunction of comparisons. Any `OR` anywhere aborts
/// flattening for the whole tree.
fn flatten_conjunction(cond: &Condition) -> Option<Vec<Condition>> {
    match cond {
        Condition::Compare(_) => Some(vec![cond.clone()]),
        Condition::And(a, b) => {
            let mut left = flatten_conjunction(a)?;
            let right = flatten_conjunction(b)?;
            left.extend(right);
            Some(left)
        }
        Condition::Or(_, _) => None,
    }
}

/// Whether every column operand referenced by `leaf` is either bare or
/// explicitly qualified with `alias`. Conservative: any column qualified
/// with a different alias, or appearing bare while other tables are
/// already reachable, disqualifies the leaf from this table's filter.
fn leaf_belongs_to(leaf: &Condition, alias: &str) -> bool {
    match leaf {
        Condition::Compare(cmp) => operand_belongs_to(&cmp.left, alias) && operand_belongs_to(&cmp.right, alias),
        Condition::And(a, b) | Condition::Or(a, b) => leaf_belongs_to(a, alias) && leaf_belongs_to(b, alias),
    }
}

fn operand_belongs_to(operand: &Operand, alias: &str) -> bool {
    match operand {
        Operand::Literal(_) => true,
        Operand::Column(ColumnRef::Bare(_)) => false,
        Operand::Column(ColumnRef::Qualified(q, _)) => q.eq_ignore_ascii_case(alias),
    }
}

fn collect_aggregates(projection: &Projection) -> Vec<AggregateSpec> {
    match projection {
        Projection::Star => Vec::new(),
        Projection::Items(items) => items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Aggregate(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse_statement;

    fn plan_of(sql: &str) -> LogicalPlan {
        Planner::plan(parse_statement(sql).unwrap())
    }

    #[test]
    fn test_simple_select_no_where() {
        let plan = plan_of("SELECT * FROM t");
        assert!(matches!(plan, LogicalPlan::SeqScan { .. }));
    }

    #[test]
    fn test_conjunction_pushed_onto_primary_scan() {
        let plan = plan_of("SELECT * FROM t WHERE t.x = 1 AND t.y = 2");
        match plan {
            LogicalPlan::Filter { input, .. } => assert!(matches!(*input, LogicalPlan::SeqScan { .. })),
            _ => panic!("expected Filter directly over SeqScan"),
        }
    }

    #[test]
    fn test_or_disables_flattening() {
        let plan = plan_of("SELECT * FROM t WHERE x = 1 OR y = 2");
        match plan {
            LogicalPlan::Filter { predicate, input } => {
                assert!(matches!(predicate, Condition::Or(_, _)));
                assert!(matches!(*input, LogicalPlan::SeqScan { .. }));
            }
            _ => panic!("expected a single Filter wrapping the scan"),
        }
    }

    #[test]
    fn test_join_leaf_pushed_to_right_scan() {
        let plan = plan_of("SELECT * FROM s JOIN c ON s.id = c.sid WHERE c.name = 'x'");
        match plan {
            LogicalPlan::Join { right, .. } => match *right {
                LogicalPlan::Filter { input, .. } => assert!(matches!(*input, LogicalPlan::SeqScan { .. })),
                _ => panic!("expected pushed filter on right scan"),
            },
            _ => panic!("expected Join"),
        }
    }

    #[test]
    fn test_group_by_wraps_aggregate() {
        let plan = plan_of("SELECT region, SUM(amt) FROM sales GROUP BY region");
        match plan {
            LogicalPlan::Project { input, .. } => match *input {
                LogicalPlan::Aggregate { input, .. } => assert!(matches!(*input, LogicalPlan::GroupBy { .. })),
                _ => panic!("expected Aggregate"),
            },
            _ => panic!("expected Project"),
        }
    }

    #[test]
    fn test_order_by_wraps_innermost_plan() {
        let plan = plan_of("SELECT x FROM t ORDER BY x DESC");
        assert!(matches!(plan, LogicalPlan::Project { .. }));
    }
}
