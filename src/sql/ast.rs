//! Abstract syntax tree: one variant per statement kind.

use crate::catalog::ColumnType;
use crate::common::Value;

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Bare(String),
    Qualified(String, String),
}

impl ColumnRef {
    /// The bare column name, dropping any qualifier.
    pub fn name(&self) -> &str {
        match self {
            ColumnRef::Bare(n) => n,
            ColumnRef::Qualified(_, n) => n,
        }
    }

    /// The qualifier (table name or alias), if present.
    pub fn qualifier(&self) -> Option<&str> {
        match self {
            ColumnRef::Bare(_) => None,
            ColumnRef::Qualified(q, _) => Some(q),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Bare(n) => write!(f, "{n}"),
            ColumnRef::Qualified(q, n) => write!(f, "{q}.{n}"),
        }
    }
}

/// A literal constant, as it appears in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Text(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Int(i) => Value::Int(*i),
            Literal::Text(s) => Value::Text(s.clone()),
        }
    }
}

/// A comparison or column operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Literal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

/// A predicate tree: comparisons combined by `AND`/`OR`.
///
/// `Or` is a first-class node, preserved end to end through planning and
/// execution rather than flattened away.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Comparison),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on: Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
        }
    }
}

/// An aggregate function application: `arg == None` means `COUNT(*)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub func: AggregateFunc,
    pub arg: Option<ColumnRef>,
    pub alias: Option<String>,
}

impl AggregateSpec {
    /// The output column name: the alias if present, else a synthesized
    /// `FUNC(col)` / `FUNC(*)` label.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.arg {
            Some(col) => format!("{}({})", self.func.name(), col),
            None => format!("{}(*)", self.func.name()),
        }
    }
}

/// One item of a `SELECT` projection list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Column(ColumnRef),
    ColumnAliased(ColumnRef, String),
    Aggregate(AggregateSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub column: ColumnRef,
    pub direction: OrderDirection,
}

/// `CREATE TABLE` column declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDeclaration {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table: String,
    pub columns: Vec<ColumnDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Vec<Literal>>,
}

/// A `SELECT`'s projection: either `*` or an explicit item list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Star,
    Items(Vec<SelectItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub projection: Projection,
    pub table: String,
    pub alias: Option<String>,
    pub joins: Vec<JoinClause>,
    pub filter: Option<Condition>,
    pub group_by: Option<Vec<ColumnRef>>,
    pub having: Option<Condition>,
    pub order_by: Vec<OrderKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub filter: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: String,
    pub filter: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStmt),
    Insert(InsertStmt),
    Select(SelectStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
}
