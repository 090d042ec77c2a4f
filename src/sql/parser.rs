//! Recursive-descent parser: token stream → [`Statement`].

use crate::common::{Error, Position, Result};
use crate::catalog::ColumnType;
use crate::sql::ast::*;
use crate::sql::token::{Keyword, Lexer, Token, TokenKind};

/// Parse one statement from `source`, accepting an optional trailing
/// `;` and requiring nothing else follow it.
pub fn parse_statement(source: &str) -> Result<Statement> {
    let tokens = Lexer::tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let stmt = parser.statement()?;
    if parser.at_delimiter(';') {
        parser.advance();
    }
    parser.expect_eof()?;
    Ok(stmt)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn position(&self) -> Position {
        self.peek().position
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if *k == kw)
    }

    fn at_delimiter(&self, c: char) -> bool {
        matches!(&self.peek().kind, TokenKind::Delimiter(d) if *d == c)
    }

    fn at_operator(&self, op: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Operator(o) if *o == op)
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<()> {
        if self.at_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(format!("{kw:?}")))
        }
    }

    fn expect_delimiter(&mut self, c: char) -> Result<()> {
        if self.at_delimiter(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(format!("'{c}'")))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if matches!(self.peek().kind, TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if matches!(self.peek().kind, TokenKind::Identifier) {
            Ok(self.advance().text)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> Error {
        let tok = self.peek();
        Error::parse_expected(format!("unexpected token '{}'", tok.text), tok.position, expected)
    }

    fn statement(&mut self) -> Result<Statement> {
        if self.at_keyword(Keyword::Create) {
            self.create_table().map(Statement::CreateTable)
        } else if self.at_keyword(Keyword::Insert) {
            self.insert().map(Statement::Insert)
        } else if self.at_keyword(Keyword::Select) {
            self.select().map(Statement::Select)
        } else if self.at_keyword(Keyword::Update) {
            self.update().map(Statement::Update)
        } else if self.at_keyword(Keyword::Delete) {
            self.delete().map(Statement::Delete)
        } else {
            Err(self.unexpected("CREATE, INSERT, SELECT, UPDATE, or DELETE"))
        }
    }

    // ---- CREATE TABLE ----

    fn create_table(&mut self) -> Result<CreateTableStmt> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;
        self.expect_delimiter('(')?;
        let mut columns = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let column_type = self.column_type()?;
            columns.push(ColumnDeclaration { name, column_type });
            if self.at_delimiter(',') {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_delimiter(')')?;
        Ok(CreateTableStmt { table, columns })
    }

    fn column_type(&mut self) -> Result<ColumnType> {
        let pos = self.position();
        let kw = match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => Some(ColumnType::Int),
            TokenKind::Keyword(Keyword::Text) => Some(ColumnType::Text),
            TokenKind::Keyword(Keyword::Varchar) => Some(ColumnType::Varchar),
            _ => None,
        };
        match kw {
            Some(t) => {
                self.advance();
                Ok(t)
            }
            None => Err(Error::parse_expected("unknown column type", pos, "INT, TEXT, or VARCHAR")),
        }
    }

    // ---- INSERT ----

    fn insert(&mut self) -> Result<InsertStmt> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;
        let columns = if self.at_delimiter('(') {
            self.advance();
            let mut cols = Vec::new();
            loop {
                cols.push(self.expect_identifier()?);
                if self.at_delimiter(',') {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect_delimiter(')')?;
            Some(cols)
        } else {
            None
        };
        self.expect_keyword(Keyword::Values)?;
        let mut rows = Vec::new();
        loop {
            self.expect_delimiter('(')?;
            let mut values = Vec::new();
            loop {
                values.push(self.literal()?);
                if self.at_delimiter(',') {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect_delimiter(')')?;
            rows.push(values);
            if self.at_delimiter(',') {
                self.advance();
                continue;
            }
            break;
        }
        Ok(InsertStmt { table, columns, rows })
    }

    fn literal(&mut self) -> Result<Literal> {
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Literal::Int(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Literal::Text(s))
            }
            _ => Err(self.unexpected("an integer or string literal")),
        }
    }

    // ---- SELECT ----

    fn select(&mut self) -> Result<SelectStmt> {
        self.expect_keyword(Keyword::Select)?;
        let projection = self.projection()?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let alias = self.optional_alias()?;

        let mut joins = Vec::new();
        while let Some(kind) = self.peek_join_kind() {
            joins.push(self.join_clause(kind)?);
        }

        let filter = if self.at_keyword(Keyword::Where) {
            self.advance();
            Some(self.condition()?)
        } else {
            None
        };

        let group_by = if self.at_keyword(Keyword::Group) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            let mut cols = vec![self.column_ref()?];
            while self.at_delimiter(',') {
                self.advance();
                cols.push(self.column_ref()?);
            }
            Some(cols)
        } else {
            None
        };

        let having = if self.at_keyword(Keyword::Having) {
            self.advance();
            Some(self.condition()?)
        } else {
            None
        };

        let mut order_by = Vec::new();
        if self.at_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            loop {
                let column = self.column_ref()?;
                let direction = if self.at_keyword(Keyword::Desc) {
                    self.advance();
                    OrderDirection::Desc
                } else if self.at_keyword(Keyword::Asc) {
                    self.advance();
                    OrderDirection::Asc
                } else {
                    OrderDirection::Asc
                };
                order_by.push(OrderKey { column, direction });
                if self.at_delimiter(',') {
                    self.advance();
                    continue;
                }
                break;
            }
        }

        Ok(SelectStmt { projection, table, alias, joins, filter, group_by, having, order_by })
    }

    fn optional_alias(&mut self) -> Result<Option<String>> {
        if self.at_keyword(Keyword::As) {
            self.advance();
            Ok(Some(self.expect_identifier()?))
        } else if matches!(self.peek().kind, TokenKind::Identifier) {
            Ok(Some(self.advance().text))
        } else {
            Ok(None)
        }
    }

    fn peek_join_kind(&self) -> Option<JoinKind> {
        if self.at_keyword(Keyword::Join) {
            return Some(JoinKind::Inner);
        }
        if self.at_keyword(Keyword::Inner) || self.at_keyword(Keyword::Left) || self.at_keyword(Keyword::Right) || self.at_keyword(Keyword::Outer) {
            return Some(JoinKind::Inner); // refined by join_clause once the explicit keyword is consumed
        }
        None
    }

    fn join_clause(&mut self, _default: JoinKind) -> Result<JoinClause> {
        let kind = if self.at_keyword(Keyword::Inner) {
            self.advance();
            JoinKind::Inner
        } else if self.at_keyword(Keyword::Left) {
            self.advance();
            JoinKind::Left
        } else if self.at_keyword(Keyword::Right) {
            self.advance();
            JoinKind::Right
        } else if self.at_keyword(Keyword::Outer) {
            self.advance();
            JoinKind::Outer
        } else {
            JoinKind::Inner
        };
        self.expect_keyword(Keyword::Join)?;
        let table = self.expect_identifier()?;
        let alias = self.optional_alias()?;
        self.expect_keyword(Keyword::On)?;
        let on = self.comparison_condition()?;
        Ok(JoinClause { kind, table, alias, on })
    }

    fn projection(&mut self) -> Result<Projection> {
        if self.at_delimiter('*') {
            self.advance();
            return Ok(Projection::Star);
        }
        let mut items = vec![self.select_item()?];
        while self.at_delimiter(',') {
            self.advance();
            items.push(self.select_item()?);
        }
        Ok(Projection::Items(items))
    }

    fn select_item(&mut self) -> Result<SelectItem> {
        if let Some(func) = self.peek_aggregate_func() {
            self.advance();
            self.expect_delimiter('(')?;
            let arg = if self.at_delimiter('*') {
                if func != AggregateFunc::Count {
                    return Err(self.unexpected("a column reference (only COUNT accepts '*')"));
                }
                self.advance();
                None
            } else {
                Some(self.column_ref()?)
            };
            self.expect_delimiter(')')?;
            let alias = if self.at_keyword(Keyword::As) {
                self.advance();
                Some(self.expect_identifier()?)
            } else {
                None
            };
            return Ok(SelectItem::Aggregate(AggregateSpec { func, arg, alias }));
        }

        let column = self.column_ref()?;
        if self.at_keyword(Keyword::As) {
            self.advance();
            let alias = self.expect_identifier()?;
            Ok(SelectItem::ColumnAliased(column, alias))
        } else {
            Ok(SelectItem::Column(column))
        }
    }

    fn peek_aggregate_func(&self) -> Option<AggregateFunc> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Count) => Some(AggregateFunc::Count),
            TokenKind::Keyword(Keyword::Sum) => Some(AggregateFunc::Sum),
            TokenKind::Keyword(Keyword::Avg) => Some(AggregateFunc::Avg),
            TokenKind::Keyword(Keyword::Min) => Some(AggregateFunc::Min),
            TokenKind::Keyword(Keyword::Max) => Some(AggregateFunc::Max),
            _ => None,
        }
    }

    // ---- UPDATE / DELETE ----

    fn update(&mut self) -> Result<UpdateStmt> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;
        let mut assignments = vec![self.assignment()?];
        while self.at_delimiter(',') {
            self.advance();
            assignments.push(self.assignment()?);
        }
        let filter = if self.at_keyword(Keyword::Where) {
            self.advance();
            Some(self.condition()?)
        } else {
            None
        };
        Ok(UpdateStmt { table, assignments, filter })
    }

    fn assignment(&mut self) -> Result<Assignment> {
        let column = self.expect_identifier()?;
        if !self.at_operator("=") {
            return Err(self.unexpected("'='"));
        }
        self.advance();
        let value = self.literal()?;
        Ok(Assignment { column, value })
    }

    fn delete(&mut self) -> Result<DeleteStmt> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let filter = if self.at_keyword(Keyword::Where) {
            self.advance();
            Some(self.condition()?)
        } else {
            None
        };
        Ok(DeleteStmt { table, filter })
    }

    // ---- conditions ----

    fn condition(&mut self) -> Result<Condition> {
        self.or_condition()
    }

    fn or_condition(&mut self) -> Result<Condition> {
        let mut left = self.and_condition()?;
        while self.at_keyword(Keyword::Or) {
            self.advance();
            let right = self.and_condition()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_condition(&mut self) -> Result<Condition> {
        let mut left = self.comparison_condition()?;
        while self.at_keyword(Keyword::And) {
            self.advance();
            let right = self.comparison_condition()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn comparison_condition(&mut self) -> Result<Condition> {
        let left = self.operand()?;
        let op = self.compare_op()?;
        let right = self.operand()?;
        Ok(Condition::Compare(Comparison { left, op, right }))
    }

    fn compare_op(&mut self) -> Result<CompareOp> {
        let pos = self.position();
        let op = match &self.peek().kind {
            TokenKind::Operator("=") => CompareOp::Eq,
            TokenKind::Operator("<>") | TokenKind::Operator("!=") => CompareOp::Ne,
            TokenKind::Operator("<") => CompareOp::Lt,
            TokenKind::Operator(">") => CompareOp::Gt,
            TokenKind::Operator("<=") => CompareOp::Le,
            TokenKind::Operator(">=") => CompareOp::Ge,
            _ => return Err(Error::parse_expected("expected a comparison operator", pos, "= <> != < > <= >=")),
        };
        self.advance();
        Ok(op)
    }

    fn operand(&mut self) -> Result<Operand> {
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Operand::Literal(Literal::Int(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Operand::Literal(Literal::Text(s)))
            }
            TokenKind::Identifier => Ok(Operand::Column(self.column_ref()?)),
            _ => Err(self.unexpected("a column reference or literal")),
        }
    }

    fn column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier()?;
        if self.at_delimiter('.') {
            self.advance();
            let second = self.expect_identifier()?;
            Ok(ColumnRef::Qualified(first, second))
        } else {
            Ok(ColumnRef::Bare(first))
        }
    }
}
