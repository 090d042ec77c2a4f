//! Lexer: source text → ordered token stream.

use crate::common::{Error, Position, Result};

/// Recognized keywords, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Create,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Join,
    Inner,
    Left,
    Right,
    Outer,
    On,
    As,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    And,
    Or,
    Int,
    Text,
    Varchar,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        Some(match word.to_ascii_uppercase().as_str() {
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "JOIN" => Keyword::Join,
            "INNER" => Keyword::Inner,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "OUTER" => Keyword::Outer,
            "ON" => Keyword::On,
            "AS" => Keyword::As,
            "GROUP" => Keyword::Group,
            "BY" => Keyword::By,
            "HAVING" => Keyword::Having,
            "ORDER" => Keyword::Order,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "INT" => Keyword::Int,
            "TEXT" => Keyword::Text,
            "VARCHAR" => Keyword::Varchar,
            "COUNT" => Keyword::Count,
            "SUM" => Keyword::Sum,
            "AVG" => Keyword::Avg,
            "MIN" => Keyword::Min,
            "MAX" => Keyword::Max,
            _ => return None,
        })
    }
}

/// The kind of lexeme a [`Token`] carries.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    Number(i64),
    String(String),
    /// One of `= <> != < > <= >= + - * / %`.
    Operator(&'static str),
    /// One of `, ; ( ) .`.
    Delimiter(char),
    Eof,
}

/// A tagged lexeme with its original text and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

/// Tokenizes a SQL source string, left to right.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source, ending with a single [`TokenKind::Eof`].
    pub fn tokenize(source: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();
        let start = self.position();
        let Some(c) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, text: String::new(), position: start });
        };

        if c.is_ascii_digit() {
            return self.lex_number(start);
        }
        if c.is_alphabetic() || c == '_' {
            return self.lex_word(start);
        }
        if c == '\'' {
            return self.lex_string(start);
        }

        match c {
            ',' | ';' | '(' | ')' | '.' => {
                self.advance();
                Ok(Token { kind: TokenKind::Delimiter(c), text: c.to_string(), position: start })
            }
            '*' => {
                self.advance();
                Ok(Token { kind: TokenKind::Delimiter('*'), text: "*".into(), position: start })
            }
            '=' | '+' | '-' | '/' | '%' => {
                self.advance();
                let s: &'static str = match c {
                    '=' => "=",
                    '+' => "+",
                    '-' => "-",
                    '/' => "/",
                    '%' => "%",
                    _ => unreachable!(),
                };
                Ok(Token { kind: TokenKind::Operator(s), text: s.into(), position: start })
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token { kind: TokenKind::Operator("<="), text: "<=".into(), position: start })
                } else if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token { kind: TokenKind::Operator("<>"), text: "<>".into(), position: start })
                } else {
                    Ok(Token { kind: TokenKind::Operator("<"), text: "<".into(), position: start })
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token { kind: TokenKind::Operator(">="), text: ">=".into(), position: start })
                } else {
                    Ok(Token { kind: TokenKind::Operator(">"), text: ">".into(), position: start })
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token { kind: TokenKind::Operator("!="), text: "!=".into(), position: start })
                } else {
                    Err(Error::lex_expected("lone '!' is not a valid operator", start, "!="))
                }
            }
            other => Err(Error::lex(format!("unexpected character '{other}'"), start)),
        }
    }

    fn lex_number(&mut self, start: Position) -> Result<Token> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let value: i64 = text
            .parse()
            .map_err(|_| Error::lex(format!("integer literal '{text}' out of range"), start))?;
        Ok(Token { kind: TokenKind::Number(value), text, position: start })
    }

    fn lex_word(&mut self, start: Position) -> Result<Token> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match Keyword::lookup(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        Ok(Token { kind, text, position: start })
    }

    fn lex_string(&mut self, start: Position) -> Result<Token> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.advance() {
                None => return Err(Error::lex_expected("unterminated string literal", start, "'")),
                Some('\'') => break,
                Some('\\') => match self.advance() {
                    Some('\\') => text.push('\\'),
                    Some('\'') => text.push('\''),
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => return Err(Error::lex_expected("unterminated string literal", start, "'")),
                },
                Some(c) => text.push(c),
            }
        }
        Ok(Token { kind: TokenKind::String(text.clone()), text, position: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(kinds("select"), vec![TokenKind::Keyword(Keyword::Select), TokenKind::Eof]);
        assert_eq!(kinds("SeLeCt"), vec![TokenKind::Keyword(Keyword::Select), TokenKind::Eof]);
    }

    #[test]
    fn test_identifier_preserves_case() {
        let tokens = Lexer::tokenize("MyTable").unwrap();
        assert_eq!(tokens[0].text, "MyTable");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::tokenize(r"'it\'s \\ok'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String("it's \\ok".to_string()));
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("<= >= <> != < >"),
            vec![
                TokenKind::Operator("<="),
                TokenKind::Operator(">="),
                TokenKind::Operator("<>"),
                TokenKind::Operator("!="),
                TokenKind::Operator("<"),
                TokenKind::Operator(">"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_comment_skipped() {
        let tokens = Lexer::tokenize("SELECT -- trailing comment\n*").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Select));
        assert_eq!(tokens[1].kind, TokenKind::Delimiter('*'));
    }

    #[test]
    fn test_lone_bang_errors() {
        assert!(Lexer::tokenize("a ! b").is_err());
    }

    #[test]
    fn test_unterminated_string_errors() {
        assert!(Lexer::tokenize("'abc").is_err());
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = Lexer::tokenize("SELECT\n*").unwrap();
        assert_eq!(tokens[1].position.line, 2);
    }
}
