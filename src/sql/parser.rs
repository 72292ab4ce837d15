//! Command Parser
//!
//! This module parses command tokens into a [`Command`].
//!
//! Grammar:
//!
//! ```text
//! command   := insert | select | delete [';']
//! insert    := INSERT INTO ident ['(' ident (',' ident)* ')'] VALUES '(' literal (',' literal)* ')'
//! select    := SELECT item (',' item)* FROM ident (',' ident)* [WHERE predicate]
//! delete    := DELETE FROM ident WHERE predicate
//! item      := '*' | column
//! column    := ident ['.' ident]
//! predicate := term (AND term)*
//! term      := alt (OR alt)*
//! alt       := '(' term ')' | column '=' literal
//! literal   := string | number | ident
//! ```
//!
//! An alternative that is not `column = literal` is kept as
//! [`Condition::Malformed`] so the engine can decide how to report it.

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::error::{Error, Result};

/// Command Parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a command string
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single command; trailing input other than `;` is an error
    pub fn parse(&mut self) -> Result<Command> {
        let command = self.parse_command()?;

        // Consume optional semicolon
        if self.check(&Token::Semicolon) {
            self.advance();
        }

        if !self.is_at_end() {
            return Err(Error::UnexpectedToken {
                expected: "end of command".to_string(),
                found: format!("{}", self.current()),
            });
        }

        Ok(command)
    }

    fn parse_command(&mut self) -> Result<Command> {
        match self.current() {
            Token::Select => self.parse_select().map(Command::Select),
            Token::Insert => self.parse_insert().map(Command::Insert),
            Token::Delete => self.parse_delete().map(Command::Delete),
            _ => Err(Error::UnexpectedToken {
                expected: "SELECT, INSERT, or DELETE".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    // ========== SELECT Command ==========

    fn parse_select(&mut self) -> Result<SelectCommand> {
        self.expect(&Token::Select)?;

        let columns = self.parse_select_list()?;

        self.expect(&Token::From)?;
        let mut tables = vec![self.expect_identifier()?];
        while self.check(&Token::Comma) {
            self.advance();
            tables.push(self.expect_identifier()?);
        }

        let predicate = if self.check(&Token::Where) {
            self.advance();
            Some(self.parse_predicate()?)
        } else {
            None
        };

        Ok(SelectCommand {
            columns,
            tables,
            predicate,
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = vec![self.parse_select_item()?];

        while self.check(&Token::Comma) {
            self.advance();
            items.push(self.parse_select_item()?);
        }

        Ok(items)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.check(&Token::Asterisk) {
            self.advance();
            return Ok(SelectItem::Wildcard);
        }
        self.parse_column_ref().map(SelectItem::Column)
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier()?;

        if self.check(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            return Ok(ColumnRef::qualified(first, column));
        }

        Ok(ColumnRef::new(first))
    }

    // ========== INSERT Command ==========

    fn parse_insert(&mut self) -> Result<InsertCommand> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table_name = self.expect_identifier()?;

        // Optional column list; values are always taken in schema order
        if self.check(&Token::LParen) {
            self.advance();
            self.expect_identifier()?;
            while self.check(&Token::Comma) {
                self.advance();
                self.expect_identifier()?;
            }
            self.expect(&Token::RParen)?;
        }

        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;

        let mut values = vec![self.expect_literal()?];
        while self.check(&Token::Comma) {
            self.advance();
            values.push(self.expect_literal()?);
        }

        self.expect(&Token::RParen)?;

        Ok(InsertCommand { table_name, values })
    }

    // ========== DELETE Command ==========

    fn parse_delete(&mut self) -> Result<DeleteCommand> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let table_name = self.expect_identifier()?;

        self.expect(&Token::Where)?;
        let predicate = self.parse_predicate()?;

        Ok(DeleteCommand {
            table_name,
            predicate,
        })
    }

    // ========== WHERE Predicate ==========

    fn parse_predicate(&mut self) -> Result<Predicate> {
        let mut terms = vec![self.parse_disjunction()?];

        while self.check(&Token::And) {
            self.advance();
            terms.push(self.parse_disjunction()?);
        }

        Ok(Predicate { terms })
    }

    fn parse_disjunction(&mut self) -> Result<Disjunction> {
        let mut alternatives = Vec::new();
        self.parse_alternative(&mut alternatives)?;

        while self.check(&Token::Or) {
            self.advance();
            self.parse_alternative(&mut alternatives)?;
        }

        Ok(Disjunction { alternatives })
    }

    /// Parse one alternative; a parenthesised term is flattened into `out`
    fn parse_alternative(&mut self, out: &mut Vec<Condition>) -> Result<()> {
        if self.check(&Token::LParen) {
            self.advance();
            let inner = self.parse_disjunction()?;
            self.expect(&Token::RParen)?;
            out.extend(inner.alternatives);
            return Ok(());
        }

        let start = self.position;
        if let Some(condition) = self.try_parse_equality() {
            out.push(condition);
            return Ok(());
        }
        self.position = start;

        let mut text = Vec::new();
        while !self.at_term_boundary() {
            text.push(self.current().to_string());
            self.advance();
        }

        if text.is_empty() {
            return Err(Error::UnexpectedToken {
                expected: "condition".to_string(),
                found: format!("{}", self.current()),
            });
        }

        out.push(Condition::Malformed(text.join(" ")));
        Ok(())
    }

    fn try_parse_equality(&mut self) -> Option<Condition> {
        let column = self.parse_column_ref().ok()?;
        if !self.check(&Token::Eq) {
            return None;
        }
        self.advance();
        let quoted = matches!(self.current(), Token::StringLiteral(_));
        let value = self.expect_literal().ok()?;

        if !self.at_term_boundary() {
            return None;
        }

        Some(Condition::Equals {
            column,
            value,
            quoted,
        })
    }

    fn at_term_boundary(&self) -> bool {
        matches!(
            self.current(),
            Token::And | Token::Or | Token::RParen | Token::Semicolon | Token::Eof
        )
    }

    // ========== Helper Methods ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: format!("{}", token),
                found: format!("{}", self.current()),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(Error::UnexpectedToken {
                expected: "identifier".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    /// A value: quoted string, number, or bare word
    fn expect_literal(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::StringLiteral(s) | Token::Number(s) | Token::Identifier(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(Error::UnexpectedToken {
                expected: "value".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }
}

/// Parse a single command string
pub fn parse_command(input: &str) -> Result<Command> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_select() {
        let command = parse_command("SELECT * FROM users").unwrap();

        match command {
            Command::Select(s) => {
                assert_eq!(s.columns, vec![SelectItem::Wildcard]);
                assert_eq!(s.tables, vec!["users".to_string()]);
                assert!(s.predicate.is_none());
            }
            _ => panic!("Expected SELECT command"),
        }
    }

    #[test]
    fn test_parse_select_with_where() {
        let command =
            parse_command("select name, users.id from users, staff where status = 'a' and id = 3;")
                .unwrap();

        match command {
            Command::Select(s) => {
                assert_eq!(
                    s.columns,
                    vec![
                        SelectItem::Column(ColumnRef::new("name")),
                        SelectItem::Column(ColumnRef::qualified("users", "id")),
                    ]
                );
                assert_eq!(s.tables, vec!["users".to_string(), "staff".to_string()]);
                assert_eq!(
                    s.predicate,
                    Some(Predicate {
                        terms: vec![
                            Disjunction::single(Condition::quoted("status", "a")),
                            Disjunction::single(Condition::equals("id", "3")),
                        ]
                    })
                );
            }
            _ => panic!("Expected SELECT command"),
        }
    }

    #[test]
    fn test_parse_or_groups() {
        let command =
            parse_command("SELECT * FROM t WHERE (a = 1 OR a = 2) AND b = x OR b = 'y z'").unwrap();

        let Command::Select(s) = command else {
            panic!("Expected SELECT command");
        };
        let pred = s.predicate.unwrap();
        assert_eq!(pred.terms.len(), 2);
        assert_eq!(
            pred.terms[0],
            Disjunction::any(vec![Condition::equals("a", "1"), Condition::equals("a", "2")])
        );
        assert_eq!(
            pred.terms[1],
            Disjunction::any(vec![
                Condition::equals("b", "x"),
                Condition::quoted("b", "y z")
            ])
        );
    }

    #[test]
    fn test_parse_malformed_condition() {
        let command = parse_command("SELECT * FROM t WHERE a > 3 AND b = 1").unwrap();

        let Command::Select(s) = command else {
            panic!("Expected SELECT command");
        };
        let pred = s.predicate.unwrap();
        assert_eq!(
            pred.terms[0].alternatives[0],
            Condition::Malformed("a > 3".to_string())
        );
        assert_eq!(pred.terms[1], Disjunction::single(Condition::equals("b", "1")));
    }

    #[test]
    fn test_parse_quoted_value_keeps_inner_quotes() {
        let command = parse_command("DELETE FROM t WHERE v = '''x''' OR v = x").unwrap();

        let Command::Delete(d) = command else {
            panic!("Expected DELETE command");
        };
        assert_eq!(
            d.predicate.terms[0].alternatives,
            vec![Condition::quoted("v", "'x'"), Condition::equals("v", "x")]
        );
    }

    #[test]
    fn test_parse_insert() {
        let command =
            parse_command("INSERT INTO users (id, name) VALUES (1, 'Alice, Jr.', active)").unwrap();

        match command {
            Command::Insert(i) => {
                assert_eq!(i.table_name, "users");
                assert_eq!(i.values, vec!["1", "Alice, Jr.", "active"]);
            }
            _ => panic!("Expected INSERT command"),
        }
    }

    #[test]
    fn test_parse_delete() {
        let command = parse_command("DELETE FROM users WHERE id = 1").unwrap();

        match command {
            Command::Delete(d) => {
                assert_eq!(d.table_name, "users");
                assert_eq!(d.predicate, Predicate::equals("id", "1"));
            }
            _ => panic!("Expected DELETE command"),
        }
    }

    #[test]
    fn test_parse_errors() {
        // DELETE requires WHERE
        assert!(parse_command("DELETE FROM users").is_err());
        assert!(parse_command("UPDATE users SET a = 1").is_err());
        assert!(parse_command("SELECT FROM users").is_err());
        assert!(parse_command("SELECT * FROM users extra").is_err());
        assert!(parse_command("SELECT * FROM t WHERE").is_err());
        assert!(parse_command("SELECT * FROM t WHERE (a = 1").is_err());
        assert!(parse_command("INSERT INTO t VALUES ()").is_err());
    }
}
