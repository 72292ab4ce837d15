//! Command token definitions
//!
//! This module defines all tokens that can appear in FlatDB commands.

use std::fmt;

/// Command token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Keywords ==========
    Select,
    Insert,
    Delete,
    Into,
    Values,
    From,
    Where,
    And,
    Or,

    // ========== Literals ==========
    /// Numeric literal, kept as written (`007` stays `007`)
    Number(String),
    /// String literal (single-quoted)
    StringLiteral(String),
    /// Identifier (table name, column name, bare value)
    Identifier(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,
    /// *
    Asterisk,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Try to parse a keyword from a string (case-insensitive)
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "SELECT" => Some(Token::Select),
            "INSERT" => Some(Token::Insert),
            "DELETE" => Some(Token::Delete),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Select => write!(f, "SELECT"),
            Token::Insert => write!(f, "INSERT"),
            Token::Delete => write!(f, "DELETE"),
            Token::Into => write!(f, "INTO"),
            Token::Values => write!(f, "VALUES"),
            Token::From => write!(f, "FROM"),
            Token::Where => write!(f, "WHERE"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Number(n) => write!(f, "{}", n),
            Token::StringLiteral(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::Asterisk => write!(f, "*"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(Token::from_keyword("select"), Some(Token::Select));
        assert_eq!(Token::from_keyword("Where"), Some(Token::Where));
        assert_eq!(Token::from_keyword("status"), None);
    }

    #[test]
    fn test_display_escapes_strings() {
        assert_eq!(
            Token::StringLiteral("it's".to_string()).to_string(),
            "'it''s'"
        );
        assert_eq!(Token::Number("007".to_string()).to_string(), "007");
    }
}
