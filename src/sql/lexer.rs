//! Command lexer (tokenizer)
//!
//! This module converts command strings into a stream of tokens.

use super::token::Token;
use crate::error::{Error, Result};

/// Command lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        let single = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '.' => Some(Token::Dot),
            '*' => Some(Token::Asterisk),
            '=' => Some(Token::Eq),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match ch {
            '<' => {
                self.advance();
                match self.peek_current() {
                    Some('=') => {
                        self.advance();
                        Ok(Token::Lte)
                    }
                    Some('>') => {
                        self.advance();
                        Ok(Token::Neq)
                    }
                    _ => Ok(Token::Lt),
                }
            }
            '>' => {
                self.advance();
                if self.peek_current() == Some('=') {
                    self.advance();
                    return Ok(Token::Gte);
                }
                Ok(Token::Gt)
            }
            '!' => {
                self.advance();
                if self.peek_current() == Some('=') {
                    self.advance();
                    return Ok(Token::Neq);
                }
                Err(Error::UnexpectedCharacter('!', self.position - 1))
            }
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                let digits = self.read_number();
                Ok(Token::Number(format!("-{}", digits)))
            }
            '\'' => self.read_string(),
            '"' => self.read_quoted_identifier(),
            c if c.is_ascii_digit() => Ok(Token::Number(self.read_number())),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c => Err(Error::UnexpectedCharacter(c, self.position)),
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Current character, if any
    fn peek_current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Read a string literal (single-quoted)
    fn read_string(&mut self) -> Result<Token> {
        self.read_delimited('\'').map(Token::StringLiteral)
    }

    /// Read a quoted identifier (double-quoted)
    fn read_quoted_identifier(&mut self) -> Result<Token> {
        self.read_delimited('"').map(Token::Identifier)
    }

    /// Read text up to the closing `quote`; a doubled quote is an escaped quote
    fn read_delimited(&mut self, quote: char) -> Result<String> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch == quote {
                if self.peek_char() == Some(quote) {
                    value.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    return Ok(value);
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::UnterminatedString(start_pos))
    }

    /// Read a number; digits with at most one decimal point, kept as text
    fn read_number(&mut self) -> String {
        let mut value = String::new();
        let mut seen_dot = false;

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.'
                && !seen_dot
                && self.peek_char().is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        value
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::from_keyword(&value).unwrap_or(Token::Identifier(value))
    }
}
