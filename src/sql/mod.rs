//! Command language front end
//!
//! Tokenizer and recursive-descent parser turning command text into a
//! typed [`Command`].

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    ColumnRef, Command, Condition, DeleteCommand, Disjunction, InsertCommand, Predicate,
    SelectCommand, SelectItem,
};
pub use lexer::Lexer;
pub use parser::{parse_command, Parser};
pub use token::Token;
