//! Tokenizer for the sysir textual assembly surface.
//!
//! A `Lexer` walks a `Position`-tracked character stream and produces
//! `Token`s for the tiny grammar the assembly format needs: lists,
//! symbols, keywords, numbers, and strings.

pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenKind};
