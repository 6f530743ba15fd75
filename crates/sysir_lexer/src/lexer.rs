//! Character-by-character scanner for the sysir assembly surface.
//!
//! Grammar: parenthesized lists of symbols, `:keyword`s, integers, floats,
//! and double-quoted strings, with `;` line comments. This is the textual
//! surface over an otherwise already-structured instruction encoding.

use crate::token::{Token, TokenKind};
use sysir_common::{Position, Result, SysirError};

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: Position::start(),
        }
    }

    /// Tokenize the entire input, ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position.advance_char(ch);
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek_char() {
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
        let start = self.position;

        let ch = match self.peek_char() {
            None => return Ok(Token::new(TokenKind::Eof, "", start)),
            Some(c) => c,
        };

        match ch {
            '(' => {
                self.advance();
                Ok(Token::new(TokenKind::LeftParen, "(", start))
            }
            ')' => {
                self.advance();
                Ok(Token::new(TokenKind::RightParen, ")", start))
            }
            '"' => self.read_string(start),
            ':' => self.read_keyword(start),
            c if c == '-' || c.is_ascii_digit() => self.read_number_or_symbol(start),
            c if is_symbol_start(c) => self.read_symbol(start),
            c => Err(SysirError::UnexpectedChar {
                found: c,
                position: start,
            }),
        }
    }

    fn read_string(&mut self, start: Position) -> Result<Token> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(SysirError::UnterminatedString { position: start });
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => value.push(other),
                    None => return Err(SysirError::UnterminatedString { position: start }),
                },
                Some(c) => value.push(c),
            }
        }
        let lexeme = format!("\"{value}\"");
        Ok(Token::new(TokenKind::Str(value), lexeme, start))
    }

    fn read_keyword(&mut self, start: Position) -> Result<Token> {
        self.advance(); // ':'
        let name = self.read_while(is_symbol_continue);
        if name.is_empty() {
            return Err(SysirError::UnexpectedEof {
                context: "reading a keyword".to_string(),
                position: start,
            });
        }
        let lexeme = format!(":{name}");
        Ok(Token::new(TokenKind::Keyword(name), lexeme, start))
    }

    fn read_number_or_symbol(&mut self, start: Position) -> Result<Token> {
        let text = self.read_while(|c| c == '-' || c == '.' || c.is_ascii_digit());
        if text.is_empty() || text == "-" {
            let rest = self.read_while(is_symbol_continue);
            let name = format!("{text}{rest}");
            return Ok(Token::new(TokenKind::Symbol(name.clone()), name, start));
        }
        if text.contains('.') {
            match text.parse::<f64>() {
                Ok(f) => Ok(Token::new(TokenKind::Float(f), text, start)),
                Err(_) => Err(SysirError::UnexpectedChar {
                    found: text.chars().next().unwrap_or('?'),
                    position: start,
                }),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Ok(Token::new(TokenKind::Integer(i), text, start)),
                Err(_) => Err(SysirError::UnexpectedChar {
                    found: text.chars().next().unwrap_or('?'),
                    position: start,
                }),
            }
        }
    }

    fn read_symbol(&mut self, start: Position) -> Result<Token> {
        let name = self.read_while(is_symbol_continue);
        Ok(Token::new(TokenKind::Symbol(name.clone()), name, start))
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }
}

fn is_symbol_start(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')' && c != '"' && c != ':' && c != ';'
}

fn is_symbol_continue(c: char) -> bool {
    is_symbol_start(c)
}

/// Convenience wrapper matching the `asm`/`to_c` free-function style of §6.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}
