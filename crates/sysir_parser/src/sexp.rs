//! A minimal S-expression tree and a recursive-descent parser over
//! `sysir_lexer` tokens, built as a `Parser` with `current`/`advance`/`check`
//! helpers over the token stream.

use sysir_common::{Position, Result, SysirError};
use sysir_lexer::{Token, TokenKind};

/// A parsed S-expression node, carrying the position of its first token so
/// instructions (and their synthesized `arg` continuations) can forward
/// accurate source positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Keyword(String),
    /// Each child keeps its own position, so a list's elements (an
    /// instruction's operands, or the assembly record's key/value pairs)
    /// can forward accurate source positions downstream.
    List(Vec<Spanned<Sexp>>),
}

impl Sexp {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexp::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Sexp::Keyword(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Spanned<Sexp>]> {
        match self {
            Sexp::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Sexp::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexp::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Sexp::Int(_) => "integer",
            Sexp::Float(_) => "float",
            Sexp::Str(_) => "string",
            Sexp::Symbol(_) => "symbol",
            Sexp::Keyword(_) => "keyword",
            Sexp::List(_) => "list",
        }
    }
}

/// A `Sexp` together with the position of its opening token.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub position: Position,
}

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        tok
    }

    /// Parse every top-level form in the token stream.
    pub fn parse_all(&mut self) -> Result<Vec<Spanned<Sexp>>> {
        let mut forms = Vec::new();
        while !matches!(self.current().kind, TokenKind::Eof) {
            forms.push(self.parse_form()?);
        }
        Ok(forms)
    }

    fn parse_form(&mut self) -> Result<Spanned<Sexp>> {
        let position = self.current().position;
        let node = match self.current().kind.clone() {
            TokenKind::LeftParen => self.parse_list()?,
            TokenKind::Integer(i) => {
                self.advance();
                Sexp::Int(i)
            }
            TokenKind::Float(f) => {
                self.advance();
                Sexp::Float(f)
            }
            TokenKind::Str(s) => {
                self.advance();
                Sexp::Str(s)
            }
            TokenKind::Symbol(s) => {
                self.advance();
                Sexp::Symbol(s)
            }
            TokenKind::Keyword(s) => {
                self.advance();
                Sexp::Keyword(s)
            }
            TokenKind::RightParen => {
                return Err(SysirError::UnexpectedEof {
                    context: "reading a form (found a stray ')')".to_string(),
                    position,
                })
            }
            TokenKind::Eof => {
                return Err(SysirError::UnexpectedEof {
                    context: "reading a form".to_string(),
                    position,
                })
            }
        };
        Ok(Spanned { node, position })
    }

    fn parse_list(&mut self) -> Result<Sexp> {
        self.advance(); // consume '('
        let mut items = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::RightParen => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(SysirError::UnexpectedEof {
                        context: "reading a list, expected ')'".to_string(),
                        position: self.current().position,
                    })
                }
                _ => items.push(self.parse_form()?),
            }
        }
        Ok(Sexp::List(items))
    }
}

/// Parse `text` into its top-level forms.
pub fn parse(text: &str) -> Result<Vec<Spanned<Sexp>>> {
    let tokens = sysir_lexer::tokenize(text)?;
    Parser::new(tokens).parse_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nodes(list: &Sexp) -> Vec<Sexp> {
        list.as_list()
            .expect("expected a list")
            .iter()
            .map(|s| s.node.clone())
            .collect()
    }

    #[test]
    fn parses_nested_lists() {
        let forms = parse("(add 2 0 1)").unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(
            nodes(&forms[0].node),
            vec![
                Sexp::Symbol("add".into()),
                Sexp::Int(2),
                Sexp::Int(0),
                Sexp::Int(1),
            ]
        );
    }

    #[test]
    fn parses_keywords_and_strings_inside_lists() {
        let forms = parse(r#"(:link-name "add")"#).unwrap();
        assert_eq!(
            nodes(&forms[0].node),
            vec![Sexp::Keyword("link-name".into()), Sexp::Str("add".into())]
        );
    }

    #[test]
    fn list_elements_keep_their_own_positions() {
        let forms = parse("(add\n  2 0 1)").unwrap();
        let items = forms[0].node.as_list().unwrap();
        // `2` sits on the second line, not the position of the opening `(`.
        assert_eq!(items[1].position.line, 2);
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(parse("(add 1 2").is_err());
        assert!(parse("add 1 2)").is_err());
    }
}
