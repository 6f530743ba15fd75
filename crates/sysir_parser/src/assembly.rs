//! Extracts the keyed assembly record — `instructions`,
//! `parameter-count`, `link-name` — from the parsed S-expression tree.

use crate::sexp::{parse, Sexp, Spanned};
use sysir_common::{Result, SysirError};

/// The keyed record the assembler consumes.
#[derive(Debug, Clone)]
pub struct AssemblyInput {
    /// One `Sexp` per instruction-sequence element: either a bare keyword
    /// (a label marker, ignored for now) or a list whose head is the
    /// opcode symbol.
    pub instructions: Vec<Spanned<Sexp>>,
    pub parameter_count: u32,
    pub link_name: String,
}

const DEFAULT_LINK_NAME: &str = "_thunk";

/// Parse a complete `(asm :link-name ... :parameter-count ... :instructions (...))`
/// top-level form out of `text`.
pub fn parse_assembly_input(text: &str) -> Result<AssemblyInput> {
    let forms = parse(text)?;
    let form = forms.into_iter().next().ok_or(SysirError::UnexpectedEof {
        context: "reading the top-level `asm` form".to_string(),
        position: sysir_common::Position::start(),
    })?;

    let items = form.node.as_list().ok_or_else(|| SysirError::ExpectedList {
        found: form.node.type_name().to_string(),
        position: form.position,
    })?;

    // First element must be the `asm` head symbol; the rest are
    // keyword/value pairs.
    let mut iter = items.iter();
    match iter.next().map(|s| &s.node) {
        Some(Sexp::Symbol(head)) if head == "asm" => {}
        Some(other) => {
            return Err(SysirError::ExpectedOpcodeSymbol {
                found: other.type_name().to_string(),
                position: form.position,
            })
        }
        None => {
            return Err(SysirError::UnexpectedEof {
                context: "reading the `asm` head symbol".to_string(),
                position: form.position,
            })
        }
    }

    let mut instructions: Option<Vec<Spanned<Sexp>>> = None;
    let mut parameter_count = 0u32;
    let mut link_name = DEFAULT_LINK_NAME.to_string();

    let rest: Vec<&Spanned<Sexp>> = iter.collect();
    let mut i = 0;
    while i < rest.len() {
        let key = rest[i].node.as_keyword().ok_or_else(|| SysirError::WrongKeyShape {
            key: "<record key>".to_string(),
            expected: "keyword".to_string(),
            found: rest[i].node.type_name().to_string(),
        })?;
        let value = rest.get(i + 1).ok_or_else(|| SysirError::MissingKey {
            key: key.to_string(),
        })?;
        match key {
            "parameter-count" => {
                parameter_count = value.node.as_int().ok_or_else(|| SysirError::WrongKeyShape {
                    key: "parameter-count".to_string(),
                    expected: "non-negative integer".to_string(),
                    found: value.node.type_name().to_string(),
                })? as u32;
            }
            "link-name" => {
                link_name = value
                    .node
                    .as_str()
                    .ok_or_else(|| SysirError::WrongKeyShape {
                        key: "link-name".to_string(),
                        expected: "string".to_string(),
                        found: value.node.type_name().to_string(),
                    })?
                    .to_string();
            }
            "instructions" => {
                let list = value.node.as_list().ok_or_else(|| SysirError::WrongKeyShape {
                    key: "instructions".to_string(),
                    expected: "list".to_string(),
                    found: value.node.type_name().to_string(),
                })?;
                instructions = Some(list.to_vec());
            }
            other => {
                return Err(SysirError::WrongKeyShape {
                    key: other.to_string(),
                    expected: "one of :instructions, :parameter-count, :link-name".to_string(),
                    found: "unknown key".to_string(),
                })
            }
        }
        i += 2;
    }

    let instructions = instructions.ok_or_else(|| SysirError::MissingKey {
        key: "instructions".to_string(),
    })?;

    Ok(AssemblyInput {
        instructions,
        parameter_count,
        link_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_keys_are_absent() {
        let input = parse_assembly_input("(asm :instructions ((return 0)))").unwrap();
        assert_eq!(input.parameter_count, 0);
        assert_eq!(input.link_name, "_thunk");
        assert_eq!(input.instructions.len(), 1);
    }

    #[test]
    fn reads_all_three_keys() {
        let input = parse_assembly_input(
            r#"(asm :link-name "add" :parameter-count 2 :instructions ((add 2 0 1) (return 2)))"#,
        )
        .unwrap();
        assert_eq!(input.link_name, "add");
        assert_eq!(input.parameter_count, 2);
        assert_eq!(input.instructions.len(), 2);
    }

    #[test]
    fn missing_instructions_is_an_error() {
        assert!(parse_assembly_input("(asm :parameter-count 1)").is_err());
    }
}
