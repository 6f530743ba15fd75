//! The single error kind raised anywhere in the sysir pipeline.
//!
//! One `thiserror`-derived enum, shared by every crate in the workspace,
//! carries a formatted message and no local recovery — callers either
//! propagate the error or abort the pipeline.

use crate::position::Position;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SysirError {
    // --- Lexer / parser shape errors ---
    #[error("unexpected character '{found}' at {position}")]
    UnexpectedChar { found: char, position: Position },

    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: Position },

    #[error("unexpected end of input while {context} at {position}")]
    UnexpectedEof { context: String, position: Position },

    #[error("expected a list, found {found} at {position}")]
    ExpectedList { found: String, position: Position },

    #[error("expected instruction to be a list, got {found} at {position}")]
    ExpectedInstructionList { found: String, position: Position },

    #[error("invalid instruction, no opcode at {position}")]
    MissingOpcode { position: Position },

    #[error("expected opcode symbol, found {found} at {position}")]
    ExpectedOpcodeSymbol { found: String, position: Position },

    #[error("unknown instruction `{name}` at {position}")]
    UnknownOpcode { name: String, position: Position },

    #[error("unknown primitive type `{name}` at {position}")]
    UnknownPrimitive { name: String, position: Position },

    #[error("expected instruction of length {expected}, got {actual} at {position}")]
    WrongArity {
        expected: usize,
        actual: usize,
        position: Position,
    },

    #[error("expected instruction of at least length {minimum}, got {actual} at {position}")]
    TooFewOperands {
        minimum: usize,
        actual: usize,
        position: Position,
    },

    #[error("expected non-negative integer operand, got {found} at {position}")]
    ExpectedNonNegativeInteger { found: String, position: Position },

    #[error("missing required key `{key}` in assembly record")]
    MissingKey { key: String },

    #[error("key `{key}` has the wrong shape: expected {expected}, got {found}")]
    WrongKeyShape {
        key: String,
        expected: String,
        found: String,
    },

    // --- Assembler structural errors ---
    #[error("last instruction must be jump or return, got {found}")]
    MissingTerminator { found: String },

    #[error("jump target {target} is not a valid instruction index (module has {count} instructions)")]
    InvalidJumpTarget { target: u32, count: u32 },

    // --- Verifier type errors ---
    #[error("type failure: type-id:{expected} does not match type-id:{actual} at {position}")]
    TypeMismatch {
        expected: u32,
        actual: u32,
        position: Position,
    },

    #[error("type failure: expected boolean, got type-id:{found} at {position}")]
    ExpectedBoolean { found: u32, position: Position },

    #[error("type failure: expected integer, got type-id:{found} at {position}")]
    ExpectedInteger { found: u32, position: Position },

    #[error("type failure: expected pointer, got type-id:{found} at {position}")]
    ExpectedPointer { found: u32, position: Position },

    #[error("type failure: expected struct, got type-id:{found} at {position}")]
    ExpectedStruct { found: u32, position: Position },

    #[error("invalid field index {field} for struct type-id:{type_id} ({field_count} fields)")]
    InvalidFieldIndex {
        field: u32,
        type_id: u32,
        field_count: u32,
    },

    #[error(
        "field of type type-id:{field_type} does not match destination type-id:{dest_type} \
         at {position}"
    )]
    FieldTypeMismatch {
        field_type: u32,
        dest_type: u32,
        position: Position,
    },

    #[error(
        "multiple return types are not allowed: type-id:{first} and type-id:{second} \
         at {position}"
    )]
    ReturnTypeMismatch {
        first: u32,
        second: u32,
        position: Position,
    },
}

pub type Result<T> = std::result::Result<T, SysirError>;
