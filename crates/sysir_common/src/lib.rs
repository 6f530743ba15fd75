//! Shared source positions and the single error type used across the
//! sysir pipeline: lexer, parser, assembler, type resolver/verifier, and
//! C lowerer all return `sysir_common::Result<T>`.

pub mod error;
pub mod position;

pub use error::{Result, SysirError};
pub use position::Position;
