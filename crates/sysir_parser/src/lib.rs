//! S-expression parsing and assembly-record extraction for the sysir
//! textual front-end.

pub mod assembly;
pub mod sexp;

pub use assembly::{parse_assembly_input, AssemblyInput};
pub use sexp::{parse, Parser, Sexp, Spanned};
