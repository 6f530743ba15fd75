//! Type resolution and structural verification for sysir modules: two
//! linear passes over the same instruction stream the assembler produced.

pub mod resolver;
pub mod verifier;

pub use resolver::resolve;
pub use verifier::verify;

use sysir_common::Result;
use sysir_ir::Module;

/// Run both passes in order: resolve types first, then verify operand
/// types and derive the return type. This is the shape the CLI driver
/// calls; the two passes stay separate functions because each has its
/// own focused test suite.
pub fn check(module: &mut Module) -> Result<()> {
    resolve(module)?;
    verify(module)
}
