//! The linear pipeline the CLI drives: structured input → assembler → IR
//! module → verifier (mutates module) → lowerer → C text.

use anyhow::{Context, Result};
use sysir_ir::Module;

/// Assemble and verify `source`, returning the checked module.
pub fn check(source: &str) -> Result<Module> {
    log::debug!("parsing assembly record");
    let input = sysir_parser::parse_assembly_input(source).context("parsing assembly record")?;

    log::debug!("assembling {} instruction(s)", input.instructions.len());
    let mut module = sysir_ir::assemble(&input).context("assembling module")?;

    log::debug!("resolving and verifying types");
    sysir_typecheck::check(&mut module).context("type-checking module")?;

    Ok(module)
}

/// Run the full pipeline and lower the result to C source text.
pub fn build(source: &str) -> Result<String> {
    let module = check(source)?;
    log::debug!("lowering to C");
    Ok(sysir_codegen::lower_to_c(&module))
}
