//! The C lowerer: emits a self-contained C89-compatible translation unit
//! for a verified module, in four phases to one output buffer.

use std::fmt::Write as _;

use sysir_ir::{Module, Opcode, Payload, Primitive};

const HEADER_PRELUDE: &str = "#include <stdint.h>\n#include <stdbool.h>\n#include <tgmath.h>\n\n";

/// Lower `module` to C source text. Pure read — `module` is not mutated.
pub fn lower_to_c(module: &Module) -> String {
    let mut out = String::new();
    out.push_str(HEADER_PRELUDE);
    emit_type_declarations(module, &mut out);
    emit_function(module, &mut out);
    out
}

fn emit_line_directive(position: sysir_common::Position, out: &mut String) {
    if position.line > 0 {
        let _ = writeln!(out, "#line {}", position.line);
    }
}

fn emit_type_declarations(module: &Module, out: &mut String) {
    for (pc, instr) in module.instructions.iter().enumerate() {
        match (&instr.opcode, &instr.payload) {
            (Opcode::TypePrim, Payload::TypePrim { dest_type, prim }) => {
                emit_line_directive(instr.position, out);
                let _ = writeln!(out, "typedef {} _t{};", prim.c_name(), dest_type);
            }
            (Opcode::TypeStruct, Payload::TypeStruct { dest_type, arg_count }) => {
                let fields = module.packed_operands(pc, *arg_count);
                emit_line_directive(instr.position, out);
                out.push_str("typedef struct {\n");
                for (i, field_type) in fields.iter().enumerate() {
                    let _ = writeln!(out, "    _t{field_type} _f{i};");
                }
                let _ = writeln!(out, "}} _t{dest_type};");
            }
            _ => {}
        }
    }
}

fn emit_function(module: &Module, out: &mut String) {
    let return_type = module.return_type.unwrap_or(0);
    let link_name = if module.link_name.is_empty() {
        "_thunk"
    } else {
        module.link_name.as_str()
    };

    let params = if module.parameter_count == 0 {
        "void".to_string()
    } else {
        (0..module.parameter_count)
            .map(|i| format!("_t{} _r{i}", module.type_of_register(i)))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(out, "_t{return_type} {link_name}({params}) {{");

    for i in module.parameter_count..module.register_count {
        let _ = writeln!(out, "    _t{} _r{i};", module.type_of_register(i));
    }

    for (pc, instr) in module.instructions.iter().enumerate() {
        if instr.is_skipped_in_body() {
            continue;
        }
        let _ = writeln!(out, "_i{pc}:");
        emit_statement(module, pc, out);
    }

    out.push_str("}\n");
}

fn emit_statement(module: &Module, pc: usize, out: &mut String) {
    let instr = &module.instructions[pc];
    let stmt = match (&instr.opcode, &instr.payload) {
        (Opcode::Constant, Payload::Constant { dest, constant }) => {
            let c_type = module.type_of_register(*dest);
            let value = module.constants[*constant as usize].format_for_c();
            format!("    _r{dest} = (_t{c_type}) {value};")
        }
        (Opcode::Address, Payload::Two { dest, src }) => {
            format!("    _r{dest} = (char *) &_r{src};")
        }
        (Opcode::Jump, Payload::Jump { target }) => format!("    goto _i{target};"),
        (Opcode::Branch, Payload::Branch { cond, target }) => {
            format!("    if (_r{cond}) goto _i{target};")
        }
        (Opcode::Return, Payload::One { src }) => format!("    return _r{src};"),
        (Opcode::Cast, Payload::Two { dest, src }) => {
            format!("    _r{dest} = (_t{}) _r{src};", module.type_of_register(*dest))
        }
        (Opcode::Move, Payload::Two { dest, src }) => format!("    _r{dest} = _r{src};"),
        (Opcode::Bnot, Payload::Two { dest, src }) => format!("    _r{dest} = ~_r{src};"),
        (Opcode::Load, Payload::Two { dest, src }) => {
            format!(
                "    _r{dest} = *((({}) *) _r{src});",
                raw_c_name(module, module.type_of_register(*dest))
            )
        }
        (Opcode::Store, Payload::Two { dest, src }) => {
            format!(
                "    *(({} *) _r{dest}) = _r{src};",
                raw_c_name(module, module.type_of_register(*src))
            )
        }
        (Opcode::FieldGet, Payload::Field { r, st, field }) => {
            format!("    _r{r} = _r{st}._f{field};")
        }
        (Opcode::FieldSet, Payload::Field { r, st, field }) => {
            format!("    _r{st}._f{field} = _r{r};")
        }
        (Opcode::Call, Payload::Call { dest, callee, arg_count }) => {
            let args = format_args(module, pc, *arg_count);
            format!("    _r{dest} = _r{callee}({args});")
        }
        (Opcode::Callk, Payload::Callk { dest, constant, arg_count }) => {
            let args = format_args(module, pc, *arg_count);
            let name = module.constants[*constant as usize].format_for_c();
            format!("    _r{dest} = {name}({args});")
        }
        (opcode, Payload::Three { dest, lhs, rhs }) => {
            format!("    _r{dest} = _r{lhs} {} _r{rhs};", c_operator(*opcode))
        }
        (opcode, payload) => {
            unreachable!("unexpected opcode/payload pairing in body: {opcode:?} {payload:?}")
        }
    };
    out.push_str(&stmt);
    out.push('\n');
}

fn format_args(module: &Module, head_pc: usize, arg_count: u32) -> String {
    module
        .packed_operands(head_pc, arg_count)
        .into_iter()
        .map(|r| format!("_r{r}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The raw C primitive name for `type_slot`, used by `load`/`store` casts.
/// Falls back to the type's own typedef name for struct slots, which
/// `load`/`store` are not expected to target.
fn raw_c_name(module: &Module, type_slot: u32) -> String {
    match module.type_defs.get(type_slot as usize).map(|d| d.primitive) {
        Some(Primitive::Struct) | None => format!("_t{type_slot}"),
        Some(prim) => prim.c_name().to_string(),
    }
}

/// C operator text for the binary-operand opcodes. `gte` intentionally
/// lowers to `>`, not `>=` — kept as-is rather than silently "fixing"
/// intent nobody has confirmed.
fn c_operator(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Add => "+",
        Opcode::Subtract => "-",
        Opcode::Multiply => "*",
        Opcode::Divide => "/",
        Opcode::Band => "&",
        Opcode::Bor => "|",
        Opcode::Bxor => "^",
        Opcode::Shl => "<<",
        Opcode::Shr => ">>",
        Opcode::Gt => ">",
        Opcode::Gte => ">",
        Opcode::Lt => "<",
        Opcode::Lte => "<=",
        Opcode::Eq => "==",
        Opcode::Neq => "!=",
        other => unreachable!("{other:?} is not a three-operand opcode"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysir_ir::assemble;
    use sysir_parser::parse_assembly_input;
    use sysir_typecheck::check;

    fn lowered(text: &str) -> String {
        let input = parse_assembly_input(text).unwrap();
        let mut module = assemble(&input).unwrap();
        check(&mut module).unwrap();
        lower_to_c(&module)
    }

    #[test]
    fn lowers_add_of_two_s32_parameters() {
        let c = lowered(
            "(asm :link-name \"add\" :parameter-count 2 :instructions (\
                (prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1) (return 2)))",
        );
        assert!(c.contains("typedef int32_t _t0;"));
        assert!(c.contains("_t0 add(_t0 _r0, _t0 _r1) {"));
        assert!(c.contains("_r2 = _r0 + _r1;"));
        assert!(c.contains("return _r2;"));
    }

    #[test]
    fn gte_lowers_to_strictly_greater_than() {
        let c = lowered(
            "(asm :instructions (\
                (prim 0 s32) (prim 1 boolean) (bind 0 0) (bind 1 0) (bind 2 1) \
                (gte 2 0 1) (return 2)))",
        );
        assert!(c.contains("_r2 = _r0 > _r1;"));
    }

    #[test]
    fn named_call_lowers_to_a_direct_c_call() {
        let c = lowered("(asm :instructions ((call 0 printf 1) (return 0)))");
        assert!(c.contains("_r0 = printf(_r1);"));
    }

    #[test]
    fn struct_field_get_lowers_to_member_access() {
        let c = lowered(
            "(asm :instructions (\
                (prim 0 s32) (struct 1 0 0 0) (bind 0 1) (fget 1 0 2) (return 1)))",
        );
        assert!(c.contains("_f0"));
        assert!(c.contains("_f2"));
        assert!(c.contains("_r1 = _r0._f2;"));
    }

    #[test]
    fn boolean_branch_lowers_to_goto() {
        let c = lowered(
            "(asm :instructions (\
                (prim 0 boolean) (prim 1 s32) (bind 0 0) (bind 1 1) \
                (branch 0 4) (return 1) (return 1)))",
        );
        assert!(c.contains("if (_r0) goto _i4;"));
    }
}
