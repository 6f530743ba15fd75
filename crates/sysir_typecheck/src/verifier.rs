//! Pass two of the type checker: validates operand types against the
//! per-opcode rule table and derives the function's single return type.

use sysir_common::{Position, Result, SysirError};
use sysir_ir::{Module, Opcode, Payload, Primitive};

/// Verify `module` in place, recording the derived return type. Assumes
/// [`crate::resolver::resolve`] has already run.
pub fn verify(module: &mut Module) -> Result<()> {
    for pc in 0..module.instructions.len() {
        let instr = module.instructions[pc].clone();
        if instr.is_skipped_in_body() || matches!(instr.opcode, Opcode::Jump) {
            continue;
        }
        check(module, &instr.opcode, &instr.payload, instr.position)?;
    }
    Ok(())
}

fn type_of(module: &Module, register: u32) -> u32 {
    module.type_of_register(register)
}

fn primitive_of(module: &Module, type_slot: u32) -> Primitive {
    module
        .type_defs
        .get(type_slot as usize)
        .map(|def| def.primitive)
        .unwrap_or(Primitive::S32)
}

fn require_equal(expected: u32, actual: u32, position: Position) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SysirError::TypeMismatch {
            expected,
            actual,
            position,
        })
    }
}

fn require_integer(module: &Module, type_slot: u32, position: Position) -> Result<()> {
    if primitive_of(module, type_slot).is_integer() {
        Ok(())
    } else {
        Err(SysirError::ExpectedInteger {
            found: type_slot,
            position,
        })
    }
}

fn require_boolean(module: &Module, type_slot: u32, position: Position) -> Result<()> {
    if primitive_of(module, type_slot).is_boolean() {
        Ok(())
    } else {
        Err(SysirError::ExpectedBoolean {
            found: type_slot,
            position,
        })
    }
}

fn require_pointer(module: &Module, type_slot: u32, position: Position) -> Result<()> {
    if primitive_of(module, type_slot).is_pointer() {
        Ok(())
    } else {
        Err(SysirError::ExpectedPointer {
            found: type_slot,
            position,
        })
    }
}

fn check(module: &mut Module, opcode: &Opcode, payload: &Payload, position: Position) -> Result<()> {
    match (opcode, payload) {
        (Opcode::Move, Payload::Two { dest, src }) => {
            require_equal(type_of(module, *dest), type_of(module, *src), position)
        }

        (Opcode::Add | Opcode::Subtract | Opcode::Multiply | Opcode::Divide, Payload::Three { dest, lhs, rhs }) => {
            let (l, r, d) = (type_of(module, *lhs), type_of(module, *rhs), type_of(module, *dest));
            require_equal(l, r, position)?;
            require_equal(l, d, position)
        }

        (Opcode::Band | Opcode::Bor | Opcode::Bxor, Payload::Three { dest, lhs, rhs }) => {
            let (l, r, d) = (type_of(module, *lhs), type_of(module, *rhs), type_of(module, *dest));
            require_integer(module, l, position)?;
            require_integer(module, r, position)?;
            require_integer(module, d, position)?;
            require_equal(l, r, position)?;
            require_equal(l, d, position)
        }

        (Opcode::Shl | Opcode::Shr, Payload::Three { dest, lhs, rhs }) => {
            let (l, r, d) = (type_of(module, *lhs), type_of(module, *rhs), type_of(module, *dest));
            require_integer(module, l, position)?;
            require_equal(l, r, position)?;
            require_equal(l, d, position)
        }

        (Opcode::Bnot, Payload::Two { dest, src }) => {
            let s = type_of(module, *src);
            require_integer(module, s, position)?;
            require_equal(s, type_of(module, *dest), position)
        }

        (Opcode::Gt | Opcode::Gte | Opcode::Lt | Opcode::Lte | Opcode::Eq | Opcode::Neq,
         Payload::Three { dest, lhs, rhs }) => {
            require_equal(type_of(module, *lhs), type_of(module, *rhs), position)?;
            require_boolean(module, type_of(module, *dest), position)
        }

        (Opcode::Load, Payload::Two { src, .. }) => require_pointer(module, type_of(module, *src), position),
        (Opcode::Store, Payload::Two { dest, .. }) => require_pointer(module, type_of(module, *dest), position),
        (Opcode::Address, Payload::Two { dest, .. }) => require_pointer(module, type_of(module, *dest), position),

        (Opcode::Branch, Payload::Branch { cond, .. }) => require_boolean(module, type_of(module, *cond), position),

        (Opcode::Call, Payload::Call { callee, .. }) => require_pointer(module, type_of(module, *callee), position),

        // `cast`, `constant`, `callk` intentionally have no rule in this
        // version — no type constraint is currently enforced for them.
        (Opcode::Cast, _) | (Opcode::Constant, _) | (Opcode::Callk, _) => Ok(()),

        (Opcode::Return, Payload::One { src }) => record_return(module, type_of(module, *src), position),

        (Opcode::FieldGet, Payload::Field { r, st, field }) => check_field(module, *r, *st, *field, position),
        (Opcode::FieldSet, Payload::Field { r, st, field }) => check_field(module, *r, *st, *field, position),

        _ => Ok(()),
    }
}

fn record_return(module: &mut Module, source_type: u32, position: Position) -> Result<()> {
    match module.return_type {
        None => {
            module.return_type = Some(source_type);
            Ok(())
        }
        Some(first) if first == source_type => Ok(()),
        Some(first) => Err(SysirError::ReturnTypeMismatch {
            first,
            second: source_type,
            position,
        }),
    }
}

fn check_field(module: &Module, r: u32, st: u32, field: u32, position: Position) -> Result<()> {
    let struct_type = type_of(module, st);
    let def = module
        .type_defs
        .get(struct_type as usize)
        .cloned()
        .unwrap_or_else(|| sysir_ir::TypeDef::primitive(Primitive::S32));
    if !def.primitive.is_struct() {
        return Err(SysirError::ExpectedStruct {
            found: struct_type,
            position,
        });
    }
    if field >= def.field_count {
        return Err(SysirError::InvalidFieldIndex {
            field,
            type_id: struct_type,
            field_count: def.field_count,
        });
    }
    let field_type = module.field_defs[(def.field_start + field) as usize].type_slot;
    let r_type = type_of(module, r);
    if field_type != r_type {
        return Err(SysirError::FieldTypeMismatch {
            field_type,
            dest_type: r_type,
            position,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use sysir_ir::assemble;
    use sysir_parser::parse_assembly_input;

    fn checked(text: &str) -> Result<Module> {
        let input = parse_assembly_input(text).unwrap();
        let mut module = assemble(&input).unwrap();
        resolve(&mut module)?;
        verify(&mut module)?;
        Ok(module)
    }

    #[test]
    fn add_returns_the_operand_type() {
        let module = checked(
            "(asm :link-name \"add\" :parameter-count 2 :instructions (\
                (prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1) (return 2)))",
        )
        .unwrap();
        assert_eq!(module.return_type, Some(0));
    }

    #[test]
    fn mismatched_operand_types_are_rejected() {
        let err = checked(
            "(asm :instructions (\
                (prim 0 s32) (prim 1 f32) (bind 0 0) (bind 1 1) (bind 2 0) (add 2 0 1) (return 2)))",
        )
        .unwrap_err();
        assert!(matches!(err, SysirError::TypeMismatch { .. }));
    }

    #[test]
    fn disagreeing_returns_are_rejected() {
        let err = checked(
            "(asm :instructions (\
                (prim 0 s32) (prim 1 boolean) (bind 0 0) (bind 1 1) \
                (branch 1 4) (return 0) (return 1)))",
        )
        .unwrap_err();
        assert!(matches!(err, SysirError::ReturnTypeMismatch { .. }));
    }

    #[test]
    fn boolean_branch_accepts_matching_returns() {
        let module = checked(
            "(asm :instructions (\
                (prim 0 boolean) (prim 1 s32) (bind 0 0) (bind 1 1) \
                (branch 0 4) (return 1) (return 1)))",
        )
        .unwrap();
        assert_eq!(module.return_type, Some(1));
    }

    #[test]
    fn field_get_checks_struct_and_field_type() {
        let module = checked(
            "(asm :instructions (\
                (prim 0 s32) (struct 1 0 0 0) (bind 0 1) (fget 1 0 2) (return 1)))",
        )
        .unwrap();
        assert_eq!(module.return_type, Some(0));
    }
}
