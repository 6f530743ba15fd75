//! Pass one of the type checker: walks the instruction stream once to
//! materialize type definitions, field definitions, and register-to-type
//! bindings.

use sysir_common::Result;
use sysir_ir::{FieldDef, Instruction, Module, Opcode, Payload, Primitive, TypeDef};

/// Grow `type_defs` so index `slot` is valid, backfilling any gap with a
/// placeholder `s32` definition. Type slot 0 is seeded this way too, so it
/// always resolves to a valid (if arbitrary) primitive.
fn ensure_type_slot(type_defs: &mut Vec<TypeDef>, slot: usize) {
    while type_defs.len() <= slot {
        type_defs.push(TypeDef::primitive(Primitive::S32));
    }
}

/// Resolve `module`'s type definitions, field definitions, and register
/// type bindings in place. Leaves `return_type` untouched — that is the
/// verifier's job.
pub fn resolve(module: &mut Module) -> Result<()> {
    ensure_type_slot(&mut module.type_defs, 0);

    for pc in 0..module.instructions.len() {
        match snapshot(&module.instructions[pc]) {
            Snapshot::TypePrim { dest_type, prim } => {
                ensure_type_slot(&mut module.type_defs, dest_type as usize);
                module.type_defs[dest_type as usize] = TypeDef::primitive(prim);
            }
            Snapshot::TypeStruct {
                dest_type,
                arg_count,
            } => {
                let field_start = module.field_defs.len() as u32;
                for type_slot in module.packed_operands(pc, arg_count) {
                    module.field_defs.push(FieldDef { type_slot });
                }
                ensure_type_slot(&mut module.type_defs, dest_type as usize);
                module.type_defs[dest_type as usize] = TypeDef {
                    primitive: Primitive::Struct,
                    field_count: arg_count,
                    field_start,
                };
            }
            Snapshot::TypeBind { dest, type_slot } => {
                module.register_types[dest as usize] = type_slot;
            }
            Snapshot::Other => {}
        }
    }
    Ok(())
}

enum Snapshot {
    TypePrim { dest_type: u32, prim: Primitive },
    TypeStruct { dest_type: u32, arg_count: u32 },
    TypeBind { dest: u32, type_slot: u32 },
    Other,
}

fn snapshot(instr: &Instruction) -> Snapshot {
    match (instr.opcode, &instr.payload) {
        (Opcode::TypePrim, Payload::TypePrim { dest_type, prim }) => Snapshot::TypePrim {
            dest_type: *dest_type,
            prim: *prim,
        },
        (Opcode::TypeStruct, Payload::TypeStruct { dest_type, arg_count }) => {
            Snapshot::TypeStruct {
                dest_type: *dest_type,
                arg_count: *arg_count,
            }
        }
        (Opcode::TypeBind, Payload::TypeBind { dest, type_slot }) => Snapshot::TypeBind {
            dest: *dest,
            type_slot: *type_slot,
        },
        _ => Snapshot::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysir_ir::assemble;
    use sysir_parser::parse_assembly_input;

    fn resolved(text: &str) -> Module {
        let input = parse_assembly_input(text).unwrap();
        let mut module = assemble(&input).unwrap();
        resolve(&mut module).unwrap();
        module
    }

    #[test]
    fn slot_zero_defaults_to_s32_even_when_untouched() {
        let module = resolved("(asm :instructions ((return 0)))");
        assert_eq!(module.type_defs[0].primitive, Primitive::S32);
    }

    #[test]
    fn binds_register_types() {
        let module = resolved(
            "(asm :instructions ((prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1) (return 2)))",
        );
        assert_eq!(module.register_types, vec![0, 0, 0]);
    }

    #[test]
    fn struct_fields_are_appended_contiguously() {
        let module = resolved(
            "(asm :instructions (\
                (prim 0 s32) (struct 1 0 0 0) (bind 0 1) (fget 1 0 2) (return 1)))",
        );
        assert_eq!(module.type_defs[1].field_count, 3);
        assert_eq!(module.type_defs[1].field_start, 0);
        assert_eq!(module.field_defs.len(), 3);
        assert!(module.field_defs.iter().all(|f| f.type_slot == 0));
    }
}
