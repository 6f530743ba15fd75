//! The assembler: parses the keyed assembly record into a populated
//! [`Module`]. This is pass zero of the pipeline — it
//! never touches types; the type-definition and register-type arrays stay
//! empty until `sysir_typecheck` walks the instruction stream.

use std::collections::HashMap;

use sysir_common::{Position, Result, SysirError};
use sysir_parser::{AssemblyInput, Sexp, Spanned};

use crate::constant::Constant;
use crate::instruction::{Instruction, Payload};
use crate::module::Module;
use crate::opcode::{self, Opcode};
use crate::primitive;

/// Key type for the constant-pool intern map. Floats are compared by bit
/// pattern so `Constant` values can be deduplicated without `Eq`/`Hash` on
/// `f64` itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InternKey {
    Int(i64),
    FloatBits(u64),
    Str(String),
    Symbol(String),
}

struct Assembler {
    instructions: Vec<Instruction>,
    constants: Vec<Constant>,
    intern: HashMap<InternKey, u32>,
    labels: HashMap<String, usize>,
    register_count: u32,
}

/// Assemble a parsed assembly record into an unverified [`Module`].
pub fn assemble(input: &AssemblyInput) -> Result<Module> {
    let mut asm = Assembler {
        instructions: Vec::new(),
        constants: Vec::new(),
        intern: HashMap::new(),
        labels: HashMap::new(),
        register_count: 0,
    };

    for item in &input.instructions {
        match &item.node {
            Sexp::Keyword(name) => {
                // Label marker: reserved for future named-label
                // resolution. Recorded but not yet consulted when
                // resolving jump/branch targets below.
                asm.labels.insert(name.clone(), asm.instructions.len());
            }
            Sexp::List(items) => asm.assemble_one(items, item.position)?,
            other => {
                return Err(SysirError::ExpectedInstructionList {
                    found: other.type_name().to_string(),
                    position: item.position,
                })
            }
        }
    }

    asm.check_terminator()?;
    asm.check_jump_targets()?;

    let register_count = asm.register_count;
    Ok(Module {
        link_name: input.link_name.clone(),
        parameter_count: input.parameter_count,
        instructions: asm.instructions,
        constants: asm.constants,
        type_defs: Vec::new(),
        field_defs: Vec::new(),
        register_types: vec![0; register_count as usize],
        register_count,
        return_type: None,
    })
}

impl Assembler {
    fn assemble_one(&mut self, items: &[Spanned<Sexp>], position: Position) -> Result<()> {
        let mut iter = items.iter();
        let head = iter.next().ok_or(SysirError::MissingOpcode { position })?;
        let name = head.node.as_symbol().ok_or_else(|| SysirError::ExpectedOpcodeSymbol {
            found: head.node.type_name().to_string(),
            position,
        })?;
        let opcode = opcode::lookup(name).ok_or_else(|| SysirError::UnknownOpcode {
            name: name.to_string(),
            position,
        })?;
        let operands: Vec<&Sexp> = iter.map(|s| &s.node).collect();

        match opcode {
            Opcode::Add
            | Opcode::Subtract
            | Opcode::Multiply
            | Opcode::Divide
            | Opcode::Band
            | Opcode::Bor
            | Opcode::Bxor
            | Opcode::Shl
            | Opcode::Shr
            | Opcode::Gt
            | Opcode::Gte
            | Opcode::Lt
            | Opcode::Lte
            | Opcode::Eq
            | Opcode::Neq => self.assemble_three(opcode, &operands, position),

            Opcode::Move | Opcode::Cast | Opcode::Bnot | Opcode::Load | Opcode::Store | Opcode::Address => {
                self.assemble_two(opcode, &operands, position)
            }

            Opcode::Return => self.assemble_one_operand(opcode, &operands, position),
            Opcode::Jump => self.assemble_jump(&operands, position),
            Opcode::Branch => self.assemble_branch(&operands, position),
            Opcode::Constant => self.assemble_constant(&operands, position),
            Opcode::Call => self.assemble_call(&operands, position),
            Opcode::TypePrim => self.assemble_type_prim(&operands, position),
            Opcode::TypeStruct => self.assemble_type_struct(&operands, position),
            Opcode::TypeBind => self.assemble_type_bind(&operands, position),
            Opcode::FieldGet | Opcode::FieldSet => self.assemble_field(opcode, &operands, position),

            Opcode::Callk | Opcode::Arg => unreachable!(
                "callk/arg are never parsed directly from text, only synthesized"
            ),
        }
    }

    fn require_arity(&self, operands: &[Sexp], expected: usize, position: Position) -> Result<()> {
        if operands.len() != expected {
            return Err(SysirError::WrongArity {
                expected: expected + 1,
                actual: operands.len() + 1,
                position,
            });
        }
        Ok(())
    }

    fn read_register(&mut self, sexp: &Sexp, position: Position) -> Result<u32> {
        let value = self.read_index(sexp, position)?;
        if self.register_count <= value {
            self.register_count = value + 1;
        }
        Ok(value)
    }

    /// A non-negative integer with no side effect on the register count —
    /// used for type slots, field indices, and constant-pool-holding
    /// positions that aren't register operands.
    fn read_index(&self, sexp: &Sexp, position: Position) -> Result<u32> {
        match sexp.as_int() {
            Some(i) if i >= 0 => Ok(i as u32),
            _ => Err(SysirError::ExpectedNonNegativeInteger {
                found: sexp.type_name().to_string(),
                position,
            }),
        }
    }

    fn intern(&mut self, key: InternKey, constant: Constant) -> u32 {
        if let Some(&index) = self.intern.get(&key) {
            return index;
        }
        let index = self.constants.len() as u32;
        self.constants.push(constant);
        self.intern.insert(key, index);
        index
    }

    fn intern_literal(&mut self, sexp: &Sexp, _position: Position) -> Result<u32> {
        match sexp {
            Sexp::Int(i) => Ok(self.intern(InternKey::Int(*i), Constant::Int(*i))),
            Sexp::Float(f) => Ok(self.intern(InternKey::FloatBits(f.to_bits()), Constant::Float(*f))),
            Sexp::Str(s) => Ok(self.intern(InternKey::Str(s.clone()), Constant::Str(s.clone()))),
            Sexp::Symbol(s) => Ok(self.intern(InternKey::Symbol(s.clone()), Constant::Symbol(s.clone()))),
            other => Err(SysirError::WrongKeyShape {
                key: "constant".to_string(),
                expected: "integer, float, string, or symbol literal".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    fn resolve_target(&self, sexp: &Sexp, position: Position) -> Result<u32> {
        // Symbolic label resolution is reserved for a future pass;
        // only integer targets are honored end-to-end.
        self.read_index(sexp, position)
    }

    fn push_variable_arity(&mut self, head: Instruction, raw_args: Vec<u32>) {
        // The head's source position is copied into each synthesized arg
        // continuation, so every instruction in the run shares one position.
        let position = head.position;
        self.instructions.push(head);
        for chunk in raw_args.chunks(3) {
            let mut slots = [0u32; 3];
            slots[..chunk.len()].copy_from_slice(chunk);
            self.instructions
                .push(Instruction::new(Opcode::Arg, position, Payload::Arg { slots }));
        }
    }

    fn assemble_three(&mut self, opcode: Opcode, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 3, position)?;
        let dest = self.read_register(&operands[0], position)?;
        let lhs = self.read_register(&operands[1], position)?;
        let rhs = self.read_register(&operands[2], position)?;
        self.instructions.push(Instruction::new(
            opcode,
            position,
            Payload::Three { dest, lhs, rhs },
        ));
        Ok(())
    }

    fn assemble_two(&mut self, opcode: Opcode, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 2, position)?;
        let dest = self.read_register(&operands[0], position)?;
        let src = self.read_register(&operands[1], position)?;
        self.instructions
            .push(Instruction::new(opcode, position, Payload::Two { dest, src }));
        Ok(())
    }

    fn assemble_one_operand(&mut self, opcode: Opcode, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 1, position)?;
        let src = self.read_register(&operands[0], position)?;
        self.instructions
            .push(Instruction::new(opcode, position, Payload::One { src }));
        Ok(())
    }

    fn assemble_jump(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 1, position)?;
        let target = self.resolve_target(&operands[0], position)?;
        self.instructions
            .push(Instruction::new(Opcode::Jump, position, Payload::Jump { target }));
        Ok(())
    }

    fn assemble_branch(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 2, position)?;
        let cond = self.read_register(&operands[0], position)?;
        let target = self.resolve_target(&operands[1], position)?;
        self.instructions.push(Instruction::new(
            Opcode::Branch,
            position,
            Payload::Branch { cond, target },
        ));
        Ok(())
    }

    fn assemble_constant(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 2, position)?;
        let dest = self.read_register(&operands[0], position)?;
        let constant = self.intern_literal(&operands[1], position)?;
        self.instructions.push(Instruction::new(
            Opcode::Constant,
            position,
            Payload::Constant { dest, constant },
        ));
        Ok(())
    }

    fn assemble_call(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        if operands.len() < 2 {
            return Err(SysirError::TooFewOperands {
                minimum: 3,
                actual: operands.len() + 1,
                position,
            });
        }
        let dest = self.read_register(&operands[0], position)?;
        let callee = &operands[1];
        let raw_args: Result<Vec<u32>> = operands[2..]
            .iter()
            .map(|op| self.read_register(op, position))
            .collect();
        let raw_args = raw_args?;
        let arg_count = raw_args.len() as u32;

        // Call promotion: a symbol callee is interned and the opcode
        // mutates to `callk` in place.
        let head = if let Sexp::Symbol(name) = callee {
            let constant = self.intern(InternKey::Symbol(name.clone()), Constant::Symbol(name.clone()));
            Instruction::new(
                Opcode::Callk,
                position,
                Payload::Callk {
                    dest,
                    constant,
                    arg_count,
                },
            )
        } else {
            let callee_register = self.read_register(callee, position)?;
            Instruction::new(
                Opcode::Call,
                position,
                Payload::Call {
                    dest,
                    callee: callee_register,
                    arg_count,
                },
            )
        };
        self.push_variable_arity(head, raw_args);
        Ok(())
    }

    fn assemble_type_prim(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 2, position)?;
        let dest_type = self.read_index(&operands[0], position)?;
        let prim_name = operands[1].as_symbol().ok_or_else(|| SysirError::WrongKeyShape {
            key: "prim".to_string(),
            expected: "primitive symbol".to_string(),
            found: operands[1].type_name().to_string(),
        })?;
        let prim = primitive::lookup(prim_name).ok_or_else(|| SysirError::UnknownPrimitive {
            name: prim_name.to_string(),
            position,
        })?;
        self.instructions.push(Instruction::new(
            Opcode::TypePrim,
            position,
            Payload::TypePrim { dest_type, prim },
        ));
        Ok(())
    }

    fn assemble_type_struct(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        if operands.is_empty() {
            return Err(SysirError::TooFewOperands {
                minimum: 2,
                actual: operands.len() + 1,
                position,
            });
        }
        let dest_type = self.read_index(&operands[0], position)?;
        let raw_fields: Result<Vec<u32>> = operands[1..]
            .iter()
            .map(|op| self.read_index(op, position))
            .collect();
        let raw_fields = raw_fields?;
        let arg_count = raw_fields.len() as u32;
        let head = Instruction::new(
            Opcode::TypeStruct,
            position,
            Payload::TypeStruct { dest_type, arg_count },
        );
        self.push_variable_arity(head, raw_fields);
        Ok(())
    }

    fn assemble_type_bind(&mut self, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 2, position)?;
        let dest = self.read_register(&operands[0], position)?;
        let type_slot = self.read_index(&operands[1], position)?;
        self.instructions.push(Instruction::new(
            Opcode::TypeBind,
            position,
            Payload::TypeBind { dest, type_slot },
        ));
        Ok(())
    }

    fn assemble_field(&mut self, opcode: Opcode, operands: &[Sexp], position: Position) -> Result<()> {
        self.require_arity(operands, 3, position)?;
        let r = self.read_register(&operands[0], position)?;
        let st = self.read_register(&operands[1], position)?;
        let field = self.read_index(&operands[2], position)?;
        self.instructions
            .push(Instruction::new(opcode, position, Payload::Field { r, st, field }));
        Ok(())
    }

    fn check_terminator(&self) -> Result<()> {
        match self.instructions.last() {
            Some(instr) if matches!(instr.opcode, Opcode::Jump | Opcode::Return) => Ok(()),
            Some(instr) => Err(SysirError::MissingTerminator {
                found: instr.opcode.mnemonic().to_string(),
            }),
            None => Err(SysirError::MissingTerminator {
                found: "<empty instruction stream>".to_string(),
            }),
        }
    }

    fn check_jump_targets(&self) -> Result<()> {
        let count = self.instructions.len() as u32;
        for instr in &self.instructions {
            let target = match instr.payload {
                Payload::Jump { target } => Some(target),
                Payload::Branch { target, .. } => Some(target),
                _ => None,
            };
            if let Some(target) = target {
                if target >= count {
                    return Err(SysirError::InvalidJumpTarget { target, count });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysir_parser::parse_assembly_input;

    fn assemble_text(text: &str) -> Result<Module> {
        let input = parse_assembly_input(text)?;
        assemble(&input)
    }

    #[test]
    fn adds_two_s32s() {
        let module = assemble_text(
            "(asm :link-name \"add\" :parameter-count 2 :instructions (\
                (prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1) (return 2)))",
        )
        .unwrap();
        assert_eq!(module.link_name, "add");
        assert_eq!(module.parameter_count, 2);
        assert_eq!(module.register_count, 3);
        assert_eq!(module.instructions.len(), 6);
        assert_eq!(
            module.instructions[4].payload,
            Payload::Three {
                dest: 2,
                lhs: 0,
                rhs: 1
            }
        );
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let err = assemble_text(
            "(asm :parameter-count 2 :instructions ((prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1)))",
        )
        .unwrap_err();
        assert!(matches!(err, SysirError::MissingTerminator { .. }));
    }

    #[test]
    fn named_call_is_promoted_to_callk() {
        let module = assemble_text(
            "(asm :instructions ((call 0 printf 1) (return 0)))",
        )
        .unwrap();
        assert_eq!(
            module.instructions[0].payload,
            Payload::Callk {
                dest: 0,
                constant: 0,
                arg_count: 1
            }
        );
        assert_eq!(module.constants, vec![Constant::Symbol("printf".to_string())]);
        // arg continuation carries the single argument register
        assert_eq!(
            module.instructions[1].payload,
            Payload::Arg { slots: [1, 0, 0] }
        );
    }

    #[test]
    fn constant_pool_deduplicates() {
        let module = assemble_text(
            "(asm :instructions ((constant 0 7) (constant 1 7) (return 0)))",
        )
        .unwrap();
        assert_eq!(module.constants, vec![Constant::Int(7)]);
        assert_eq!(
            module.instructions[0].payload,
            Payload::Constant {
                dest: 0,
                constant: 0
            }
        );
        assert_eq!(
            module.instructions[1].payload,
            Payload::Constant {
                dest: 1,
                constant: 0
            }
        );
    }

    #[test]
    fn out_of_range_jump_target_is_rejected() {
        let err = assemble_text("(asm :instructions ((jump 9)))").unwrap_err();
        assert!(matches!(err, SysirError::InvalidJumpTarget { .. }));
    }

    #[test]
    fn struct_type_packs_field_types_into_arg_continuations() {
        let module = assemble_text(
            "(asm :instructions (\
                (prim 0 s32) (struct 1 0 0 0) (bind 0 1) (fget 1 0 2) (return 1)))",
        )
        .unwrap();
        assert_eq!(
            module.instructions[1].payload,
            Payload::TypeStruct {
                dest_type: 1,
                arg_count: 3
            }
        );
        assert_eq!(module.packed_operands(1, 3), vec![0, 0, 0]);
    }
}
