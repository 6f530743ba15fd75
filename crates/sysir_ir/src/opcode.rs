//! Opcode tags and the sorted mnemonic table the assembler binary-searches.

use std::fmt;

/// Every instruction tag the IR understands. `Callk` and `Arg` never come
/// from the textual mnemonic table directly — `Callk` replaces `Call`
/// during call promotion, and `Arg` is synthesized by the assembler to
/// carry packed variable-arity operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Address,
    Band,
    Bnot,
    Bor,
    Branch,
    Bxor,
    Call,
    Callk,
    Cast,
    Constant,
    Divide,
    Eq,
    FieldGet,
    FieldSet,
    Gt,
    Gte,
    Jump,
    Load,
    Lt,
    Lte,
    Move,
    Multiply,
    Neq,
    Return,
    Shl,
    Shr,
    Store,
    Subtract,
    TypeBind,
    TypePrim,
    TypeStruct,
    Arg,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl Opcode {
    /// The textual mnemonic (`prim`/`struct`/`bind` for the three
    /// type-construction opcodes).
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Address => "address",
            Opcode::Band => "band",
            Opcode::Bnot => "bnot",
            Opcode::Bor => "bor",
            Opcode::Branch => "branch",
            Opcode::Bxor => "bxor",
            Opcode::Call => "call",
            Opcode::Callk => "callk",
            Opcode::Cast => "cast",
            Opcode::Constant => "constant",
            Opcode::Divide => "divide",
            Opcode::Eq => "eq",
            Opcode::FieldGet => "fget",
            Opcode::FieldSet => "fset",
            Opcode::Gt => "gt",
            Opcode::Gte => "gte",
            Opcode::Jump => "jump",
            Opcode::Load => "load",
            Opcode::Lt => "lt",
            Opcode::Lte => "lte",
            Opcode::Move => "move",
            Opcode::Multiply => "multiply",
            Opcode::Neq => "neq",
            Opcode::Return => "return",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Store => "store",
            Opcode::Subtract => "subtract",
            Opcode::TypeBind => "bind",
            Opcode::TypePrim => "prim",
            Opcode::TypeStruct => "struct",
            Opcode::Arg => "arg",
        }
    }
}

/// Sorted `(mnemonic, tag)` table, parsed via binary search. Does not
/// include `callk`/`arg`, which are never parsed directly from source
/// text.
const OPCODE_TABLE: &[(&str, Opcode)] = &[
    ("add", Opcode::Add),
    ("address", Opcode::Address),
    ("band", Opcode::Band),
    ("bind", Opcode::TypeBind),
    ("bnot", Opcode::Bnot),
    ("bor", Opcode::Bor),
    ("branch", Opcode::Branch),
    ("bxor", Opcode::Bxor),
    ("call", Opcode::Call),
    ("cast", Opcode::Cast),
    ("constant", Opcode::Constant),
    ("divide", Opcode::Divide),
    ("eq", Opcode::Eq),
    ("fget", Opcode::FieldGet),
    ("fset", Opcode::FieldSet),
    ("gt", Opcode::Gt),
    ("gte", Opcode::Gte),
    ("jump", Opcode::Jump),
    ("load", Opcode::Load),
    ("lt", Opcode::Lt),
    ("lte", Opcode::Lte),
    ("move", Opcode::Move),
    ("multiply", Opcode::Multiply),
    ("neq", Opcode::Neq),
    ("prim", Opcode::TypePrim),
    ("return", Opcode::Return),
    ("shl", Opcode::Shl),
    ("shr", Opcode::Shr),
    ("store", Opcode::Store),
    ("struct", Opcode::TypeStruct),
    ("subtract", Opcode::Subtract),
];

/// Resolve a textual mnemonic to its opcode tag via binary search.
pub fn lookup(name: &str) -> Option<Opcode> {
    OPCODE_TABLE
        .binary_search_by_key(&name, |(mnemonic, _)| mnemonic)
        .ok()
        .map(|idx| OPCODE_TABLE[idx].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        let mut names: Vec<&str> = OPCODE_TABLE.iter().map(|(n, _)| *n).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        names.dedup();
        assert_eq!(names.len(), OPCODE_TABLE.len());
    }

    #[test]
    fn resolves_known_mnemonics() {
        assert_eq!(lookup("add"), Some(Opcode::Add));
        assert_eq!(lookup("bind"), Some(Opcode::TypeBind));
        assert_eq!(lookup("struct"), Some(Opcode::TypeStruct));
    }

    #[test]
    fn rejects_unknown_mnemonics() {
        assert_eq!(lookup("callk"), None);
        assert_eq!(lookup("nonsense"), None);
    }
}
