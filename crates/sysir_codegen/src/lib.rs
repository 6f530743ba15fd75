//! C89-compatible lowering of a verified sysir module to a single
//! translation unit.

pub mod lower;

pub use lower::lower_to_c;
