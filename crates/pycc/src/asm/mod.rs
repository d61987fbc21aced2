//! AT&T-syntax assembly emission: a double-constant pool plus an ordered
//! instruction list, rendered as text `as --64` can consume directly.

mod text;

pub use text::{Assembler, Instruction, Operand};
