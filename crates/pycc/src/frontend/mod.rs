//! AST to SSA IR lowering: the front-end stage of the pipeline.
//!
//! Takes a single annotated function declaration and produces straight-line
//! SSA IR plus the native signature the backend and loader need. Modeled on
//! a one-function-at-a-time AST visitor: every name gets a version counter,
//! every literal and every intermediate binary-operation result gets a
//! fresh internal name, and the body is required to be zero or more
//! assignments followed by exactly one terminal return.

mod lower;

pub use lower::lower_function;

use crate::abi::ScalarType;

/// The calling surface a compiled function exposes: its parameter types in
/// order and its return type. Every scalar in this core is `F64`, so today
/// this is little more than an arity marker, but it is kept as a real type
/// so a second scalar type stays additive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSignature {
    pub arg_types: Vec<ScalarType>,
    pub return_type: ScalarType,
}

impl NativeSignature {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }
}
