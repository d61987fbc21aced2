#![allow(clippy::missing_errors_doc)]

pub mod abi;
pub mod ast;
pub mod asm;
pub mod backend;
pub mod error;
pub mod frontend;
pub mod ir;

#[cfg(feature = "external-tools")]
pub mod toolchain;

#[cfg(feature = "jit")]
pub mod jit;

pub use error::{Error, Result};
pub use frontend::NativeSignature;

/// A function compiled through the full front-end/optimizer/backend
/// pipeline: the assembly text ready for [`toolchain::assemble_and_link`],
/// plus the signature the caller needs to invoke it correctly.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub assembly: String,
    pub signature: NativeSignature,
}

/// Compile a single annotated function declaration to AT&T assembly.
///
/// Runs the front-end lowering, the three optimizer passes in their fixed
/// order, and the backend register allocator/instruction selector, in
/// that sequence.
///
/// # Errors
///
/// Propagates any [`Error`] raised by lowering or code generation.
pub fn compile(func: &ast::FunctionDef) -> Result<CompiledFunction> {
    let (body, signature) = frontend::lower_function(func)?;
    let optimized = ir::optimize(body);
    let assembler = backend::compile(&optimized)?;
    Ok(CompiledFunction {
        assembly: assembler.text(),
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::{BinOpKind, Expr, FunctionDef, Param, Stmt};

    #[test]
    fn compiles_return_constant_to_a_ret_only_body() {
        let func = FunctionDef {
            name: "ten".to_string(),
            params: vec![],
            return_type: Some("float".to_string()),
            body: vec![Stmt::Return {
                value: Expr::Constant(10.0, 1),
                line: 1,
            }],
            line: 1,
        };

        let compiled = compile(&func).unwrap();
        assert_eq!(compiled.signature.arity(), 0);
        assert!(compiled.assembly.contains(".double 10.0"));
        assert!(compiled.assembly.trim_end().ends_with("ret"));
    }

    #[test]
    fn compiles_double_square_with_one_multiply() {
        let func = FunctionDef {
            name: "double_square".to_string(),
            params: vec![Param {
                name: "x".to_string(),
                annotation: Some("float".to_string()),
                line: 1,
            }],
            return_type: Some("float".to_string()),
            body: vec![Stmt::Return {
                value: Expr::BinOp {
                    left: Box::new(Expr::BinOp {
                        left: Box::new(Expr::Constant(2.0, 2)),
                        op: BinOpKind::Mul,
                        right: Box::new(Expr::Name("x".to_string(), 2)),
                        line: 2,
                    }),
                    op: BinOpKind::Mul,
                    right: Box::new(Expr::Name("x".to_string(), 2)),
                    line: 2,
                },
                line: 2,
            }],
            line: 1,
        };

        let compiled = compile(&func).unwrap();
        assert_eq!(compiled.assembly.matches("mulsd").count(), 2);
    }
}
