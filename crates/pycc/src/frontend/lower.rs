use std::collections::HashMap;

use crate::abi::{self, ScalarType};
use crate::ast::{BinOpKind, Expr, FunctionDef, Stmt};
use crate::error::{Error, Result};
use crate::ir::{AssignmentRhs, BinOp, IrItem, Op, VersionedVariable};

use super::NativeSignature;

/// Annotation spellings this core recognizes as the double-precision
/// scalar type, kept exactly as the originating AST producer writes them.
const RECOGNIZED_DOUBLE_ANNOTATIONS: &[&str] = &["float", "double", "c_double", "ctypes.c_double"];

fn recognize_type(annotation: &str) -> Option<ScalarType> {
    RECOGNIZED_DOUBLE_ANNOTATIONS
        .contains(&annotation)
        .then_some(ScalarType::F64)
}

fn unsupported_syntax(file: &str, line: u32, detail: impl Into<String>) -> Error {
    let detail = detail.into();
    tracing::error!(file, line, %detail, "unsupported syntax");
    Error::UnsupportedSyntax {
        file: file.to_string(),
        line,
        detail,
    }
}

fn unsupported_type(file: &str, line: u32, annotation: impl Into<String>) -> Error {
    let annotation = annotation.into();
    tracing::error!(file, line, %annotation, "unsupported type annotation");
    Error::UnsupportedType {
        file: file.to_string(),
        line,
        annotation,
    }
}

fn missing_annotation(file: &str, line: u32, argument_index: usize) -> Error {
    tracing::error!(file, line, argument_index, "missing parameter annotation");
    Error::MissingAnnotation {
        file: file.to_string(),
        line,
        argument_index,
    }
}

struct Lowerer<'a> {
    file: &'a str,
    variables: HashMap<String, u32>,
    temp_counter: u32,
    const_counter: u32,
}

impl<'a> Lowerer<'a> {
    fn new(file: &'a str) -> Self {
        Self {
            file,
            variables: HashMap::new(),
            temp_counter: 0,
            const_counter: 0,
        }
    }

    fn unsupported(&self, line: u32, detail: impl Into<String>) -> Error {
        unsupported_syntax(self.file, line, detail)
    }

    fn fresh_const_name(&mut self) -> String {
        let name = format!("__PYCC_INTERNAL__C{}", self.const_counter);
        self.const_counter += 1;
        name
    }

    fn fresh_temp_name(&mut self) -> String {
        let name = format!("__PYCC_INTERNAL__A{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn bind(&mut self, name: &str) -> VersionedVariable {
        let version = self
            .variables
            .get(name)
            .map_or(0, |current| current + 1);
        self.variables.insert(name.to_string(), version);
        VersionedVariable::new(name, version)
    }

    fn resolve(&self, name: &str, line: u32) -> Result<VersionedVariable> {
        self.variables
            .get(name)
            .map(|&version| VersionedVariable::new(name, version))
            .ok_or_else(|| self.unsupported(line, format!("reference to undefined variable '{name}'")))
    }

    /// Lower an expression, returning the items needed to compute it and
    /// the SSA value that holds the result. A bare name read produces no
    /// items at all: its value already exists.
    fn lower_expr(&mut self, expr: &Expr) -> Result<(Vec<IrItem>, VersionedVariable)> {
        match expr {
            Expr::Constant(value, _line) => {
                let name = self.fresh_const_name();
                let target = VersionedVariable::new(name, 0);
                let item = IrItem::assignment(target.clone(), AssignmentRhs::Constant(*value));
                Ok((vec![item], target))
            }
            Expr::Name(name, line) => {
                let var = self.resolve(name, *line)?;
                Ok((Vec::new(), var))
            }
            Expr::BinOp {
                left, op, right, ..
            } => {
                let (mut items, left_var) = self.lower_expr(left)?;
                let (right_items, right_var) = self.lower_expr(right)?;
                items.extend(right_items);

                let name = self.fresh_temp_name();
                let target = VersionedVariable::new(name, 0);
                let binop = BinOp {
                    left: left_var,
                    op: lower_op(*op),
                    right: right_var,
                };
                items.push(IrItem::assignment(target.clone(), AssignmentRhs::BinOp(binop)));
                Ok((items, target))
            }
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<Vec<IrItem>> {
        match stmt {
            Stmt::Assign { name, value, .. } => {
                let (mut items, value_var) = self.lower_expr(value)?;
                let target = self.bind(name);
                items.push(IrItem::assignment(target, AssignmentRhs::Variable(value_var)));
                Ok(items)
            }
            Stmt::Return { value, .. } => {
                let (mut items, value_var) = self.lower_expr(value)?;
                items.push(IrItem::Return(value_var));
                Ok(items)
            }
        }
    }
}

fn lower_op(op: BinOpKind) -> Op {
    match op {
        BinOpKind::Add => Op::Add,
        BinOpKind::Sub => Op::Sub,
        BinOpKind::Mul => Op::Mul,
        BinOpKind::Div => Op::Div,
    }
}

/// Lower a single annotated function declaration to SSA IR.
///
/// # Errors
///
/// Returns `MissingAnnotation` for an unannotated parameter,
/// `UnsupportedType` for an annotation this core does not recognize,
/// `RegisterPressureExceeded` for more than [`abi::MAX_PARAMS`] parameters,
/// and `UnsupportedSyntax` for a body that is not zero or more assignments
/// followed by exactly one terminal return, or a read of an undefined
/// name.
pub fn lower_function(func: &FunctionDef) -> Result<(Vec<IrItem>, NativeSignature)> {
    tracing::debug!(function = %func.name, params = func.params.len(), "lowering function");

    if func.params.len() > abi::MAX_PARAMS {
        tracing::error!(
            function = %func.name,
            params = func.params.len(),
            max = abi::MAX_PARAMS,
            "register pressure exceeded during parameter binding"
        );
        return Err(Error::RegisterPressureExceeded);
    }

    let return_type = match &func.return_type {
        Some(annotation) => {
            recognize_type(annotation).ok_or_else(|| unsupported_type(&func.name, func.line, annotation.clone()))?
        }
        None => return Err(unsupported_type(&func.name, func.line, "<missing return type>")),
    };

    validate_body_shape(func)?;

    let mut lowerer = Lowerer::new(&func.name);
    let mut ir = Vec::new();
    let mut arg_types = Vec::with_capacity(func.params.len());

    for (index, param) in func.params.iter().enumerate() {
        let annotation = param
            .annotation
            .as_deref()
            .ok_or_else(|| missing_annotation(&func.name, param.line, index))?;
        let scalar = recognize_type(annotation)
            .ok_or_else(|| unsupported_type(&func.name, param.line, annotation.to_string()))?;
        arg_types.push(scalar);

        let target = lowerer.bind(&param.name);
        let reg = abi::xmm_register_name(index);
        ir.push(IrItem::assignment(target, AssignmentRhs::XmmRegister(reg)));
    }

    for stmt in &func.body {
        ir.extend(lowerer.lower_stmt(stmt)?);
    }

    Ok((
        ir,
        NativeSignature {
            arg_types,
            return_type,
        },
    ))
}

fn validate_body_shape(func: &FunctionDef) -> Result<()> {
    let Some((last, rest)) = func.body.split_last() else {
        return Err(unsupported_syntax(
            &func.name,
            func.line,
            "function body must end with a return statement",
        ));
    };

    if !matches!(last, Stmt::Return { .. }) {
        return Err(unsupported_syntax(
            &func.name,
            func.line,
            "function body must end with a return statement",
        ));
    }

    if let Some(Stmt::Return { line, .. }) = rest.iter().find(|s| matches!(s, Stmt::Return { .. })) {
        return Err(unsupported_syntax(&func.name, *line, "return must be the final statement"));
    }

    Ok(())
}
