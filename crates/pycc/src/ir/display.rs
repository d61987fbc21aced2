//! Textual unparse of IR items, used by `--emit-ir` and debug logging.

use std::fmt;

use super::value::{AssignmentRhs, IrItem};

impl fmt::Display for AssignmentRhs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentRhs::Constant(value) => write!(f, "{value:?}"),
            AssignmentRhs::XmmRegister(reg) => write!(f, "{reg}"),
            AssignmentRhs::Variable(var) => write!(f, "{var}"),
            AssignmentRhs::BinOp(binop) => {
                write!(f, "{} {} {}", binop.left, binop.op.as_str(), binop.right)
            }
        }
    }
}

impl fmt::Display for IrItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrItem::Assignment { left, right } => write!(f, "{left} = {right}"),
            IrItem::Return(var) => write!(f, "return {var}"),
            IrItem::Label(name) => write!(f, "{name}:"),
            IrItem::Goto(name) => write!(f, "goto {name}"),
        }
    }
}

/// Render a full IR program as one instruction per line, in order.
#[must_use]
pub fn unparse(ir: &[IrItem]) -> String {
    ir.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::{BinOp, Op, VersionedVariable};

    #[test]
    fn unparse_formats_each_item_kind() {
        let ir = vec![
            IrItem::assignment(
                VersionedVariable::new("x", 0),
                AssignmentRhs::XmmRegister("%xmm0".into()),
            ),
            IrItem::assignment(
                VersionedVariable::new("__PYCC_INTERNAL__A0", 0),
                AssignmentRhs::BinOp(BinOp {
                    left: VersionedVariable::new("x", 0),
                    op: Op::Mul,
                    right: VersionedVariable::new("x", 0),
                }),
            ),
            IrItem::Return(VersionedVariable::new("__PYCC_INTERNAL__A0", 0)),
        ];

        assert_eq!(
            unparse(&ir),
            "x#0 = %xmm0\n__PYCC_INTERNAL__A0#0 = x#0 * x#0\nreturn __PYCC_INTERNAL__A0#0"
        );
    }
}
