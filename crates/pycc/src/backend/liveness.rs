//! Backward liveness precomputed once per function body in a single
//! forward sweep, turning what would otherwise be an O(n^2) "does this
//! value have a later use" query into an O(1) map lookup.

use std::collections::HashMap;

use crate::ir::{AssignmentRhs, IrItem};

pub struct Liveness {
    last_use: HashMap<String, usize>,
}

impl Liveness {
    #[must_use]
    pub fn compute(ir: &[IrItem]) -> Self {
        let mut last_use = HashMap::new();
        for (index, item) in ir.iter().enumerate() {
            match item {
                IrItem::Assignment {
                    right: AssignmentRhs::BinOp(binop),
                    ..
                } => {
                    last_use.insert(binop.left.full_name(), index);
                    last_use.insert(binop.right.full_name(), index);
                }
                IrItem::Assignment {
                    right: AssignmentRhs::Variable(var),
                    ..
                } => {
                    last_use.insert(var.full_name(), index);
                }
                IrItem::Return(var) => {
                    last_use.insert(var.full_name(), index);
                }
                _ => {}
            }
        }
        Self { last_use }
    }

    /// True iff `name` is referenced anywhere strictly after item `index`.
    #[must_use]
    pub fn has_dependent(&self, name: &str, index: usize) -> bool {
        self.last_use.get(name).is_some_and(|&last| last > index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Op, VersionedVariable};

    #[test]
    fn last_use_marks_no_dependent_past_final_reference() {
        let x = VersionedVariable::new("x", 0);
        let ir = vec![
            IrItem::assignment(x.clone(), AssignmentRhs::XmmRegister("%xmm0".into())),
            IrItem::assignment(
                VersionedVariable::new("__PYCC_INTERNAL__A0", 0),
                AssignmentRhs::BinOp(BinOp {
                    left: x.clone(),
                    op: Op::Mul,
                    right: x.clone(),
                }),
            ),
            IrItem::Return(VersionedVariable::new("__PYCC_INTERNAL__A0", 0)),
        ];

        let liveness = Liveness::compute(&ir);
        assert!(!liveness.has_dependent(&x.full_name(), 1));
        assert!(liveness.has_dependent(&x.full_name(), 0));
    }
}
