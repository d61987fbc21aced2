//! Three straight-line optimization passes, run in this fixed order:
//! copy propagation, constant folding, then dead-code elimination. Each
//! pass is a single sweep — the source SSA form never contains cycles, so
//! a second sweep is never needed to reach a fixpoint.

use std::collections::HashMap;

use super::value::{AssignmentRhs, IrItem, VersionedVariable};

/// Run the full optimization pipeline over a lowered function body.
#[must_use]
pub fn optimize(ir: Vec<IrItem>) -> Vec<IrItem> {
    let ir = propagate_copies(ir);
    let ir = fold_constants(ir);
    remove_dead_assignments(ir)
}

/// Eliminate every `Assignment` whose right-hand side is a bare
/// `VersionedVariable`, substituting the copy's source for its target in
/// every later use (including `Return`).
///
/// The source implementation this core is modeled on builds its
/// replacement map from one sweep but only ever rewrites later `BinOp`
/// operands, leaving a `Return` referencing an already-deleted copy
/// unresolved. This pass resolves copy chains to their root in one pass
/// and rewrites every subsequent reference, matching the documented
/// behavior rather than that gap.
fn propagate_copies(ir: Vec<IrItem>) -> Vec<IrItem> {
    let mut substitutions: HashMap<String, VersionedVariable> = HashMap::new();
    for item in &ir {
        if let IrItem::Assignment {
            left,
            right: AssignmentRhs::Variable(source),
        } = item
        {
            let resolved = resolve(&substitutions, source);
            substitutions.insert(left.full_name(), resolved);
        }
    }

    ir.into_iter()
        .filter_map(|item| match item {
            IrItem::Assignment {
                right: AssignmentRhs::Variable(_),
                ..
            } => None,
            IrItem::Assignment {
                left,
                right: AssignmentRhs::BinOp(mut binop),
            } => {
                binop.left = resolve(&substitutions, &binop.left);
                binop.right = resolve(&substitutions, &binop.right);
                Some(IrItem::Assignment {
                    left,
                    right: AssignmentRhs::BinOp(binop),
                })
            }
            IrItem::Return(var) => Some(IrItem::Return(resolve(&substitutions, &var))),
            other => Some(other),
        })
        .collect()
}

fn resolve(substitutions: &HashMap<String, VersionedVariable>, var: &VersionedVariable) -> VersionedVariable {
    match substitutions.get(&var.full_name()) {
        Some(replacement) => replacement.clone(),
        None => var.clone(),
    }
}

/// Fold a `BinOp` whose operands are both internal constant holders
/// (`__PYCC_INTERNAL__C*`) into a single `Constant` assignment.
fn fold_constants(ir: Vec<IrItem>) -> Vec<IrItem> {
    let mut constants: HashMap<String, f64> = HashMap::new();
    for item in &ir {
        if let IrItem::Assignment {
            left,
            right: AssignmentRhs::Constant(value),
        } = item
        {
            constants.insert(left.full_name(), *value);
        }
    }

    ir.into_iter()
        .map(|item| match item {
            IrItem::Assignment {
                left,
                right: AssignmentRhs::BinOp(binop),
            } => {
                let folded = is_internal_constant(&binop.left.name)
                    .then(|| constants.get(&binop.left.full_name()))
                    .flatten()
                    .zip(
                        is_internal_constant(&binop.right.name)
                            .then(|| constants.get(&binop.right.full_name()))
                            .flatten(),
                    )
                    .map(|(l, r)| binop.op.apply(*l, *r));

                match folded {
                    Some(value) => IrItem::Assignment {
                        left,
                        right: AssignmentRhs::Constant(value),
                    },
                    None => IrItem::Assignment {
                        left,
                        right: AssignmentRhs::BinOp(binop),
                    },
                }
            }
            other => other,
        })
        .collect()
}

fn is_internal_constant(name: &str) -> bool {
    name.starts_with("__PYCC_INTERNAL__C")
}

/// Drop every `Assignment` whose target is never referenced by a later
/// item, in a single backward-looking sweep.
fn remove_dead_assignments(ir: Vec<IrItem>) -> Vec<IrItem> {
    let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();
    for item in &ir {
        match item {
            IrItem::Assignment {
                right: AssignmentRhs::BinOp(binop),
                ..
            } => {
                used.insert(binop.left.full_name());
                used.insert(binop.right.full_name());
            }
            IrItem::Assignment {
                right: AssignmentRhs::Variable(var),
                ..
            } => {
                used.insert(var.full_name());
            }
            IrItem::Return(var) => {
                used.insert(var.full_name());
            }
            _ => {}
        }
    }

    ir.into_iter()
        .filter(|item| match item {
            IrItem::Assignment { left, .. } => used.contains(&left.full_name()),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::{BinOp, Op};

    fn var(name: &str, version: u32) -> VersionedVariable {
        VersionedVariable::new(name, version)
    }

    #[test]
    fn copy_propagation_resolves_chain_into_return() {
        let ir = vec![
            IrItem::assignment(var("x", 0), AssignmentRhs::XmmRegister("%xmm0".into())),
            IrItem::assignment(var("y", 0), AssignmentRhs::Variable(var("x", 0))),
            IrItem::Return(var("y", 0)),
        ];

        let ir = propagate_copies(ir);

        assert_eq!(
            ir,
            vec![
                IrItem::assignment(var("x", 0), AssignmentRhs::XmmRegister("%xmm0".into())),
                IrItem::Return(var("x", 0)),
            ]
        );
    }

    #[test]
    fn constant_folding_precomputes_internal_constants() {
        let ir = vec![
            IrItem::assignment(
                var("__PYCC_INTERNAL__C0", 0),
                AssignmentRhs::Constant(2.0),
            ),
            IrItem::assignment(
                var("__PYCC_INTERNAL__C1", 0),
                AssignmentRhs::Constant(3.0),
            ),
            IrItem::assignment(
                var("__PYCC_INTERNAL__A0", 0),
                AssignmentRhs::BinOp(BinOp {
                    left: var("__PYCC_INTERNAL__C0", 0),
                    op: Op::Mul,
                    right: var("__PYCC_INTERNAL__C1", 0),
                }),
            ),
        ];

        let ir = fold_constants(ir);

        assert_eq!(
            ir[2],
            IrItem::assignment(var("__PYCC_INTERNAL__A0", 0), AssignmentRhs::Constant(6.0))
        );
    }

    #[test]
    fn dead_code_elimination_drops_unused_assignment() {
        let ir = vec![
            IrItem::assignment(var("x", 0), AssignmentRhs::XmmRegister("%xmm0".into())),
            IrItem::assignment(var("unused", 0), AssignmentRhs::XmmRegister("%xmm1".into())),
            IrItem::Return(var("x", 0)),
        ];

        let ir = remove_dead_assignments(ir);

        assert_eq!(ir.len(), 2);
        assert_eq!(ir[1], IrItem::Return(var("x", 0)));
    }

    #[test]
    fn full_pipeline_handles_return_var_scenario() {
        let ir = vec![
            IrItem::assignment(var("x", 0), AssignmentRhs::XmmRegister("%xmm0".into())),
            IrItem::assignment(var("y", 0), AssignmentRhs::Variable(var("x", 0))),
            IrItem::Return(var("y", 0)),
        ];

        let ir = optimize(ir);

        assert_eq!(
            ir,
            vec![
                IrItem::assignment(var("x", 0), AssignmentRhs::XmmRegister("%xmm0".into())),
                IrItem::Return(var("x", 0)),
            ]
        );
    }
}
