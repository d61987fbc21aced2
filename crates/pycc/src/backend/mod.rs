//! Register allocation and instruction selection: walks the optimized IR
//! once, tracking which XMM register or RIP-relative constant symbol holds
//! each live SSA value, and lowers each item to AT&T assembly.
//!
//! The occupancy map is keyed by location (`"%xmm3"`, a constant symbol)
//! rather than by SSA name, mirroring how the source assembler tracks a
//! fixed slot table extended with constant entries created on demand.

mod liveness;

use std::collections::HashMap;

use crate::abi::{self, is_xmm_register, xmm_register_name};
use crate::asm::{Assembler, Operand};
use crate::error::{Error, Result};
use crate::ir::{AssignmentRhs, BinOp, IrItem, Op, VersionedVariable};

use liveness::Liveness;

fn undefined_value(name: impl Into<String>) -> Error {
    let name = name.into();
    tracing::error!(%name, "undefined value referenced during register allocation");
    Error::UndefinedValue { name }
}

fn register_pressure_exceeded(context: &str) -> Error {
    tracing::error!(context, "register pressure exceeded");
    Error::RegisterPressureExceeded
}

/// Lower an optimized IR body to assembly text.
///
/// # Errors
///
/// Returns `UndefinedValue` if an operand has no known location,
/// `RegisterPressureExceeded` if no XMM register can be freed for a
/// result, and `TypeMismatch` if a binary operation's operands cannot be
/// bridged (unreachable in this single-scalar-type core; kept because the
/// error contract names it).
pub fn compile(ir: &[IrItem]) -> Result<Assembler> {
    let mut backend = Backend::new();
    backend.run(ir)
}

struct Backend {
    /// Location symbol (e.g. `"%xmm3"`, a constant's `sym(%rip)` text) to
    /// the `full_name` of the SSA value currently occupying it.
    locations: HashMap<String, String>,
    assembler: Assembler,
}

impl Backend {
    fn new() -> Self {
        Self {
            locations: HashMap::new(),
            assembler: Assembler::new(),
        }
    }

    fn run(mut self, ir: &[IrItem]) -> Result<Assembler> {
        let liveness = Liveness::compute(ir);
        for (index, item) in ir.iter().enumerate() {
            match item {
                IrItem::Assignment { left, right } => {
                    self.assign(left, right, index, &liveness)?;
                }
                IrItem::Return(var) => self.emit_return(var)?,
                IrItem::Label(_) | IrItem::Goto(_) => {}
            }
        }
        Ok(self.assembler)
    }

    fn find_location(&self, name: &str) -> Option<String> {
        self.locations
            .iter()
            .find(|(_, occupant)| occupant.as_str() == name)
            .map(|(location, _)| location.clone())
    }

    fn find_free_xmm(&self, liveness: &Liveness, index: usize) -> Result<String> {
        for slot in 0..abi::XMM_REGISTER_COUNT {
            let reg = xmm_register_name(slot);
            match self.locations.get(&reg) {
                None => return Ok(reg),
                Some(occupant) if !liveness.has_dependent(occupant, index) => return Ok(reg),
                Some(_) => {}
            }
        }
        Err(register_pressure_exceeded("find_free_xmm"))
    }

    fn assign(
        &mut self,
        left: &VersionedVariable,
        right: &AssignmentRhs,
        index: usize,
        liveness: &Liveness,
    ) -> Result<()> {
        match right {
            AssignmentRhs::Constant(value) => {
                let location = self.assembler.double_const(*value).to_string();
                self.locations.insert(location, left.full_name());
            }
            AssignmentRhs::XmmRegister(reg) => {
                self.locations.insert(reg.clone(), left.full_name());
            }
            AssignmentRhs::Variable(source) => {
                let source_name = source.full_name();
                if liveness.has_dependent(&source_name, index) {
                    return Err(register_pressure_exceeded("copy of a still-live value"));
                }
                let location = self
                    .find_location(&source_name)
                    .ok_or_else(|| undefined_value(source_name))?;
                self.locations.insert(location, left.full_name());
            }
            AssignmentRhs::BinOp(binop) => {
                let location = self.emit_binop(binop, index, liveness)?;
                self.locations.insert(location, left.full_name());
            }
        }
        Ok(())
    }

    fn emit_return(&mut self, var: &VersionedVariable) -> Result<()> {
        let name = var.full_name();
        let location = self.find_location(&name).ok_or_else(|| undefined_value(name))?;
        if location != "%xmm0" {
            self.assembler
                .movsd(operand_for(&location), Operand::xmm("%xmm0"));
        }
        self.assembler.ret();
        Ok(())
    }

    fn emit_binop(&mut self, binop: &BinOp, index: usize, liveness: &Liveness) -> Result<String> {
        let left_name = binop.left.full_name();
        let right_name = binop.right.full_name();
        let left_loc = self
            .find_location(&left_name)
            .ok_or_else(|| undefined_value(left_name))?;
        let right_loc = self
            .find_location(&right_name)
            .ok_or_else(|| undefined_value(right_name))?;

        match (is_xmm_register(&left_loc), is_xmm_register(&right_loc)) {
            (true, true) => self.binop_reg_reg(&left_loc, &right_loc, binop.op, index, liveness),
            (false, true) => self.binop_mem_reg(&left_loc, &right_loc, binop.op, index, liveness),
            (true, false) => self.binop_reg_mem(&left_loc, &right_loc, binop.op, index, liveness),
            (false, false) => Err(register_pressure_exceeded("both binop operands are in memory")),
        }
    }

    fn occupant(&self, location: &str) -> String {
        self.locations
            .get(location)
            .cloned()
            .unwrap_or_default()
    }

    /// Both operands live in XMM registers.
    fn binop_reg_reg(
        &mut self,
        left: &str,
        right: &str,
        op: Op,
        index: usize,
        liveness: &Liveness,
    ) -> Result<String> {
        let left_occupant = self.occupant(left);
        let right_occupant = self.occupant(right);

        if !liveness.has_dependent(&left_occupant, index) {
            self.assembler
                .binop(op, operand_for(right), operand_for(left));
            return Ok(left.to_string());
        }
        if op.is_commutative() && !liveness.has_dependent(&right_occupant, index) {
            self.assembler
                .binop(op, operand_for(left), operand_for(right));
            return Ok(right.to_string());
        }
        Err(register_pressure_exceeded("reg/reg binop with both operands still live"))
    }

    /// Left operand in memory (a constant), right in an XMM register.
    fn binop_mem_reg(
        &mut self,
        left_mem: &str,
        right_reg: &str,
        op: Op,
        index: usize,
        liveness: &Liveness,
    ) -> Result<String> {
        let right_occupant = self.occupant(right_reg);
        if op.is_commutative() && !liveness.has_dependent(&right_occupant, index) {
            self.assembler
                .binop(op, operand_for(left_mem), operand_for(right_reg));
            return Ok(right_reg.to_string());
        }

        let tmp = self.find_free_xmm(liveness, index)?;
        self.assembler.movsd(operand_for(left_mem), operand_for(&tmp));
        self.assembler.binop(op, operand_for(right_reg), operand_for(&tmp));
        Ok(tmp)
    }

    /// Left operand in an XMM register, right in memory (a constant).
    fn binop_reg_mem(
        &mut self,
        left_reg: &str,
        right_mem: &str,
        op: Op,
        index: usize,
        liveness: &Liveness,
    ) -> Result<String> {
        let left_occupant = self.occupant(left_reg);
        if !liveness.has_dependent(&left_occupant, index) {
            self.assembler
                .binop(op, operand_for(right_mem), operand_for(left_reg));
            return Ok(left_reg.to_string());
        }
        Err(register_pressure_exceeded("reg/mem binop with the register operand still live"))
    }
}

fn operand_for(location: &str) -> Operand {
    if is_xmm_register(location) {
        Operand::Xmm(location.to_string())
    } else {
        Operand::Mem(location.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Op, VersionedVariable};

    fn var(name: &str) -> VersionedVariable {
        VersionedVariable::new(name, 0)
    }

    #[test]
    fn return_of_xmm0_skips_the_move() {
        let ir = vec![
            IrItem::assignment(var("x"), AssignmentRhs::XmmRegister("%xmm0".into())),
            IrItem::Return(var("x")),
        ];
        let assembler = compile(&ir).unwrap();
        assert_eq!(assembler.text().matches("ret").count(), 1);
        assert!(!assembler.text().contains("movsd"));
    }

    #[test]
    fn return_of_non_xmm0_emits_a_move_into_xmm0() {
        let ir = vec![
            IrItem::assignment(var("x"), AssignmentRhs::XmmRegister("%xmm1".into())),
            IrItem::Return(var("x")),
        ];
        let assembler = compile(&ir).unwrap();
        assert!(assembler.text().contains("movsd %xmm1,%xmm0"));
    }

    #[test]
    fn commutative_reg_reg_reuses_the_dead_operand() {
        let ir = vec![
            IrItem::assignment(var("x"), AssignmentRhs::XmmRegister("%xmm0".into())),
            IrItem::assignment(
                var("t"),
                AssignmentRhs::BinOp(BinOp {
                    left: var("x"),
                    op: Op::Mul,
                    right: var("x"),
                }),
            ),
            IrItem::Return(var("t")),
        ];
        let assembler = compile(&ir).unwrap();
        assert!(assembler.text().contains("mulsd %xmm0,%xmm0"));
    }

    #[test]
    fn mem_mem_binop_fails_with_register_pressure() {
        let ir = vec![
            IrItem::assignment(var("a"), AssignmentRhs::Constant(1.0)),
            IrItem::assignment(var("b"), AssignmentRhs::Constant(2.0)),
            IrItem::assignment(
                var("t"),
                AssignmentRhs::BinOp(BinOp {
                    left: var("a"),
                    op: Op::Add,
                    right: var("b"),
                }),
            ),
        ];
        assert!(matches!(
            compile(&ir).unwrap_err(),
            Error::RegisterPressureExceeded
        ));
    }

    #[test]
    fn undefined_operand_is_reported() {
        let ir = vec![IrItem::Return(var("ghost"))];
        assert!(matches!(
            compile(&ir).unwrap_err(),
            Error::UndefinedValue { .. }
        ));
    }
}
