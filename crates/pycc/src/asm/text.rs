use std::fmt;

use crate::ir::Op;

/// An instruction operand: either an XMM register or a RIP-relative memory
/// reference to a pooled double constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Xmm(String),
    Mem(String),
}

impl Operand {
    #[must_use]
    pub fn xmm(name: impl Into<String>) -> Self {
        Operand::Xmm(name.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Xmm(name) | Operand::Mem(name) => write!(f, "{name}"),
        }
    }
}

/// The five mnemonics this core ever emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Movsd(Operand, Operand),
    Addsd(Operand, Operand),
    Subsd(Operand, Operand),
    Mulsd(Operand, Operand),
    Divsd(Operand, Operand),
    Ret,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Movsd(src, dst) => write!(f, "movsd {src},{dst}"),
            Instruction::Addsd(src, dst) => write!(f, "addsd {src},{dst}"),
            Instruction::Subsd(src, dst) => write!(f, "subsd {src},{dst}"),
            Instruction::Mulsd(src, dst) => write!(f, "mulsd {src},{dst}"),
            Instruction::Divsd(src, dst) => write!(f, "divsd {src},{dst}"),
            Instruction::Ret => write!(f, "ret"),
        }
    }
}

/// Accumulates a function body's double-constant pool and instruction
/// stream, then renders both as one `.s` file.
#[derive(Debug, Default)]
pub struct Assembler {
    double_consts: Vec<(u64, String)>,
    instructions: Vec<Instruction>,
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `value` into the constant pool, returning a RIP-relative
    /// memory operand for it. Repeated values across a function share one
    /// symbol, the same interning the source assembler performs.
    #[must_use]
    pub fn double_const(&mut self, value: f64) -> Operand {
        let bits = value.to_bits();
        if let Some((_, symbol)) = self.double_consts.iter().find(|(b, _)| *b == bits) {
            return Operand::Mem(format!("{symbol}(%rip)"));
        }
        let symbol = format!("__PYCC_INTERNAL_DOUBLE_CONST__N{}", self.double_consts.len());
        self.double_consts.push((bits, symbol.clone()));
        Operand::Mem(format!("{symbol}(%rip)"))
    }

    pub fn movsd(&mut self, src: Operand, dst: Operand) {
        self.instructions.push(Instruction::Movsd(src, dst));
    }

    /// Emit the mnemonic for `op` with the given operand order.
    pub fn binop(&mut self, op: Op, src: Operand, dst: Operand) {
        let instruction = match op {
            Op::Add => Instruction::Addsd(src, dst),
            Op::Sub => Instruction::Subsd(src, dst),
            Op::Mul => Instruction::Mulsd(src, dst),
            Op::Div => Instruction::Divsd(src, dst),
        };
        self.instructions.push(instruction);
    }

    pub fn ret(&mut self) {
        self.instructions.push(Instruction::Ret);
    }

    /// Render the accumulated constants and instructions as AT&T assembly
    /// text, ready for `as --64`.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        out.push_str("# pycc compiled for x86_64\n\n");
        out.push_str(".section .rodata\n");
        for (bits, symbol) in &self.double_consts {
            let value = f64::from_bits(*bits);
            out.push_str(&format!("\t{symbol}: .double {value:?}\n"));
        }
        out.push('\n');
        out.push_str(".section .text\n");
        out.push_str(".global _start\n");
        out.push_str("_start:\n");
        for instruction in &self.instructions {
            out.push_str(&format!("\t{instruction}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_constants_share_one_symbol() {
        let mut asm = Assembler::new();
        let a = asm.double_const(2.0);
        let b = asm.double_const(2.0);
        assert_eq!(a, b);
        assert_eq!(asm.double_consts.len(), 1);
    }

    #[test]
    fn text_layout_has_rodata_before_text() {
        let mut asm = Assembler::new();
        let c = asm.double_const(10.0);
        asm.movsd(c, Operand::xmm("%xmm0"));
        asm.ret();

        let text = asm.text();
        let rodata_pos = text.find(".section .rodata").unwrap();
        let text_pos = text.find(".section .text").unwrap();
        assert!(rodata_pos < text_pos);
        assert!(text.contains("__PYCC_INTERNAL_DOUBLE_CONST__N0: .double 10.0"));
        assert!(text.contains("movsd __PYCC_INTERNAL_DOUBLE_CONST__N0(%rip),%xmm0"));
        assert!(text.trim_end().ends_with("ret"));
    }
}
