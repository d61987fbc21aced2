//! The SSA IR data model: versioned variables, binary operations, and the
//! handful of item kinds a function body lowers to.

use std::fmt;

/// A name bound at a single SSA version. Two `VersionedVariable`s are the
/// same IR value iff both fields match; the backend never reinterprets a
/// variable's meaning once its version is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedVariable {
    pub name: String,
    pub version: u32,
}

impl VersionedVariable {
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// The `name#version` form used as a map key everywhere a single string
    /// identity is needed (liveness, register occupancy).
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}#{}", self.name, self.version)
    }
}

impl fmt::Display for VersionedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// The four scalar binary operators this core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    #[must_use]
    pub fn is_commutative(self) -> bool {
        matches!(self, Op::Add | Op::Mul)
    }

    #[must_use]
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Op::Add => left + right,
            Op::Sub => left - right,
            Op::Mul => left * right,
            Op::Div => left / right,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }
}

/// A binary operation over two already-defined SSA values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinOp {
    pub left: VersionedVariable,
    pub op: Op,
    pub right: VersionedVariable,
}

/// The right-hand side of an `Assignment`.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentRhs {
    /// A literal double, materialized lazily as a RIP-relative constant at
    /// first use rather than at the point of definition.
    Constant(f64),
    /// An incoming argument register, bound once at function entry.
    XmmRegister(String),
    /// A bare reference to another SSA value. Ordinary front-end output for
    /// `name = other_name`; eliminated by copy propagation when possible.
    Variable(VersionedVariable),
    BinOp(BinOp),
}

/// One item of a function's IR body.
#[derive(Debug, Clone, PartialEq)]
pub enum IrItem {
    Assignment {
        left: VersionedVariable,
        right: AssignmentRhs,
    },
    Return(VersionedVariable),
    /// Reserved for a future control-flow extension. Never produced by the
    /// front-end or consumed by the optimizer/backend in this core.
    Label(String),
    /// Reserved alongside `Label`.
    Goto(String),
}

impl IrItem {
    #[must_use]
    pub fn assignment(left: VersionedVariable, right: AssignmentRhs) -> Self {
        IrItem::Assignment { left, right }
    }
}
