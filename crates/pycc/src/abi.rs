//! System V AMD64 ABI constants shared between the front-end, backend, and
//! the executable-memory loader.
//!
//! Floating-point arguments and the floating-point return value live in the
//! XMM register file. This core extends argument placement up to `%xmm14`
//! for its own convenience (`%xmm15` is left unused, see DESIGN.md).

/// Number of XMM registers the backend is allowed to allocate into:
/// `%xmm0`..`%xmm14`.
pub const XMM_REGISTER_COUNT: usize = 15;

/// Maximum number of scalar parameters a compiled function may take. Bound
/// by `XMM_REGISTER_COUNT` since every parameter consumes one argument
/// register and the core never spills to the stack.
pub const MAX_PARAMS: usize = XMM_REGISTER_COUNT;

#[must_use]
pub fn xmm_register_name(index: usize) -> String {
    format!("%xmm{index}")
}

#[must_use]
pub fn is_xmm_register(name: &str) -> bool {
    name.starts_with("%xmm")
}

/// Scalar types recognized across the ABI boundary. The core supports only
/// `F64`; kept as an enum (rather than a bare unit type) so a future scalar
/// type is additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    F64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xmm_register_naming() {
        assert_eq!(xmm_register_name(0), "%xmm0");
        assert_eq!(xmm_register_name(14), "%xmm14");
        assert!(is_xmm_register("%xmm3"));
        assert!(!is_xmm_register("%rax"));
    }
}
