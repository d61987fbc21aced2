//! Maps a flat binary produced by [`crate::toolchain`] into executable
//! memory and exposes it as a callable native function.
//!
//! Gated behind the `jit` feature. The one `unsafe` boundary in this crate
//! lives here: transmuting a raw pointer into an `extern "C"` function
//! pointer and calling through it. Everything upstream of this module is
//! ordinary safe Rust.
#![allow(unsafe_code)]

use memmap2::{Mmap, MmapOptions};

use crate::frontend::NativeSignature;

/// Errors local to the executable-memory loader. Kept separate from
/// [`crate::error::Error`]: these describe a loader limitation or a host
/// I/O failure, not a defect detected during compilation.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("I/O error mapping executable memory: {0}")]
    Mmap(#[from] std::io::Error),

    #[error("argument count {got} does not match the compiled signature's arity {expected}")]
    ArityMismatch { got: usize, expected: usize },

    #[error("unsupported call arity: {0} arguments (this loader supports up to 4)")]
    UnsupportedArity(usize),
}

pub type Result<T> = std::result::Result<T, LoaderError>;

type Fn0 = unsafe extern "C" fn() -> f64;
type Fn1 = unsafe extern "C" fn(f64) -> f64;
type Fn2 = unsafe extern "C" fn(f64, f64) -> f64;
type Fn3 = unsafe extern "C" fn(f64, f64, f64) -> f64;
type Fn4 = unsafe extern "C" fn(f64, f64, f64, f64) -> f64;

/// A flat binary mapped as executable memory, kept alive for as long as
/// calls into it are possible.
pub struct JitFunction {
    mapping: Mmap,
    signature: NativeSignature,
}

impl JitFunction {
    /// Map `binary` as executable memory starting at its first byte.
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::Mmap` if the anonymous mapping, the copy, or
    /// the read-exec transition fails.
    pub fn load(binary: &[u8], signature: NativeSignature) -> Result<Self> {
        let len = binary.len().max(1);
        let mut mapping = MmapOptions::new().len(len).map_anon()?;
        mapping[..binary.len()].copy_from_slice(binary);
        let mapping = mapping.make_exec()?;
        tracing::debug!(bytes = binary.len(), "mapped executable function");
        Ok(Self { mapping, signature })
    }

    #[must_use]
    pub fn signature(&self) -> &NativeSignature {
        &self.signature
    }

    /// Call the compiled function with `args`, which must match the
    /// signature's arity exactly.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if `args.len()` does not match the
    /// signature, and `UnsupportedArity` for more than four arguments —
    /// beyond that the real System V ABI spills to the stack, which this
    /// toy core's front-end never models (it maps every parameter
    /// straight to an XMM register up to `%xmm14`, see `abi` module docs).
    pub fn call(&self, args: &[f64]) -> Result<f64> {
        if args.len() != self.signature.arity() {
            return Err(LoaderError::ArityMismatch {
                got: args.len(),
                expected: self.signature.arity(),
            });
        }

        let entry = self.mapping.as_ptr();
        unsafe {
            match *args {
                [] => Ok(std::mem::transmute::<*const u8, Fn0>(entry)()),
                [a] => Ok(std::mem::transmute::<*const u8, Fn1>(entry)(a)),
                [a, b] => Ok(std::mem::transmute::<*const u8, Fn2>(entry)(a, b)),
                [a, b, c] => Ok(std::mem::transmute::<*const u8, Fn3>(entry)(a, b, c)),
                [a, b, c, d] => Ok(std::mem::transmute::<*const u8, Fn4>(entry)(a, b, c, d)),
                _ => Err(LoaderError::UnsupportedArity(args.len())),
            }
        }
    }
}
