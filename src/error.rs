//! Core error type
//!
//! Instruction execution never fails under normal operation (see the
//! crate root docs on error handling) — the only fallible operation
//! exposed by the core is decoding a state snapshot.

use thiserror::Error;

/// Errors the core can report to a host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpuError {
    /// A snapshot buffer passed to [`crate::cpu::Cpu::load_state`] was
    /// too small to hold a full register-file image.
    #[error("state buffer too small: need at least {needed} bytes, got {got}")]
    BadSnapshot {
        /// Minimum buffer length required.
        needed: usize,
        /// Actual length of the buffer that was passed in.
        got: usize,
    },
}
