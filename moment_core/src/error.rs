//! Typed error taxonomy for the moment-matrix core (see spec §7).
//!
//! Every fallible core operation returns `Result<T, MomentError>`. No
//! variant here is recoverable by retrying the same call with the same
//! arguments; each one names the component, the offending index or key,
//! and the invariant that was violated.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MomentError {
    #[error("bad Pauli context: {reason}")]
    BadPauliContext { reason: String },

    #[error("bad tensor index {index:?}: {reason}")]
    BadTensorIndex { index: Vec<usize>, reason: String },

    #[error("bad Collins-Gisin operation: {reason}")]
    BadCG { reason: String },

    #[error("bad full-correlator operation: {reason}")]
    BadFC { reason: String },

    #[error("bad probability-tensor operation: {reason}")]
    BadPT { reason: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },

    #[error("bad signature on handle {key:#018x}: expected {expected:#010x}, found {found:#010x}")]
    BadSignature {
        key: u64,
        expected: u32,
        found: u32,
    },

    #[error("object with key {key:#018x} not found")]
    NotFound { key: u64 },

    #[error("invalid moment rule: {reason}")]
    InvalidMomentRule { reason: String },
}
