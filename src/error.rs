//! Error types for wombat.

use thiserror::Error;

/// Result type alias using wombat's [`AdError`].
pub type Result<T> = std::result::Result<T, AdError>;

/// Precondition violations reported by the autodiff engine.
///
/// Every variant is raised before any node is recorded, so a failed call
/// leaves the tape exactly as it was. `NaN` and infinite *results* are never
/// errors; they propagate through values and adjoints like ordinary floats.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdError {
    /// Two containers that must have equal length do not.
    #[error("{op}: size mismatch, left operand has {left} elements but right operand has {right}")]
    SizeMismatch {
        op: &'static str,
        left: usize,
        right: usize,
    },

    /// A container is empty where at least one element is required.
    #[error("{op}: {what} has size 0, but must have a non-zero size")]
    ZeroSize { op: &'static str, what: &'static str },

    /// An argument is `NaN` where the function forbids it.
    #[error("{op}: {what} is NaN")]
    NotANumber { op: &'static str, what: &'static str },

    /// An argument lies outside the function's domain.
    #[error("{op}: {what} is {value}, but must be {expected}")]
    OutOfDomain {
        op: &'static str,
        what: &'static str,
        value: f64,
        expected: String,
    },

    /// `recover_memory_nested` was called with no nested scope open.
    #[error("no nested autodiff scope is active")]
    NoNestedContext,

    /// A root-level operation was attempted while nested scopes are open.
    #[error("cannot reset the root context while {depth} nested scope(s) are active")]
    NestedContextActive { depth: usize },

    /// A variable refers to a node that has been discarded.
    #[error("variable at tape position {index} refers to a node from a discarded scope")]
    StaleVariable { index: u32 },

    /// The context must be empty for this operation.
    #[error("context already holds {len} node(s); recover memory before reconfiguring")]
    ContextInUse { len: usize },
}

impl AdError {
    /// `true` for argument-domain failures (size, emptiness, NaN, range).
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            AdError::SizeMismatch { .. }
                | AdError::ZeroSize { .. }
                | AdError::NotANumber { .. }
                | AdError::OutOfDomain { .. }
        )
    }
}
