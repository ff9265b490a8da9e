//! Error kinds for the PBD physics core.
//!
//! Propagation policy follows the design in spec §7: initialization errors
//! are surfaced to the caller, per-constraint solve failures are local and
//! silent (a `bool` return, never an `Err`), collision handler failures are
//! logged and dropped, and `BudgetExceeded` is a warning rather than a hard
//! failure. Every variant here is still constructible so tests can assert
//! on it directly.

use thiserror::Error;

use crate::constraints::ConstraintKind;

/// Errors produced by the physics core's initialization paths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A particle index was out of range for the current state store.
    #[error("particle index {index} out of range (count = {count})")]
    InvalidIndex { index: usize, count: usize },

    /// A constraint's rest measure was at or below the degeneracy epsilon,
    /// or a rest-shape matrix was singular.
    #[error("degenerate geometry while initializing {kind:?} constraint: {reason}")]
    DegenerateGeometry {
        kind: ConstraintKind,
        reason: &'static str,
    },

    /// The requested constraint kind is incompatible with the mesh's
    /// topology (e.g. a volume constraint on a surface mesh).
    #[error("constraint kind {kind:?} is incompatible with the mesh topology")]
    WrongTopology { kind: ConstraintKind },

    /// A step was requested before geometry was set on the model.
    #[error("step() called before setGeometry() configured a mesh")]
    Unconfigured,

    /// A per-step budget (e.g. density constraint neighbor count) was
    /// exceeded. Not fatal: the solver logs this and truncates.
    #[error("budget exceeded: {what} capped at {limit} (observed {observed})")]
    BudgetExceeded {
        what: &'static str,
        limit: usize,
        observed: usize,
    },
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
