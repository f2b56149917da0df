//! Errors reported by the kinematic model and the solver.
//!
//! Only malformed input is an error. A target the robot cannot reach is a valid
//! question with an empty answer and yields an empty `SolutionSet` instead.

use thiserror::Error;

/// Input validation failures, reported before any iteration begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IkError {
    /// Joint vector of the wrong length.
    #[error("invalid joint vector length: expected {expected}, found {found}")]
    InvalidLength {
        /// Number of joints of the chain.
        expected: usize,
        /// Number of values received.
        found: usize,
    },

    /// NaN or infinite value in joints or pose.
    #[error("non-finite value: {0}")]
    NonFinite(String),

    /// Orientation that is not a proper rotation (not orthonormal, reflection, bad quaternion).
    #[error("not a rotation: {0}")]
    NotARotation(String),

    /// Lower limit above the upper one, or non-finite limit.
    #[error("invalid joint limits: {0}")]
    InvalidLimits(String),

    /// Solver options out of their valid ranges.
    #[error("invalid solver options: {0}")]
    InvalidOptions(String),

    /// The caller abandoned the solve.
    #[error("solve cancelled")]
    Cancelled,
}
