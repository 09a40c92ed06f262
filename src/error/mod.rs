//! Crate-wide error taxonomy.
//!
//! Every fatal failure of the pipeline maps onto one of three classes:
//! malformed parameter input, an invalid production sequence, or a Riccati
//! solve that cannot produce a stabilizing solution. A tolerance violation
//! on the ARME residual is deliberately *not* an error; it is reported as a
//! warning by the caller and does not alter the exit status.

/// Unified error type for the recovery-policy pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum GrpError {
    /// Required JSON fields absent or unreadable, parameter arrays of
    /// mismatched length, or non-finite/degenerate parameter values.
    MalformedInput(String),
    /// The production sequence failed validation: empty, a non-integer or
    /// negative entry, an entry outside `[0, m)`, or a minimum entry that is
    /// nonzero (item indices must start at 0).
    InvalidSequence(String),
    /// The ARME admits no reachable stabilizing solution for these
    /// parameters, or a matrix that the pipeline must invert is singular.
    /// Covers the infeasible `p[i] = 1` case detected at assembly.
    SolverConvergence(String),
}

/// Standard result alias used across the crate.
pub type GrpResult<T> = Result<T, GrpError>;

impl std::fmt::Display for GrpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrpError::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            GrpError::InvalidSequence(msg) => {
                write!(f, "invalid production sequence: {}", msg)
            }
            GrpError::SolverConvergence(msg) => {
                write!(f, "Riccati solver failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for GrpError {}
