//! Error types.
//!
//! Library code returns [`EtcError`]; the binary boundary converts it into an
//! [`AppError`] carrying the process exit code.

use thiserror::Error;

use crate::math::measure::Dimension;

/// Exit code for configuration and usage errors.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code when the target SNR is not reachable inside the magnitude bracket.
pub const EXIT_NOT_BRACKETED: u8 = 3;
/// Exit code for numeric failures (non-convergence, non-finite SNR).
pub const EXIT_NUMERIC: u8 = 4;
/// Exit code for photometry / sky-background lookup failures.
pub const EXIT_UPSTREAM: u8 = 5;

/// Errors raised by the exposure time calculator and its collaborators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EtcError {
    /// A unit-bearing input does not have the physical dimension it needs.
    #[error("incompatible units for {parameter}: expected {expected}, got {found}")]
    IncompatibleUnits {
        parameter: &'static str,
        expected: Dimension,
        found: Dimension,
    },

    /// Observation request or solver settings are out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The objective has the same sign at both ends of the magnitude bracket.
    #[error(
        "target SNR is not reachable within magnitudes [{low}, {high}] \
         (SNR offset {f_low:.4e} at {low}, {f_high:.4e} at {high})"
    )]
    RootNotBracketed {
        low: f64,
        high: f64,
        f_low: f64,
        f_high: f64,
    },

    /// Bisection ran out of iterations before the bracket shrank below tolerance.
    #[error("bisection did not converge after {iterations} iterations (bracket width {width:.3e})")]
    Convergence { iterations: usize, width: f64 },

    /// SNR evaluation produced NaN or infinity.
    #[error("SNR evaluation is not finite at magnitude {magnitude}")]
    NonFiniteObjective { magnitude: f64 },

    /// Failure reported by a photometry or sky-background collaborator.
    #[error("{source_name} lookup failed: {message}")]
    Upstream { source_name: String, message: String },
}

impl EtcError {
    pub fn upstream(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Process exit code used when this error reaches `main`.
    pub fn exit_code(&self) -> u8 {
        match self {
            EtcError::IncompatibleUnits { .. } | EtcError::InvalidRequest(_) => EXIT_CONFIG,
            EtcError::RootNotBracketed { .. } => EXIT_NOT_BRACKETED,
            EtcError::Convergence { .. } | EtcError::NonFiniteObjective { .. } => EXIT_NUMERIC,
            EtcError::Upstream { .. } => EXIT_UPSTREAM,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EtcError> for AppError {
    fn from(err: EtcError) -> Self {
        AppError::new(err.exit_code(), format!("error: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
