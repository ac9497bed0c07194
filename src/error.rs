//! Error types.
//!
//! Two layers:
//!
//! - [`ApiError`] / [`AnalysisFailed`]: structured failures produced by the data
//!   client and the analysis flow. Sessions convert these into degraded states;
//!   they never reach the rendering layer.
//! - [`AppError`]: the process-level error carried back to `main`, which prints
//!   it and exits with its code.

use thiserror::Error;

/// A failed call to one of the remote endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request could not be sent, or the connection failed mid-flight.
    #[error("{endpoint}: request failed: {reason}")]
    Transport {
        endpoint: String,
        reason: String,
    },

    /// The server answered with a non-2xx status.
    #[error("{endpoint}: HTTP {status}")]
    Status {
        endpoint: String,
        status: u16,
    },

    /// The body did not decode into the expected shape.
    #[error("{endpoint}: unexpected response shape: {reason}")]
    Decode {
        endpoint: String,
        reason: String,
    },
}

/// The text-analysis request failed. No retry is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Analysis failed: {0}")]
pub struct AnalysisFailed(pub ApiError);

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

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<AnalysisFailed> for AppError {
    fn from(err: AnalysisFailed) -> Self {
        AppError::new(3, err.to_string())
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
