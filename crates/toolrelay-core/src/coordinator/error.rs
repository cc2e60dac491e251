//! Round-trip error kinds

use thiserror::Error;

use crate::providers::ProviderError;
use crate::structured::ValidationError;
use crate::tools::ToolError;
use crate::types::{ToolCall, ToolResult};

/// Classification of everything that can go wrong in a round trip
///
/// `ToolNotFound` and `ToolExecutionFailed` are recovered per call and
/// reported to the provider as error results; the rest end the round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ProviderUnavailable,
    ToolNotFound,
    ToolExecutionFailed,
    SchemaValidationFailed,
    RoundTripLimitExceeded,
    Cancelled,
}

impl ErrorKind {
    /// Kind of a tool failure, if the result is one
    pub fn of_tool_result(result: &ToolResult) -> Option<Self> {
        if !result.is_error {
            return None;
        }
        if result.content.starts_with("tool unavailable:") {
            Some(ErrorKind::ToolNotFound)
        } else {
            Some(ErrorKind::ToolExecutionFailed)
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ToolExecutionFailed => "ToolExecutionFailed",
            ErrorKind::SchemaValidationFailed => "SchemaValidationFailed",
            ErrorKind::RoundTripLimitExceeded => "RoundTripLimitExceeded",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

impl From<&ToolError> for ErrorKind {
    fn from(err: &ToolError) -> Self {
        match err {
            ToolError::NotFound(_) => ErrorKind::ToolNotFound,
            _ => ErrorKind::ToolExecutionFailed,
        }
    }
}

/// A round trip that ended in `Failed`
#[derive(Error, Debug)]
pub enum RoundTripError {
    /// The provider call failed or its response was unusable
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),

    /// The final payload did not match the requested shape
    #[error("structured answer failed validation: {}", join_errors(.errors))]
    SchemaValidationFailed {
        errors: Vec<ValidationError>,
        /// The provider's raw final text
        payload: String,
    },

    /// The provider kept requesting tools past the configured bound
    #[error("round trip exceeded {limit} tool rounds with {} unresolved tool calls", .unresolved.len())]
    RoundTripLimitExceeded { limit: usize, unresolved: Vec<ToolCall> },

    #[error("round trip cancelled")]
    Cancelled,
}

impl RoundTripError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoundTripError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            RoundTripError::SchemaValidationFailed { .. } => ErrorKind::SchemaValidationFailed,
            RoundTripError::RoundTripLimitExceeded { .. } => ErrorKind::RoundTripLimitExceeded,
            RoundTripError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<ProviderError> for RoundTripError {
    fn from(err: ProviderError) -> Self {
        if err.is_cancelled() {
            RoundTripError::Cancelled
        } else {
            RoundTripError::ProviderUnavailable(err)
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub type RoundTripResult<T> = Result<T, RoundTripError>;
