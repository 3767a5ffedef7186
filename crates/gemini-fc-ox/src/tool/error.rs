//! Per-call failures and the result type of a single function execution.

use serde_json::{Value, json};
use thiserror::Error;

/// Outcome of running one call: the handler's value or the reason it failed.
pub type ExecutionResult = Result<Value, FunctionCallError>;

/// Why a call produced no value.
///
/// These never abort a loop; they are reported back to the model inside the
/// function turn so it can recover.
#[derive(Error, Debug)]
pub enum FunctionCallError {
    /// No handler is registered under the requested name.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// The handler returned an error or panicked.
    #[error("Function execution failed: {error}")]
    ExecutionFailed { name: String, error: anyhow::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    UnknownFunction,
    ExecutionError,
}

impl FunctionCallError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnknownFunction(_) => FailureKind::UnknownFunction,
            Self::ExecutionFailed { .. } => FailureKind::ExecutionError,
        }
    }

    /// Name of the function the failed call targeted.
    #[must_use]
    pub fn function_name(&self) -> &str {
        match self {
            Self::UnknownFunction(name) | Self::ExecutionFailed { name, .. } => name,
        }
    }

    /// The `{"error": message}` payload sent back to the model.
    #[must_use]
    pub fn to_response_payload(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}
