//! Function declarations and the automatic function-calling machinery.
//!
//! A response is turned into [`CallDescriptor`]s by [`extract`], the calls
//! are run against a [`Registry`], and the results are folded back into a
//! function turn by [`turn`]. [`auto::FunctionCallingLoop`] repeats this
//! until the model answers without calling anything.

pub mod auto;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod registry;
pub mod turn;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use auto::{FunctionCallingLoop, LoopConfig, LoopOutcome, StopReason, should_continue};
pub use error::{ExecutionResult, FailureKind, FunctionCallError};
pub use executor::build_responses;
pub use extract::{CallDescriptor, FunctionCallSource, ResponseShape, extract, has_function_calls};
pub use registry::{Args, Dispatch, Handler, HandlerFuture, Registry};
pub use turn::{build_function_response_turn, extract_model_turn};

/// Declaration of a function the model may call.
///
/// `parameters` is an OpenAPI-style schema object and is passed to the
/// provider as is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl FunctionMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters,
            response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    FunctionDeclarations(Vec<FunctionMetadata>),
    CodeExecution(Value),
    GoogleSearch(Value),
}

impl Tool {
    /// Names of the functions this tool declares.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        let declarations: &[FunctionMetadata] = match self {
            Tool::FunctionDeclarations(declarations) => declarations,
            _ => &[],
        };
        declarations.iter().map(|d| d.name.as_str())
    }
}

impl From<FunctionMetadata> for Tool {
    fn from(value: FunctionMetadata) -> Self {
        Tool::FunctionDeclarations(vec![value])
    }
}

impl From<Vec<FunctionMetadata>> for Tool {
    fn from(value: Vec<FunctionMetadata>) -> Self {
        Tool::FunctionDeclarations(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn function_declarations_use_camel_case_key() {
        let tool = Tool::from(FunctionMetadata::new(
            "add",
            "Adds two integers",
            json!({
                "type": "object",
                "properties": { "a": { "type": "integer" }, "b": { "type": "integer" } },
                "required": ["a", "b"]
            }),
        ));

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["functionDeclarations"][0]["name"], "add");
        assert!(value["functionDeclarations"][0].get("response").is_none());
        assert_eq!(tool.function_names().collect::<Vec<_>>(), ["add"]);
    }

    #[test]
    fn builtin_tools_declare_no_functions() {
        let tool = Tool::CodeExecution(json!({}));
        assert_eq!(serde_json::to_value(&tool).unwrap(), json!({ "codeExecution": {} }));
        assert_eq!(tool.function_names().count(), 0);
    }
}
