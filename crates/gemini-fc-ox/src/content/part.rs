use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single piece of a [`Content`](super::Content) turn.
///
/// On the wire a part is an object carrying exactly one payload key
/// (`text`, `inlineData`, `functionCall`, `executableCode`, ...) next to
/// optional thought metadata, so the payload is flattened into the part
/// itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(flatten)]
    pub data: PartData,
    /// Set by thinking models on parts that contain reasoning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    /// Opaque signature that must be echoed back with the part it came with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

impl Part {
    pub fn new(data: impl Into<PartData>) -> Self {
        Self {
            data: data.into(),
            thought: None,
            thought_signature: None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&Text> {
        match &self.data {
            PartData::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match &self.data {
            PartData::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function_response(&self) -> Option<&FunctionResponse> {
        match &self.data {
            PartData::FunctionResponse(response) => Some(response),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_inline_data(&self) -> Option<&Blob> {
        match &self.data {
            PartData::InlineData(blob) => Some(blob),
            _ => None,
        }
    }
}

macro_rules! part_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Part {
                fn from(value: $ty) -> Self {
                    Part::new(value)
                }
            }
        )*
    };
}

part_from!(
    PartData,
    Text,
    &str,
    String,
    Blob,
    FunctionCall,
    FunctionResponse,
    FileData,
    ExecutableCode,
    CodeExecutionResult,
);

/// The payload of a [`Part`]. The variant name is the wire key, except for
/// `Other`, which holds the remaining keys as they arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartData {
    Text(Text),
    InlineData(Blob),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    FileData(FileData),
    /// Code generated by the model for the code execution tool.
    ExecutableCode(ExecutableCode),
    /// The result of running an [`ExecutableCode`] part.
    CodeExecutionResult(CodeExecutionResult),
    /// Any payload not modelled above, kept verbatim so it is echoed back
    /// unchanged.
    #[serde(untagged)]
    Other(Value),
}

impl From<Text> for PartData {
    fn from(value: Text) -> Self {
        PartData::Text(value)
    }
}

impl From<&str> for PartData {
    fn from(value: &str) -> Self {
        PartData::Text(Text::from(value))
    }
}

impl From<String> for PartData {
    fn from(value: String) -> Self {
        PartData::Text(Text::from(value))
    }
}

impl From<Blob> for PartData {
    fn from(value: Blob) -> Self {
        PartData::InlineData(value)
    }
}

impl From<FunctionCall> for PartData {
    fn from(value: FunctionCall) -> Self {
        PartData::FunctionCall(value)
    }
}

impl From<FunctionResponse> for PartData {
    fn from(value: FunctionResponse) -> Self {
        PartData::FunctionResponse(value)
    }
}

impl From<FileData> for PartData {
    fn from(value: FileData) -> Self {
        PartData::FileData(value)
    }
}

impl From<ExecutableCode> for PartData {
    fn from(value: ExecutableCode) -> Self {
        PartData::ExecutableCode(value)
    }
}

impl From<CodeExecutionResult> for PartData {
    fn from(value: CodeExecutionResult) -> Self {
        PartData::CodeExecutionResult(value)
    }
}

/// Plain text. Serialises as a bare string under the `text` key.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
)]
#[serde(transparent)]
pub struct Text(String);

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Raw media bytes, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl Blob {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Reference to a file previously uploaded to the Files API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

impl FileData {
    pub fn new(file_uri: impl Into<String>, mime_type: Option<impl Into<String>>) -> Self {
        Self {
            mime_type: mime_type.map(Into::into),
            file_uri: file_uri.into(),
        }
    }
}

/// Programming language of [`ExecutableCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    LanguageUnspecified,
    Python,
}

/// Code the model wrote and asked the code execution tool to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableCode {
    pub language: Language,
    pub code: String,
}

/// How a code execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    OutcomeUnspecified,
    OutcomeOk,
    OutcomeFailed,
    OutcomeDeadlineExceeded,
}

/// Output of running [`ExecutableCode`]: stdout on success, an error
/// description otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExecutionResult {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// A function invocation predicted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// The output of a function call, sent back to the model.
///
/// `response` is an arbitrary JSON object; by convention it holds either a
/// `result` or an `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

impl FunctionResponse {
    pub fn new(name: impl Into<String>, response: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            response,
        }
    }
}
