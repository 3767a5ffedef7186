//! Core content types for the Gemini API
//!
//! Conversation turns ([`Content`]) and their parts, shared by requests,
//! responses and the function-calling loop.

pub mod part;
pub mod types;

pub use part::{
    Blob, CodeExecutionResult, ExecutableCode, FileData, FunctionCall, FunctionResponse, Language,
    Outcome, Part, PartData, Text,
};
pub use types::{Content, ContentError, Role};
