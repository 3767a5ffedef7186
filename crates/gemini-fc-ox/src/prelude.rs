//! Everything needed to declare functions and run the function-calling loop.

pub use crate::{
    Gemini, GeminiRequestError, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig,
    content::{Content, Part, Role},
    tool::{
        Args, CallDescriptor, Dispatch, FunctionCallError, FunctionCallingLoop, FunctionMetadata,
        Handler, LoopConfig, LoopOutcome, Registry, StopReason, Tool,
        config::{Mode, ToolConfig},
        extract, extract_model_turn, has_function_calls,
    },
};
