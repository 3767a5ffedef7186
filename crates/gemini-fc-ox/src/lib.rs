#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

pub mod content;
pub mod generate_content;
mod internal;
pub mod prelude;
pub mod tool;

// Re-export generate content types
pub use crate::generate_content::request::GenerateContentRequest;
pub use crate::generate_content::response::GenerateContentResponse;
pub use crate::generate_content::{
    FinishReason, GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting,
    SafetySettings,
};

// Re-export content types
pub use crate::content::{Content, FunctionCall, FunctionResponse, Part, Role, Text};

// Re-export tool and loop types
pub use crate::tool::{
    CallDescriptor, FunctionCallError, FunctionCallingLoop, FunctionMetadata, Handler,
    LoopConfig, LoopOutcome, Registry, StopReason, Tool,
};

use core::fmt;

use bon::Builder;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Client for the Gemini `generateContent` API.
///
/// Authenticates with an API key, or with an OAuth token against the Cloud
/// Code Assist endpoint. When both are set the OAuth token wins.
#[derive(Clone, Default, Builder)]
pub struct Gemini {
    #[builder(into)]
    pub(crate) api_key: Option<String>,
    #[builder(into)]
    pub(crate) oauth_token: Option<String>,
    #[builder(into)]
    pub(crate) project_id: Option<String>,
    #[builder(default)]
    pub(crate) client: reqwest::Client,
    #[builder(default = "v1beta".to_string(), into)]
    pub(crate) api_version: String,
    /// Replaces the Google endpoint, e.g. to point at a local mock server.
    #[builder(into)]
    pub(crate) base_url: Option<String>,
}

impl Gemini {
    /// Create a new Gemini client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new Gemini client with an OAuth token.
    pub fn with_oauth_token(oauth_token: impl Into<String>) -> Self {
        Self::builder().oauth_token(oauth_token).build()
    }

    /// Create a client authenticated with an OAuth token for a Cloud project.
    pub fn with_oauth_token_and_project(
        oauth_token: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self::builder()
            .oauth_token(oauth_token)
            .project_id(project_id)
            .build()
    }

    /// Reads the API key from `GEMINI_API_KEY`, falling back to `GOOGLE_AI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `VarError` if neither variable is set to valid unicode.
    pub fn load_from_env() -> Result<Self, std::env::VarError> {
        let api_key =
            std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_AI_API_KEY"))?;
        Ok(Self::new(api_key))
    }

    pub(crate) fn base_url(&self) -> &str {
        match (&self.base_url, &self.oauth_token) {
            (Some(base_url), _) => base_url.trim_end_matches('/'),
            (None, Some(_)) => "https://cloudcode-pa.googleapis.com",
            (None, None) => "https://generativelanguage.googleapis.com",
        }
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "oauth_token",
                &self.oauth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("project_id", &self.project_id)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Body of a structured Google API error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleApiErrorPayload {
    /// The error object itself.
    error: GoogleApiErrorDetails,
}

/// Fields of a structured Google API error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleApiErrorDetails {
    /// HTTP-like numeric code.
    code: Option<i32>,
    /// Human readable message.
    message: String,
    /// Canonical status, e.g. `INVALID_ARGUMENT`.
    status: Option<String>,
    /// Provider specific details.
    details: Option<Value>,
}

#[derive(Debug, Error)]
pub enum GeminiRequestError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid request error: {message}")]
    InvalidRequestError {
        code: Option<String>,
        details: serde_json::Value,
        message: String,
        status: Option<String>,
    },

    #[error("Unexpected response from API: {0}")]
    UnexpectedResponse(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication is missing: no API key or OAuth token provided")]
    AuthenticationMissing,
}

/// Maps a non-success HTTP response to the matching error.
fn parse_error_response(status: reqwest::StatusCode, bytes: &[u8]) -> GeminiRequestError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return GeminiRequestError::RateLimit;
    }
    if let Ok(payload) = serde_json::from_slice::<GoogleApiErrorPayload>(bytes) {
        GeminiRequestError::InvalidRequestError {
            code: payload.error.code.map(|c| c.to_string()),
            message: payload.error.message,
            status: payload.error.status,
            details: payload.error.details.unwrap_or(Value::Null),
        }
    } else {
        let error_text = String::from_utf8_lossy(bytes);
        GeminiRequestError::UnexpectedResponse(format!(
            "HTTP status {}: {error_text}",
            status.as_u16()
        ))
    }
}
