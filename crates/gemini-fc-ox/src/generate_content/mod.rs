use crate::{
    GeminiRequestError, content::Content, internal::GeminiRequestHelper,
    tool::extract_model_turn,
};
use bon::Builder;
use request::GenerateContentRequest;
use response::GenerateContentResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod request;
pub mod response;
pub mod usage;

impl GenerateContentRequest {
    /// Sends a generate content request to the Gemini API
    ///
    /// This method makes a non-streaming request and returns the complete response.
    ///
    /// # Errors
    ///
    /// This function can return the following error variants:
    /// - `GeminiRequestError::AuthenticationMissing` - if the client has neither an API key nor an OAuth token
    /// - `GeminiRequestError::ReqwestError` - if the HTTP request fails
    /// - `GeminiRequestError::RateLimit` - if the API rate limit is exceeded (HTTP 429)
    /// - `GeminiRequestError::InvalidRequestError` - if the API returns a 4xx/5xx error with structured error data
    /// - `GeminiRequestError::SerdeError` - if the API response cannot be parsed as JSON
    /// - `GeminiRequestError::UnexpectedResponse` - if the API returns an unexpected response format or error
    pub async fn send(&self) -> Result<GenerateContentResponse, GeminiRequestError> {
        let helper = GeminiRequestHelper::for_generate(&self.gemini)?;
        helper.send_generate_content_request(self).await
    }

    #[must_use]
    pub fn push_content(mut self, content: impl Into<Content>) -> Self {
        self.contents.push(content.into());
        self
    }
}

/// Flattens the parts of every candidate into a single model turn.
impl From<GenerateContentResponse> for Content {
    fn from(value: GenerateContentResponse) -> Self {
        extract_model_turn(&value)
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
/// Output only. The reason why the model stopped generating tokens.
///
/// If empty, the model has not stopped generating the tokens.
pub enum FinishReason {
    /// The finish reason is unspecified.
    FinishReasonUnspecified,
    /// Token generation reached a natural stopping point or a configured stop sequence.
    Stop,
    /// Token generation reached the configured maximum output tokens.
    MaxTokens,
    /// Token generation stopped because the content potentially contains safety violations.
    Safety,
    /// The token generation stopped because of potential recitation.
    Recitation,
    /// The token generation stopped because of using an unsupported language.
    Language,
    /// All other reasons that stopped the token generation.
    Other,
    /// Token generation stopped because the content contains forbidden terms.
    Blocklist,
    /// Token generation stopped for potentially containing prohibited content.
    ProhibitedContent,
    /// Token generation stopped because the content potentially contains Sensitive Personally Identifiable Information (SPII).
    Spii,
    /// The function call generated by the model is invalid.
    MalformedFunctionCall,
    /// The model called a function that was not declared.
    UnexpectedToolCall,
    /// Token generation stopped because generated images have safety violations.
    ImageSafety,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCandidate {
    /// Blocked candidates may arrive without content.
    #[serde(default)]
    pub content: Content,
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
    pub token_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_logprobs: Option<f64>,
    pub index: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    BlockReasonUnspecified,
    Safety,
    Other,
    Blocklist,
    ProhibitedContent,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<BlockReason>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetySettings(Vec<SafetySetting>);

impl SafetySettings {
    #[must_use]
    pub fn with_category(mut self, category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        self.0.push((category, threshold).into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl From<(HarmCategory, HarmBlockThreshold)> for SafetySetting {
    fn from(value: (HarmCategory, HarmBlockThreshold)) -> Self {
        SafetySetting {
            category: value.0,
            threshold: value.1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryUnspecified,
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
    HarmCategoryCivicIntegrity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    HarmBlockThresholdUnspecified,
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
    Off,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    pub category: HarmCategory,
    pub probability: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// Indicates whether to include thoughts in the response.
    pub include_thoughts: bool,
    /// The number of thoughts tokens that the model should generate.
    pub thinking_budget: i32,
}

/// Sampling and output options, threaded unchanged through every turn of a
/// function-calling loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Character sequences (up to 5) that will stop output generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Output response mimetype, e.g. `application/json`.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Output schema of the generated candidate text. Requires a compatible `response_mime_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// Number of generated responses to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    /// The maximum number of tokens to include in a candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Controls the randomness of the output. Values range over [0.0, 2.0].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// The maximum cumulative probability of tokens to consider when sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// The maximum number of tokens to consider when sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u64>,
    /// Config for thinking features.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}
