use serde::{Deserialize, Serialize};

use super::{PromptFeedback, ResponseCandidate, usage::UsageMetadata};
use crate::{
    content::Content,
    tool::{
        CallDescriptor, Registry,
        extract::{extract, has_function_calls},
        turn::build_function_response_turn,
    },
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GenerateContentResponse {
    #[must_use]
    pub fn content(&self) -> Vec<&Content> {
        self.candidates.iter().map(|c| &c.content).collect()
    }

    #[must_use]
    pub fn first_content(&self) -> Option<&Content> {
        self.candidates.first().map(|c| &c.content)
    }

    /// Text of the first candidate, if it carries any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.first_content().and_then(Content::text_content)
    }

    /// Every function call across every candidate, in provider order.
    #[must_use]
    pub fn function_calls(&self) -> Vec<CallDescriptor> {
        extract(self)
    }

    #[must_use]
    pub fn has_function_calls(&self) -> bool {
        has_function_calls(self)
    }

    /// Runs every requested call concurrently against `registry` and returns
    /// the function turn to send back, or `None` when nothing was requested.
    ///
    /// Failures are reported inside the turn, never as an `Err`.
    pub async fn invoke_functions(&self, registry: &Registry) -> Option<Content> {
        let descriptors = self.function_calls();
        if descriptors.is_empty() {
            return None;
        }
        let results = registry.execute_all_parallel(&descriptors).await;
        Some(build_function_response_turn(&descriptors, results))
    }
}
