use bon::Builder;
use serde::Serialize;

use crate::{
    Gemini, GeminiRequestError,
    tool::{
        Registry, Tool,
        auto::{FunctionCallingLoop, LoopConfig, LoopOutcome},
        config::ToolConfig,
    },
};

use super::{GenerationConfig, SafetySettings, response::GenerateContentResponse};
use crate::content::Content;

#[derive(Debug, Clone, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[builder(field)]
    pub contents: Vec<Content>,
    #[builder(field)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) tools: Vec<Tool>,
    #[builder(into)]
    #[serde(skip)]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) safety_settings: Option<SafetySettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cached_content: Option<String>,
    #[serde(skip)]
    pub(crate) gemini: Gemini,
}

impl<S: generate_content_request_builder::State> GenerateContentRequestBuilder<S> {
    pub fn content_list(mut self, contents: impl IntoIterator<Item = impl Into<Content>>) -> Self {
        self.contents = contents.into_iter().map(Into::into).collect();
        self
    }
    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.contents.push(content.into());
        self
    }
    pub fn tool(mut self, tool: impl Into<Tool>) -> Self {
        self.tools.push(tool.into());
        self
    }
    pub fn tools(mut self, tools: impl IntoIterator<Item = impl Into<Tool>>) -> Self {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }
}

impl GenerateContentRequest {
    #[must_use]
    pub fn generation_config(&self) -> Option<&GenerationConfig> {
        self.generation_config.as_ref()
    }

    /// Sends the request and keeps answering the model's function calls from
    /// `registry` until it replies without calls or the budget in `config`
    /// runs out.
    ///
    /// Every follow-up request reuses this request's model, tools and
    /// settings, with `contents` replaced by the accumulated conversation
    /// and the generation config threaded through unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error of the *initial* request. Failures of follow-up
    /// requests end the loop and are reported in [`LoopOutcome::response`].
    pub async fn run_with_functions(
        &self,
        registry: &Registry,
        config: &LoopConfig,
    ) -> Result<LoopOutcome<GenerateContentResponse, GeminiRequestError>, GeminiRequestError>
    {
        let initial = self.send().await?;
        let driver = FunctionCallingLoop::builder()
            .registry(registry.clone())
            .config(*config)
            .build();

        let outcome = driver
            .run(
                initial,
                self.contents.clone(),
                self.generation_config.clone(),
                |contents, generation_config| {
                    let mut request = self.clone();
                    request.contents = contents;
                    request.generation_config = generation_config;
                    async move { request.send().await }
                },
            )
            .await;
        Ok(outcome)
    }
}

impl Gemini {
    pub fn generate_content(
        &self,
    ) -> GenerateContentRequestBuilder<generate_content_request_builder::SetGemini> {
        GenerateContentRequest::builder().gemini(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::FunctionMetadata;
    use serde_json::json;

    #[test]
    fn request_serializes_wire_body() {
        let request = Gemini::new("key")
            .generate_content()
            .model("gemini-2.5-flash")
            .content("What is 2 + 3?")
            .tool(Tool::FunctionDeclarations(vec![FunctionMetadata {
                name: "add".to_string(),
                description: Some("Adds two numbers".to_string()),
                parameters: json!({ "type": "object" }),
                response: None,
            }]))
            .generation_config(GenerationConfig::builder().temperature(0.0).build())
            .build();

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "What is 2 + 3?");
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "add");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert!(body.get("model").is_none());
        assert!(body.get("toolConfig").is_none());
    }
}
