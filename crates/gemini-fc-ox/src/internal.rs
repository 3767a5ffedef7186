//! Transport for `generateContent`: auth selection, endpoint layout and the
//! Cloud Code Assist envelope.

use crate::{
    Gemini, GeminiRequestError,
    generate_content::{request::GenerateContentRequest, response::GenerateContentResponse},
    parse_error_response,
};
use serde_json::{Value, json};

/// How a request is authenticated.
#[derive(Clone)]
enum AuthMethod {
    /// `?key=` query parameter against the public API.
    ApiKey(String),
    /// `Authorization: Bearer` against the Cloud Code Assist API.
    Bearer(String),
}

/// Sends Gemini requests over the client's `reqwest::Client`.
#[derive(Clone)]
pub(crate) struct GeminiRequestHelper {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// Selected credentials.
    auth: AuthMethod,
    /// Endpoint root without trailing slash.
    base_url: String,
    /// API version segment for key-authenticated requests.
    api_version: String,
    /// Cloud project sent in the OAuth envelope.
    project_id: Option<String>,
}

impl GeminiRequestHelper {
    /// Picks OAuth when a token is present, otherwise the API key.
    pub(crate) fn for_generate(gemini: &Gemini) -> Result<Self, GeminiRequestError> {
        let auth = match (&gemini.oauth_token, &gemini.api_key) {
            (Some(token), _) => AuthMethod::Bearer(token.clone()),
            (None, Some(key)) => AuthMethod::ApiKey(key.clone()),
            (None, None) => return Err(GeminiRequestError::AuthenticationMissing),
        };
        Ok(Self {
            client: gemini.client.clone(),
            auth,
            base_url: gemini.base_url().to_string(),
            api_version: gemini.api_version.clone(),
            project_id: gemini.project_id.clone(),
        })
    }

    /// Builds the body; OAuth requests wrap the request in an envelope.
    fn build_generate_content_body(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Value, GeminiRequestError> {
        match self.auth {
            AuthMethod::ApiKey(_) => Ok(serde_json::to_value(request)?),
            AuthMethod::Bearer(_) => {
                let mut inner = json!({
                    "contents": request.contents,
                    "generationConfig": request.generation_config,
                    "systemInstruction": request.system_instruction,
                });
                if !request.tools.is_empty() {
                    inner["tools"] = serde_json::to_value(&request.tools)?;
                }
                if let Some(tool_config) = &request.tool_config {
                    inner["toolConfig"] = serde_json::to_value(tool_config)?;
                }
                if let Some(safety_settings) = &request.safety_settings {
                    inner["safetySettings"] = serde_json::to_value(safety_settings)?;
                }
                if let Some(cached_content) = &request.cached_content {
                    inner["cachedContent"] = Value::String(cached_content.clone());
                }
                Ok(json!({
                    "model": request.model,
                    "project": self.project_id,
                    "request": inner,
                }))
            }
        }
    }

    /// Sends one non-streaming `generateContent` request.
    pub(crate) async fn send_generate_content_request(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiRequestError> {
        let body = self.build_generate_content_body(request)?;
        let builder = match &self.auth {
            AuthMethod::ApiKey(key) => self
                .client
                .post(format!(
                    "{}/{}/models/{}:generateContent",
                    self.base_url, self.api_version, request.model
                ))
                .query(&[("key", key)]),
            AuthMethod::Bearer(token) => self
                .client
                .post(format!("{}/v1internal:generateContent", self.base_url))
                .bearer_auth(token),
        };

        log::debug!("POST generateContent for model {}", request.model);
        let res = builder.json(&body).send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(parse_error_response(status, &bytes));
        }

        let value: Value = serde_json::from_slice(&bytes)?;
        let value = match self.auth {
            AuthMethod::ApiKey(_) => value,
            AuthMethod::Bearer(_) => value.get("response").cloned().ok_or_else(|| {
                GeminiRequestError::UnexpectedResponse(
                    "Missing 'response' field in Cloud Code Assist API response".to_string(),
                )
            })?,
        };
        Ok(serde_json::from_value(value)?)
    }
}
