use super::part::{Blob, FileData, FunctionCall, FunctionResponse, Part, Text};
use bon::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents the producer of the content.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Content produced by the user.
    #[default]
    User,
    /// Content produced by the model.
    Model,
    /// Results of function calls, fed back to the model.
    Function,
}

/// Errors that can occur when building content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Error during serialization of JSON data.
    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// One role-tagged turn of a conversation.
///
/// A `Content` includes a `role` designating the producer of the turn and an
/// ordered list of `parts` carrying its payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
pub struct Content {
    /// Ordered parts that constitute a single message.
    #[builder(field = Vec::new())]
    #[serde(default)]
    pub parts: Vec<Part>,
    /// The producer of the content.
    #[builder(default, into)]
    #[serde(default)]
    pub role: Role,
}

impl Content {
    /// Creates a new `Content` with the given role and parts.
    pub fn new(role: Role, parts: impl IntoIterator<Item = impl Into<Part>>) -> Self {
        Self {
            role,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a user turn containing a single text part.
    pub fn text(text: impl Into<Text>) -> Self {
        Self::new(Role::User, [Part::new(text.into())])
    }

    /// Creates a user turn containing a single inline blob.
    #[must_use]
    pub fn inline_data(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::new(Role::User, [Blob::new(mime_type, data)])
    }

    /// Creates a model turn containing a single function call.
    ///
    /// # Errors
    /// Returns `ContentError::SerializationError` if the arguments cannot be serialized.
    pub fn function_call(
        name: impl Into<String>,
        args: Option<impl Serialize>,
    ) -> Result<Self, ContentError> {
        let args = args.map(serde_json::to_value).transpose()?;
        let call = FunctionCall {
            id: None,
            name: name.into(),
            args,
        };
        Ok(Self::new(Role::Model, [call]))
    }

    /// Creates a function turn containing a single function response.
    ///
    /// # Errors
    /// Returns `ContentError::SerializationError` if the response cannot be serialized.
    pub fn function_response(
        name: impl Into<String>,
        response: impl Serialize,
    ) -> Result<Self, ContentError> {
        let response = FunctionResponse::new(name, serde_json::to_value(response)?);
        Ok(Self::new(Role::Function, [response]))
    }

    /// Creates a user turn referencing an uploaded file.
    #[must_use]
    pub fn file_data(file_uri: impl Into<String>, mime_type: Option<impl Into<String>>) -> Self {
        Self::new(Role::User, [FileData::new(file_uri, mime_type)])
    }

    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Adds a new part to the end of the content's parts.
    pub fn push(&mut self, part: impl Into<Part>) {
        self.parts.push(part.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterates over the function calls carried by this turn.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(Part::as_function_call)
    }

    /// Concatenates every text part, or `None` when the turn has no text.
    #[must_use]
    pub fn text_content(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(Part::as_text)
            .map(|text| text.as_str())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

impl<S: content_builder::State> ContentBuilder<S> {
    /// Sets the parts of the content.
    pub fn parts(mut self, parts: impl IntoIterator<Item = impl Into<Part>>) -> Self {
        self.parts = parts.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a single part to the content.
    pub fn part(mut self, part: impl Into<Part>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Adds a single text part to the content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Text::new(text).into());
        self
    }

    /// Adds a single function response part to the content.
    ///
    /// # Errors
    /// Returns an error if the response cannot be serialized to JSON.
    pub fn function_response(
        mut self,
        name: impl Into<String>,
        response: impl Serialize,
    ) -> Result<Self, ContentError> {
        let response = FunctionResponse::new(name, serde_json::to_value(response)?);
        self.parts.push(response.into());
        Ok(self)
    }
}

/// Creates a user turn from an iterator of parts.
impl FromIterator<Part> for Content {
    fn from_iter<T: IntoIterator<Item = Part>>(iter: T) -> Self {
        Self::new(Role::User, iter)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::text(value)
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::text(value)
    }
}

impl From<Content> for Vec<Content> {
    fn from(value: Content) -> Self {
        vec![value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn function_role_serializes_as_function() {
        let content = Content::function_response("get_time", json!({ "result": "noon" })).unwrap();
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({
                "parts": [{ "functionResponse": { "name": "get_time", "response": { "result": "noon" } } }],
                "role": "function"
            })
        );
    }

    #[test]
    fn builder_collects_parts_in_order() {
        let content = Content::builder()
            .role(Role::Model)
            .text("first")
            .part(FunctionCall {
                id: Some("call_0".to_string()),
                name: "lookup".to_string(),
                args: None,
            })
            .build();

        assert_eq!(content.role, Role::Model);
        assert_eq!(content.parts.len(), 2);
        assert_eq!(content.text_content().as_deref(), Some("first"));
        assert_eq!(content.function_calls().count(), 1);
    }

    #[test]
    fn content_without_parts_deserializes() {
        let content: Content = serde_json::from_value(json!({ "role": "model" })).unwrap();
        assert!(content.is_empty());
        assert_eq!(content.role, Role::Model);
    }
}
