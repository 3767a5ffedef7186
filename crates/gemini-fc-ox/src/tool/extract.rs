//! Normalises function-call requests out of a provider response.
//!
//! Responses arrive either as the typed [`GenerateContentResponse`] or as
//! raw decoded JSON, with camelCase or snake_case keys and with parts
//! optionally wrapped in a `part` object. [`extract`] flattens all of them
//! into one ordered list of [`CallDescriptor`]s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{content::FunctionCall, generate_content::response::GenerateContentResponse};

const CALL_KEYS: [&str; 2] = ["functionCall", "function_call"];

/// One function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// The provider's call id, or `call_{index}` when it sent none.
    pub id: String,
    pub name: String,
    pub args: Map<String, Value>,
}

impl CallDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// The two response representations the extractor understands.
#[derive(Debug, Clone, Copy)]
pub enum ResponseShape<'a> {
    Typed(&'a GenerateContentResponse),
    Raw(&'a Value),
}

/// Anything a function-calling loop can read calls out of.
pub trait FunctionCallSource {
    fn shape(&self) -> ResponseShape<'_>;
}

impl FunctionCallSource for GenerateContentResponse {
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Typed(self)
    }
}

impl FunctionCallSource for Value {
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Raw(self)
    }
}

impl<T: FunctionCallSource + ?Sized> FunctionCallSource for &T {
    fn shape(&self) -> ResponseShape<'_> {
        (**self).shape()
    }
}

/// A call payload before validation, borrowed from either shape.
struct Payload<'a> {
    id: Option<&'a str>,
    name: Option<&'a str>,
    args: Option<&'a Value>,
}

impl<'a> From<&'a FunctionCall> for Payload<'a> {
    fn from(call: &'a FunctionCall) -> Self {
        Self {
            id: call.id.as_deref(),
            name: Some(call.name.as_str()),
            args: call.args.as_ref(),
        }
    }
}

impl<'a> Payload<'a> {
    fn from_raw(call: &'a Value) -> Self {
        Self {
            id: call.get("id").and_then(Value::as_str),
            name: call.get("name").and_then(Value::as_str),
            args: call.get("args"),
        }
    }

    fn into_descriptor(self, index: usize) -> Option<CallDescriptor> {
        let Some(name) = self.name else {
            log::warn!("Skipping function call #{index}: payload has no name");
            return None;
        };
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("call_{index}"), str::to_string);
        let args = match self.args {
            Some(Value::Object(args)) => args.clone(),
            _ => Map::new(),
        };
        Some(CallDescriptor::new(id, name, args))
    }
}

pub(crate) fn raw_candidates(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

pub(crate) fn raw_parts(candidate: &Value) -> impl Iterator<Item = &Value> {
    candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .or_else(|| candidate.get("parts"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn call_payload(value: &Value) -> Option<&Value> {
    CALL_KEYS.iter().find_map(|key| value.get(*key))
}

fn raw_function_call(part: &Value) -> Option<&Value> {
    call_payload(part)
        .or_else(|| part.get("part").and_then(call_payload))
        .filter(|call| call.is_object())
}

/// Every function call in `response`, across all candidates, in provider order.
///
/// Pure: the response is only read, and extracting twice yields equal lists.
pub fn extract<S: FunctionCallSource + ?Sized>(response: &S) -> Vec<CallDescriptor> {
    let payloads: Vec<Payload<'_>> = match response.shape() {
        ResponseShape::Typed(response) => response
            .candidates
            .iter()
            .flat_map(|candidate| candidate.content.function_calls())
            .map(Payload::from)
            .collect(),
        ResponseShape::Raw(response) => raw_candidates(response)
            .flat_map(raw_parts)
            .filter_map(raw_function_call)
            .map(Payload::from_raw)
            .collect(),
    };

    payloads
        .into_iter()
        .enumerate()
        .filter_map(|(index, payload)| payload.into_descriptor(index))
        .collect()
}

#[must_use]
pub fn has_function_calls<S: FunctionCallSource + ?Sized>(response: &S) -> bool {
    !extract(response).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn typed(value: Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn typed_response_yields_calls_from_every_candidate() {
        let response = typed(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [
                    { "text": "Let me check." },
                    { "functionCall": { "id": "abc", "name": "lookup", "args": { "q": "rust" } } }
                ] } },
                { "content": { "role": "model", "parts": [
                    { "functionCall": { "name": "add", "args": { "a": 2, "b": 3 } } }
                ] } }
            ]
        }));

        let calls = extract(&response);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "abc");
        assert_eq!(calls[0].name, "lookup");
        assert_eq!(calls[1].id, "call_1");
        assert_eq!(calls[1].args["a"], 2);
        assert!(has_function_calls(&response));
    }

    #[test]
    fn raw_response_accepts_both_key_styles_and_wrapped_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "functionCall": { "name": "first" } },
                { "function_call": { "name": "second", "args": { "x": 1 } } },
                { "part": { "function_call": { "name": "third", "id": "" } } },
                { "part": { "text": "not a call" } }
            ] } }]
        });

        let calls = extract(&response);
        let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert!(calls[0].args.is_empty());
        assert_eq!(calls[1].args["x"], 1);
        assert_eq!(calls[2].id, "call_2");
    }

    #[test]
    fn nameless_payloads_are_skipped_without_shifting_ids() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "functionCall": { "args": { "x": 1 } } },
                { "functionCall": { "name": "kept" } }
            ] } }]
        });

        let calls = extract(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
    }

    #[test]
    fn non_object_args_become_empty() {
        let response = json!({
            "candidates": [{ "parts": [{ "functionCall": { "name": "f", "args": "oops" } }] }]
        });
        let calls = extract(&response);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].args.is_empty());
    }

    #[test]
    fn unknown_shapes_have_no_calls() {
        assert!(extract(&json!(null)).is_empty());
        assert!(extract(&json!({ "candidates": [] })).is_empty());
        assert!(extract(&json!({ "candidates": "nope" })).is_empty());
        assert!(!has_function_calls(&GenerateContentResponse::default()));
    }

    #[test]
    fn extraction_is_repeatable() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "functionCall": { "name": "a" } },
                { "functionCall": { "name": "b" } }
            ] } }]
        });
        let before = response.clone();
        assert_eq!(extract(&response), extract(&response));
        assert_eq!(response, before);
    }
}
