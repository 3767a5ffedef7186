//! Builds the two turns appended to the conversation per loop iteration: the
//! model's turn echoed back verbatim and the function turn answering it.

use serde_json::{Map, Value};

use super::{
    error::ExecutionResult,
    executor::build_responses,
    extract::{CallDescriptor, FunctionCallSource, ResponseShape, raw_candidates, raw_parts},
};
use crate::content::{Content, Part, Role};

/// Part payloads whose own fields follow the wire casing. Function call
/// arguments and responses are user data and keep their keys.
const CAMEL_CASED_PAYLOADS: [&str; 2] = ["inlineData", "fileData"];

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn camel_case_keys(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .map(|(key, value)| (camel_case(key), value.clone()))
        .collect()
}

fn decode_raw_part(part: &Value) -> Option<Part> {
    let part = part.get("part").filter(|inner| inner.is_object()).unwrap_or(part);
    let Some(object) = part.as_object() else {
        log::warn!("Skipping non-object part in model turn");
        return None;
    };

    let normalized: Map<String, Value> = camel_case_keys(object)
        .into_iter()
        .map(|(key, value)| match value {
            Value::Object(inner) if CAMEL_CASED_PAYLOADS.contains(&key.as_str()) => {
                let inner = camel_case_keys(&inner);
                (key, Value::Object(inner))
            }
            other => (key, other),
        })
        .collect();

    serde_json::from_value(Value::Object(normalized))
        .inspect_err(|e| log::warn!("Skipping undecodable part in model turn: {e}"))
        .ok()
}

/// The model's turn, carrying every part of every candidate in order.
///
/// Raw responses are normalised to the wire casing. Payloads without a
/// typed counterpart are carried as [`PartData::Other`](crate::content::PartData::Other);
/// only parts that are not objects are dropped. An empty or unrecognised
/// response gives a turn with no parts.
pub fn extract_model_turn<S: FunctionCallSource + ?Sized>(response: &S) -> Content {
    match response.shape() {
        ResponseShape::Typed(response) => Content::new(
            Role::Model,
            response
                .candidates
                .iter()
                .flat_map(|candidate| candidate.content.parts.iter().cloned()),
        ),
        ResponseShape::Raw(response) => Content::new(
            Role::Model,
            raw_candidates(response)
                .flat_map(raw_parts)
                .filter_map(decode_raw_part),
        ),
    }
}

/// The function turn answering `descriptors`, one response part per call.
///
/// # Panics
///
/// Panics if `descriptors` and `results` differ in length.
#[must_use]
pub fn build_function_response_turn(
    descriptors: &[CallDescriptor],
    results: Vec<ExecutionResult>,
) -> Content {
    Content::new(Role::Function, build_responses(descriptors, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{content::PartData, generate_content::response::GenerateContentResponse};
    use serde_json::json;

    #[test]
    fn converts_snake_case_keys() {
        assert_eq!(camel_case("function_call"), "functionCall");
        assert_eq!(camel_case("mime_type"), "mimeType");
        assert_eq!(camel_case("thought_signature"), "thoughtSignature");
        assert_eq!(camel_case("text"), "text");
        assert_eq!(camel_case("_private"), "private");
    }

    #[test]
    fn typed_turn_keeps_all_parts_in_order() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [
                    { "text": "Checking" },
                    { "functionCall": { "name": "add", "args": { "a": 1 } }, "thoughtSignature": "sig" }
                ] } },
                { "content": { "role": "model", "parts": [{ "text": "again" }] } }
            ]
        }))
        .unwrap();

        let turn = extract_model_turn(&response);
        assert_eq!(turn.role, Role::Model);
        assert_eq!(turn.parts.len(), 3);
        assert_eq!(turn.parts[1].thought_signature.as_deref(), Some("sig"));
        assert_eq!(turn.parts[2].as_text().map(|t| t.as_str()), Some("again"));
    }

    #[test]
    fn raw_turn_normalises_wire_keys_only() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "function_call": { "name": "lookup", "args": { "user_id": 7 } } },
                { "part": { "inline_data": { "mime_type": "image/png", "data": "AAAA" } } },
                { "text": "done" }
            ] } }]
        });

        let turn = extract_model_turn(&response);
        assert_eq!(turn.parts.len(), 3);

        let call = turn.parts[0].as_function_call().unwrap();
        assert_eq!(call.args, Some(json!({ "user_id": 7 })));

        let blob = turn.parts[1].as_inline_data().unwrap();
        assert_eq!(blob.mime_type, "image/png");

        let wire = serde_json::to_value(&turn).unwrap();
        assert_eq!(wire["parts"][0]["functionCall"]["name"], "lookup");
        assert_eq!(wire["parts"][1]["inlineData"]["mimeType"], "image/png");
    }

    #[test]
    fn non_object_parts_are_skipped_and_unknown_ones_kept() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                "just a string",
                { "unknown_payload": { "some_field": 1 } },
                { "text": "kept" }
            ] } }]
        });
        let turn = extract_model_turn(&response);
        assert_eq!(turn.parts.len(), 2);
        assert_eq!(
            turn.parts[0].data,
            PartData::Other(json!({ "unknownPayload": { "some_field": 1 } }))
        );
        assert!(matches!(turn.parts[1].data, PartData::Text(_)));
    }

    #[test]
    fn code_execution_parts_survive_both_shapes() {
        let typed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "role": "model", "parts": [
                { "executableCode": { "language": "PYTHON", "code": "print(1 + 2)" } },
                { "codeExecutionResult": { "outcome": "OUTCOME_OK", "output": "3" } },
                { "functionCall": { "name": "add", "args": { "a": 1, "b": 2 } } }
            ] } }]
        }))
        .unwrap();
        let raw = json!({
            "candidates": [{ "content": { "parts": [
                { "executable_code": { "language": "PYTHON", "code": "print(1 + 2)" } },
                { "code_execution_result": { "outcome": "OUTCOME_OK", "output": "3" } },
                { "function_call": { "name": "add", "args": { "a": 1, "b": 2 } } }
            ] } }]
        });

        let typed_turn = extract_model_turn(&typed);
        let raw_turn = extract_model_turn(&raw);
        assert_eq!(typed_turn.parts.len(), 3);
        assert_eq!(typed_turn, raw_turn);
        assert!(matches!(typed_turn.parts[0].data, PartData::ExecutableCode(_)));
        assert!(matches!(typed_turn.parts[1].data, PartData::CodeExecutionResult(_)));
        assert_eq!(crate::tool::extract(&typed).len(), 1);
        assert_eq!(crate::tool::extract(&raw).len(), 1);
    }

    #[test]
    fn empty_responses_give_empty_turns() {
        assert!(extract_model_turn(&json!({})).is_empty());
        assert!(extract_model_turn(&GenerateContentResponse::default()).is_empty());
    }

    #[test]
    fn function_turn_answers_each_call() {
        let calls = [
            CallDescriptor::new("call_0", "add", Map::new()),
            CallDescriptor::new("call_1", "missing", Map::new()),
        ];
        let turn = build_function_response_turn(
            &calls,
            vec![
                Ok(json!(5)),
                Err(crate::tool::FunctionCallError::UnknownFunction("missing".to_string())),
            ],
        );

        assert_eq!(turn.role, Role::Function);
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({
                "parts": [
                    { "functionResponse": { "name": "add", "response": { "result": 5 } } },
                    { "functionResponse": { "name": "missing", "response": { "error": "Unknown function: missing" } } }
                ],
                "role": "function"
            })
        );
    }
}
