//! Runs call descriptors against a [`Registry`].
//!
//! Every entry point returns exactly one [`ExecutionResult`] per descriptor,
//! in descriptor order. Failures of one call never affect the others.

use std::{any::Any, panic::AssertUnwindSafe};

use anyhow::anyhow;
use futures_util::{
    FutureExt, StreamExt,
    future::{self, BoxFuture},
    stream,
};
use serde_json::json;
use tokio::task::JoinError;

use super::{
    error::{ExecutionResult, FunctionCallError},
    extract::CallDescriptor,
    registry::Registry,
};
use crate::content::FunctionResponse;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Resolves the handler up front and returns an owned future, so calls can
/// be spawned onto other tasks.
fn call(descriptor: &CallDescriptor, registry: &Registry) -> BoxFuture<'static, ExecutionResult> {
    let name = descriptor.name.clone();
    let Some(handler) = registry.get(&name).cloned() else {
        log::warn!("Model requested unknown function `{name}`");
        let result: ExecutionResult = Err(FunctionCallError::UnknownFunction(name));
        return Box::pin(future::ready(result));
    };
    log::debug!("Dispatching `{name}` (call id {})", descriptor.id);
    let args = descriptor.args.clone();

    Box::pin(async move {
        let error = match AssertUnwindSafe(handler.invoke(args)).catch_unwind().await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => error,
            Err(panic) => anyhow!("handler panicked: {}", panic_message(&*panic)),
        };
        log::warn!("Function `{name}` failed: {error:#}");
        Err(FunctionCallError::ExecutionFailed { name, error })
    })
}

fn joined(
    descriptor: &CallDescriptor,
    outcome: Result<ExecutionResult, JoinError>,
) -> ExecutionResult {
    outcome.unwrap_or_else(|join_error| {
        log::warn!("Task running `{}` did not complete: {join_error}", descriptor.name);
        Err(FunctionCallError::ExecutionFailed {
            name: descriptor.name.clone(),
            error: anyhow::Error::new(join_error),
        })
    })
}

/// Runs one call. Never panics and never returns anything but a result value.
pub async fn execute(descriptor: &CallDescriptor, registry: &Registry) -> ExecutionResult {
    call(descriptor, registry).await
}

/// Runs the calls one after another, continuing past failures.
pub async fn execute_all(
    descriptors: &[CallDescriptor],
    registry: &Registry,
) -> Vec<ExecutionResult> {
    let mut results = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        results.push(call(descriptor, registry).await);
    }
    results
}

/// Runs every call on its own tokio task and waits for all of them.
///
/// Results are positional, whatever order the tasks finish in.
pub async fn execute_all_parallel(
    descriptors: &[CallDescriptor],
    registry: &Registry,
) -> Vec<ExecutionResult> {
    let handles: Vec<_> = descriptors
        .iter()
        .map(|descriptor| tokio::spawn(call(descriptor, registry)))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (descriptor, handle) in descriptors.iter().zip(handles) {
        results.push(joined(descriptor, handle.await));
    }
    results
}

/// Like [`execute_all_parallel`] with at most `limit` calls in flight.
/// A `limit` of zero is treated as one.
pub async fn execute_all_bounded(
    descriptors: &[CallDescriptor],
    registry: &Registry,
    limit: usize,
) -> Vec<ExecutionResult> {
    let results: Vec<_> = stream::iter(descriptors)
        .map(|descriptor| tokio::spawn(call(descriptor, registry)))
        .buffered(limit.max(1))
        .collect()
        .await;

    descriptors
        .iter()
        .zip(results)
        .map(|(descriptor, result)| joined(descriptor, result))
        .collect()
}

/// Pairs each descriptor with its result as a function response part.
///
/// Successes become `{"result": value}`, failures `{"error": message}`.
///
/// # Panics
///
/// Panics if `descriptors` and `results` differ in length. Both are expected
/// to come from the same batch.
#[must_use]
pub fn build_responses(
    descriptors: &[CallDescriptor],
    results: Vec<ExecutionResult>,
) -> Vec<FunctionResponse> {
    assert_eq!(
        descriptors.len(),
        results.len(),
        "every call descriptor needs exactly one execution result"
    );
    descriptors
        .iter()
        .zip(results)
        .map(|(descriptor, result)| {
            let response = match result {
                Ok(value) => json!({ "result": value }),
                Err(error) => error.to_response_payload(),
            };
            FunctionResponse::new(descriptor.name.clone(), response)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{
        error::FailureKind,
        registry::{Args, Handler},
    };
    use serde_json::{Map, Value};
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    fn descriptor(id: &str, name: &str, args: Value) -> CallDescriptor {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        CallDescriptor::new(id, name, args)
    }

    fn registry() -> Registry {
        Registry::from_entries([
            (
                "add",
                Handler::sync(|args: &Args| {
                    let a = args.get("a").and_then(Value::as_i64).unwrap_or_default();
                    let b = args.get("b").and_then(Value::as_i64).unwrap_or_default();
                    Ok(a + b)
                }),
            ),
            ("fail", Handler::sync(|_| -> anyhow::Result<()> { anyhow::bail!("Boom!") })),
            ("explode", Handler::sync(|_| -> anyhow::Result<()> { panic!("kaboom") })),
        ])
    }

    #[tokio::test]
    async fn unknown_function_is_a_result_not_an_error() {
        let result = execute(&descriptor("call_0", "missing", json!({})), &registry()).await;
        let error = result.unwrap_err();
        assert_eq!(error.kind(), FailureKind::UnknownFunction);
        assert_eq!(error.to_string(), "Unknown function: missing");
    }

    #[tokio::test]
    async fn handler_panics_are_contained() {
        let error = execute(&descriptor("call_0", "explode", json!({})), &registry())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), FailureKind::ExecutionError);
        assert!(error.to_string().contains("kaboom"));
    }

    #[tokio::test]
    async fn sequential_execution_does_not_short_circuit() {
        let calls = [
            descriptor("1", "fail", json!({})),
            descriptor("2", "add", json!({ "a": 2, "b": 3 })),
            descriptor("3", "missing", json!({})),
        ];
        let results = execute_all(&calls, &registry()).await;
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap_err().to_string(),
            "Function execution failed: Boom!"
        );
        assert_eq!(results[1].as_ref().unwrap(), &json!(5));
        assert_eq!(results[2].as_ref().unwrap_err().kind(), FailureKind::UnknownFunction);
    }

    #[tokio::test]
    async fn parallel_execution_contains_panics_per_call() {
        let calls = [
            descriptor("1", "explode", json!({})),
            descriptor("2", "add", json!({ "a": 1, "b": 1 })),
        ];
        let results = execute_all_parallel(&calls, &registry()).await;
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap(), &json!(2));
    }

    #[tokio::test]
    async fn bounded_execution_respects_the_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let handler = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            Handler::new(move |args: Args| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(args.get("n").cloned())
                }
            })
        };
        let registry = Registry::from_entries([("slow", handler)]);
        let calls: Vec<_> = (0..6)
            .map(|n| descriptor(&format!("call_{n}"), "slow", json!({ "n": n })))
            .collect();

        let results = execute_all_bounded(&calls, &registry, 2).await;
        let values: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, (0..6).map(|n| json!(n)).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_limit_still_makes_progress() {
        let calls = [descriptor("1", "add", json!({ "a": 4, "b": 5 }))];
        let results = execute_all_bounded(&calls, &registry(), 0).await;
        assert_eq!(results[0].as_ref().unwrap(), &json!(9));
    }

    #[test]
    fn responses_wrap_results_and_errors() {
        let calls = [
            descriptor("1", "add", json!({})),
            descriptor("2", "missing", json!({})),
        ];
        let responses = build_responses(
            &calls,
            vec![
                Ok(json!(5)),
                Err(FunctionCallError::UnknownFunction("missing".to_string())),
            ],
        );
        assert_eq!(responses[0].name, "add");
        assert_eq!(responses[0].response, json!({ "result": 5 }));
        assert_eq!(responses[1].response, json!({ "error": "Unknown function: missing" }));
    }

    #[test]
    #[should_panic(expected = "exactly one execution result")]
    fn mismatched_lengths_panic() {
        let calls = [descriptor("1", "add", json!({}))];
        let _ = build_responses(&calls, Vec::new());
    }
}
