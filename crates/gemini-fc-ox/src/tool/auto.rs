//! The automatic function-calling loop.
//!
//! Starting from a model response, the loop executes the calls it requests,
//! appends the model turn and the function turn to the conversation, and asks
//! a caller-supplied continuation for the next response. It stops when the
//! model answers without calls, when the call budget is spent, when the loop
//! is disabled, or when the continuation fails.

use std::future::Future;

use bon::Builder;

use super::{
    error::ExecutionResult,
    extract::{CallDescriptor, FunctionCallSource, extract},
    registry::Registry,
    turn::{build_function_response_turn, extract_model_turn},
};
use crate::content::Content;

/// Settings for one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct LoopConfig {
    /// Budget of executed calls. Checked before each batch; a batch that
    /// starts under budget runs in full.
    #[builder(default = 10)]
    pub max_calls: usize,
    /// When `false` the initial response is returned untouched.
    #[builder(default = true)]
    pub enabled: bool,
    /// Skip recording executed calls in [`LoopOutcome::call_history`].
    #[builder(default)]
    pub ignore_call_history: bool,
    /// Run the calls of a batch concurrently.
    #[builder(default)]
    pub parallel_execution: bool,
    /// Cap on concurrent calls when `parallel_execution` is set.
    pub max_concurrency: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// The loop was disabled in its config.
    Disabled,
    /// The last response requested no function calls.
    NoFunctionCalls,
    /// `max_calls` calls have been executed.
    BudgetExhausted,
    /// The continuation returned an error.
    ContinuationFailed,
}

/// What a finished loop hands back.
#[derive(Debug)]
pub struct LoopOutcome<R, E> {
    /// The last response, or the continuation error that ended the loop.
    pub response: Result<R, E>,
    pub call_count: usize,
    pub call_history: Vec<CallDescriptor>,
    /// The conversation including every turn the loop appended.
    pub contents: Vec<Content>,
    pub stop_reason: StopReason,
}

impl<R, E> LoopOutcome<R, E> {
    /// Discards the bookkeeping and keeps the final response.
    ///
    /// # Errors
    ///
    /// Returns the continuation error if the loop ended on one.
    pub fn into_response(self) -> Result<R, E> {
        self.response
    }

    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.stop_reason == StopReason::BudgetExhausted
    }
}

enum Step {
    Stop(StopReason),
    Execute(Vec<CallDescriptor>),
}

fn next_step<S: FunctionCallSource + ?Sized>(
    response: &S,
    config: &LoopConfig,
    call_count: usize,
) -> Step {
    if !config.enabled {
        return Step::Stop(StopReason::Disabled);
    }
    let calls = extract(response);
    if calls.is_empty() {
        Step::Stop(StopReason::NoFunctionCalls)
    } else if call_count >= config.max_calls {
        Step::Stop(StopReason::BudgetExhausted)
    } else {
        Step::Execute(calls)
    }
}

/// Whether the loop would run another iteration for `response`.
#[must_use]
pub fn should_continue<S: FunctionCallSource + ?Sized>(
    response: &S,
    config: &LoopConfig,
    call_count: usize,
) -> bool {
    matches!(next_step(response, config, call_count), Step::Execute(_))
}

/// Drives the function-calling loop against a registry.
///
/// The loop knows nothing about transport: each follow-up response comes
/// from the continuation passed to [`FunctionCallingLoop::run`].
#[derive(Debug, Clone, Builder)]
pub struct FunctionCallingLoop {
    registry: Registry,
    #[builder(default)]
    config: LoopConfig,
}

impl FunctionCallingLoop {
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    async fn execute(&self, descriptors: &[CallDescriptor]) -> Vec<ExecutionResult> {
        match (self.config.parallel_execution, self.config.max_concurrency) {
            (false, _) => self.registry.execute_all(descriptors).await,
            (true, None) => self.registry.execute_all_parallel(descriptors).await,
            (true, Some(limit)) => self.registry.execute_all_bounded(descriptors, limit).await,
        }
    }

    /// Runs the loop from `response`.
    ///
    /// `contents` is the conversation that produced `response`. Each
    /// iteration appends the model turn and then the function turn to it and
    /// calls `continuation` with a copy of the conversation and of `options`.
    /// A continuation error ends the loop and is returned in
    /// [`LoopOutcome::response`].
    pub async fn run<R, O, E, F, Fut>(
        &self,
        response: R,
        mut contents: Vec<Content>,
        options: O,
        mut continuation: F,
    ) -> LoopOutcome<R, E>
    where
        R: FunctionCallSource,
        O: Clone,
        F: FnMut(Vec<Content>, O) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let mut response = response;
        let mut call_count = 0;
        let mut call_history = Vec::new();

        loop {
            let descriptors = match next_step(&response, &self.config, call_count) {
                Step::Execute(descriptors) => descriptors,
                Step::Stop(stop_reason) => {
                    log::debug!("Function calling stopped ({stop_reason}) after {call_count} call(s)");
                    return LoopOutcome {
                        response: Ok(response),
                        call_count,
                        call_history,
                        contents,
                        stop_reason,
                    };
                }
            };

            log::debug!(
                "Executing {} function call(s), {call_count} of {} already used",
                descriptors.len(),
                self.config.max_calls
            );
            let results = self.execute(&descriptors).await;

            contents.push(extract_model_turn(&response));
            contents.push(build_function_response_turn(&descriptors, results));
            call_count += descriptors.len();
            if !self.config.ignore_call_history {
                call_history.extend(descriptors);
            }

            match continuation(contents.clone(), options.clone()).await {
                Ok(next) => response = next,
                Err(error) => {
                    log::warn!("Continuation failed after {call_count} call(s); stopping");
                    return LoopOutcome {
                        response: Err(error),
                        call_count,
                        call_history,
                        contents,
                        stop_reason: StopReason::ContinuationFailed,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn with_call() -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "functionCall": { "name": "f" } }] } }] })
    }

    #[test]
    fn defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.max_calls, 10);
        assert!(config.enabled);
        assert!(!config.ignore_call_history);
        assert!(!config.parallel_execution);
        assert_eq!(config.max_concurrency, None);
    }

    #[test]
    fn should_continue_requires_calls_budget_and_enabled() {
        let config = LoopConfig::default();
        assert!(should_continue(&with_call(), &config, 0));
        assert!(should_continue(&with_call(), &config, 9));
        assert!(!should_continue(&with_call(), &config, 10));
        assert!(!should_continue(&json!({ "candidates": [] }), &config, 0));

        let disabled = LoopConfig::builder().enabled(false).build();
        assert!(!should_continue(&with_call(), &disabled, 0));

        let zero = LoopConfig::builder().max_calls(0).build();
        assert!(!should_continue(&with_call(), &zero, 0));
    }

    #[tokio::test]
    async fn zero_budget_executes_nothing() {
        let driver = FunctionCallingLoop::builder()
            .registry(Registry::new())
            .config(LoopConfig::builder().max_calls(0).build())
            .build();

        let outcome = driver
            .run(with_call(), Vec::new(), (), |_, ()| async {
                Err::<Value, _>("continuation must not run")
            })
            .await;

        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
        assert!(outcome.budget_exhausted());
        assert_eq!(outcome.call_count, 0);
        assert!(outcome.contents.is_empty());
        assert!(outcome.response.is_ok());
    }

    #[test]
    fn stop_reasons_render_snake_case() {
        assert_eq!(StopReason::BudgetExhausted.to_string(), "budget_exhausted");
        assert_eq!(StopReason::NoFunctionCalls.to_string(), "no_function_calls");
    }
}
