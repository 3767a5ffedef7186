use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use futures_util::future::{self, BoxFuture};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    error::ExecutionResult,
    executor,
    extract::CallDescriptor,
};

/// Arguments of a call, as sent by the model.
pub type Args = Map<String, Value>;

/// The future a handler resolves to.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Value>>;

type DirectFn = dyn Fn(Args) -> HandlerFuture + Send + Sync;

/// A target that exposes several operations under string selectors, for
/// handlers bound with [`Handler::indirect`].
pub trait Dispatch: Send + Sync + 'static {
    fn dispatch(&self, selector: &str, args: Vec<Value>) -> BoxFuture<'_, anyhow::Result<Value>>;
}

/// How a registered function is invoked.
#[derive(Clone)]
pub enum Handler {
    /// A callable that receives the call's arguments.
    Direct(Arc<DirectFn>),
    /// An operation on a shared target, invoked with fixed arguments. The
    /// model's arguments are ignored.
    Indirect {
        target: Arc<dyn Dispatch>,
        selector: String,
        fixed_args: Vec<Value>,
    },
}

impl Handler {
    /// Wraps an async function. Its output is serialised to JSON.
    pub fn new<F, Fut, T>(f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Serialize + 'static,
    {
        Self::Direct(Arc::new(move |args: Args| -> HandlerFuture {
            let fut = f(args);
            Box::pin(async move {
                let value = fut.await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(value)?)
            })
        }))
    }

    /// Wraps a blocking function. It runs on the executing task when the call
    /// is polled, so keep it short.
    pub fn sync<F, T>(f: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Serialize + 'static,
    {
        Self::Direct(Arc::new(move |args: Args| -> HandlerFuture {
            let result = f(&args).and_then(|value| Ok(serde_json::to_value(value)?));
            Box::pin(future::ready(result))
        }))
    }

    pub fn indirect<T: Dispatch>(
        target: Arc<T>,
        selector: impl Into<String>,
        fixed_args: Vec<Value>,
    ) -> Self {
        Self::Indirect {
            target,
            selector: selector.into(),
            fixed_args,
        }
    }

    /// Starts the handler. Nothing runs until the returned future is polled.
    #[must_use]
    pub fn invoke(&self, args: Args) -> HandlerFuture {
        match self {
            Self::Direct(f) => {
                let f = Arc::clone(f);
                Box::pin(async move { f(args).await })
            }
            Self::Indirect {
                target,
                selector,
                fixed_args,
            } => {
                let target = Arc::clone(target);
                let selector = selector.clone();
                let fixed_args = fixed_args.clone();
                Box::pin(async move { target.dispatch(&selector, fixed_args).await })
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Handler::Direct"),
            Self::Indirect {
                selector,
                fixed_args,
                ..
            } => f
                .debug_struct("Handler::Indirect")
                .field("selector", selector)
                .field("fixed_args", fixed_args)
                .finish_non_exhaustive(),
        }
    }
}

/// Functions the model may call, keyed by name.
///
/// Cloning is cheap and shares the handlers; [`Registry::register`] on a
/// shared registry copies the map first.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: Arc<HashMap<String, Handler>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names().collect::<Vec<_>>();
        names.sort_unstable();
        f.debug_struct("Registry").field("functions", &names).finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = (impl Into<String>, Handler)>,
    ) -> Self {
        entries.into_iter().collect()
    }

    /// Adds or replaces the handler for `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        Arc::make_mut(&mut self.handlers).insert(name.into(), handler);
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.register(name, handler);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn execute(&self, descriptor: &CallDescriptor) -> ExecutionResult {
        executor::execute(descriptor, self).await
    }

    pub async fn execute_all(&self, descriptors: &[CallDescriptor]) -> Vec<ExecutionResult> {
        executor::execute_all(descriptors, self).await
    }

    pub async fn execute_all_parallel(
        &self,
        descriptors: &[CallDescriptor],
    ) -> Vec<ExecutionResult> {
        executor::execute_all_parallel(descriptors, self).await
    }

    pub async fn execute_all_bounded(
        &self,
        descriptors: &[CallDescriptor],
        limit: usize,
    ) -> Vec<ExecutionResult> {
        executor::execute_all_bounded(descriptors, self, limit).await
    }
}

impl From<HashMap<String, Handler>> for Registry {
    fn from(handlers: HashMap<String, Handler>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Handler)> for Registry {
    fn from_iter<I: IntoIterator<Item = (K, Handler)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, handler)| (name.into(), handler))
            .collect::<HashMap<_, _>>()
            .into()
    }
}
