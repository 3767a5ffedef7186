use serde::{Deserialize, Serialize};

/// Tool use settings sent with a request.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_calling_config: Option<FunctionCallingConfig>,
}

impl ToolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the calling mode, creating the function calling config if needed.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.function_calling_config = Some(
            self.function_calling_config
                .unwrap_or_default()
                .mode(mode),
        );
        self
    }

    /// Restricts the model to the named functions. Only honoured with [`Mode::Any`].
    #[must_use]
    pub fn allowed_function_names(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.function_calling_config = Some(
            self.function_calling_config
                .unwrap_or_default()
                .allowed_function_names(names),
        );
        self
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    /// Left unset, the API behaves as [`Mode::Auto`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_function_names: Option<Vec<String>>,
}

impl FunctionCallingConfig {
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn allowed_function_names(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_function_names = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    ModeUnspecified,
    /// The model chooses between a function call and a plain answer.
    #[default]
    Auto,
    /// The model must call a function.
    Any,
    /// Function calling is disabled for the request.
    None,
}
