use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::descriptor::OperatorInput;
use crate::error::EvalResult;
use crate::provider::capability::next_id;

pub type FunctionFuture = BoxFuture<'static, Result<Value, String>>;

type Callable = Arc<dyn Fn(Vec<Value>) -> FunctionFuture + Send + Sync>;

/// A caller-registered callable reachable through `CUSTOM_FUNCTIONS`.
///
/// Called with positional arguments. A function may declare default
/// arguments, or a default single input, used when the node supplies none.
#[derive(Clone)]
pub struct CustomFunction {
    id: u64,
    callable: Callable,
    pub description: Option<String>,
    pub args_default: Option<Vec<Value>>,
    pub input_default: Option<Value>,
}

impl CustomFunction {
    pub fn new<F, Fut>(function: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        Self {
            id: next_id(),
            callable: Arc::new(move |args: Vec<Value>| -> FunctionFuture { Box::pin(function(args)) }),
            description: None,
            args_default: None,
            input_default: None,
        }
    }

    pub fn from_sync<F>(function: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::new(move |args| futures::future::ready(function(args)))
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_args_default(mut self, args: Vec<Value>) -> Self {
        self.args_default = Some(args);
        self
    }

    pub fn with_input_default(mut self, input: Value) -> Self {
        self.input_default = Some(input);
        self
    }

    /// Unique per registered callable; clones keep it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn call(&self, args: Vec<Value>) -> Result<Value, String> {
        (self.callable)(args).await
    }

    pub fn info(&self, name: &str) -> FunctionInfo {
        FunctionInfo {
            name: name.to_string(),
            description: self.description.clone(),
            args_default: self.args_default.clone(),
            input_default: self.input_default.clone(),
        }
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("description", &self.description)
            .field("args_default", &self.args_default)
            .field("input_default", &self.input_default)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub name: String,
    pub description: Option<String>,
    pub args_default: Option<Vec<Value>>,
    pub input_default: Option<Value>,
}

pub(super) async fn custom_functions(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let name = input.require_str("functionName")?;
    let function = input
        .options()
        .functions
        .get(name)
        .ok_or_else(|| input.runtime_error(format!("No custom function named \"{}\"", name)))?;

    let args = if let Some(single) = input.get("input") {
        vec![single.clone()]
    } else if let Some(args) = input.get("args") {
        match args {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        }
    } else if let Some(single) = &function.input_default {
        vec![single.clone()]
    } else {
        function.args_default.clone().unwrap_or_default()
    };

    debug!("Calling custom function {} with {} args", name, args.len());
    function
        .call(args)
        .await
        .map_err(|message| input.runtime_error(format!("Function \"{}\" failed: {}", name, message)))
}
