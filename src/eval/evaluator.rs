use std::sync::Arc;

use async_recursion::async_recursion;
use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::alias::alias_definitions;
use super::context::EvaluationContext;
use super::fragment::{evaluate_fragment, FragmentInfo};
use super::output::{coerce, OutputType};
use crate::cache::EvaluatorCache;
use crate::config::{EvaluatorOptions, OptionsUpdate};
use crate::error::{EvalError, EvalResult};
use crate::node::{
    is_alias_key, NodeKind, CHILDREN_KEY, FALLBACK_KEY, OPERATOR_KEY, OUTPUT_TYPE_KEY,
    USE_CACHE_KEY,
};
use crate::operator::{
    Evaluation, FunctionInfo, OperatorDescriptor, OperatorInput, OperatorRegistry,
};
use crate::type_checker::preview;

/// The expression engine: holds the current options snapshot, the operator
/// registry and the result cache shared by all evaluations.
pub struct Evaluator {
    options: RwLock<Arc<EvaluatorOptions>>,
    registry: Arc<OperatorRegistry>,
    cache: Arc<EvaluatorCache>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorOptions::default())
    }
}

impl Evaluator {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self::with_registry(options, OperatorRegistry::builtin())
    }

    pub fn with_registry(options: EvaluatorOptions, registry: Arc<OperatorRegistry>) -> Self {
        let cache = Arc::new(EvaluatorCache::new(options.cache_config()));
        Self {
            options: RwLock::new(Arc::new(options)),
            registry,
            cache,
        }
    }

    /// Evaluate `node` against the current options, with `overrides`
    /// applied for this call only.
    ///
    /// With `returnErrorAsString` set, a failure resolves to its message.
    #[tracing::instrument(skip(self, node, overrides))]
    pub async fn evaluate(&self, node: &Value, overrides: Option<OptionsUpdate>) -> EvalResult<Value> {
        let current = self.options().await;
        let options = match overrides {
            Some(update) => Arc::new(current.merged(update)),
            None => current,
        };
        let context = EvaluationContext::new(
            Arc::clone(&options),
            Arc::clone(&self.registry),
            Arc::clone(&self.cache),
        );

        match eval_node(node, &context).await {
            Err(error) if options.return_error_as_string => {
                debug!("Returning error as string: {}", error);
                Ok(Value::String(error.to_string()))
            }
            result => result,
        }
    }

    pub async fn options(&self) -> Arc<EvaluatorOptions> {
        Arc::clone(&*self.options.read().await)
    }

    /// Replace the options snapshot with `update` merged in. Evaluations
    /// already running keep the snapshot they started with.
    pub async fn update_options(&self, update: OptionsUpdate) {
        let mut options = self.options.write().await;
        if update.functions.is_some() {
            // Cached results may come from a function that is being replaced.
            self.cache.clear();
        }
        let resize = update.touches_cache();
        let next = options.merged(update);
        if resize {
            self.cache.configure(next.cache_config());
        }
        *options = Arc::new(next);
    }

    pub fn get_operators(&self) -> &[OperatorDescriptor] {
        self.registry.list_operators()
    }

    pub async fn get_fragments(&self) -> Vec<FragmentInfo> {
        let options = self.options().await;
        options
            .fragments
            .iter()
            .map(|(name, definition)| definition.info(name))
            .collect()
    }

    pub async fn get_custom_functions(&self) -> Vec<FunctionInfo> {
        let options = self.options().await;
        let mut functions: Vec<FunctionInfo> = options
            .functions
            .iter()
            .map(|(name, function)| function.info(name))
            .collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        functions
    }

    pub fn cache(&self) -> &EvaluatorCache {
        &self.cache
    }
}

/// Evaluate one node of any kind.
#[async_recursion]
pub(crate) async fn eval_node(node: &Value, context: &EvaluationContext) -> EvalResult<Value> {
    match context.classify(node) {
        NodeKind::Literal => Ok(node.clone()),
        NodeKind::AliasReference(name) => match context.lookup_alias(name) {
            Some(binding) => binding.resolve().await,
            None => Ok(node.clone()),
        },
        NodeKind::Array(items) => {
            let results = join_all(items.iter().map(|item| eval_node(item, context))).await;
            results.into_iter().collect::<EvalResult<Vec<_>>>().map(Value::Array)
        }
        NodeKind::Object(map) if context.options.evaluate_full_object => {
            evaluate_object(map, context).await
        }
        NodeKind::Object(_) => Ok(node.clone()),
        NodeKind::Shorthand(expanded) => eval_node(&expanded, context).await,
        NodeKind::Fragment(map) => evaluate_fragment(map, context).await,
        NodeKind::Operator(map) => evaluate_operator(map, context).await,
    }
}

/// Substitute `fallback` for a failed result, logging the failure.
pub(crate) async fn recover(
    result: EvalResult<Value>,
    fallback: Option<&Value>,
    context: &EvaluationContext,
) -> EvalResult<Value> {
    match (result, fallback) {
        (Err(error), Some(fallback)) => {
            warn!("Using fallback after error: {}", error);
            eval_node(fallback, context).await
        }
        (result, _) => result,
    }
}

/// Bind the object's aliases, then evaluate each remaining value.
async fn evaluate_object(map: &Map<String, Value>, context: &EvaluationContext) -> EvalResult<Value> {
    let context = context.with_aliases(alias_definitions(map), context);
    let entries: Vec<(&String, &Value)> = map.iter().filter(|(key, _)| !is_alias_key(key)).collect();
    let values = join_all(entries.iter().map(|(_, value)| eval_node(value, &context))).await;
    entries
        .into_iter()
        .zip(values)
        .map(|((key, _), value)| value.map(|v| (key.clone(), v)))
        .collect::<EvalResult<Map<String, Value>>>()
        .map(Value::Object)
}

async fn evaluate_entries(value: &Value, context: &EvaluationContext) -> EvalResult<Value> {
    match context.classify(value) {
        NodeKind::Object(map) => evaluate_object(map, context).await,
        _ => eval_node(value, context).await,
    }
}

/// An operator node after name resolution and property normalization,
/// before any property is evaluated.
struct PreparedNode<'a> {
    descriptor: &'a OperatorDescriptor,
    properties: Map<String, Value>,
    fallback: Option<Value>,
    output_type: Option<OutputType>,
    use_cache: Option<bool>,
}

async fn evaluate_operator(map: &Map<String, Value>, context: &EvaluationContext) -> EvalResult<Value> {
    let context = context.with_aliases(alias_definitions(map), context);
    match prepare(map, &context).await {
        Ok(mut prepared) => {
            let fallback = prepared.fallback.take();
            let result = run(prepared, &context).await;
            recover(result, fallback.as_ref(), &context).await
        }
        Err(error) => recover(Err(error), map.get(FALLBACK_KEY), &context).await,
    }
}

async fn prepare<'c>(
    map: &Map<String, Value>,
    context: &'c EvaluationContext,
) -> EvalResult<PreparedNode<'c>> {
    let name = match map.get(OPERATOR_KEY) {
        Some(Value::String(name)) if !is_alias_key(name) => name.clone(),
        Some(node) => match eval_node(node, context).await? {
            Value::String(name) => name,
            other => {
                return Err(EvalError::invalid_node(format!(
                    "operator must be a string, got {}",
                    preview(&other)
                )))
            }
        },
        None => return Err(EvalError::invalid_node("missing operator")),
    };
    let descriptor = context
        .registry
        .resolve(&name)
        .ok_or_else(|| EvalError::UnknownOperator(name.clone()))?;

    let mut properties: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| key.as_str() != OPERATOR_KEY && !is_alias_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if let Some(children) = properties.remove(CHILDREN_KEY) {
        let children = match children {
            Value::Array(items) => items,
            node => match eval_node(&node, context).await? {
                Value::Array(items) => items,
                other => {
                    return Err(EvalError::invalid_node(format!(
                        "children must be an array, got {}",
                        preview(&other)
                    )))
                }
            },
        };
        descriptor.kind.children_to_properties(children, &mut properties);
    }

    let fallback = properties.remove(FALLBACK_KEY);
    let output_type = OutputType::from_node(properties.remove(OUTPUT_TYPE_KEY).as_ref());
    let use_cache = properties.remove(USE_CACHE_KEY).and_then(|v| v.as_bool());

    Ok(PreparedNode {
        descriptor,
        properties: descriptor.normalize_properties(properties),
        fallback,
        output_type,
        use_cache,
    })
}

async fn run(prepared: PreparedNode<'_>, context: &EvaluationContext) -> EvalResult<Value> {
    let PreparedNode {
        descriptor,
        properties,
        output_type,
        use_cache,
        ..
    } = prepared;

    let missing = descriptor.missing_properties(&properties);
    if !missing.is_empty() {
        return Err(EvalError::MissingRequiredProperty {
            operator: descriptor.name.clone(),
            properties: missing,
        });
    }

    let mut properties = evaluate_properties(descriptor, properties, context).await?;
    descriptor.apply_defaults(&mut properties);
    context
        .type_checker
        .check_operator(&descriptor.name, &descriptor.type_check_items(&properties))?;

    let cache_key = should_cache(descriptor, use_cache, context).then(|| {
        let mut keyed = properties.clone();
        if let Some(output_type) = output_type {
            keyed.insert(OUTPUT_TYPE_KEY.to_string(), Value::String(output_type.to_string()));
        }
        context.fingerprint(&descriptor.name, &keyed)
    });
    if let Some(key) = &cache_key {
        if let Some(hit) = context.cache.get(key) {
            debug!("Cache hit for {}", descriptor.name);
            return coerce(hit, output_type);
        }
    }

    debug!("Evaluating {}", descriptor.name);
    let result = descriptor
        .kind
        .evaluate(OperatorInput {
            descriptor,
            properties,
            context,
            output_type,
        })
        .await?;

    if let Some(key) = cache_key {
        context.cache.set(key, result.clone());
    }
    coerce(result, output_type)
}

/// Evaluate all properties concurrently. Every evaluation settles before
/// the first error, in property order, is reported.
async fn evaluate_properties(
    descriptor: &OperatorDescriptor,
    properties: Map<String, Value>,
    context: &EvaluationContext,
) -> EvalResult<Map<String, Value>> {
    let results = join_all(properties.iter().map(|(key, value)| async move {
        match descriptor.evaluation_of(key) {
            Evaluation::Eager => eval_node(value, context).await,
            Evaluation::Entries => evaluate_entries(value, context).await,
            Evaluation::Lazy => Ok(value.clone()),
        }
    }))
    .await;

    properties
        .keys()
        .cloned()
        .zip(results)
        .map(|(key, result)| result.map(|value| (key, value)))
        .collect()
}

/// A node's own `useCache` decides; otherwise the global flag applies to
/// cacheable operators. Operators that evaluate branches lazily never cache.
fn should_cache(descriptor: &OperatorDescriptor, node_flag: Option<bool>, context: &EvaluationContext) -> bool {
    if descriptor.has_lazy_parameters() {
        return false;
    }
    node_flag.unwrap_or(context.options.use_cache && descriptor.cacheable)
}
