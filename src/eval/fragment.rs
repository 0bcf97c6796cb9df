use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::alias::alias_definitions;
use super::context::EvaluationContext;
use super::evaluator::{eval_node, recover};
use super::output::{coerce, OutputType};
use crate::error::{EvalError, EvalResult};
use crate::node::{is_alias_key, FALLBACK_KEY, FRAGMENT_KEY, OUTPUT_TYPE_KEY, PARAMETERS_KEY};
use crate::type_checker::preview;

const METADATA_KEY: &str = "metadata";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FragmentParameter {
    /// `$name`, whether or not the declaration carries the `$`.
    pub fn key(&self) -> String {
        alias_key(&self.name)
    }

    fn keys(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.key()).chain(self.aliases.iter().map(|a| alias_key(a)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<FragmentParameter>,
}

/// A registered template. Written as the template node itself, with an
/// optional `metadata` member describing its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct FragmentDefinition {
    pub template: Value,
    pub metadata: FragmentMetadata,
}

impl From<Value> for FragmentDefinition {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let metadata = map
                    .remove(METADATA_KEY)
                    .and_then(|m| serde_json::from_value(m).ok())
                    .unwrap_or_default();
                Self {
                    template: Value::Object(map),
                    metadata,
                }
            }
            template => Self {
                template,
                metadata: FragmentMetadata::default(),
            },
        }
    }
}

impl From<FragmentDefinition> for Value {
    fn from(definition: FragmentDefinition) -> Self {
        match definition.template {
            Value::Object(mut map) if definition.metadata != FragmentMetadata::default() => {
                if let Ok(metadata) = serde_json::to_value(&definition.metadata) {
                    map.insert(METADATA_KEY.to_string(), metadata);
                }
                Value::Object(map)
            }
            template => template,
        }
    }
}

/// Introspection view of a registered fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentInfo {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<FragmentParameter>,
}

impl FragmentDefinition {
    pub fn info(&self, name: &str) -> FragmentInfo {
        FragmentInfo {
            name: name.to_string(),
            description: self.metadata.description.clone(),
            parameters: self.metadata.parameters.clone(),
        }
    }
}

fn alias_key(name: &str) -> String {
    format!("${}", name.trim_start_matches('$'))
}

/// Evaluate a fragment node: bind the call-site parameters, then evaluate
/// the template as if it were written in place of the node.
pub(crate) async fn evaluate_fragment(
    map: &Map<String, Value>,
    context: &EvaluationContext,
) -> EvalResult<Value> {
    let context = context.with_aliases(alias_definitions(map), context);
    let result = expand(map, &context).await;
    recover(result, map.get(FALLBACK_KEY), &context).await
}

async fn expand(map: &Map<String, Value>, context: &EvaluationContext) -> EvalResult<Value> {
    let name = match map.get(FRAGMENT_KEY) {
        Some(Value::String(name)) if !is_alias_key(name) => name.clone(),
        Some(node) => match eval_node(node, context).await? {
            Value::String(name) => name,
            other => {
                return Err(EvalError::invalid_node(format!(
                    "fragment name must be a string, got {}",
                    preview(&other)
                )))
            }
        },
        None => return Err(EvalError::invalid_node("missing fragment name")),
    };
    let definition = context
        .options
        .fragments
        .get(&name)
        .ok_or_else(|| EvalError::UnknownFragment(name.clone()))?;
    let body_context = context.with_fragment(&name)?;

    let mut supplied: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| is_alias_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if let Some(Value::Object(parameters)) = map.get(PARAMETERS_KEY) {
        for (key, value) in parameters {
            supplied.insert(alias_key(key), value.clone());
        }
    }
    let inline: BTreeSet<&String> = map.keys().filter(|key| is_alias_key(key)).collect();

    let mut missing = Vec::new();
    let mut bindings = Vec::new();
    for parameter in &definition.metadata.parameters {
        let key = parameter.key();
        if supplied.contains_key(&key) {
            continue;
        }
        match parameter.keys().find_map(|k| supplied.get(&k)) {
            Some(value) => bindings.push((key, value.clone())),
            None => match &parameter.default {
                Some(default) => bindings.push((key, default.clone())),
                None if parameter.required => missing.push(key),
                None => {}
            },
        }
    }
    if !missing.is_empty() {
        return Err(EvalError::MissingFragmentParameter {
            fragment: name,
            parameters: missing,
        });
    }
    // Inline `$` parameters are already bound in `context`.
    for (key, value) in supplied {
        if !inline.contains(&key) {
            bindings.push((key, value));
        }
    }

    debug!("Expanding fragment {}", name);
    let body_context = body_context.with_aliases(bindings, context);
    let output_type = OutputType::from_node(map.get(OUTPUT_TYPE_KEY));
    let result = eval_node(&definition.template, &body_context).await?;
    coerce(result, output_type)
}
