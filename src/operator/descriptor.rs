use serde::Serialize;
use serde_json::{Map, Value};

use super::OperatorKind;
use crate::config::EvaluatorOptions;
use crate::error::{EvalError, EvalResult, MissingProperty};
use crate::eval::context::EvaluationContext;
use crate::eval::evaluator::eval_node;
use crate::eval::output::OutputType;
use crate::provider::ProviderError;
use crate::type_checker::{ExpectedType, TypeCheckItem};

/// How a property value is evaluated before the operator sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    /// Evaluated as a node.
    #[default]
    Eager,
    /// Plain objects have each value evaluated; anything else is evaluated
    /// as a node.
    Entries,
    /// Passed through unevaluated; the operator evaluates what it needs.
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
    pub accepted_types: Vec<ExpectedType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub evaluation: Evaluation,
}

impl ParamSpec {
    pub fn required(name: &'static str, accepted_types: Vec<ExpectedType>) -> Self {
        Self {
            name,
            description: "",
            aliases: &[],
            required: true,
            accepted_types,
            default: None,
            evaluation: Evaluation::Eager,
        }
    }

    pub fn optional(name: &'static str, accepted_types: Vec<ExpectedType>) -> Self {
        Self {
            required: false,
            ..Self::required(name, accepted_types)
        }
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn lazy(self) -> Self {
        self.evaluation(Evaluation::Lazy)
    }

    pub fn entries(self) -> Self {
        self.evaluation(Evaluation::Entries)
    }

    fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

/// Immutable description of one operator: names, parameters and policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorDescriptor {
    #[serde(skip)]
    pub kind: OperatorKind,
    pub name: String,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub parameters: Vec<ParamSpec>,
    /// Groups of properties of which at least one must be fully present.
    #[serde(skip)]
    pub alternatives: Vec<Vec<&'static str>>,
    /// Results go through the cache unless the node opts out.
    pub cacheable: bool,
    /// Evaluation of properties that match no parameter.
    #[serde(skip)]
    pub extra_properties: Evaluation,
}

impl OperatorDescriptor {
    pub fn new(
        kind: OperatorKind,
        description: &'static str,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            kind,
            name: kind.to_string(),
            description,
            aliases,
            parameters: Vec::new(),
            alternatives: Vec::new(),
            cacheable: false,
            extra_properties: Evaluation::Eager,
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn alternatives(mut self, groups: Vec<Vec<&'static str>>) -> Self {
        self.alternatives = groups;
        self
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    pub fn lazy_extras(mut self) -> Self {
        self.extra_properties = Evaluation::Lazy;
        self
    }

    /// The parameter `key` names, either canonically or by alias.
    pub fn canonical_property(&self, key: &str) -> Option<&ParamSpec> {
        self.parameters
            .iter()
            .find(|p| p.name == key)
            .or_else(|| self.parameters.iter().find(|p| p.answers_to(key)))
    }

    pub fn evaluation_of(&self, key: &str) -> Evaluation {
        self.parameters
            .iter()
            .find(|p| p.name == key)
            .map_or(self.extra_properties, |p| p.evaluation)
    }

    /// True when some parameter is never evaluated up front. Such operators
    /// decide at run time what to evaluate, so their results are not cached.
    pub fn has_lazy_parameters(&self) -> bool {
        self.extra_properties == Evaluation::Lazy
            || self
                .parameters
                .iter()
                .any(|p| p.evaluation == Evaluation::Lazy)
    }

    /// Rename alias property keys to their canonical names. A canonical key
    /// already present wins over any alias for it; unknown keys are kept.
    pub fn normalize_properties(&self, properties: Map<String, Value>) -> Map<String, Value> {
        let mut normalized = Map::new();
        let mut aliased = Vec::new();
        for (key, value) in properties {
            match self.canonical_property(&key) {
                Some(spec) if spec.name != key => aliased.push((spec.name, value)),
                _ => {
                    normalized.insert(key, value);
                }
            }
        }
        for (name, value) in aliased {
            normalized.entry(name).or_insert(value);
        }
        normalized
    }

    pub fn missing_properties(&self, properties: &Map<String, Value>) -> Vec<MissingProperty> {
        let mut missing: Vec<MissingProperty> = self
            .parameters
            .iter()
            .filter(|p| p.required && p.default.is_none() && !properties.contains_key(p.name))
            .map(|p| self.missing(p.name))
            .collect();

        if !self.alternatives.is_empty() {
            let unmet: Vec<Vec<&'static str>> = self
                .alternatives
                .iter()
                .map(|group| {
                    group
                        .iter()
                        .copied()
                        .filter(|name| !properties.contains_key(*name))
                        .collect()
                })
                .collect();
            if unmet.iter().all(|group| !group.is_empty()) {
                // Fewest missing first, then the group the node started to fill.
                let closest = unmet
                    .iter()
                    .zip(&self.alternatives)
                    .min_by_key(|(unmet, group)| (unmet.len(), std::cmp::Reverse(group.len())));
                if let Some((closest, _)) = closest {
                    missing.extend(closest.iter().map(|name| self.missing(name)));
                }
            }
        }
        missing
    }

    pub fn apply_defaults(&self, properties: &mut Map<String, Value>) {
        for spec in &self.parameters {
            if let Some(default) = &spec.default {
                if !properties.contains_key(spec.name) {
                    properties.insert(spec.name.to_string(), default.clone());
                }
            }
        }
    }

    /// Items for the type checker. Absent optional parameters and lazy
    /// parameters are not checked.
    pub fn type_check_items<'a>(&'a self, properties: &'a Map<String, Value>) -> Vec<TypeCheckItem<'a>> {
        self.parameters
            .iter()
            .filter(|p| p.evaluation != Evaluation::Lazy)
            .filter(|p| p.required || properties.contains_key(p.name))
            .map(|p| TypeCheckItem::new(p.name, properties.get(p.name), &p.accepted_types))
            .collect()
    }

    fn missing(&self, name: &str) -> MissingProperty {
        let expected = self
            .parameters
            .iter()
            .find(|p| p.name == name)
            .map_or_else(|| "any".to_string(), |p| ExpectedType::describe(&p.accepted_types));
        MissingProperty::new(name, expected)
    }
}

/// Everything an operator implementation sees: its resolved properties and
/// the context to evaluate lazy ones in.
pub struct OperatorInput<'a> {
    pub descriptor: &'a OperatorDescriptor,
    pub properties: Map<String, Value>,
    pub context: &'a EvaluationContext,
    pub output_type: Option<OutputType>,
}

impl<'a> OperatorInput<'a> {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    pub fn require(&self, name: &str) -> EvalResult<&Value> {
        self.get(name)
            .ok_or_else(|| self.runtime_error(format!("Missing property \"{}\"", name)))
    }

    pub fn require_str(&self, name: &str) -> EvalResult<&str> {
        self.require(name)?.as_str().ok_or_else(|| {
            self.runtime_error(format!("Property \"{}\" must be a string", name))
        })
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(default)
    }

    /// The array property `name`; a missing property is an empty list.
    pub fn array(&self, name: &str) -> EvalResult<&[Value]> {
        match self.get(name) {
            None => Ok(&[][..]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(self.runtime_error(format!("Property \"{}\" must be an array", name))),
        }
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.context.options
    }

    pub fn runtime_error(&self, message: impl Into<String>) -> EvalError {
        EvalError::runtime(&self.descriptor.name, message)
    }

    pub fn provider_error(&self, source: ProviderError) -> EvalError {
        EvalError::Provider {
            operator: self.descriptor.name.clone(),
            source,
        }
    }

    /// Evaluate a lazily passed node in the operator's context.
    pub async fn evaluate(&self, node: &Value) -> EvalResult<Value> {
        eval_node(node, self.context).await
    }
}
