use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::descriptor::OperatorInput;
use crate::error::EvalResult;
use crate::type_checker::preview;
use crate::value::{stringify, to_number, truthy};

/// How loosely two values are compared by `EQUAL` and `NOT_EQUAL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonPolicy {
    pub case_insensitive: bool,
    /// An object key holding `null` equals the key being absent.
    pub null_equals_undefined: bool,
}

impl ComparisonPolicy {
    fn from_input(input: &OperatorInput<'_>) -> Self {
        let options = input.options();
        Self {
            case_insensitive: input.bool_or("caseInsensitive", options.case_insensitive),
            null_equals_undefined: input
                .bool_or("nullEqualsUndefined", options.null_equals_undefined),
        }
    }

    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
            (Value::String(x), Value::String(y)) if self.case_insensitive => {
                x.to_lowercase() == y.to_lowercase()
            }
            (Value::Array(x), Value::Array(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(a, b)| self.equals(a, b))
            }
            (Value::Object(x), Value::Object(y)) => self.objects_equal(x, y),
            _ => a == b,
        }
    }

    fn objects_equal(&self, x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
        x.keys().chain(y.keys()).all(|key| match (x.get(key), y.get(key)) {
            (Some(a), Some(b)) => self.equals(a, b),
            (Some(Value::Null), None) | (None, Some(Value::Null)) => self.null_equals_undefined,
            _ => false,
        })
    }
}

pub(super) fn and(input: &OperatorInput<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(input.array("values")?.iter().all(truthy)))
}

pub(super) fn or(input: &OperatorInput<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(input.array("values")?.iter().any(truthy)))
}

fn all_equal(input: &OperatorInput<'_>) -> EvalResult<bool> {
    let policy = ComparisonPolicy::from_input(input);
    let values = input.array("values")?;
    Ok(match values.split_first() {
        Some((first, rest)) => rest.iter().all(|value| policy.equals(first, value)),
        None => true,
    })
}

pub(super) fn equal(input: &OperatorInput<'_>) -> EvalResult<Value> {
    all_equal(input).map(Value::Bool)
}

pub(super) fn not_equal(input: &OperatorInput<'_>) -> EvalResult<Value> {
    all_equal(input).map(|equal| Value::Bool(!equal))
}

fn compare(input: &OperatorInput<'_>, a: &Value, b: &Value) -> EvalResult<Ordering> {
    let ordering = match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        input.runtime_error(format!("Cannot compare {} with {}", preview(a), preview(b)))
    })
}

fn ordered(input: &OperatorInput<'_>, wanted: Ordering) -> EvalResult<Value> {
    let values = input.array("values")?;
    if values.len() < 2 {
        return Err(input.runtime_error("At least two values are required"));
    }
    let strict = input.bool_or("strict", false);
    for pair in values.windows(2) {
        let ordering = compare(input, &pair[0], &pair[1])?;
        let holds = ordering == wanted || (!strict && ordering == Ordering::Equal);
        if !holds {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub(super) fn greater_than(input: &OperatorInput<'_>) -> EvalResult<Value> {
    ordered(input, Ordering::Greater)
}

pub(super) fn less_than(input: &OperatorInput<'_>) -> EvalResult<Value> {
    ordered(input, Ordering::Less)
}

pub(super) async fn conditional(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let condition = input.properties.get("condition").is_some_and(truthy);
    let branch = if condition {
        "valueIfTrue"
    } else {
        "valueIfFalse"
    };
    match input.properties.get(branch) {
        Some(node) => input.evaluate(node).await,
        None => Ok(Value::Null),
    }
}

/// `[expression, key1, branch1, key2, branch2, ...]`
pub(super) fn match_children(children: Vec<Value>) -> Vec<(&'static str, Value)> {
    let mut children = children.into_iter();
    let mut named = Vec::new();
    if let Some(expression) = children.next() {
        named.push(("matchExpression", expression));
    }
    let mut branches = Map::new();
    while let (Some(key), Some(branch)) = (children.next(), children.next()) {
        branches.insert(stringify(&key), branch);
    }
    if !branches.is_empty() {
        named.push(("branches", Value::Object(branches)));
    }
    named
}

pub(super) async fn match_branches(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let key = input
        .properties
        .get("matchExpression")
        .map_or_else(|| "null".to_string(), stringify);

    let from_table = input
        .properties
        .get("branches")
        .and_then(Value::as_object)
        .and_then(|branches| branches.get(&key));
    let inline = || {
        input
            .properties
            .get(&key)
            .filter(|_| input.descriptor.canonical_property(&key).is_none())
    };

    match from_table.or_else(inline) {
        Some(branch) => input.evaluate(branch).await,
        None => Err(input.runtime_error(format!("No match found for \"{}\"", key))),
    }
}

pub(super) fn regex(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let text = input.require_str("testString")?;
    let pattern = input.require_str("pattern")?;
    let regex = ::regex::Regex::new(pattern)
        .map_err(|e| input.runtime_error(format!("Invalid regex: {}", e)))?;
    Ok(Value::Bool(regex.is_match(text)))
}

pub(super) fn count(input: &OperatorInput<'_>) -> EvalResult<Value> {
    Ok(Value::from(input.array("values")?.len()))
}

pub(super) fn passthru(input: &OperatorInput<'_>) -> EvalResult<Value> {
    Ok(input.properties.get("value").cloned().unwrap_or(Value::Null))
}
