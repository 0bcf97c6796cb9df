//! Node classification.
//!
//! A node is any JSON value. Objects carrying an `operator` key are operator
//! nodes, objects carrying a `fragment` key are fragment nodes, strings of
//! the form `$name` are alias references, and everything else is literal
//! data. A `$name` key whose name is a known operator, fragment or custom
//! function marks a shorthand node, which [`expand_shorthand`] rewrites into
//! the long form before evaluation.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::operator::OperatorKind;

pub const OPERATOR_KEY: &str = "operator";
pub const FRAGMENT_KEY: &str = "fragment";
pub const CHILDREN_KEY: &str = "children";
pub const FALLBACK_KEY: &str = "fallback";
pub const OUTPUT_TYPE_KEY: &str = "outputType";
pub const USE_CACHE_KEY: &str = "useCache";
pub const PARAMETERS_KEY: &str = "parameters";

/// Node-level keys that any operator or fragment node may carry.
pub const RESERVED_KEYS: &[&str] = &[FALLBACK_KEY, OUTPUT_TYPE_KEY, USE_CACHE_KEY];

lazy_static! {
    static ref ALIAS_KEY: Regex = Regex::new(r"^\$.+").expect("alias key pattern is valid");
}

pub fn is_alias_key(key: &str) -> bool {
    ALIAS_KEY.is_match(key)
}

pub fn is_operator_node(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(OPERATOR_KEY))
}

pub fn is_fragment_node(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(FRAGMENT_KEY) && !map.contains_key(OPERATOR_KEY))
}

/// What a shorthand `$name` key refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum ShorthandTarget {
    Operator(OperatorKind),
    Fragment(String),
    Function(String),
}

/// The `(key, target)` of a shorthand node, if `value` is one.
///
/// Exactly one `$name` key must resolve through `resolve`; every other key
/// must be reserved or an alias definition.
pub fn find_shorthand<F>(value: &Value, resolve: F) -> Option<(String, ShorthandTarget)>
where
    F: Fn(&str) -> Option<ShorthandTarget>,
{
    let map = value.as_object()?;
    if map.contains_key(OPERATOR_KEY) || map.contains_key(FRAGMENT_KEY) {
        return None;
    }
    let mut found = None;
    for key in map.keys() {
        if is_alias_key(key) {
            if let Some(target) = resolve(&key[1..]) {
                if found.is_some() {
                    return None;
                }
                found = Some((key.clone(), target));
            }
        } else if !RESERVED_KEYS.contains(&key.as_str()) {
            return None;
        }
    }
    found
}

pub fn is_shorthand_node<F>(value: &Value, resolve: F) -> bool
where
    F: Fn(&str) -> Option<ShorthandTarget>,
{
    find_shorthand(value, resolve).is_some()
}

/// Rewrite a shorthand node into its long form.
///
/// Operators take an array value as `children`, a plain object value as
/// named properties and anything else as a single child. Fragments take an
/// object value as `parameters`. Custom functions take an array value as
/// `args` and anything else as `input`.
pub fn expand_shorthand(map: &Map<String, Value>, key: &str, target: &ShorthandTarget) -> Value {
    let mut node = Map::new();
    let Some(value) = map.get(key) else {
        return Value::Object(map.clone());
    };
    let plain_object = value.is_object() && !is_operator_node(value) && !is_fragment_node(value);

    match target {
        ShorthandTarget::Operator(kind) => {
            node.insert(OPERATOR_KEY.to_string(), Value::String(kind.to_string()));
            match value {
                Value::Array(_) => {
                    node.insert(CHILDREN_KEY.to_string(), value.clone());
                }
                Value::Object(properties) if plain_object => {
                    node.extend(properties.clone());
                }
                other => {
                    node.insert(CHILDREN_KEY.to_string(), Value::Array(vec![other.clone()]));
                }
            }
        }
        ShorthandTarget::Fragment(name) => {
            node.insert(FRAGMENT_KEY.to_string(), Value::String(name.clone()));
            if plain_object {
                node.insert(PARAMETERS_KEY.to_string(), value.clone());
            }
        }
        ShorthandTarget::Function(name) => {
            node.insert(
                OPERATOR_KEY.to_string(),
                Value::String(OperatorKind::CustomFunctions.to_string()),
            );
            node.insert("functionName".to_string(), Value::String(name.clone()));
            let slot = if value.is_array() { "args" } else { "input" };
            node.insert(slot.to_string(), value.clone());
        }
    }

    for (other, value) in map {
        if other != key {
            node.insert(other.clone(), value.clone());
        }
    }
    Value::Object(node)
}

/// Structural category of a node, decided before any evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    Literal,
    AliasReference(&'a str),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
    Shorthand(Value),
    Fragment(&'a Map<String, Value>),
    Operator(&'a Map<String, Value>),
}

pub fn classify<F>(value: &Value, resolve: F) -> NodeKind<'_>
where
    F: Fn(&str) -> Option<ShorthandTarget>,
{
    match value {
        Value::String(s) if is_alias_key(s) => NodeKind::AliasReference(s.as_str()),
        Value::Array(items) => NodeKind::Array(items),
        Value::Object(map) if map.contains_key(OPERATOR_KEY) => NodeKind::Operator(map),
        Value::Object(map) if map.contains_key(FRAGMENT_KEY) => NodeKind::Fragment(map),
        Value::Object(map) => match find_shorthand(value, resolve) {
            Some((key, target)) => NodeKind::Shorthand(expand_shorthand(map, &key, &target)),
            None => NodeKind::Object(map),
        },
        _ => NodeKind::Literal,
    }
}
