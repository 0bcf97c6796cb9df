use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use super::data::extract_property;
use super::descriptor::OperatorInput;
use crate::error::EvalResult;
use crate::value::stringify;

lazy_static! {
    static ref NAMED_PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern is valid");
}

/// `%1..%n` (or `$1..$n`) take positional substitutions; `{{path}}` takes
/// named ones, looked up in the substitution object and then in the data
/// object. Unresolved placeholders become empty.
pub(super) fn string_substitution(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let template = input.require_str("string")?;
    let trim = input.bool_or("trimWhiteSpace", true);
    let marker = input.str("substitutionCharacter").unwrap_or("%");
    let substitutions = input.get("substitutions");
    let render = |value: &Value| {
        let text = stringify(value);
        if trim {
            text.trim().to_string()
        } else {
            text
        }
    };

    let positional = Regex::new(&format!(r"{}(\d+)", regex::escape(marker)))
        .map_err(|e| input.runtime_error(format!("Invalid substitution character: {}", e)))?;
    let result = positional.replace_all(template, |caps: &Captures<'_>| {
        let position = caps[1].parse::<usize>().unwrap_or(0);
        substitutions
            .and_then(Value::as_array)
            .and_then(|items| position.checked_sub(1).and_then(|i| items.get(i)))
            .map(render)
            .unwrap_or_default()
    });

    let data = Value::Object(input.options().data.clone());
    let result = NAMED_PLACEHOLDER.replace_all(&result, |caps: &Captures<'_>| {
        let path = &caps[1];
        substitutions
            .filter(|s| s.is_object())
            .and_then(|s| extract_property(s, path))
            .or_else(|| extract_property(&data, path))
            .map(|value| render(&value))
            .unwrap_or_default()
    });

    let result: &str = if trim { result.trim() } else { &result };
    Ok(Value::String(result.to_string()))
}

pub(super) fn split(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let text = input.require_str("value")?;
    let delimiter = input.str("delimiter").unwrap_or(" ");
    let trim = input.bool_or("trimWhiteSpace", true);
    let exclude_trailing = input.bool_or("excludeTrailing", true);

    let mut parts: Vec<String> = if delimiter.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(delimiter).map(String::from).collect()
    };
    if trim {
        parts = parts.into_iter().map(|p| p.trim().to_string()).collect();
    }
    if exclude_trailing && parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    Ok(Value::Array(parts.into_iter().map(Value::String).collect()))
}
