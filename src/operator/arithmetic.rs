use serde_json::{Map, Value};

use super::descriptor::OperatorInput;
use crate::error::{EvalError, EvalResult};
use crate::type_checker::preview;
use crate::value::{number_value, stringify, to_number};

fn numbers(input: &OperatorInput<'_>, values: &[Value]) -> EvalResult<Vec<f64>> {
    values
        .iter()
        .map(|value| {
            to_number(value)
                .ok_or_else(|| input.runtime_error(format!("Not a number: {}", preview(value))))
        })
        .collect()
}

fn number(input: &OperatorInput<'_>, name: &str) -> EvalResult<f64> {
    let value = input.require(name)?;
    to_number(value).ok_or_else(|| input.runtime_error(format!("Not a number: {}", preview(value))))
}

fn finite(input: &OperatorInput<'_>, result: f64) -> EvalResult<Value> {
    number_value(result).ok_or_else(|| input.runtime_error("Result is not a finite number"))
}

fn concat_strings(values: &[Value]) -> Value {
    Value::String(values.iter().map(stringify).collect())
}

fn concat_arrays(values: &[Value]) -> Value {
    let mut joined = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => joined.extend(items.iter().cloned()),
            other => joined.push(other.clone()),
        }
    }
    Value::Array(joined)
}

fn merge_objects(values: &[Value]) -> Value {
    let mut merged = Map::new();
    for value in values {
        if let Value::Object(map) = value {
            merged.extend(map.clone());
        }
    }
    Value::Object(merged)
}

/// Reduce by the shape of the values: arrays concatenate, objects merge,
/// numbers add, and anything involving a string concatenates as text.
pub(super) fn plus(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let values = input.array("values")?;
    match input.str("type") {
        Some("string") => return Ok(concat_strings(values)),
        Some("array") => return Ok(concat_arrays(values)),
        _ => {}
    }

    if values.is_empty() {
        return Ok(Value::from(0));
    }
    if values.iter().all(Value::is_array) {
        return Ok(concat_arrays(values));
    }
    if values.iter().all(Value::is_object) {
        return Ok(merge_objects(values));
    }
    if values.iter().all(Value::is_number) {
        let sum = numbers(input, values)?.into_iter().sum();
        return finite(input, sum);
    }
    Ok(concat_strings(values))
}

pub(super) fn subtract(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let (from, subtract) = match input.get("values") {
        Some(_) => {
            let values = numbers(input, input.array("values")?)?;
            match values.split_first() {
                Some((first, rest)) => (*first, rest.iter().sum::<f64>()),
                None => return Err(input.runtime_error("No values to subtract")),
            }
        }
        None => (number(input, "from")?, number(input, "subtract")?),
    };
    finite(input, from - subtract)
}

pub(super) fn multiply(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let product = numbers(input, input.array("values")?)?.into_iter().product();
    finite(input, product)
}

/// `output` selects the floored `quotient` or the `remainder`; without it
/// the plain quotient is returned.
pub(super) fn divide(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let (dividend, divisor) = match input.get("values") {
        Some(_) => {
            let values = numbers(input, input.array("values")?)?;
            match values.split_first() {
                Some((first, rest)) if !rest.is_empty() => (*first, rest.iter().product::<f64>()),
                _ => return Err(input.runtime_error("Division requires a dividend and a divisor")),
            }
        }
        None => (number(input, "dividend")?, number(input, "divisor")?),
    };
    if divisor == 0.0 {
        return Err(EvalError::runtime(&input.descriptor.name, "Division by zero"));
    }
    let result = match input.str("output") {
        Some("quotient") => (dividend / divisor).floor(),
        Some("remainder") => dividend % divisor,
        _ => dividend / divisor,
    };
    finite(input, result)
}
