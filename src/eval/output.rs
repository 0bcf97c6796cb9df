use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::{EvalError, EvalResult};
use crate::type_checker::preview;
use crate::value::{number_value, stringify, to_number, truthy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    String,
    Number,
    #[strum(to_string = "boolean", serialize = "bool")]
    #[serde(alias = "bool")]
    Boolean,
    Array,
}

impl OutputType {
    /// Parse a node's `outputType`. Unknown types are ignored.
    pub fn from_node(value: Option<&Value>) -> Option<Self> {
        let name = value?.as_str()?;
        match OutputType::from_str(name) {
            Ok(output_type) => Some(output_type),
            Err(_) => {
                warn!("Ignoring unknown outputType \"{}\"", name);
                None
            }
        }
    }
}

/// Convert `value` to `output_type`, or return it unchanged when none is
/// requested.
pub fn coerce(value: Value, output_type: Option<OutputType>) -> EvalResult<Value> {
    let Some(output_type) = output_type else {
        return Ok(value);
    };
    match output_type {
        OutputType::String => Ok(Value::String(stringify(&value))),
        OutputType::Boolean => Ok(Value::Bool(truthy(&value))),
        OutputType::Array => Ok(match value {
            Value::Array(_) => value,
            Value::Null => Value::Array(Vec::new()),
            other => Value::Array(vec![other]),
        }),
        OutputType::Number => {
            let number = match &value {
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                other => to_number(other),
            };
            number.and_then(number_value).ok_or_else(|| EvalError::OutputConversion {
                value: preview(&value),
                target: output_type.to_string(),
            })
        }
    }
}
