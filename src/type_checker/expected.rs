use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Vocabulary of runtime types a property can be checked against.
///
/// `Undefined` matches an absent value only; `Literal` matches one exact
/// value, so a list of literals forms an enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    Undefined,
    Any,
    Literal(Value),
}

impl ExpectedType {
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (ExpectedType::Any, _) => true,
            (ExpectedType::Undefined, None) => true,
            (_, None) => false,
            (ExpectedType::String, Some(v)) => v.is_string(),
            (ExpectedType::Number, Some(v)) => v.is_number(),
            (ExpectedType::Boolean, Some(v)) => v.is_boolean(),
            (ExpectedType::Array, Some(v)) => v.is_array(),
            (ExpectedType::Object, Some(v)) => v.is_object(),
            (ExpectedType::Null, Some(v)) => v.is_null(),
            (ExpectedType::Undefined, Some(_)) => false,
            (ExpectedType::Literal(expected), Some(v)) => expected == v,
        }
    }

    /// Human readable list, e.g. `string, number`.
    pub fn describe(types: &[ExpectedType]) -> String {
        if types.is_empty() {
            return "any".to_string();
        }
        types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedType::String => write!(f, "string"),
            ExpectedType::Number => write!(f, "number"),
            ExpectedType::Boolean => write!(f, "boolean"),
            ExpectedType::Array => write!(f, "array"),
            ExpectedType::Object => write!(f, "object"),
            ExpectedType::Null => write!(f, "null"),
            ExpectedType::Undefined => write!(f, "undefined"),
            ExpectedType::Any => write!(f, "any"),
            ExpectedType::Literal(value) => write!(f, "{}", value),
        }
    }
}
