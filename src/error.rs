use thiserror::Error;

use crate::provider::types::ProviderError;

/// A property an operator requires but the node did not supply.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingProperty {
    pub name: String,
    pub expected: String,
}

impl MissingProperty {
    pub fn new(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected: expected.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown fragment: {0}")]
    UnknownFragment(String),

    #[error("Operator: {operator}{}", format_missing(.properties))]
    MissingRequiredProperty {
        operator: String,
        properties: Vec<MissingProperty>,
    },

    #[error("Operator: {operator}\n{violations}")]
    TypeMismatch { operator: String, violations: String },

    #[error("Fragment: {fragment}{}", format_parameters(.parameters))]
    MissingFragmentParameter {
        fragment: String,
        parameters: Vec<String>,
    },

    #[error("Recursive fragment: {}", .chain.join(" -> "))]
    RecursiveFragment { chain: Vec<String> },

    #[error("Operator: {operator}\n{message}")]
    OperatorRuntime { operator: String, message: String },

    #[error("Operator: {operator}\n{source}")]
    Provider {
        operator: String,
        #[source]
        source: ProviderError,
    },

    #[error("Cannot convert {value} to {target}")]
    OutputConversion { value: String, target: String },

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Operator alias \"{alias}\" is claimed by both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Config error: {0}")]
    Config(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn runtime(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperatorRuntime {
            operator: operator.into(),
            message: message.into(),
        }
    }

    pub fn invalid_node(message: impl Into<String>) -> Self {
        Self::InvalidNode(message.into())
    }
}

fn format_missing(properties: &[MissingProperty]) -> String {
    properties
        .iter()
        .map(|p| {
            format!(
                "\n- Missing required property \"{}\" (type: {})",
                p.name, p.expected
            )
        })
        .collect()
}

fn format_parameters(parameters: &[String]) -> String {
    parameters
        .iter()
        .map(|p| format!("\n- Missing required parameter \"{}\"", p))
        .collect()
}
