//! The built-in operator catalog.
//!
//! Operators form a closed set ([`OperatorKind`]). Each kind has one
//! [`OperatorDescriptor`] describing its names and parameters, a positional
//! adapter for the `children` form, and an implementation reached through
//! [`OperatorKind::evaluate`]. The [`OperatorRegistry`] maps operator names
//! and aliases to descriptors.

mod arithmetic;
mod catalog;
mod data;
pub mod descriptor;
pub mod functions;
mod http;
mod logic;
pub mod registry;
mod sql;
mod string;

pub use data::extract_property;
pub use descriptor::{Evaluation, OperatorDescriptor, OperatorInput, ParamSpec};
pub use functions::{CustomFunction, FunctionInfo};
pub use logic::ComparisonPolicy;
pub use registry::OperatorRegistry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

use crate::error::EvalResult;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorKind {
    And,
    Or,
    Equal,
    NotEqual,
    Plus,
    Subtract,
    Multiply,
    Divide,
    GreaterThan,
    LessThan,
    Conditional,
    Match,
    Regex,
    ObjectProperties,
    StringSubstitution,
    Split,
    Count,
    BuildObject,
    Get,
    Post,
    PgSql,
    Graphql,
    CustomFunctions,
    Passthru,
}

impl OperatorKind {
    pub fn descriptor(self) -> OperatorDescriptor {
        catalog::descriptor(self)
    }

    pub async fn evaluate(self, input: OperatorInput<'_>) -> EvalResult<Value> {
        match self {
            OperatorKind::And => logic::and(&input),
            OperatorKind::Or => logic::or(&input),
            OperatorKind::Equal => logic::equal(&input),
            OperatorKind::NotEqual => logic::not_equal(&input),
            OperatorKind::GreaterThan => logic::greater_than(&input),
            OperatorKind::LessThan => logic::less_than(&input),
            OperatorKind::Conditional => logic::conditional(&input).await,
            OperatorKind::Match => logic::match_branches(&input).await,
            OperatorKind::Regex => logic::regex(&input),
            OperatorKind::Count => logic::count(&input),
            OperatorKind::Passthru => logic::passthru(&input),
            OperatorKind::Plus => arithmetic::plus(&input),
            OperatorKind::Subtract => arithmetic::subtract(&input),
            OperatorKind::Multiply => arithmetic::multiply(&input),
            OperatorKind::Divide => arithmetic::divide(&input),
            OperatorKind::ObjectProperties => data::object_properties(&input),
            OperatorKind::BuildObject => data::build_object(&input).await,
            OperatorKind::StringSubstitution => string::string_substitution(&input),
            OperatorKind::Split => string::split(&input),
            OperatorKind::Get => http::get(&input).await,
            OperatorKind::Post => http::post(&input).await,
            OperatorKind::Graphql => http::graphql(&input).await,
            OperatorKind::PgSql => sql::pg_sql(&input).await,
            OperatorKind::CustomFunctions => functions::custom_functions(&input).await,
        }
    }

    /// Assign positional `children` to named properties. Properties the
    /// node already names explicitly are left untouched.
    pub fn children_to_properties(self, children: Vec<Value>, properties: &mut Map<String, Value>) {
        let named = match self {
            OperatorKind::And
            | OperatorKind::Or
            | OperatorKind::Equal
            | OperatorKind::NotEqual
            | OperatorKind::Plus
            | OperatorKind::Subtract
            | OperatorKind::Multiply
            | OperatorKind::Divide
            | OperatorKind::GreaterThan
            | OperatorKind::LessThan
            | OperatorKind::Count => vec![("values", Value::Array(children))],
            OperatorKind::Conditional => {
                positional(children, &["condition", "valueIfTrue", "valueIfFalse"])
            }
            OperatorKind::Match => logic::match_children(children),
            OperatorKind::Regex => positional(children, &["testString", "pattern"]),
            OperatorKind::ObjectProperties => positional(children, &["property", "fallback"]),
            OperatorKind::StringSubstitution => {
                let mut children = children.into_iter();
                let mut named = Vec::new();
                if let Some(string) = children.next() {
                    named.push(("string", string));
                    named.push(("substitutions", Value::Array(children.collect())));
                }
                named
            }
            OperatorKind::Split => positional(children, &["value", "delimiter"]),
            OperatorKind::BuildObject => data::build_object_children(children),
            OperatorKind::Get | OperatorKind::Post => http::request_children(children),
            OperatorKind::Graphql => http::graphql_children(children),
            OperatorKind::PgSql => {
                let mut children = children.into_iter();
                let mut named = Vec::new();
                if let Some(query) = children.next() {
                    named.push(("query", query));
                    named.push(("values", Value::Array(children.collect())));
                }
                named
            }
            OperatorKind::CustomFunctions => {
                let mut children = children.into_iter();
                let mut named = Vec::new();
                if let Some(name) = children.next() {
                    named.push(("functionName", name));
                    named.push(("args", Value::Array(children.collect())));
                }
                named
            }
            OperatorKind::Passthru => positional(children, &["value"]),
        };

        for (name, value) in named {
            properties.entry(name).or_insert(value);
        }
    }
}

fn positional(children: Vec<Value>, names: &[&'static str]) -> Vec<(&'static str, Value)> {
    names.iter().copied().zip(children).collect()
}
