//! Tree-walking evaluation.
//!
//! [`Evaluator`] is the entry point. Each call builds an
//! [`EvaluationContext`] from the current options snapshot and walks the
//! node recursively:
//!
//! 1. classify the node (literal, alias reference, array, plain object,
//!    shorthand, fragment, operator);
//! 2. bind the node's `$name` aliases in a new scope;
//! 3. for fragments, bind parameters and evaluate the template;
//! 4. for operators, resolve the name, normalize properties, check required
//!    properties, evaluate properties concurrently, type check, consult the
//!    cache, run the operator and coerce the output type;
//! 5. on failure, evaluate the node's `fallback` if it has one.

pub mod alias;
pub mod context;
pub mod evaluator;
pub mod fragment;
pub mod output;

pub use context::EvaluationContext;
pub use evaluator::Evaluator;
pub use fragment::{FragmentDefinition, FragmentInfo, FragmentMetadata, FragmentParameter};
pub use output::OutputType;
