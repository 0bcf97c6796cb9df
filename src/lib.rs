//! # treeval
//!
//! An evaluation engine for JSON expression trees.
//!
//! A tree is plain JSON. Objects with an `operator` key are operator nodes,
//! objects with a `fragment` key expand a registered template, strings
//! starting with `$` refer to aliases bound on an enclosing node, and
//! everything else evaluates to itself:
//!
//! ```no_run
//! # async fn demo() -> treeval::EvalResult<()> {
//! use serde_json::json;
//! use treeval::{Evaluator, EvaluatorOptions};
//!
//! let evaluator = Evaluator::new(EvaluatorOptions::default().with_data(json!({"user": {"name": "Ada"}})));
//! let greeting = evaluator
//!     .evaluate(
//!         &json!({
//!             "operator": "+",
//!             "$name": {"operator": "getData", "property": "user.name"},
//!             "values": ["Hello ", "$name"]
//!         }),
//!         None,
//!     )
//!     .await?;
//! assert_eq!(greeting, json!("Hello Ada"));
//! # Ok(())
//! # }
//! ```
//!
//! Operators that reach outside the process (`GET`, `POST`, `GRAPHQL`,
//! `PG_SQL`) use the capabilities in [`provider`], injected through
//! [`EvaluatorOptions`].

pub mod cache;
pub mod config;
pub mod error;
pub mod eval;
pub mod node;
pub mod operator;
pub mod provider;
pub mod type_checker;
pub mod value;

pub use cache::{CacheConfig, EvaluatorCache};
pub use config::{EvaluatorOptions, GraphQlConnection, OptionsUpdate};
pub use error::{EvalError, EvalResult, MissingProperty};
pub use eval::{
    EvaluationContext, Evaluator, FragmentDefinition, FragmentInfo, FragmentMetadata, FragmentParameter,
    OutputType,
};
pub use operator::{CustomFunction, FunctionInfo, OperatorDescriptor, OperatorKind, OperatorRegistry, ParamSpec};
