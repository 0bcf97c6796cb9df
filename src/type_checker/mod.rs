//! Runtime type validation for operator properties.
//!
//! Every operator's resolved properties pass through [`TypeChecker`] before
//! the operator runs, so type errors read the same regardless of which
//! operator raised them:
//!
//! ```text
//! Operator: SUBTRACT
//! - Property "from" (value: "ten") is not of type: number
//! ```
//!
//! The checker never stops at the first violation; all violations of a
//! batch are reported together. A disabled checker (the
//! `skipRuntimeTypeCheck` option) accepts everything, leaving operators to
//! fail with their own errors.

mod expected;

pub use expected::ExpectedType;

use serde_json::Value;

use crate::error::{EvalError, EvalResult};

const PREVIEW_LIMIT: usize = 100;

/// One (name, value, expected types) triple to validate.
#[derive(Debug, Clone)]
pub struct TypeCheckItem<'a> {
    pub name: &'a str,
    pub value: Option<&'a Value>,
    pub expected: &'a [ExpectedType],
    pub not: bool,
}

impl<'a> TypeCheckItem<'a> {
    pub fn new(name: &'a str, value: Option<&'a Value>, expected: &'a [ExpectedType]) -> Self {
        Self {
            name,
            value,
            expected,
            not: false,
        }
    }

    /// Invert the check: the value must match none of the types.
    pub fn not(mut self) -> Self {
        self.not = true;
        self
    }

    fn violation(&self) -> Option<String> {
        if self.expected.is_empty() {
            return None;
        }
        let matched = self.expected.iter().any(|t| t.matches(self.value));
        let value = self.value.map_or_else(|| "undefined".to_string(), preview);
        match (matched, self.not) {
            (false, false) => Some(format!(
                "- Property \"{}\" (value: {}) is not of type: {}",
                self.name,
                value,
                ExpectedType::describe(self.expected)
            )),
            (true, true) => Some(format!(
                "- Property \"{}\" (value: {}) must not be of type: {}",
                self.name,
                value,
                ExpectedType::describe(self.expected)
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeChecker {
    enabled: bool,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TypeChecker {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Validate a batch, returning every violation as one message.
    pub fn check(&self, items: &[TypeCheckItem<'_>]) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        let violations: Vec<String> = items.iter().filter_map(TypeCheckItem::violation).collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations.join("\n"))
        }
    }

    /// [`check`](Self::check), raised as a [`EvalError::TypeMismatch`] for `operator`.
    pub fn check_operator(&self, operator: &str, items: &[TypeCheckItem<'_>]) -> EvalResult<()> {
        self.check(items)
            .map_err(|violations| EvalError::TypeMismatch {
                operator: operator.to_string(),
                violations,
            })
    }
}

/// Compact JSON rendering for diagnostics, truncated for large values.
pub(crate) fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > PREVIEW_LIMIT {
        let truncated: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}
