use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::trace;

use super::context::EvaluationContext;
use super::evaluator::eval_node;
use crate::error::EvalResult;
use crate::node::is_alias_key;

/// A `$name` binding: the aliased node plus the scope it was declared in.
/// The node is evaluated on first use and the settled result is shared by
/// every later reference.
pub struct AliasBinding {
    name: String,
    node: Value,
    context: EvaluationContext,
    value: OnceCell<EvalResult<Value>>,
}

impl AliasBinding {
    pub fn new(name: String, node: Value, context: EvaluationContext) -> Self {
        Self {
            name,
            node,
            context,
            value: OnceCell::new(),
        }
    }

    pub async fn resolve(&self) -> EvalResult<Value> {
        self.value
            .get_or_init(|| async {
                trace!("Evaluating alias {}", self.name);
                eval_node(&self.node, &self.context).await
            })
            .await
            .clone()
    }

    pub fn is_evaluated(&self) -> bool {
        self.value.initialized()
    }
}

impl fmt::Debug for AliasBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasBinding")
            .field("name", &self.name)
            .field("node", &self.node)
            .field("evaluated", &self.is_evaluated())
            .finish()
    }
}

/// One level of alias bindings. Scopes chain to their parent, so an inner
/// binding shadows an outer one of the same name only within its subtree.
#[derive(Debug, Default)]
pub struct AliasScope {
    bindings: HashMap<String, Arc<AliasBinding>>,
    parent: Option<Arc<AliasScope>>,
}

impl AliasScope {
    pub fn new(bindings: HashMap<String, Arc<AliasBinding>>, parent: Option<Arc<AliasScope>>) -> Self {
        Self { bindings, parent }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<AliasBinding>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(binding) = current.bindings.get(name) {
                return Some(Arc::clone(binding));
            }
            scope = current.parent.as_deref();
        }
        None
    }
}

/// The `$name` entries of a node.
pub fn alias_definitions(map: &Map<String, Value>) -> Vec<(String, Value)> {
    map.iter()
        .filter(|(key, _)| is_alias_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
