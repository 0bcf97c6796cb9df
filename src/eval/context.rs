use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde_json::{json, Map, Value};

use super::alias::{AliasBinding, AliasScope};
use crate::cache::{fingerprint, EvaluatorCache};
use crate::config::EvaluatorOptions;
use crate::error::{EvalError, EvalResult};
use crate::node::{self, NodeKind, ShorthandTarget};
use crate::operator::OperatorRegistry;
use crate::provider::{Capability, HttpClient, ReqwestClient};
use crate::type_checker::TypeChecker;

lazy_static! {
    static ref DEFAULT_HTTP_CLIENT: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new());
}

/// Everything a node evaluation can see.
///
/// Cheap to clone. Entering a scope (aliases, a fragment body) produces a
/// new context; the parent context is never modified.
#[derive(Clone)]
pub struct EvaluationContext {
    pub options: Arc<EvaluatorOptions>,
    pub registry: Arc<OperatorRegistry>,
    pub cache: Arc<EvaluatorCache>,
    pub type_checker: TypeChecker,
    aliases: Option<Arc<AliasScope>>,
    fragment_chain: Arc<Vec<String>>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        let options = EvaluatorOptions::default();
        let cache = Arc::new(EvaluatorCache::new(options.cache_config()));
        Self::new(Arc::new(options), OperatorRegistry::builtin(), cache)
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("options", &self.options)
            .field("type_checker", &self.type_checker)
            .field("aliases", &self.aliases)
            .field("fragment_chain", &self.fragment_chain)
            .finish_non_exhaustive()
    }
}

impl EvaluationContext {
    pub fn new(
        options: Arc<EvaluatorOptions>,
        registry: Arc<OperatorRegistry>,
        cache: Arc<EvaluatorCache>,
    ) -> Self {
        let type_checker = TypeChecker::new(!options.skip_runtime_type_check);
        Self {
            options,
            registry,
            cache,
            type_checker,
            aliases: None,
            fragment_chain: Arc::new(Vec::new()),
        }
    }

    /// A child context with `definitions` bound. Each aliased node is
    /// evaluated lazily in `declared_in`, the scope enclosing the node that
    /// declares it.
    pub fn with_aliases(&self, definitions: Vec<(String, Value)>, declared_in: &EvaluationContext) -> Self {
        if definitions.is_empty() {
            return self.clone();
        }
        let bindings: HashMap<String, Arc<AliasBinding>> = definitions
            .into_iter()
            .map(|(name, node)| {
                let binding = AliasBinding::new(name.clone(), node, declared_in.clone());
                (name, Arc::new(binding))
            })
            .collect();
        Self {
            aliases: Some(Arc::new(AliasScope::new(bindings, self.aliases.clone()))),
            ..self.clone()
        }
    }

    pub fn lookup_alias(&self, name: &str) -> Option<Arc<AliasBinding>> {
        self.aliases.as_ref().and_then(|scope| scope.lookup(name))
    }

    /// Enter fragment `name`, failing if it is already being expanded.
    pub fn with_fragment(&self, name: &str) -> EvalResult<Self> {
        if self.fragment_chain.iter().any(|active| active == name) {
            let mut chain = self.fragment_chain.as_ref().clone();
            chain.push(name.to_string());
            return Err(EvalError::RecursiveFragment { chain });
        }
        let mut chain = self.fragment_chain.as_ref().clone();
        chain.push(name.to_string());
        Ok(Self {
            fragment_chain: Arc::new(chain),
            ..self.clone()
        })
    }

    pub fn classify<'a>(&self, value: &'a Value) -> NodeKind<'a> {
        node::classify(value, |name| self.shorthand_target(name))
    }

    fn shorthand_target(&self, name: &str) -> Option<ShorthandTarget> {
        if let Some(descriptor) = self.registry.resolve_exact(name) {
            return Some(ShorthandTarget::Operator(descriptor.kind));
        }
        if self.options.fragments.contains_key(name) {
            return Some(ShorthandTarget::Fragment(name.to_string()));
        }
        if self.options.functions.contains_key(name) {
            return Some(ShorthandTarget::Function(name.to_string()));
        }
        None
    }

    /// Everything besides the node and `data` that can change an operator
    /// result: capability and function ids, comparison flags and request
    /// settings.
    pub fn environment(&self) -> Value {
        let options = &self.options;
        let functions: BTreeMap<&str, u64> = options
            .functions
            .iter()
            .map(|(name, function)| (name.as_str(), function.id()))
            .collect();
        json!({
            "http": options.http_client.as_ref().map(Capability::id),
            "sql": options.sql_connection.as_ref().map(Capability::id),
            "functions": functions,
            "caseInsensitive": options.case_insensitive,
            "nullEqualsUndefined": options.null_equals_undefined,
            "graphql": options.graphql_connection,
            "baseEndpoint": options.base_endpoint,
            "headers": options.headers,
        })
    }

    pub fn fingerprint(&self, operator: &str, properties: &Map<String, Value>) -> String {
        fingerprint(operator, properties, &self.options.data, &self.environment())
    }

    /// The injected HTTP client, or the shared default one.
    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        self.options
            .http_client
            .as_ref()
            .map(Capability::shared)
            .unwrap_or_else(|| Arc::clone(&DEFAULT_HTTP_CLIENT))
    }
}
