use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::CacheConfig;
use crate::error::{EvalError, EvalResult};
use crate::eval::fragment::FragmentDefinition;
use crate::operator::functions::CustomFunction;
use crate::provider::{Capability, HttpClient, SqlConnection};

/// Endpoint and default headers for the `GRAPHQL` operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlConnection {
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Engine-wide options. Each evaluation runs against one immutable snapshot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorOptions {
    /// Context object used by `OBJECT_PROPERTIES` and named substitutions.
    #[serde(default, alias = "objects")]
    pub data: Map<String, Value>,

    #[serde(default)]
    pub fragments: BTreeMap<String, FragmentDefinition>,

    #[serde(skip)]
    pub functions: HashMap<String, CustomFunction>,

    #[serde(skip)]
    pub http_client: Option<Capability<dyn HttpClient>>,

    #[serde(skip)]
    pub sql_connection: Option<Capability<dyn SqlConnection>>,

    #[serde(default, rename = "graphQLConnection")]
    pub graphql_connection: Option<GraphQlConnection>,

    #[serde(default)]
    pub base_endpoint: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub return_error_as_string: bool,

    #[serde(default)]
    pub null_equals_undefined: bool,

    #[serde(default)]
    pub case_insensitive: bool,

    #[serde(default)]
    pub skip_runtime_type_check: bool,

    #[serde(default)]
    pub evaluate_full_object: bool,

    #[serde(default = "default_true")]
    pub use_cache: bool,

    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,

    #[serde(default = "default_max_cache_time", with = "duration_secs")]
    pub max_cache_time: Duration,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            data: Map::new(),
            fragments: BTreeMap::new(),
            functions: HashMap::new(),
            http_client: None,
            sql_connection: None,
            graphql_connection: None,
            base_endpoint: None,
            headers: BTreeMap::new(),
            return_error_as_string: false,
            null_equals_undefined: false,
            case_insensitive: false,
            skip_runtime_type_check: false,
            evaluate_full_object: false,
            use_cache: default_true(),
            max_cache_size: default_max_cache_size(),
            max_cache_time: default_max_cache_time(),
        }
    }
}

impl fmt::Debug for EvaluatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorOptions")
            .field("data", &self.data)
            .field("fragments", &self.fragments.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("http_client", &self.http_client.is_some())
            .field("sql_connection", &self.sql_connection.is_some())
            .field("graphql_connection", &self.graphql_connection)
            .field("base_endpoint", &self.base_endpoint)
            .field("headers", &self.headers)
            .field("return_error_as_string", &self.return_error_as_string)
            .field("null_equals_undefined", &self.null_equals_undefined)
            .field("case_insensitive", &self.case_insensitive)
            .field("skip_runtime_type_check", &self.skip_runtime_type_check)
            .field("evaluate_full_object", &self.evaluate_full_object)
            .field("use_cache", &self.use_cache)
            .field("max_cache_size", &self.max_cache_size)
            .field("max_cache_time", &self.max_cache_time)
            .finish()
    }
}

impl EvaluatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, function: CustomFunction) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    pub fn with_fragment(mut self, name: impl Into<String>, fragment: Value) -> Self {
        self.fragments
            .insert(name.into(), FragmentDefinition::from(fragment));
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(Capability::new(client));
        self
    }

    pub fn with_sql_connection(mut self, connection: Arc<dyn SqlConnection>) -> Self {
        self.sql_connection = Some(Capability::new(connection));
        self
    }

    pub fn with_graphql_connection(mut self, connection: GraphQlConnection) -> Self {
        self.graphql_connection = Some(connection);
        self
    }

    pub fn with_base_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.base_endpoint = Some(endpoint.into());
        self
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_cache_size,
            max_age: self.max_cache_time,
        }
    }

    /// New snapshot with `update` applied.
    ///
    /// Scalars replace. `data`, `fragments` and `functions` merge key by key.
    /// `headers` and `graphQLConnection` replace wholesale.
    pub fn merged(&self, update: OptionsUpdate) -> Self {
        let mut next = self.clone();
        if let Some(data) = update.data {
            next.data.extend(data);
        }
        if let Some(fragments) = update.fragments {
            next.fragments.extend(fragments);
        }
        if let Some(functions) = update.functions {
            next.functions.extend(functions);
        }
        if let Some(client) = update.http_client {
            next.http_client = Some(client);
        }
        if let Some(connection) = update.sql_connection {
            next.sql_connection = Some(connection);
        }
        if let Some(connection) = update.graphql_connection {
            next.graphql_connection = Some(connection);
        }
        if let Some(endpoint) = update.base_endpoint {
            next.base_endpoint = Some(endpoint);
        }
        if let Some(headers) = update.headers {
            next.headers = headers;
        }
        macro_rules! replace {
            ($($field:ident),*) => {
                $(if let Some(value) = update.$field {
                    next.$field = value;
                })*
            };
        }
        replace!(
            return_error_as_string,
            null_equals_undefined,
            case_insensitive,
            skip_runtime_type_check,
            evaluate_full_object,
            use_cache,
            max_cache_size
        );
        if let Some(seconds) = update.max_cache_time {
            next.max_cache_time = Duration::from_secs(seconds);
        }
        next
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> EvalResult<Self> {
        from_file(path)
    }
}

/// Partial options for `update_options` and per-call overrides.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsUpdate {
    #[serde(default, alias = "objects")]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub fragments: Option<BTreeMap<String, FragmentDefinition>>,
    #[serde(skip)]
    pub functions: Option<HashMap<String, CustomFunction>>,
    #[serde(skip)]
    pub http_client: Option<Capability<dyn HttpClient>>,
    #[serde(skip)]
    pub sql_connection: Option<Capability<dyn SqlConnection>>,
    #[serde(default, rename = "graphQLConnection")]
    pub graphql_connection: Option<GraphQlConnection>,
    #[serde(default)]
    pub base_endpoint: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub return_error_as_string: Option<bool>,
    #[serde(default)]
    pub null_equals_undefined: Option<bool>,
    #[serde(default)]
    pub case_insensitive: Option<bool>,
    #[serde(default)]
    pub skip_runtime_type_check: Option<bool>,
    #[serde(default)]
    pub evaluate_full_object: Option<bool>,
    #[serde(default)]
    pub use_cache: Option<bool>,
    #[serde(default)]
    pub max_cache_size: Option<usize>,
    /// Seconds.
    #[serde(default)]
    pub max_cache_time: Option<u64>,
}

impl fmt::Debug for OptionsUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsUpdate")
            .field("data", &self.data)
            .field("fragments", &self.fragments.as_ref().map(|f| f.keys().collect::<Vec<_>>()))
            .field("functions", &self.functions.as_ref().map(|f| f.keys().collect::<Vec<_>>()))
            .field("http_client", &self.http_client.is_some())
            .field("sql_connection", &self.sql_connection.is_some())
            .field("use_cache", &self.use_cache)
            .field("max_cache_size", &self.max_cache_size)
            .field("max_cache_time", &self.max_cache_time)
            .finish_non_exhaustive()
    }
}

impl OptionsUpdate {
    pub fn data(data: Value) -> Self {
        Self {
            data: data.as_object().cloned(),
            ..Self::default()
        }
    }

    pub fn functions(functions: HashMap<String, CustomFunction>) -> Self {
        Self {
            functions: Some(functions),
            ..Self::default()
        }
    }

    pub fn sql_connection(connection: Arc<dyn SqlConnection>) -> Self {
        Self {
            sql_connection: Some(Capability::new(connection)),
            ..Self::default()
        }
    }

    pub fn http_client(client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client: Some(Capability::new(client)),
            ..Self::default()
        }
    }

    /// True when applying this update changes cache sizing.
    pub fn touches_cache(&self) -> bool {
        self.max_cache_size.is_some() || self.max_cache_time.is_some()
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> EvalResult<T> {
    let file = File::open(path)
        .map_err(|e| EvalError::Config(format!("Failed to open options file: {}", e)))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| EvalError::Config(format!("Failed to parse options file: {}", e)))
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> EvalResult<T> {
    serde_json::from_str(s).map_err(|e| EvalError::Config(format!("Failed to parse options: {}", e)))
}

fn default_true() -> bool {
    true
}

fn default_max_cache_size() -> usize {
    50
}

fn default_max_cache_time() -> Duration {
    Duration::from_secs(1800)
}

pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
