use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::ProviderResult;

/// Shape of each returned row: a column-keyed object or a positional array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowMode {
    #[default]
    Object,
    Array,
}

/// A parameterized query; `values` fill `$1..$n` placeholders in `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQuery {
    pub text: String,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub row_mode: RowMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRows {
    pub rows: Vec<Value>,
}

/// Relational connection used by `PG_SQL`.
#[automock]
#[async_trait]
pub trait SqlConnection: Send + Sync {
    async fn query(&self, query: SqlQuery) -> ProviderResult<SqlRows>;
}
