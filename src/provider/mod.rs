//! Injected capabilities used by the I/O operators.
//!
//! The engine never talks to the network or a database directly. `GET`,
//! `POST` and `GRAPHQL` go through an [`http::HttpClient`], `PG_SQL` goes
//! through a [`sql::SqlConnection`]. Both traits are narrow so callers can
//! plug in their own transport; [`http::ReqwestClient`] is the default HTTP
//! implementation when none is injected.

pub mod capability;
pub mod http;
pub mod sql;
pub mod types;

pub use capability::Capability;
pub use http::{HttpClient, HttpMethod, HttpRequest, MockHttpClient, ReqwestClient};
pub use sql::{MockSqlConnection, RowMode, SqlConnection, SqlQuery, SqlRows};
pub use types::{ProviderError, ProviderResult};
