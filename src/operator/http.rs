use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use super::data::extract_property;
use super::descriptor::OperatorInput;
use crate::error::EvalResult;
use crate::provider::{HttpRequest, ProviderError};
use crate::value::stringify;

/// Resolve `url` against `base` unless it is already absolute.
pub fn join_url(base: Option<&str>, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match base {
        Some(base) if !base.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        _ => url.to_string(),
    }
}

/// Unwrap an object with exactly one key to that key's value.
pub fn simplify(value: Value) -> Value {
    match value {
        Value::Object(map) if map.len() == 1 => map.into_iter().next().map_or(Value::Null, |(_, v)| v),
        other => other,
    }
}

fn merged_headers(defaults: &BTreeMap<String, String>, node: Option<&Value>) -> BTreeMap<String, String> {
    let mut headers = defaults.clone();
    if let Some(Value::Object(map)) = node {
        for (name, value) in map {
            headers.insert(name.clone(), stringify(value));
        }
    }
    headers
}

fn extract_return(input: &OperatorInput<'_>, response: Value, key: &str) -> EvalResult<Value> {
    match input.str(key) {
        Some(path) => extract_property(&response, path).ok_or_else(|| {
            input.runtime_error(format!("Response has no property \"{}\"", path))
        }),
        None => Ok(simplify(response)),
    }
}

async fn send(input: &OperatorInput<'_>, request: HttpRequest) -> EvalResult<Value> {
    debug!("{} {}", request.method, request.url);
    input
        .context
        .http_client()
        .send(request)
        .await
        .map_err(|e| input.provider_error(e))
}

pub(super) async fn get(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let options = input.options();
    let url = join_url(options.base_endpoint.as_deref(), input.require_str("url")?);
    let mut request = HttpRequest::get(url);
    if let Some(Value::Object(parameters)) = input.get("parameters") {
        request.query = parameters
            .iter()
            .map(|(key, value)| (key.clone(), stringify(value)))
            .collect();
    }
    request.headers = merged_headers(&options.headers, input.get("headers"));

    let response = send(input, request).await?;
    extract_return(input, response, "returnProperty")
}

pub(super) async fn post(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let options = input.options();
    let url = join_url(options.base_endpoint.as_deref(), input.require_str("url")?);
    let body = input
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let mut request = HttpRequest::post(url, body);
    request.headers = merged_headers(&options.headers, input.get("headers"));

    let response = send(input, request).await?;
    extract_return(input, response, "returnProperty")
}

pub(super) async fn graphql(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let options = input.options();
    let connection = options.graphql_connection.as_ref();
    let endpoint = connection.map(|c| c.endpoint.as_str());
    let url = match (input.str("url"), endpoint) {
        (Some(url), endpoint) => join_url(endpoint, url),
        (None, Some(endpoint)) => endpoint.to_string(),
        (None, None) => {
            return Err(input.provider_error(ProviderError::MissingConnection("GraphQL".to_string())))
        }
    };

    let query = input.require_str("query")?;
    let variables = input.get("variables").cloned().unwrap_or_else(|| json!({}));
    let body = json!({ "query": query, "variables": variables });
    let mut request = HttpRequest::post(url, body);
    let mut defaults = connection.map(|c| c.headers.clone()).unwrap_or_default();
    defaults.extend(options.headers.clone());
    request.headers = merged_headers(&defaults, input.get("headers"));

    let response = send(input, request).await?;
    if let Some(Value::Array(errors)) = response.get("errors") {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| e.get("message").map_or_else(|| stringify(e), stringify))
                .collect();
            return Err(input.runtime_error(format!("GraphQL error: {}", messages.join("; "))));
        }
    }
    let data = response.get("data").cloned().unwrap_or(response);
    extract_return(input, data, "returnNode")
}

/// `[keys]` followed by one value per key, zipped into an object.
fn zip_keyed<I: Iterator<Item = Value>>(keys: &[Value], values: &mut I) -> Value {
    let mut object = Map::new();
    for key in keys {
        let value = values.next().unwrap_or(Value::Null);
        object.insert(stringify(key), value);
    }
    Value::Object(object)
}

/// `[url, [keys], ...values, returnProperty?]`
pub(super) fn request_children(children: Vec<Value>) -> Vec<(&'static str, Value)> {
    let mut children = children.into_iter().peekable();
    let mut named = Vec::new();
    if let Some(url) = children.next() {
        named.push(("url", url));
    }
    if let Some(Value::Array(keys)) = children.peek().cloned() {
        children.next();
        named.push(("parameters", zip_keyed(&keys, &mut children)));
    }
    if let Some(property) = children.next() {
        named.push(("returnProperty", property));
    }
    named
}

/// `[query, url, [keys], ...values, returnNode?]`
pub(super) fn graphql_children(children: Vec<Value>) -> Vec<(&'static str, Value)> {
    let mut children = children.into_iter().peekable();
    let mut named = Vec::new();
    if let Some(query) = children.next() {
        named.push(("query", query));
    }
    if let Some(url) = children.next() {
        if !url.is_null() && url != json!("") {
            named.push(("url", url));
        }
    }
    if let Some(Value::Array(keys)) = children.peek().cloned() {
        children.next();
        named.push(("variables", zip_keyed(&keys, &mut children)));
    }
    if let Some(node) = children.next() {
        named.push(("returnNode", node));
    }
    named
}
