use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use treeval::provider::{HttpMethod, MockHttpClient, ProviderError};
use treeval::{EvalError, Evaluator, EvaluatorOptions};

#[tokio::test]
async fn test_get_with_query_and_return_property() {
    let mut client = MockHttpClient::new();
    client
        .expect_send()
        .withf(|request| {
            request.method == HttpMethod::Get
                && request.url == "https://api.test/users"
                && request.query == vec![("id".to_string(), "7".to_string())]
                && request.headers.get("X-Api-Key").map(String::as_str) == Some("secret")
        })
        .times(1)
        .returning(|_| Ok(json!({"user": {"name": "Ada", "id": 7}})));

    let mut options = EvaluatorOptions::default()
        .with_http_client(Arc::new(client))
        .with_base_endpoint("https://api.test/");
    options.headers.insert("X-Api-Key".into(), "secret".into());
    let evaluator = Evaluator::new(options);

    let node = json!({
        "operator": "GET",
        "url": "/users",
        "parameters": {"id": {"operator": "+", "values": [3, 4]}},
        "returnProperty": "user.name"
    });
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("Ada")));
    // Served from the cache; the mock allows a single request.
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("Ada")));
}

#[tokio::test]
async fn test_get_positional_form_simplifies_single_key() {
    let mut client = MockHttpClient::new();
    client
        .expect_send()
        .withf(|request| request.url == "https://api.test/items" && request.query.len() == 1)
        .returning(|_| Ok(json!({"data": [1, 2, 3]})));
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_http_client(Arc::new(client)));

    let node = json!({"operator": "get", "children": ["https://api.test/items", ["page"], 2]});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!([1, 2, 3])));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mut client = MockHttpClient::new();
    client
        .expect_send()
        .withf(|request| {
            request.method == HttpMethod::Post
                && request.body == Some(json!({"name": "Ada", "tags": ["x"]}))
                && request.headers.get("Authorization").map(String::as_str) == Some("Bearer t")
        })
        .returning(|_| Ok(json!({"id": 1, "created": true})));
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_http_client(Arc::new(client)));

    let node = json!({
        "operator": "POST",
        "url": "https://api.test/users",
        "body": {"name": "Ada", "tags": ["x"]},
        "headers": {"Authorization": "Bearer t"}
    });
    assert_eq!(
        evaluator.evaluate(&node, None).await,
        Ok(json!({"id": 1, "created": true}))
    );
}

#[tokio::test]
async fn test_transport_errors_reach_fallback() {
    let mut client = MockHttpClient::new();
    client
        .expect_send()
        .returning(|_| Err(ProviderError::Status {
                url: "https://api.test/down".into(),
                status: 503,
                body: "unavailable".into(),
            }));
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_http_client(Arc::new(client)));

    let node = json!({"operator": "GET", "url": "https://api.test/down"});
    let error = evaluator.evaluate(&node, None).await.unwrap_err();
    assert!(matches!(error, EvalError::Provider { .. }), "{:?}", error);

    let node = json!({"operator": "GET", "url": "https://api.test/down", "fallback": [], "useCache": false});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!([])));
}
