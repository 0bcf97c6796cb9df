use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use treeval::provider::MockHttpClient;
use treeval::{Evaluator, EvaluatorOptions, GraphQlConnection};

fn connection() -> GraphQlConnection {
    GraphQlConnection {
        endpoint: "https://gql.test/graphql".into(),
        headers: BTreeMap::from([("Authorization".to_string(), "Bearer t".to_string())]),
    }
}

#[tokio::test]
async fn test_query_with_variables() {
    let mut client = MockHttpClient::new();
    client
        .expect_send()
        .withf(|request| {
            let body = request.body.clone().unwrap_or_default();
            request.url == "https://gql.test/graphql"
                && body["variables"] == json!({"id": 3})
                && body["query"].as_str().is_some_and(|q| q.contains("user(id: $id)"))
                && request.headers.get("Authorization").map(String::as_str) == Some("Bearer t")
        })
        .times(1)
        .returning(|_| Ok(json!({"data": {"user": {"name": "Ada"}}})));
    let evaluator = Evaluator::new(
        EvaluatorOptions::default()
            .with_http_client(Arc::new(client))
            .with_graphql_connection(connection()),
    );

    let node = json!({
        "operator": "graphQL",
        "children": ["query($id: ID) { user(id: $id) { name } }", "", ["id"], 3, "user.name"]
    });
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("Ada")));
}

#[tokio::test]
async fn test_graphql_errors() {
    let mut client = MockHttpClient::new();
    client
        .expect_send()
        .returning(|_| Ok(json!({"data": null, "errors": [{"message": "Not authorised"}]})));
    let evaluator = Evaluator::new(
        EvaluatorOptions::default()
            .with_http_client(Arc::new(client))
            .with_graphql_connection(connection()),
    );

    let node = json!({"operator": "gql", "query": "{ secrets }"});
    let error = evaluator.evaluate(&node, None).await.unwrap_err();
    assert!(error.to_string().contains("Not authorised"), "{}", error);

    let node = json!({"operator": "gql", "query": "{ secrets }", "fallback": "hidden", "useCache": false});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("hidden")));
}

#[tokio::test]
async fn test_missing_endpoint() {
    let node = json!({"operator": "graphql", "query": "{ a }"});
    assert!(Evaluator::default().evaluate(&node, None).await.is_err());
}
