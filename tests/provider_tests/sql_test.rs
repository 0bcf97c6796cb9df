use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use treeval::provider::{MockSqlConnection, ProviderError, RowMode, SqlRows};
use treeval::{EvalError, Evaluator, EvaluatorOptions};

fn evaluator(connection: MockSqlConnection) -> Evaluator {
    Evaluator::new(EvaluatorOptions::default().with_sql_connection(Arc::new(connection)))
}

#[tokio::test]
async fn test_object_rows() {
    let mut connection = MockSqlConnection::new();
    connection
        .expect_query()
        .withf(|query| {
            query.text == "SELECT id, name FROM users WHERE team = $1"
                && query.values == vec![json!("core")]
                && query.row_mode == RowMode::Object
        })
        .returning(|_| {
            Ok(SqlRows {
                rows: vec![json!({"id": 1, "name": "Ada"}), json!({"id": 2, "name": "Bob"})],
            })
        });

    let node = json!({
        "operator": "pgSql",
        "children": ["SELECT id, name FROM users WHERE team = $1", "core"]
    });
    assert_eq!(
        evaluator(connection).evaluate(&node, None).await,
        Ok(json!([{"id": 1, "name": "Ada"}, {"id": 2, "name": "Bob"}]))
    );
}

#[tokio::test]
async fn test_single_row() {
    let mut connection = MockSqlConnection::new();
    connection.expect_query().returning(|_| {
        Ok(SqlRows {
            rows: vec![json!({"id": 1}), json!({"id": 2})],
        })
    });
    let node = json!({"operator": "sql", "query": "SELECT id FROM users", "single": true});
    assert_eq!(evaluator(connection).evaluate(&node, None).await, Ok(json!({"id": 1})));
}

#[tokio::test]
async fn test_output_type_flattens_rows() {
    let mut connection = MockSqlConnection::new();
    connection
        .expect_query()
        .withf(|query| query.row_mode == RowMode::Array)
        .returning(|_| {
            Ok(SqlRows {
                rows: vec![json!(["Ada"]), json!(["Bob"])],
            })
        });
    let evaluator = evaluator(connection);

    let node = json!({"operator": "PG_SQL", "query": "SELECT name FROM users", "outputType": "string"});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("Ada Bob")));

    let node = json!({"operator": "PG_SQL", "query": "SELECT name FROM users", "flatten": true});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!(["Ada", "Bob"])));
}

#[tokio::test]
async fn test_missing_connection() {
    let node = json!({"operator": "PG_SQL", "query": "SELECT 1"});
    let error = Evaluator::default().evaluate(&node, None).await.unwrap_err();
    assert_eq!(
        error,
        EvalError::Provider {
            operator: "PG_SQL".into(),
            source: ProviderError::MissingConnection("Postgres".into()),
        }
    );
}

#[tokio::test]
async fn test_query_errors_reach_fallback() {
    let mut connection = MockSqlConnection::new();
    connection
        .expect_query()
        .returning(|_| Err(ProviderError::Query("relation \"users\" does not exist".into())));
    let node = json!({"operator": "PG_SQL", "query": "SELECT * FROM users", "fallback": null});
    assert_eq!(evaluator(connection).evaluate(&node, None).await, Ok(json!(null)));
}
