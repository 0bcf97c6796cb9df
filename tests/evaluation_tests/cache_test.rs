use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use treeval::provider::{MockSqlConnection, SqlRows};
use treeval::{CustomFunction, Evaluator, EvaluatorOptions, OptionsUpdate};

use crate::{calls, counting_function};

fn echo_node(arg: i64) -> serde_json::Value {
    json!({"operator": "customFunctions", "functionName": "echo", "args": [arg]})
}

#[tokio::test]
async fn test_repeated_evaluation_hits_cache() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function("echo", echo));

    let first = evaluator.evaluate(&echo_node(1), None).await;
    let second = evaluator.evaluate(&echo_node(1), None).await;
    assert_eq!(first, Ok(json!(1)));
    assert_eq!(first, second);
    assert_eq!(calls(&counter), 1);
    assert_eq!(evaluator.cache().len(), 1);
}

#[tokio::test]
async fn test_node_flag_overrides_global_flag() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function("echo", echo));
    let uncached = json!({"operator": "customFunctions", "functionName": "echo", "args": [1], "useCache": false});
    evaluator.evaluate(&uncached, None).await.unwrap();
    evaluator.evaluate(&uncached, None).await.unwrap();
    assert_eq!(calls(&counter), 2);

    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions {
        use_cache: false,
        ..EvaluatorOptions::default().with_function("echo", echo)
    });
    let cached = json!({"operator": "customFunctions", "functionName": "echo", "args": [1], "useCache": true});
    evaluator.evaluate(&cached, None).await.unwrap();
    evaluator.evaluate(&cached, None).await.unwrap();
    assert_eq!(calls(&counter), 1);
}

#[tokio::test]
async fn test_pure_operators_are_not_cached() {
    let evaluator = Evaluator::default();
    evaluator
        .evaluate(&json!({"operator": "+", "values": [1, 2]}), None)
        .await
        .unwrap();
    assert!(evaluator.cache().is_empty());
}

#[tokio::test]
async fn test_distinct_data_misses_cache() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function("echo", echo));
    evaluator.evaluate(&echo_node(1), None).await.unwrap();
    evaluator
        .evaluate(&echo_node(1), Some(OptionsUpdate::data(json!({"user": "ada"}))))
        .await
        .unwrap();
    assert_eq!(calls(&counter), 2);
}

#[tokio::test]
async fn test_eviction_keeps_newest_entries() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions {
        max_cache_size: 2,
        ..EvaluatorOptions::default().with_function("echo", echo)
    });
    for arg in 1..=3 {
        evaluator.evaluate(&echo_node(arg), None).await.unwrap();
    }
    assert_eq!(evaluator.cache().len(), 2);

    evaluator.evaluate(&echo_node(3), None).await.unwrap();
    assert_eq!(calls(&counter), 3);
    evaluator.evaluate(&echo_node(1), None).await.unwrap();
    assert_eq!(calls(&counter), 4);
}

#[tokio::test]
async fn test_expired_entries_are_recomputed() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions {
        max_cache_time: Duration::from_millis(20),
        ..EvaluatorOptions::default().with_function("echo", echo)
    });
    evaluator.evaluate(&echo_node(1), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    evaluator.evaluate(&echo_node(1), None).await.unwrap();
    assert_eq!(calls(&counter), 2);
}

#[tokio::test]
async fn test_replacing_functions_clears_cache() {
    let (echo, _) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function("echo", echo));
    evaluator.evaluate(&echo_node(1), None).await.unwrap();
    assert_eq!(evaluator.cache().len(), 1);

    let mut functions = HashMap::new();
    functions.insert(
        "echo".to_string(),
        CustomFunction::from_sync(|_| Ok(json!("replaced"))),
    );
    evaluator
        .update_options(OptionsUpdate {
            functions: Some(functions),
            ..Default::default()
        })
        .await;
    assert!(evaluator.cache().is_empty());
    assert_eq!(evaluator.evaluate(&echo_node(1), None).await, Ok(json!("replaced")));
}

#[tokio::test]
async fn test_resizing_trims_cache() {
    let (echo, _) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function("echo", echo));
    for arg in 1..=4 {
        evaluator.evaluate(&echo_node(arg), None).await.unwrap();
    }
    evaluator
        .update_options(OptionsUpdate {
            max_cache_size: Some(1),
            ..Default::default()
        })
        .await;
    assert_eq!(evaluator.cache().len(), 1);
    assert_eq!(evaluator.cache().config().max_entries, 1);
}

#[tokio::test]
async fn test_per_call_functions_bypass_cached_result() {
    let evaluator = Evaluator::new(
        EvaluatorOptions::default().with_function("f", CustomFunction::from_sync(|_| Ok(json!("original")))),
    );
    let node = json!({"operator": "customFunctions", "functionName": "f"});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("original")));

    let functions = HashMap::from([(
        "f".to_string(),
        CustomFunction::from_sync(|_| Ok(json!("override"))),
    )]);
    let overridden = evaluator
        .evaluate(&node, Some(OptionsUpdate::functions(functions)))
        .await;
    assert_eq!(overridden, Ok(json!("override")));
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("original")));
}

#[tokio::test]
async fn test_per_call_comparison_flags_bypass_cached_result() {
    let evaluator = Evaluator::default();
    let node = json!({"operator": "=", "values": ["A", "a"], "useCache": true});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!(false)));

    let folded = OptionsUpdate {
        case_insensitive: Some(true),
        ..Default::default()
    };
    assert_eq!(evaluator.evaluate(&node, Some(folded)).await, Ok(json!(true)));

    let node = json!({"operator": "=", "values": [{"a": null}, {}], "useCache": true});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!(false)));
    let loose = OptionsUpdate {
        null_equals_undefined: Some(true),
        ..Default::default()
    };
    assert_eq!(evaluator.evaluate(&node, Some(loose)).await, Ok(json!(true)));
}

fn connection_returning(name: &'static str) -> Arc<MockSqlConnection> {
    let mut connection = MockSqlConnection::new();
    connection.expect_query().times(1).returning(move |_| {
        Ok(SqlRows {
            rows: vec![json!({"name": name})],
        })
    });
    Arc::new(connection)
}

#[tokio::test]
async fn test_replaced_connection_misses_cache() {
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_sql_connection(connection_returning("first")));
    let node = json!({"operator": "PG_SQL", "query": "SELECT name FROM users", "single": true});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!({"name": "first"})));
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!({"name": "first"})));

    evaluator
        .update_options(OptionsUpdate::sql_connection(connection_returning("second")))
        .await;
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!({"name": "second"})));
}
