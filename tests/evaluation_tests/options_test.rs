use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use treeval::config::from_str;
use treeval::{CustomFunction, Evaluator, EvaluatorOptions, OperatorKind, OptionsUpdate};

#[tokio::test]
async fn test_update_options_merges_data() {
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_data(json!({"a": 1, "b": 1})));
    evaluator.update_options(OptionsUpdate::data(json!({"b": 2, "c": 3}))).await;

    let node = json!({"operator": "+", "values": [
        {"operator": "getData", "property": "a"},
        {"operator": "getData", "property": "b"},
        {"operator": "getData", "property": "c"}
    ]});
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!(6)));
}

#[tokio::test]
async fn test_update_options_replaces_scalars() {
    let evaluator = Evaluator::default();
    evaluator
        .update_options(OptionsUpdate {
            case_insensitive: Some(true),
            max_cache_time: Some(60),
            ..Default::default()
        })
        .await;
    let options = evaluator.options().await;
    assert!(options.case_insensitive);
    assert!(options.use_cache);
    assert_eq!(options.max_cache_time, Duration::from_secs(60));
    assert_eq!(
        evaluator
            .evaluate(&json!({"operator": "=", "values": ["A", "a"]}), None)
            .await,
        Ok(json!(true))
    );
}

#[tokio::test]
async fn test_snapshot_is_immutable() {
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_data(json!({"x": 1})));
    let before = evaluator.options().await;
    evaluator.update_options(OptionsUpdate::data(json!({"x": 2}))).await;
    assert_eq!(before.data["x"], json!(1));
    assert_eq!(evaluator.options().await.data["x"], json!(2));
}

#[tokio::test]
async fn test_introspection() {
    let evaluator = Evaluator::new(
        EvaluatorOptions::default()
            .with_function("zeta", CustomFunction::from_sync(|_| Ok(json!(0))))
            .with_function(
                "alpha",
                CustomFunction::from_sync(|args| Ok(json!(args.len())))
                    .describe("Count arguments")
                    .with_args_default(vec![json!(1), json!(2)]),
            ),
    );
    let operators = evaluator.get_operators();
    assert_eq!(operators.len(), 24);
    assert!(operators.iter().any(|d| d.kind == OperatorKind::PgSql));

    let functions = evaluator.get_custom_functions().await;
    let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(functions[0].description.as_deref(), Some("Count arguments"));
    assert_eq!(
        evaluator
            .evaluate(&json!({"operator": "function", "functionName": "alpha"}), None)
            .await,
        Ok(json!(2))
    );
}

#[test]
fn test_options_from_json() {
    let options: EvaluatorOptions = from_str(
        r#"{
            "objects": {"user": {"name": "Ada"}},
            "useCache": false,
            "maxCacheSize": 5,
            "maxCacheTime": 10,
            "graphQLConnection": {"endpoint": "https://gql.test"},
            "fragments": {
                "hello": {"operator": "+", "values": ["Hi ", "$name"], "metadata": {"parameters": [{"name": "name"}]}}
            }
        }"#,
    )
    .unwrap();
    assert_eq!(options.data["user"]["name"], json!("Ada"));
    assert!(!options.use_cache);
    assert_eq!(options.cache_config().max_entries, 5);
    assert_eq!(options.max_cache_time, Duration::from_secs(10));
    assert_eq!(options.fragments["hello"].metadata.parameters[0].key(), "$name");
    assert_eq!(
        options.graphql_connection.map(|c| c.endpoint),
        Some("https://gql.test".to_string())
    );
}

#[test]
fn test_invalid_options_are_config_errors() {
    let result: Result<EvaluatorOptions, _> = from_str(r#"{"useCache": "yes"}"#);
    assert!(matches!(result, Err(treeval::EvalError::Config(_))));
}
