use pretty_assertions::assert_eq;
use serde_json::json;
use treeval::{Evaluator, EvaluatorOptions};

use crate::{calls, counting_function};

#[tokio::test]
async fn test_alias_evaluates_once() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions {
        use_cache: false,
        ..EvaluatorOptions::default().with_function("echo", echo)
    });
    let node = json!({
        "operator": "+",
        "$x": {"operator": "function", "functionName": "echo", "args": [2]},
        "values": ["$x", "$x", {"operator": "*", "values": ["$x", 10]}]
    });
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!(24)));
    assert_eq!(calls(&counter), 1);
}

#[tokio::test]
async fn test_unreferenced_alias_is_never_evaluated() {
    let (echo, counter) = counting_function();
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function("echo", echo));
    let node = json!({
        "operator": "_",
        "$unused": {"operator": "function", "functionName": "echo", "args": [1]},
        "$broken": {"operator": "run"},
        "value": "ok"
    });
    assert_eq!(evaluator.evaluate(&node, None).await, Ok(json!("ok")));
    assert_eq!(calls(&counter), 0);
}

#[tokio::test]
async fn test_inner_alias_shadows_outer() {
    let node = json!({
        "operator": "+",
        "$x": 1,
        "values": [
            "$x",
            {"operator": "+", "$x": 10, "values": ["$x", 1]},
            "$x"
        ]
    });
    assert_eq!(Evaluator::default().evaluate(&node, None).await, Ok(json!(13)));
}

#[tokio::test]
async fn test_alias_body_sees_enclosing_scope() {
    let node = json!({
        "operator": "_",
        "$a": 1,
        "value": {"operator": "_", "$a": 2, "$b": "$a", "value": ["$a", "$b"]}
    });
    assert_eq!(Evaluator::default().evaluate(&node, None).await, Ok(json!([2, 1])));
}

#[tokio::test]
async fn test_unbound_reference_is_literal() {
    let node = json!({"operator": "+", "values": ["$nope", "!"]});
    assert_eq!(Evaluator::default().evaluate(&node, None).await, Ok(json!("$nope!")));
}

#[tokio::test]
async fn test_alias_error_surfaces_at_reference() {
    let node = json!({"operator": "_", "$bad": {"operator": "run"}, "value": "$bad", "fallback": "caught"});
    assert_eq!(Evaluator::default().evaluate(&node, None).await, Ok(json!("caught")));
}
