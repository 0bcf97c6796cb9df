use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use treeval::{EvalError, Evaluator, EvaluatorOptions};

fn evaluator() -> Evaluator {
    Evaluator::new(EvaluatorOptions::default().with_data(json!({
        "user": {
            "firstName": "Ada",
            "friends": [{"name": "Charles"}, {"name": "Mary"}],
            "nickname": null
        },
        "greeting": "Hello"
    })))
}

async fn eval(node: Value) -> Result<Value, EvalError> {
    evaluator().evaluate(&node, None).await
}

#[tokio::test]
async fn test_equality() {
    assert_eq!(eval(json!({"operator": "=", "values": [1, 1.0, "1"]})).await, Ok(json!(false)));
    assert_eq!(eval(json!({"operator": "=", "values": [2, 2.0]})).await, Ok(json!(true)));
    assert_eq!(
        eval(json!({"operator": "=", "values": ["Yes", "YES"], "caseInsensitive": true})).await,
        Ok(json!(true))
    );
    assert_eq!(
        eval(json!({"operator": "=", "values": [{"a": 1, "b": null}, {"a": 1}]})).await,
        Ok(json!(false))
    );
    assert_eq!(
        eval(json!({
            "operator": "=",
            "values": [{"a": 1, "b": null}, {"a": 1}],
            "nullEqualsUndefined": true
        }))
        .await,
        Ok(json!(true))
    );
    assert_eq!(eval(json!({"operator": "!=", "values": ["a", "b"]})).await, Ok(json!(true)));
}

#[tokio::test]
async fn test_ordering() {
    assert_eq!(eval(json!({"operator": ">", "values": [3, 2, 2]})).await, Ok(json!(true)));
    assert_eq!(
        eval(json!({"operator": ">", "values": [3, 2, 2], "strict": true})).await,
        Ok(json!(false))
    );
    assert_eq!(eval(json!({"operator": "<", "values": ["a", "b"]})).await, Ok(json!(true)));
}

#[tokio::test]
async fn test_arithmetic() {
    assert_eq!(eval(json!({"operator": "+", "values": [[1], [2, 3]]})).await, Ok(json!([1, 2, 3])));
    assert_eq!(
        eval(json!({"operator": "+", "values": [{"a": 1}, {"b": 2}]})).await,
        Ok(json!({"a": 1, "b": 2}))
    );
    assert_eq!(eval(json!({"operator": "+", "values": [1, "a"]})).await, Ok(json!("1a")));
    assert_eq!(eval(json!({"operator": "*", "values": [2, 3, 4]})).await, Ok(json!(24)));
    assert_eq!(eval(json!({"operator": "/", "values": [7, 2]})).await, Ok(json!(3.5)));
    assert_eq!(
        eval(json!({"operator": "/", "dividend": 7, "divisor": 2, "output": "quotient"})).await,
        Ok(json!(3))
    );
    assert_eq!(
        eval(json!({"operator": "/", "dividend": 7, "divisor": 2, "output": "remainder"})).await,
        Ok(json!(1))
    );
    assert!(eval(json!({"operator": "/", "values": [1, 0]})).await.is_err());
}

#[tokio::test]
async fn test_object_properties() {
    assert_eq!(
        eval(json!({"operator": "getData", "property": "user.friends[1].name"})).await,
        Ok(json!("Mary"))
    );
    assert_eq!(
        eval(json!({"operator": "getData", "children": ["user.middleName", "n/a"]})).await,
        Ok(json!("n/a"))
    );
    let error = eval(json!({"operator": "getData", "property": "user.middleName"}))
        .await
        .unwrap_err();
    let message = error.to_string();
    assert!(message.contains("Unable to extract object property"), "{}", message);
    assert!(message.contains("Looking for property: user.middleName"), "{}", message);
}

#[tokio::test]
async fn test_string_substitution() {
    assert_eq!(
        eval(json!({"operator": "stringSubstitution", "children": ["%1 is %2", "Ada", " here "]})).await,
        Ok(json!("Ada is here"))
    );
    assert_eq!(
        eval(json!({
            "operator": "substitute",
            "string": "{{greeting}}, {{name}}!",
            "substitutions": {"name": {"operator": "getData", "property": "user.firstName"}}
        }))
        .await,
        Ok(json!("Hello, Ada!"))
    );
    assert_eq!(
        eval(json!({
            "operator": "substitute",
            "string": "$1-$2",
            "substitutions": ["a", "b"],
            "substitutionCharacter": "$"
        }))
        .await,
        Ok(json!("a-b"))
    );
}

#[tokio::test]
async fn test_split() {
    assert_eq!(
        eval(json!({"operator": "split", "value": "a, b, c,", "delimiter": ","})).await,
        Ok(json!(["a", "b", "c"]))
    );
    assert_eq!(
        eval(json!({"operator": "split", "children": ["one two"]})).await,
        Ok(json!(["one", "two"]))
    );
}

#[tokio::test]
async fn test_conditional_only_evaluates_taken_branch() {
    let node = json!({
        "operator": "?",
        "children": [false, {"operator": "run"}, "no"]
    });
    assert_eq!(eval(node).await, Ok(json!("no")));
}

#[tokio::test]
async fn test_match() {
    let node = json!({
        "operator": "match",
        "matchExpression": {"operator": "getData", "property": "user.firstName"},
        "branches": {"Ada": "mathematician", "Charles": {"operator": "run"}}
    });
    assert_eq!(eval(node).await, Ok(json!("mathematician")));

    let positional = json!({"operator": "switch", "children": [2, 1, "one", 2, "two"]});
    assert_eq!(eval(positional).await, Ok(json!("two")));

    let inline = json!({"operator": "match", "matchExpression": "b", "a": 1, "b": 2});
    assert_eq!(eval(inline).await, Ok(json!(2)));

    let unmatched = json!({"operator": "match", "matchExpression": "z", "branches": {"a": 1}});
    assert!(eval(unmatched).await.is_err());
}

#[tokio::test]
async fn test_build_object() {
    let node = json!({
        "operator": "buildObject",
        "properties": [
            {"key": "name", "value": {"operator": "getData", "property": "user.firstName"}},
            {"key": {"operator": "+", "values": ["fri", "ends"]}, "value": {"operator": "count", "values": [1, 2]}}
        ]
    });
    assert_eq!(eval(node).await, Ok(json!({"name": "Ada", "friends": 2})));

    let positional = json!({"operator": "object", "children": ["a", 1, "b", 2]});
    assert_eq!(eval(positional).await, Ok(json!({"a": 1, "b": 2})));
}

#[tokio::test]
async fn test_regex_and_count() {
    assert_eq!(
        eval(json!({"operator": "regex", "testString": "abc123", "pattern": "^[a-z]+\\d+$"})).await,
        Ok(json!(true))
    );
    assert_eq!(eval(json!({"operator": "count", "values": []})).await, Ok(json!(0)));
}

#[tokio::test]
async fn test_logic() {
    assert_eq!(eval(json!({"operator": "and", "values": [true, 1, "x"]})).await, Ok(json!(true)));
    assert_eq!(eval(json!({"operator": "and", "values": [true, 0]})).await, Ok(json!(false)));
    assert_eq!(eval(json!({"operator": "or", "values": [null, ""]})).await, Ok(json!(false)));
    assert_eq!(eval(json!({"operator": "||", "children": [null, "y"]})).await, Ok(json!(true)));
}

#[tokio::test]
async fn test_custom_function_shorthand() {
    let evaluator = Evaluator::new(EvaluatorOptions::default().with_function(
        "double",
        treeval::CustomFunction::from_sync(|args| {
            let n = args.first().and_then(Value::as_i64).ok_or("expected a number")?;
            Ok(json!(n * 2))
        }),
    ));
    assert_eq!(evaluator.evaluate(&json!({"$double": [21]}), None).await, Ok(json!(42)));
    assert_eq!(evaluator.evaluate(&json!({"$double": 4}), None).await, Ok(json!(8)));

    let error = evaluator
        .evaluate(&json!({"$double": ["x"]}), None)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("expected a number"), "{}", error);
}
