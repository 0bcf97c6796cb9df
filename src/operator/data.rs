use futures::future::join_all;
use serde_json::{Map, Value};

use super::descriptor::OperatorInput;
use crate::error::EvalResult;
use crate::type_checker::preview;
use crate::value::stringify;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// `a.b[0].c` becomes `Key(a) Key(b) Index(0) Key(c)`.
fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let mut rest = part;
        if let Some(open) = rest.find('[') {
            if open > 0 {
                segments.push(Segment::Key(rest[..open].to_string()));
            }
            rest = &rest[open..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else {
                    break;
                };
                let inner = &stripped[..close];
                segments.push(match inner.parse::<usize>() {
                    Ok(index) => Segment::Index(index),
                    Err(_) => Segment::Key(inner.to_string()),
                });
                rest = &stripped[close + 1..];
            }
        } else {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

fn extract(value: &Value, segments: &[Segment]) -> Option<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(value.clone());
    };
    match (first, value) {
        (Segment::Index(index), Value::Array(items)) => extract(items.get(*index)?, rest),
        (Segment::Key(key), Value::Object(map)) => extract(map.get(key)?, rest),
        (Segment::Key(key), Value::Array(items)) => match key.parse::<usize>() {
            Ok(index) => extract(items.get(index)?, rest),
            // A field name applied to a list reads it from every element.
            Err(_) => items
                .iter()
                .map(|item| extract(item, segments))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
        },
        _ => None,
    }
}

/// Read `path` from `value`. `None` when any segment is missing.
pub fn extract_property(value: &Value, path: &str) -> Option<Value> {
    extract(value, &parse_path(path))
}

pub(super) fn object_properties(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let path = input.require_str("property")?;
    let mut data = input.options().data.clone();
    if let Some(Value::Object(additional)) = input.get("additionalData") {
        data.extend(additional.clone());
    }
    let data = Value::Object(data);

    extract_property(&data, path).ok_or_else(|| {
        input.runtime_error(format!(
            "Unable to extract object property\nLooking for property: {}\nIn object: {}",
            path,
            preview(&data)
        ))
    })
}

/// `[k1, v1, k2, v2, ...]` becomes `properties: [{key: k1, value: v1}, ...]`.
pub(super) fn build_object_children(children: Vec<Value>) -> Vec<(&'static str, Value)> {
    let pairs = children
        .chunks(2)
        .map(|pair| {
            let mut entry = Map::new();
            entry.insert("key".to_string(), pair[0].clone());
            entry.insert("value".to_string(), pair.get(1).cloned().unwrap_or(Value::Null));
            Value::Object(entry)
        })
        .collect();
    vec![("properties", Value::Array(pairs))]
}

pub(super) async fn build_object(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let Some(Value::Array(entries)) = input.properties.get("properties") else {
        return Err(input.runtime_error("Property \"properties\" must be an array of { key, value }"));
    };

    let pairs = join_all(entries.iter().map(|entry| async move {
        let (key, value) = match entry {
            Value::Object(map) => (
                map.get("key").cloned().unwrap_or(Value::Null),
                map.get("value").cloned().unwrap_or(Value::Null),
            ),
            Value::Array(pair) if pair.len() == 2 => (pair[0].clone(), pair[1].clone()),
            other => {
                return Err(input.runtime_error(format!("Invalid key/value pair: {}", preview(other))))
            }
        };
        let (key, value) = futures::join!(input.evaluate(&key), input.evaluate(&value));
        Ok((stringify(&key?), value?))
    }))
    .await;

    let mut object = Map::new();
    for pair in pairs {
        let (key, value) = pair?;
        object.insert(key, value);
    }
    Ok(Value::Object(object))
}
