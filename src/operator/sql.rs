use serde_json::Value;

use super::descriptor::OperatorInput;
use crate::error::EvalResult;
use crate::eval::output::OutputType;
use crate::provider::{ProviderError, RowMode, SqlQuery};
use crate::value::stringify;

pub(super) async fn pg_sql(input: &OperatorInput<'_>) -> EvalResult<Value> {
    let connection = input
        .options()
        .sql_connection
        .clone()
        .ok_or_else(|| input.provider_error(ProviderError::MissingConnection("Postgres".to_string())))?;

    let flatten = input.bool_or("flatten", false);
    let single = input.bool_or("single", false);
    let row_mode = if flatten || input.output_type.is_some() {
        RowMode::Array
    } else {
        RowMode::Object
    };
    let query = SqlQuery {
        text: input.require_str("query")?.to_string(),
        values: input.array("values")?.to_vec(),
        row_mode,
    };

    let result = connection
        .query(query)
        .await
        .map_err(|e| input.provider_error(e))?;
    Ok(convert_rows(result.rows, row_mode, input.output_type, single))
}

/// Shape query rows for the requested output.
///
/// Array-mode rows are flattened into one list of values, joined with
/// spaces for string output, or reduced to the first value for number and
/// boolean output. `single` keeps only the first row.
pub fn convert_rows(
    rows: Vec<Value>,
    row_mode: RowMode,
    output_type: Option<OutputType>,
    single: bool,
) -> Value {
    if row_mode == RowMode::Object {
        return if single {
            rows.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(rows)
        };
    }

    if single && !matches!(output_type, Some(OutputType::String)) {
        return match rows.into_iter().next() {
            Some(Value::Array(mut columns)) if columns.len() == 1 => columns.remove(0),
            Some(row) => row,
            None => Value::Null,
        };
    }

    let values: Vec<Value> = rows
        .into_iter()
        .flat_map(|row| match row {
            Value::Array(columns) => columns,
            other => vec![other],
        })
        .collect();

    match output_type {
        Some(OutputType::String) => Value::String(
            values
                .iter()
                .map(stringify)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Some(OutputType::Number) | Some(OutputType::Boolean) => {
            values.into_iter().next().unwrap_or(Value::Null)
        }
        _ => Value::Array(values),
    }
}
