use serde_json::json;

use super::descriptor::{OperatorDescriptor, ParamSpec};
use super::OperatorKind;
use crate::type_checker::ExpectedType as T;

fn any() -> Vec<T> {
    Vec::new()
}

fn string_or_number() -> Vec<T> {
    vec![T::String, T::Number]
}

fn object_or_array() -> Vec<T> {
    vec![T::Object, T::Array]
}

fn headers() -> ParamSpec {
    ParamSpec::optional("headers", vec![T::Object])
        .entries()
        .describe("Request headers, merged over the configured headers")
}

pub(super) fn descriptor(kind: OperatorKind) -> OperatorDescriptor {
    use OperatorKind::*;

    match kind {
        And => OperatorDescriptor::new(kind, "Logical AND over all values", &["and", "&", "&&"])
            .param(ParamSpec::required("values", vec![T::Array])),
        Or => OperatorDescriptor::new(kind, "Logical OR over all values", &["or", "|", "||"])
            .param(ParamSpec::required("values", vec![T::Array])),
        Equal => OperatorDescriptor::new(
            kind,
            "True when every value equals the first",
            &["=", "eq", "equal", "equals"],
        )
        .param(ParamSpec::required("values", vec![T::Array]))
        .param(ParamSpec::optional("caseInsensitive", vec![T::Boolean]))
        .param(ParamSpec::optional("nullEqualsUndefined", vec![T::Boolean])),
        NotEqual => OperatorDescriptor::new(
            kind,
            "True when some value differs from the first",
            &["!=", "!", "ne", "notEqual"],
        )
        .param(ParamSpec::required("values", vec![T::Array]))
        .param(ParamSpec::optional("caseInsensitive", vec![T::Boolean]))
        .param(ParamSpec::optional("nullEqualsUndefined", vec![T::Boolean])),
        Plus => OperatorDescriptor::new(
            kind,
            "Add numbers, concatenate strings or arrays, or merge objects",
            &["+", "plus", "add", "concat", "join", "merge"],
        )
        .param(ParamSpec::required("values", vec![T::Array]))
        .param(
            ParamSpec::optional("type", vec![T::Literal(json!("string")), T::Literal(json!("array"))])
                .describe("Force string or array concatenation"),
        ),
        Subtract => OperatorDescriptor::new(
            kind,
            "Subtract one number from another",
            &["-", "subtract", "minus", "takeaway"],
        )
        .param(ParamSpec::optional("values", vec![T::Array]))
        .param(ParamSpec::optional("from", string_or_number()).aliases(&["subtractFrom"]))
        .param(ParamSpec::optional("subtract", string_or_number()))
        .alternatives(vec![vec!["values"], vec!["from", "subtract"]]),
        Multiply => OperatorDescriptor::new(
            kind,
            "Multiply all values",
            &["*", "x", "multiply", "times"],
        )
        .param(ParamSpec::required("values", vec![T::Array])),
        Divide => OperatorDescriptor::new(kind, "Divide one number by another", &["/", "divide", "÷"])
            .param(ParamSpec::optional("values", vec![T::Array]))
            .param(ParamSpec::optional("dividend", string_or_number()).aliases(&["divide"]))
            .param(ParamSpec::optional("divisor", string_or_number()).aliases(&["divideBy", "by"]))
            .param(ParamSpec::optional(
                "output",
                vec![T::Literal(json!("quotient")), T::Literal(json!("remainder"))],
            ))
            .alternatives(vec![vec!["values"], vec!["dividend", "divisor"]]),
        GreaterThan => OperatorDescriptor::new(
            kind,
            "True when each value is greater than the next",
            &[">", "greaterThan", "higher", "larger"],
        )
        .param(ParamSpec::required("values", vec![T::Array]))
        .param(ParamSpec::optional("strict", vec![T::Boolean]).with_default(json!(false))),
        LessThan => OperatorDescriptor::new(
            kind,
            "True when each value is less than the next",
            &["<", "lessThan", "lower", "smaller"],
        )
        .param(ParamSpec::required("values", vec![T::Array]))
        .param(ParamSpec::optional("strict", vec![T::Boolean]).with_default(json!(false))),
        Conditional => OperatorDescriptor::new(
            kind,
            "Evaluate one of two branches depending on a condition",
            &["?", "conditional", "ifThen"],
        )
        .param(ParamSpec::required("condition", any()))
        .param(ParamSpec::required("valueIfTrue", any()).aliases(&["ifTrue"]).lazy())
        .param(ParamSpec::required("valueIfFalse", any()).aliases(&["ifFalse"]).lazy()),
        Match => OperatorDescriptor::new(
            kind,
            "Evaluate the branch keyed by the match expression",
            &["match", "switch"],
        )
        .param(
            ParamSpec::required("matchExpression", any())
                .aliases(&["match"])
                .describe("Value whose string form selects the branch"),
        )
        .param(
            ParamSpec::optional("branches", vec![T::Object])
                .aliases(&["arms", "cases"])
                .lazy(),
        )
        .lazy_extras(),
        Regex => OperatorDescriptor::new(
            kind,
            "Test a string against a regular expression",
            &["regex", "patternMatch", "regexp", "matchPattern"],
        )
        .param(ParamSpec::required("testString", vec![T::String]).aliases(&["string", "value"]))
        .param(ParamSpec::required("pattern", vec![T::String]).aliases(&["regex", "regexp"])),
        ObjectProperties => OperatorDescriptor::new(
            kind,
            "Extract a value from the data object by path",
            &[
                "dataProperties",
                "data",
                "getData",
                "objectProperties",
                "objProps",
                "getProperty",
                "getObjProp",
            ],
        )
        .param(
            ParamSpec::required("property", vec![T::String])
                .aliases(&["path", "propertyName"])
                .describe("Path such as user.friends[0].name"),
        )
        .param(
            ParamSpec::optional("additionalData", vec![T::Object])
                .aliases(&["additional", "objects"])
                .entries(),
        ),
        StringSubstitution => OperatorDescriptor::new(
            kind,
            "Fill positional or named placeholders in a string",
            &["stringSubstitution", "substitute", "stringSub", "replace"],
        )
        .param(ParamSpec::required("string", vec![T::String]))
        .param(
            ParamSpec::optional("substitutions", object_or_array())
                .aliases(&["replacements", "values"])
                .entries(),
        )
        .param(
            ParamSpec::optional("trimWhiteSpace", vec![T::Boolean])
                .aliases(&["trim"])
                .with_default(json!(true)),
        )
        .param(
            ParamSpec::optional(
                "substitutionCharacter",
                vec![T::Literal(json!("%")), T::Literal(json!("$"))],
            )
            .with_default(json!("%")),
        ),
        Split => OperatorDescriptor::new(kind, "Split a string into an array", &["split", "arraySplit"])
            .param(ParamSpec::required("value", vec![T::String]).aliases(&["string"]))
            .param(
                ParamSpec::optional("delimiter", vec![T::String])
                    .aliases(&["separator"])
                    .with_default(json!(" ")),
            )
            .param(ParamSpec::optional("trimWhiteSpace", vec![T::Boolean]).with_default(json!(true)))
            .param(ParamSpec::optional("excludeTrailing", vec![T::Boolean]).with_default(json!(true))),
        Count => OperatorDescriptor::new(kind, "Number of elements", &["count", "length"])
            .param(ParamSpec::required("values", vec![T::Array])),
        BuildObject => OperatorDescriptor::new(
            kind,
            "Build an object from key/value pairs",
            &["buildObject", "build", "object"],
        )
        .param(
            ParamSpec::required("properties", vec![T::Array])
                .aliases(&["values", "keyValPairs", "keyValuePairs"])
                .lazy()
                .describe("Array of { key, value } nodes"),
        ),
        Get => OperatorDescriptor::new(kind, "HTTP GET request", &["get", "api"])
            .param(ParamSpec::required("url", vec![T::String]).aliases(&["endpoint", "endPoint"]))
            .param(
                ParamSpec::optional("parameters", vec![T::Object])
                    .aliases(&["queryParams", "queryParameters", "urlQueries"])
                    .entries(),
            )
            .param(headers())
            .param(ParamSpec::optional("returnProperty", vec![T::String]).aliases(&["outputProperty"]))
            .cacheable(),
        Post => OperatorDescriptor::new(kind, "HTTP POST request", &["post"])
            .param(ParamSpec::required("url", vec![T::String]).aliases(&["endpoint", "endPoint"]))
            .param(
                ParamSpec::optional("parameters", vec![T::Object])
                    .aliases(&["queryParams", "queryParameters", "urlQueries", "bodyJson", "body"])
                    .entries()
                    .describe("JSON request body"),
            )
            .param(headers())
            .param(ParamSpec::optional("returnProperty", vec![T::String]).aliases(&["outputProperty"]))
            .cacheable(),
        PgSql => OperatorDescriptor::new(
            kind,
            "Parameterized query against the injected SQL connection",
            &["sql", "pgSql", "postgres", "pg", "pgDb"],
        )
        .param(ParamSpec::required("query", vec![T::String]).aliases(&["text"]))
        .param(ParamSpec::optional("values", vec![T::Array]).aliases(&["replacements"]))
        .param(ParamSpec::optional("single", vec![T::Boolean]))
        .param(ParamSpec::optional("flatten", vec![T::Boolean]))
        .cacheable(),
        Graphql => OperatorDescriptor::new(
            kind,
            "GraphQL query against the configured endpoint",
            &["graphQl", "graphql", "gql"],
        )
        .param(ParamSpec::required("query", vec![T::String]))
        .param(ParamSpec::optional("variables", vec![T::Object]).entries())
        .param(ParamSpec::optional("url", vec![T::String]).aliases(&["endpoint"]))
        .param(headers())
        .param(ParamSpec::optional("returnNode", vec![T::String]).aliases(&["returnProperty", "outputProperty"]))
        .cacheable(),
        CustomFunctions => OperatorDescriptor::new(
            kind,
            "Call a registered custom function",
            &[
                "customFunctions",
                "customFunction",
                "objectFunctions",
                "function",
                "functions",
                "runFunction",
            ],
        )
        .param(
            ParamSpec::required("functionName", vec![T::String]).aliases(&["functionPath", "name"]),
        )
        .param(ParamSpec::optional("args", vec![T::Array]).aliases(&["arguments", "variables"]))
        .param(ParamSpec::optional("input", any()))
        .cacheable(),
        Passthru => OperatorDescriptor::new(
            kind,
            "Return the value unchanged, optionally converted by outputType",
            &["pass", "passThru", "passthru", "_", "coerce", "convert"],
        )
        .param(ParamSpec::required("value", any()).aliases(&["_", "data", "input"])),
    }
}
