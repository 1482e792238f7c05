use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison literal used by branch conditions and `show_when` maps.
///
/// Only scalars and string sequences are representable; any other JSON
/// shape is rejected while the catalogue is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl Literal {
    /// Strict equality against an answer value. No cross-type coercion.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Literal::Number(expected), Value::Number(actual)) => {
                actual.as_f64().is_some_and(|actual| actual == *expected)
            }
            (Literal::String(expected), Value::String(actual)) => expected == actual,
            (Literal::List(expected), Value::Array(actual)) => {
                expected.len() == actual.len()
                    && expected
                        .iter()
                        .zip(actual)
                        .all(|(expected, actual)| actual.as_str() == Some(expected.as_str()))
            }
            _ => false,
        }
    }

    /// Whether `value` equals one of the members of a sequence literal.
    /// Scalar literals have no members.
    pub fn has_member(&self, value: &Value) -> bool {
        match self {
            Literal::List(items) => value
                .as_str()
                .is_some_and(|value| items.iter().any(|item| item == value)),
            _ => false,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Literal::List(_))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<Vec<&str>> for Literal {
    fn from(values: Vec<&str>) -> Self {
        Literal::List(values.into_iter().map(str::to_string).collect())
    }
}
