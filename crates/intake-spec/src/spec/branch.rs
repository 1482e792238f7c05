use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::literal::Literal;

/// Comparison operator of a branch condition.
///
/// Operator strings outside the supported set are kept as `Unknown` so a
/// catalogue can still be inspected; they never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    In,
    NotIn,
    Contains,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "contains" => Operator::Contains,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(operator: Operator) -> Self {
        operator.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison between an answer and a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BranchCondition {
    pub question_id: String,
    #[schemars(with = "String")]
    pub operator: Operator,
    pub value: Literal,
}

impl BranchCondition {
    pub fn new(question_id: impl Into<String>, operator: Operator, value: Literal) -> Self {
        Self {
            question_id: question_id.into(),
            operator,
            value,
        }
    }
}

fn default_priority() -> i32 {
    0
}

/// A conditionally-activated question group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Branch {
    pub id: String,
    pub name: String,
    /// Implicit AND; must not be empty.
    pub conditions: Vec<BranchCondition>,
    pub question_group_id: String,
    /// Higher priorities are listed first.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

impl Branch {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        conditions: Vec<BranchCondition>,
        question_group_id: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            conditions,
            question_group_id: question_group_id.into(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_operator_survives_round_trip() {
        let condition: BranchCondition = serde_json::from_value(json!({
            "question_id": "species",
            "operator": "gt",
            "value": 3
        }))
        .expect("deserialize");
        assert_eq!(condition.operator, Operator::Unknown("gt".into()));
        let value = serde_json::to_value(&condition).expect("serialize");
        assert_eq!(value["operator"], "gt");
    }
}
