use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::{branch::Branch, group::QuestionGroup};

/// Declarative catalogue document: groups and branches in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogueSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub groups: Vec<QuestionGroup>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}
