use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::Question;

/// A titled group of questions. Groups without `branch_id` are base groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionGroup {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

impl QuestionGroup {
    pub fn new(id: impl Into<String>, title: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            questions,
            order: 0,
            branch_id: None,
        }
    }

    pub fn for_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    pub fn is_base(&self) -> bool {
        self.branch_id.is_none()
    }

    /// Questions sorted by display order; ties keep declaration order.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.iter().collect();
        questions.sort_by_key(|question| question.order);
        questions
    }
}
