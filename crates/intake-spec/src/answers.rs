use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::branching::active_branch_ids;
use crate::catalogue::Catalogue;
use crate::validate::validate_questionnaire;

/// Flat mapping from question id to answer value.
pub type Answers = Map<String, Value>;

/// Looks up an answer, treating JSON `null` as absent.
pub fn answer<'a>(answers: &'a Answers, question_id: &str) -> Option<&'a Value> {
    answers.get(question_id).filter(|value| !value.is_null())
}

/// Whether a value counts as an answer. Blank strings and empty selections
/// do not; `false` and `0` do.
pub fn is_answered(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

pub fn has_answer(answers: &Answers, question_id: &str) -> bool {
    answer(answers, question_id).is_some_and(is_answered)
}

/// Per-session questionnaire state.
///
/// `answers` is the only source of truth; `active_branches` and
/// `is_complete` are recomputed by [`QuestionnaireState::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireState {
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub active_branches: Vec<String>,
    #[serde(default)]
    pub completed_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_group_id: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
}

impl QuestionnaireState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: Answers) -> Self {
        Self {
            answers,
            ..Self::default()
        }
    }

    /// Builds a state from a JSON object; anything else yields empty answers.
    pub fn from_answers_value(answers: &Value) -> Self {
        Self::with_answers(answers.as_object().cloned().unwrap_or_default())
    }

    pub fn set_answer(&mut self, question_id: impl Into<String>, value: Value) {
        self.answers.insert(question_id.into(), value);
    }

    pub fn merge_answers(&mut self, answers: Answers) {
        self.answers.extend(answers);
    }

    pub fn complete_group(&mut self, group_id: impl Into<String>) {
        let group_id = group_id.into();
        if !self.completed_groups.contains(&group_id) {
            self.completed_groups.push(group_id);
        }
    }

    /// Recomputes the derived fields against `catalogue`.
    pub fn refresh(&mut self, catalogue: &Catalogue) {
        self.active_branches = active_branch_ids(catalogue, &self.answers);
        self.is_complete = validate_questionnaire(catalogue, self).is_empty();
    }
}

/// A structured, user-facing validation problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub question_id: String,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    pub fn new(
        question_id: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}
