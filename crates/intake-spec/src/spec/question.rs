use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::literal::Literal;

/// Supported question input types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Single-line free text.
    #[serde(rename = "text")]
    ShortText,
    /// Multi-line free text.
    #[serde(rename = "textarea")]
    LongText,
    Number,
    SingleSelect,
    MultiSelect,
    Date,
    #[serde(rename = "yes_no")]
    Boolean,
    File,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ShortText => "text",
            QuestionType::LongText => "textarea",
            QuestionType::Number => "number",
            QuestionType::SingleSelect => "single_select",
            QuestionType::MultiSelect => "multi_select",
            QuestionType::Date => "date",
            QuestionType::Boolean => "yes_no",
            QuestionType::File => "file",
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, QuestionType::SingleSelect | QuestionType::MultiSelect)
    }
}

/// A selectable answer for select-type questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// Branch this option is expected to reveal. Advisory only: activation
    /// is decided by the branch conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers_branch: Option<String>,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            help_text: None,
            triggers_branch: None,
        }
    }

    pub fn triggers(mut self, branch_id: impl Into<String>) -> Self {
        self.triggers_branch = Some(branch_id.into());
        self
    }
}

/// Kinds of advisory validation rules attached to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Required,
    MinLength,
    MaxLength,
    #[serde(rename = "min", alias = "numeric_min")]
    NumericMin,
    #[serde(rename = "max", alias = "numeric_max")]
    NumericMax,
    #[serde(rename = "pattern", alias = "pattern_match")]
    Pattern,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Required => "required",
            RuleType::MinLength => "min_length",
            RuleType::MaxLength => "max_length",
            RuleType::NumericMin => "min",
            RuleType::NumericMax => "max",
            RuleType::Pattern => "pattern",
        }
    }
}

/// Validation metadata consumed by renderers and the optional shape checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRule {
    pub rule_type: RuleType,
    #[serde(default)]
    pub value: Value,
    pub message: String,
}

impl ValidationRule {
    pub fn new(rule_type: RuleType, value: Value, message: impl Into<String>) -> Self {
        Self {
            rule_type,
            value,
            message: message.into(),
        }
    }

    /// Rule value as a length bound, if it is a non-negative integer.
    pub fn length(&self) -> Option<usize> {
        self.value.as_u64().and_then(|len| usize::try_from(len).ok())
    }

    /// Rule value as a numeric bound.
    pub fn bound(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.value.as_str()
    }
}

fn default_required() -> bool {
    true
}

/// Definition of a single questionnaire question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulatory_reference: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Informational lineage; visibility is gated by `show_when` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<BTreeMap<String, Literal>>,
    #[serde(default)]
    pub order: i32,
}

impl Question {
    /// Minimal required question, mostly useful for synthetic catalogues.
    pub fn new(id: impl Into<String>, kind: QuestionType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            help_text: None,
            regulatory_reference: None,
            required: true,
            options: Vec::new(),
            validation: Vec::new(),
            default_value: None,
            placeholder: None,
            depends_on: None,
            show_when: None,
            order: 0,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Shows the question only when `question_id` was answered with `expected`.
    pub fn shown_when(mut self, question_id: impl Into<String>, expected: Literal) -> Self {
        let question_id = question_id.into();
        self.depends_on = Some(question_id.clone());
        self.show_when
            .get_or_insert_with(BTreeMap::new)
            .insert(question_id, expected);
        self
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.value == value)
    }
}
