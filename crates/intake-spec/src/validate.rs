use regex::Regex;
use serde_json::Value;

use crate::answers::{QuestionnaireState, ValidationError, answer, has_answer};
use crate::branching::relevant_groups;
use crate::catalogue::Catalogue;
use crate::spec::{Question, RuleType, ValidationRule};
use crate::visibility::filter_visible_questions;

pub const MISSING_REQUIRED: &str = "required";

/// One error per visible required question without an answer, across base
/// groups and active branch groups in catalogue order.
pub fn validate_questionnaire(
    catalogue: &Catalogue,
    state: &QuestionnaireState,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for entry in relevant_groups(catalogue, &state.answers) {
        for question in filter_visible_questions(&entry.group.questions, &state.answers) {
            if !question.required || has_answer(&state.answers, &question.id) {
                continue;
            }
            let message = match entry.branch {
                Some(branch) => format!("Required ({}): {}", branch.name, question.label),
                None => format!("Required: {}", question.label),
            };
            errors.push(ValidationError::new(
                question.id.clone(),
                message,
                MISSING_REQUIRED,
            ));
        }
    }

    errors
}

/// Applies length, bound and pattern rules to the answers that are present
/// on visible questions. Values of an unexpected type are skipped.
pub fn check_answer_rules(
    catalogue: &Catalogue,
    state: &QuestionnaireState,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for entry in relevant_groups(catalogue, &state.answers) {
        for question in filter_visible_questions(&entry.group.questions, &state.answers) {
            let Some(value) = answer(&state.answers, &question.id) else {
                continue;
            };
            for rule in &question.validation {
                if violates(rule, value) {
                    errors.push(rule_error(question, rule));
                }
            }
        }
    }

    errors
}

fn violates(rule: &ValidationRule, value: &Value) -> bool {
    match rule.rule_type {
        RuleType::Required => false,
        RuleType::MinLength => rule
            .length()
            .zip(length_of(value))
            .is_some_and(|(min, len)| len < min),
        RuleType::MaxLength => rule
            .length()
            .zip(length_of(value))
            .is_some_and(|(max, len)| len > max),
        RuleType::NumericMin => rule
            .bound()
            .zip(value.as_f64())
            .is_some_and(|(min, number)| number < min),
        RuleType::NumericMax => rule
            .bound()
            .zip(value.as_f64())
            .is_some_and(|(max, number)| number > max),
        RuleType::Pattern => {
            if let Some(pattern) = rule.pattern()
                && let Some(text) = value.as_str()
                && let Ok(regex) = Regex::new(pattern)
            {
                !regex.is_match(text)
            } else {
                false
            }
        }
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn rule_error(question: &Question, rule: &ValidationRule) -> ValidationError {
    ValidationError::new(
        question.id.clone(),
        rule.message.clone(),
        rule.rule_type.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CatalogueSpec, QuestionGroup, QuestionType};
    use serde_json::json;

    fn catalogue() -> Catalogue {
        let group = QuestionGroup::new(
            "base",
            "Base",
            vec![
                Question::new("email", QuestionType::ShortText, "Email").with_rule(
                    ValidationRule::new(
                        RuleType::Pattern,
                        json!(r"^[^@\s]+@[^@\s]+\.[a-z]{2,}$"),
                        "Please enter a valid email address",
                    ),
                ),
                Question::new("title", QuestionType::ShortText, "Title").with_rule(
                    ValidationRule::new(RuleType::MinLength, json!(5), "Too short"),
                ),
                Question::new("count", QuestionType::Number, "Count")
                    .with_rule(ValidationRule::new(RuleType::NumericMin, json!(1), "At least 1"))
                    .with_rule(ValidationRule::new(RuleType::NumericMax, json!(10), "At most 10")),
            ],
        );
        Catalogue::new(CatalogueSpec {
            id: "rules".into(),
            title: "Rules".into(),
            version: "1".into(),
            description: None,
            groups: vec![group],
            branches: vec![],
        })
        .expect("valid catalogue")
    }

    #[test]
    fn missing_answers_are_reported_in_order() {
        let catalogue = catalogue();
        let errors = validate_questionnaire(&catalogue, &QuestionnaireState::new());
        let ids: Vec<&str> = errors.iter().map(|error| error.question_id.as_str()).collect();
        assert_eq!(ids, vec!["email", "title", "count"]);
        assert_eq!(errors[0].message, "Required: Email");
        assert_eq!(errors[0].code, MISSING_REQUIRED);
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let catalogue = catalogue();
        let state = QuestionnaireState::from_answers_value(&json!({
            "email": "  ",
            "title": "Valid title",
            "count": 0
        }));
        let errors = validate_questionnaire(&catalogue, &state);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].question_id, "email");
    }

    #[test]
    fn rule_checks_report_shape_violations() {
        let catalogue = catalogue();
        let state = QuestionnaireState::from_answers_value(&json!({
            "email": "not-an-email",
            "title": "abc",
            "count": 11
        }));
        let errors = check_answer_rules(&catalogue, &state);
        let codes: Vec<&str> = errors.iter().map(|error| error.code.as_str()).collect();
        assert_eq!(codes, vec!["pattern", "min_length", "max"]);
        assert_eq!(errors[0].message, "Please enter a valid email address");
    }

    #[test]
    fn rule_checks_skip_absent_and_mistyped_answers() {
        let catalogue = catalogue();
        let state = QuestionnaireState::from_answers_value(&json!({
            "email": "pi@university.edu",
            "count": "seven"
        }));
        assert!(check_answer_rules(&catalogue, &state).is_empty());
    }
}
