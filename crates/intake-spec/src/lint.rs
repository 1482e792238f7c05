use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use thiserror::Error;

use crate::spec::{
    CatalogueSpec, Literal, Operator, Question, QuestionType, RuleType, ValidationRule,
};

/// A single authoring problem found in a catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintIssue {
    #[error("duplicate question id '{0}'")]
    DuplicateQuestion(String),
    #[error("duplicate group id '{0}'")]
    DuplicateGroup(String),
    #[error("duplicate branch id '{0}'")]
    DuplicateBranch(String),
    #[error("branch '{0}' has no conditions")]
    EmptyConditions(String),
    #[error("branch '{branch_id}' uses unknown operator '{operator}'")]
    UnknownOperator { branch_id: String, operator: String },
    #[error("branch '{branch_id}' operator '{operator}' expects {expected}")]
    LiteralShape {
        branch_id: String,
        operator: String,
        expected: &'static str,
    },
    #[error("branch '{branch_id}' reveals unknown group '{group_id}'")]
    DanglingBranchGroup { branch_id: String, group_id: String },
    #[error("branch '{branch_id}' tests unknown question '{question_id}'")]
    DanglingConditionQuestion {
        branch_id: String,
        question_id: String,
    },
    #[error("group '{group_id}' links unknown branch '{branch_id}'")]
    DanglingGroupBranch { group_id: String, branch_id: String },
    #[error("question '{question_id}' show_when references unknown question '{target}'")]
    DanglingShowWhen { question_id: String, target: String },
    #[error("question '{question_id}' depends on unknown question '{target}'")]
    DanglingDependsOn { question_id: String, target: String },
    #[error("question '{question_id}' depends on '{target}' which is not a show_when key")]
    DependsOnNotInShowWhen { question_id: String, target: String },
    #[error("question '{question_id}' option '{option}' triggers unknown branch '{branch_id}'")]
    DanglingTrigger {
        question_id: String,
        option: String,
        branch_id: String,
    },
    #[error("question '{question_id}' rule '{rule}' has an invalid value")]
    RuleValue { question_id: String, rule: String },
    #[error("question '{question_id}' pattern does not compile: {reason}")]
    InvalidPattern { question_id: String, reason: String },
    #[error("select question '{0}' has no options")]
    MissingOptions(String),
}

/// Every issue found by [`lint`], in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LintReport {
    pub issues: Vec<LintIssue>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} catalogue issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

/// Checks a catalogue document for duplicate ids, dangling references and
/// malformed literals or rules.
pub fn lint(spec: &CatalogueSpec) -> LintReport {
    let mut issues = Vec::new();

    let mut question_ids = BTreeSet::new();
    let mut group_ids = BTreeSet::new();
    let mut branch_ids = BTreeSet::new();

    for group in &spec.groups {
        if !group_ids.insert(group.id.as_str()) {
            issues.push(LintIssue::DuplicateGroup(group.id.clone()));
        }
        for question in &group.questions {
            if !question_ids.insert(question.id.as_str()) {
                issues.push(LintIssue::DuplicateQuestion(question.id.clone()));
            }
        }
    }
    for branch in &spec.branches {
        if !branch_ids.insert(branch.id.as_str()) {
            issues.push(LintIssue::DuplicateBranch(branch.id.clone()));
        }
    }

    for branch in &spec.branches {
        if branch.conditions.is_empty() {
            issues.push(LintIssue::EmptyConditions(branch.id.clone()));
        }
        if !group_ids.contains(branch.question_group_id.as_str()) {
            issues.push(LintIssue::DanglingBranchGroup {
                branch_id: branch.id.clone(),
                group_id: branch.question_group_id.clone(),
            });
        }
        for condition in &branch.conditions {
            if !question_ids.contains(condition.question_id.as_str()) {
                issues.push(LintIssue::DanglingConditionQuestion {
                    branch_id: branch.id.clone(),
                    question_id: condition.question_id.clone(),
                });
            }
            let expected = match (&condition.operator, &condition.value) {
                (Operator::Unknown(operator), _) => {
                    issues.push(LintIssue::UnknownOperator {
                        branch_id: branch.id.clone(),
                        operator: operator.clone(),
                    });
                    None
                }
                (Operator::In | Operator::NotIn, literal) if !literal.is_list() => {
                    Some("a list of strings")
                }
                (Operator::Contains, Literal::List(_)) => Some("a scalar value"),
                _ => None,
            };
            if let Some(expected) = expected {
                issues.push(LintIssue::LiteralShape {
                    branch_id: branch.id.clone(),
                    operator: condition.operator.to_string(),
                    expected,
                });
            }
        }
    }

    for group in &spec.groups {
        if let Some(branch_id) = &group.branch_id
            && !branch_ids.contains(branch_id.as_str())
        {
            issues.push(LintIssue::DanglingGroupBranch {
                group_id: group.id.clone(),
                branch_id: branch_id.clone(),
            });
        }
        for question in &group.questions {
            lint_question(question, &question_ids, &branch_ids, &mut issues);
        }
    }

    LintReport { issues }
}

fn lint_question(
    question: &Question,
    question_ids: &BTreeSet<&str>,
    branch_ids: &BTreeSet<&str>,
    issues: &mut Vec<LintIssue>,
) {
    if let Some(show_when) = &question.show_when {
        for target in show_when.keys() {
            if !question_ids.contains(target.as_str()) {
                issues.push(LintIssue::DanglingShowWhen {
                    question_id: question.id.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    if let Some(target) = &question.depends_on {
        if !question_ids.contains(target.as_str()) {
            issues.push(LintIssue::DanglingDependsOn {
                question_id: question.id.clone(),
                target: target.clone(),
            });
        } else if let Some(show_when) = &question.show_when
            && !show_when.contains_key(target)
        {
            issues.push(LintIssue::DependsOnNotInShowWhen {
                question_id: question.id.clone(),
                target: target.clone(),
            });
        }
    }

    if question.kind.is_select() && question.options.is_empty() {
        issues.push(LintIssue::MissingOptions(question.id.clone()));
    }

    for option in &question.options {
        if let Some(branch_id) = &option.triggers_branch
            && !branch_ids.contains(branch_id.as_str())
        {
            issues.push(LintIssue::DanglingTrigger {
                question_id: question.id.clone(),
                option: option.value.clone(),
                branch_id: branch_id.clone(),
            });
        }
    }

    for rule in &question.validation {
        if let Some(issue) = lint_rule(question, rule) {
            issues.push(issue);
        }
    }
}

fn lint_rule(question: &Question, rule: &ValidationRule) -> Option<LintIssue> {
    let valid = match rule.rule_type {
        RuleType::Required => true,
        RuleType::MinLength | RuleType::MaxLength => rule.length().is_some(),
        RuleType::NumericMin | RuleType::NumericMax => {
            rule.bound().is_some() && matches!(question.kind, QuestionType::Number)
        }
        RuleType::Pattern => match rule.pattern() {
            Some(pattern) => {
                if let Err(err) = Regex::new(pattern) {
                    return Some(LintIssue::InvalidPattern {
                        question_id: question.id.clone(),
                        reason: err.to_string(),
                    });
                }
                true
            }
            None => false,
        },
    };

    (!valid).then(|| LintIssue::RuleValue {
        question_id: question.id.clone(),
        rule: rule.rule_type.as_str().to_string(),
    })
}
