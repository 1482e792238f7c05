#![allow(missing_docs)]

pub mod answers;
pub mod branching;
pub mod catalogue;
pub mod condition;
pub mod lint;
pub mod progress;
pub mod render;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{Answers, QuestionnaireState, ValidationError, has_answer, is_answered};
pub use branching::{
    RelevantGroup, active_branch_ids, evaluate_branch, get_active_branches, relevant_groups,
    triggered_branch,
};
pub use catalogue::{Catalogue, CatalogueError};
pub use condition::evaluate;
pub use lint::{LintIssue, LintReport, lint};
pub use progress::{
    ProgressSummary, calculate_progress, get_next_questions, next_groups, next_question,
    progress_summary,
};
pub use render::{
    FormSchema, OptionTrigger, options_with_triggers, render_question_group,
    render_question_property, render_question_ui_schema, render_questionnaire,
    render_single_group, render_text,
};
pub use spec::{
    Branch, BranchCondition, CatalogueSpec, Literal, Operator, Question, QuestionGroup,
    QuestionOption, QuestionType, RuleType, ValidationRule,
};
pub use validate::{check_answer_rules, validate_questionnaire};
pub use visibility::{filter_visible_questions, should_show_question};
