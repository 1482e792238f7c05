use serde::Serialize;

use crate::answers::{Answers, QuestionnaireState, has_answer};
use crate::branching::{get_active_branches, relevant_groups};
use crate::catalogue::Catalogue;
use crate::spec::{Question, QuestionGroup};
use crate::visibility::filter_visible_questions;

/// Answered versus total visible required questions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub answered: usize,
    pub total: usize,
    pub ratio: f64,
}

pub fn progress_summary(catalogue: &Catalogue, state: &QuestionnaireState) -> ProgressSummary {
    let mut answered = 0;
    let mut total = 0;

    for entry in relevant_groups(catalogue, &state.answers) {
        for question in filter_visible_questions(&entry.group.questions, &state.answers) {
            if !question.required {
                continue;
            }
            total += 1;
            if has_answer(&state.answers, &question.id) {
                answered += 1;
            }
        }
    }

    let ratio = if total == 0 {
        0.0
    } else {
        answered as f64 / total as f64
    };

    ProgressSummary {
        answered,
        total,
        ratio,
    }
}

/// Fraction of currently relevant required questions that are answered.
/// A questionnaire with nothing required reports `0.0`.
pub fn calculate_progress(catalogue: &Catalogue, state: &QuestionnaireState) -> f64 {
    progress_summary(catalogue, state).ratio
}

fn pending_questions<'a>(group: &'a QuestionGroup, answers: &Answers) -> Vec<&'a Question> {
    filter_visible_questions(&group.questions, answers)
        .into_iter()
        .filter(|question| !has_answer(answers, &question.id))
        .collect()
}

/// Unanswered visible questions of the current group, or of the first
/// relevant group that is not completed and still has some. A completed or
/// exhausted current group falls through to the others.
pub fn get_next_questions<'a>(
    catalogue: &'a Catalogue,
    state: &QuestionnaireState,
) -> Vec<&'a Question> {
    let relevant = relevant_groups(catalogue, &state.answers);

    if let Some(current) = &state.current_group_id
        && !state.completed_groups.contains(current)
        && let Some(entry) = relevant.iter().find(|entry| &entry.group.id == current)
    {
        let pending = pending_questions(entry.group, &state.answers);
        if !pending.is_empty() {
            return pending;
        }
    }

    relevant
        .iter()
        .filter(|entry| !state.completed_groups.contains(&entry.group.id))
        .map(|entry| pending_questions(entry.group, &state.answers))
        .find(|pending| !pending.is_empty())
        .unwrap_or_default()
}

pub fn next_question<'a>(
    catalogue: &'a Catalogue,
    state: &QuestionnaireState,
) -> Option<&'a Question> {
    get_next_questions(catalogue, state).into_iter().next()
}

/// Groups still to present: base groups first, then active branch groups by
/// priority, skipping completed ones.
pub fn next_groups<'a>(
    catalogue: &'a Catalogue,
    state: &QuestionnaireState,
) -> Vec<&'a QuestionGroup> {
    let mut groups: Vec<&QuestionGroup> = catalogue.base_groups().collect();
    for branch in get_active_branches(catalogue, &state.answers) {
        match catalogue.group(&branch.question_group_id) {
            Some(group) if !groups.iter().any(|existing| existing.id == group.id) => {
                groups.push(group)
            }
            Some(_) => {}
            None => log::warn!(
                "branch '{}' reveals unknown group '{}'; skipping",
                branch.id,
                branch.question_group_id
            ),
        }
    }
    groups.retain(|group| !state.completed_groups.contains(&group.id));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Branch, BranchCondition, CatalogueSpec, Operator, QuestionType};
    use serde_json::json;

    fn catalogue() -> Catalogue {
        let base = QuestionGroup::new(
            "base",
            "Base",
            vec![
                Question::new("name", QuestionType::ShortText, "Name").with_order(1),
                Question::new("extra", QuestionType::Boolean, "Extra").with_order(2),
                Question::new("notes", QuestionType::LongText, "Notes")
                    .optional()
                    .with_order(3),
            ],
        );
        let extra = QuestionGroup::new(
            "extra_group",
            "Extra",
            vec![
                Question::new("extra_a", QuestionType::ShortText, "A"),
                Question::new("extra_b", QuestionType::ShortText, "B"),
            ],
        )
        .for_branch("extra_branch");
        Catalogue::new(CatalogueSpec {
            id: "progress".into(),
            title: "Progress".into(),
            version: "1".into(),
            description: None,
            groups: vec![base, extra],
            branches: vec![Branch::new(
                "extra_branch",
                "Extra",
                vec![BranchCondition::new("extra", Operator::Eq, true.into())],
                "extra_group",
                1,
            )],
        })
        .expect("valid catalogue")
    }

    #[test]
    fn empty_state_has_zero_progress() {
        let catalogue = catalogue();
        assert_eq!(calculate_progress(&catalogue, &QuestionnaireState::new()), 0.0);
    }

    #[test]
    fn no_required_questions_is_zero_not_nan() {
        let catalogue = Catalogue::new(CatalogueSpec {
            id: "empty".into(),
            title: "Empty".into(),
            version: "1".into(),
            description: None,
            groups: vec![QuestionGroup::new(
                "base",
                "Base",
                vec![Question::new("notes", QuestionType::LongText, "Notes").optional()],
            )],
            branches: vec![],
        })
        .expect("valid catalogue");
        let summary = progress_summary(&catalogue, &QuestionnaireState::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.ratio, 0.0);
    }

    #[test]
    fn activating_a_branch_can_lower_progress() {
        let catalogue = catalogue();
        let mut state = QuestionnaireState::from_answers_value(&json!({ "name": "Ada" }));
        assert_eq!(calculate_progress(&catalogue, &state), 0.5);

        state.set_answer("extra", json!(false));
        assert_eq!(calculate_progress(&catalogue, &state), 1.0);

        state.set_answer("extra", json!(true));
        let summary = progress_summary(&catalogue, &state);
        assert_eq!((summary.answered, summary.total), (2, 4));
        assert_eq!(summary.ratio, 0.5);
    }

    #[test]
    fn next_questions_skip_answered_and_hidden() {
        let catalogue = catalogue();
        let state = QuestionnaireState::from_answers_value(&json!({ "name": "Ada" }));
        let ids: Vec<&str> = get_next_questions(&catalogue, &state)
            .iter()
            .map(|question| question.id.as_str())
            .collect();
        assert_eq!(ids, vec!["extra", "notes"]);
    }

    #[test]
    fn next_questions_move_past_completed_groups() {
        let catalogue = catalogue();
        let mut state =
            QuestionnaireState::from_answers_value(&json!({ "name": "Ada", "extra": true }));
        state.complete_group("base");
        let next = next_question(&catalogue, &state).map(|question| question.id.as_str());
        assert_eq!(next, Some("extra_a"));
    }

    #[test]
    fn current_group_takes_precedence() {
        let catalogue = catalogue();
        let mut state = QuestionnaireState::from_answers_value(&json!({ "extra": true }));
        state.current_group_id = Some("extra_group".into());
        let next = next_question(&catalogue, &state).map(|question| question.id.as_str());
        assert_eq!(next, Some("extra_a"));
    }

    #[test]
    fn completed_current_group_falls_through() {
        let catalogue = catalogue();
        let mut state =
            QuestionnaireState::from_answers_value(&json!({ "name": "Ada", "extra": true }));
        state.current_group_id = Some("base".into());
        let next = next_question(&catalogue, &state).map(|question| question.id.as_str());
        assert_eq!(next, Some("notes"));

        state.complete_group("base");
        let next = next_question(&catalogue, &state).map(|question| question.id.as_str());
        assert_eq!(next, Some("extra_a"));
    }

    #[test]
    fn exhausted_current_group_falls_through() {
        let catalogue = catalogue();
        let mut state = QuestionnaireState::from_answers_value(
            &json!({ "extra": true, "extra_a": "a", "extra_b": "b" }),
        );
        state.current_group_id = Some("extra_group".into());
        let next = next_question(&catalogue, &state).map(|question| question.id.as_str());
        assert_eq!(next, Some("name"));
    }

    #[test]
    fn next_groups_exclude_completed() {
        let catalogue = catalogue();
        let mut state = QuestionnaireState::from_answers_value(&json!({ "extra": true }));
        let ids: Vec<&str> = next_groups(&catalogue, &state)
            .iter()
            .map(|group| group.id.as_str())
            .collect();
        assert_eq!(ids, vec!["base", "extra_group"]);

        state.complete_group("base");
        let ids: Vec<&str> = next_groups(&catalogue, &state)
            .iter()
            .map(|group| group.id.as_str())
            .collect();
        assert_eq!(ids, vec!["extra_group"]);
    }
}
