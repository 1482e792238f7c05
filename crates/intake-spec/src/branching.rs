use crate::answers::Answers;
use crate::catalogue::Catalogue;
use crate::condition::evaluate;
use crate::spec::{Branch, QuestionGroup, QuestionOption};

/// A branch is active when every one of its conditions holds.
pub fn evaluate_branch(branch: &Branch, answers: &Answers) -> bool {
    !branch.conditions.is_empty()
        && branch
            .conditions
            .iter()
            .all(|condition| evaluate(condition, answers))
}

/// Active branches, highest priority first. Equal priorities keep catalogue
/// declaration order.
pub fn get_active_branches<'a>(catalogue: &'a Catalogue, answers: &Answers) -> Vec<&'a Branch> {
    let mut active: Vec<&Branch> = catalogue
        .branches()
        .iter()
        .filter(|branch| evaluate_branch(branch, answers))
        .collect();
    active.sort_by(|left, right| right.priority.cmp(&left.priority));

    log::debug!(
        "active branches: [{}]",
        active
            .iter()
            .map(|branch| branch.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    active
}

pub fn active_branch_ids(catalogue: &Catalogue, answers: &Answers) -> Vec<String> {
    get_active_branches(catalogue, answers)
        .into_iter()
        .map(|branch| branch.id.clone())
        .collect()
}

/// Branch an option advertises; informational only.
pub fn triggered_branch(option: &QuestionOption) -> Option<&str> {
    option.triggers_branch.as_deref()
}

/// A group that currently takes part in the questionnaire.
#[derive(Debug, Clone, Copy)]
pub struct RelevantGroup<'a> {
    pub group: &'a QuestionGroup,
    /// Branch that revealed the group; `None` for base groups.
    pub branch: Option<&'a Branch>,
}

impl RelevantGroup<'_> {
    pub fn is_branch(&self) -> bool {
        self.branch.is_some()
    }
}

/// Base groups plus groups revealed by active branches, in catalogue order.
pub fn relevant_groups<'a>(catalogue: &'a Catalogue, answers: &Answers) -> Vec<RelevantGroup<'a>> {
    let active = get_active_branches(catalogue, answers);

    for branch in &active {
        if catalogue.group(&branch.question_group_id).is_none() {
            log::warn!(
                "branch '{}' reveals unknown group '{}'; skipping",
                branch.id,
                branch.question_group_id
            );
        }
    }

    catalogue
        .groups()
        .iter()
        .filter_map(|group| {
            if group.is_base() {
                return Some(RelevantGroup {
                    group,
                    branch: None,
                });
            }
            active
                .iter()
                .find(|branch| branch.question_group_id == group.id)
                .map(|branch| RelevantGroup {
                    group,
                    branch: Some(*branch),
                })
        })
        .collect()
}
