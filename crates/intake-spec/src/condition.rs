use crate::answers::{Answers, answer};
use crate::spec::{BranchCondition, Operator};

/// Evaluates one branch condition against the answer map.
///
/// A missing answer never satisfies any operator, negations included.
pub fn evaluate(condition: &BranchCondition, answers: &Answers) -> bool {
    let Some(value) = answer(answers, &condition.question_id) else {
        return false;
    };
    let literal = &condition.value;

    match &condition.operator {
        Operator::Eq => literal.matches(value),
        Operator::Ne => !literal.matches(value),
        Operator::In => literal.has_member(value),
        Operator::NotIn => !literal.has_member(value),
        Operator::Contains => value
            .as_array()
            .is_some_and(|items| items.iter().any(|item| literal.matches(item))),
        Operator::Unknown(_) => false,
    }
}
