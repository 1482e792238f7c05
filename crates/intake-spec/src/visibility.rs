use crate::answers::{Answers, answer};
use crate::spec::Question;

/// Whether the question is currently eligible to be shown.
///
/// Every `show_when` pair must match; a missing referenced answer hides the
/// question. `depends_on` does not gate visibility.
pub fn should_show_question(question: &Question, answers: &Answers) -> bool {
    let Some(show_when) = &question.show_when else {
        return true;
    };
    show_when.iter().all(|(question_id, expected)| {
        answer(answers, question_id).is_some_and(|value| expected.matches(value))
    })
}

/// Visible questions sorted by `order`; ties keep input order.
pub fn filter_visible_questions<'a, I>(questions: I, answers: &Answers) -> Vec<&'a Question>
where
    I: IntoIterator<Item = &'a Question>,
{
    let mut sorted: Vec<&Question> = questions.into_iter().collect();
    sorted.sort_by_key(|question| question.order);
    sorted
        .into_iter()
        .filter(|question| should_show_question(question, answers))
        .collect()
}
