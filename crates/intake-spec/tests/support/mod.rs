#![allow(dead_code)]

use intake_spec::{Catalogue, Question, QuestionType, QuestionnaireState, validate_questionnaire};
use serde_json::{Value, json};

pub fn builtin() -> Catalogue {
    Catalogue::builtin().expect("builtin catalogue is valid")
}

pub fn state(answers: Value) -> QuestionnaireState {
    QuestionnaireState::from_answers_value(&answers)
}

pub fn sample_answer(question: &Question) -> Value {
    let first_option = question
        .options
        .first()
        .map(|option| option.value.clone())
        .unwrap_or_else(|| "other".into());
    match question.kind {
        QuestionType::ShortText | QuestionType::LongText | QuestionType::File => {
            json!(format!("sample answer for {}", question.id))
        }
        QuestionType::Number => json!(5),
        QuestionType::Date => json!("2024-01-15"),
        QuestionType::Boolean => json!(true),
        QuestionType::SingleSelect => json!(first_option),
        QuestionType::MultiSelect => json!([first_option]),
    }
}

/// Answers every missing required question, repeating while newly
/// activated branches add more.
pub fn fill_required(catalogue: &Catalogue, state: &mut QuestionnaireState) {
    for _ in 0..16 {
        let errors = validate_questionnaire(catalogue, state);
        if errors.is_empty() {
            return;
        }
        for error in errors {
            let question = catalogue
                .question(&error.question_id)
                .expect("error refers to a catalogue question");
            state.set_answer(question.id.clone(), sample_answer(question));
        }
    }
    panic!("questionnaire did not converge");
}
