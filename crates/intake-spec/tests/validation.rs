mod support;

use std::sync::Arc;
use std::thread;

use intake_spec::{
    QuestionnaireState, calculate_progress, check_answer_rules, progress_summary,
    validate_questionnaire,
};
use serde_json::json;
use support::{builtin, fill_required, state};

#[test]
fn empty_state_reports_every_required_base_question() {
    let catalogue = builtin();
    let errors = validate_questionnaire(&catalogue, &QuestionnaireState::new());

    for group in catalogue.base_groups() {
        for question in group.questions.iter().filter(|q| q.required && q.show_when.is_none()) {
            assert!(
                errors.iter().any(|error| error.question_id == question.id),
                "missing error for {}",
                question.id
            );
        }
    }
    assert_eq!(errors[0].question_id, "protocol_title");
    assert_eq!(errors[0].message, "Required: Protocol Title");
}

#[test]
fn branch_errors_name_the_branch() {
    let catalogue = builtin();
    let errors = validate_questionnaire(&catalogue, &state(json!({ "pain_category": "E" })));
    let error = errors
        .iter()
        .find(|error| error.question_id == "category_e_justification")
        .expect("category E question is required");
    assert_eq!(
        error.message,
        "Required (Category E Justification): Scientific Justification for Category E"
    );
}

#[test]
fn hidden_questions_are_not_required() {
    let catalogue = builtin();
    let errors = validate_questionnaire(
        &catalogue,
        &state(json!({ "species": "primate", "primate_social_housing": true })),
    );
    assert!(errors.iter().any(|error| error.question_id == "primate_enrichment_plan"));
    assert!(!errors
        .iter()
        .any(|error| error.question_id == "primate_single_housing_justification"));
}

#[test]
fn progress_is_zero_for_empty_state() {
    let catalogue = builtin();
    assert_eq!(calculate_progress(&catalogue, &QuestionnaireState::new()), 0.0);
}

#[test]
fn fully_answered_state_is_complete() {
    let catalogue = builtin();
    let mut state = QuestionnaireState::new();
    fill_required(&catalogue, &mut state);

    assert!(validate_questionnaire(&catalogue, &state).is_empty());
    assert_eq!(calculate_progress(&catalogue, &state), 1.0);

    state.refresh(&catalogue);
    assert!(state.is_complete);
    assert!(state.active_branches.contains(&"surgery_branch".to_string()));
}

#[test]
fn new_branch_can_lower_progress() {
    let catalogue = builtin();
    let mut state = QuestionnaireState::new();
    fill_required(&catalogue, &mut state);
    let before = calculate_progress(&catalogue, &state);
    assert_eq!(before, 1.0);

    state.set_answer("pain_category", json!("E"));
    let after = progress_summary(&catalogue, &state);
    assert!(after.ratio < before);
    assert_eq!(after.total - after.answered, 3);
}

#[test]
fn progress_stays_within_bounds_while_filling() {
    let catalogue = builtin();
    let mut state = QuestionnaireState::new();
    for question_id in ["protocol_title", "pi_name", "species", "procedure_types"] {
        let value = match question_id {
            "species" => json!("dog"),
            "procedure_types" => json!(["imaging"]),
            _ => json!("answered"),
        };
        state.set_answer(question_id, value);
        let progress = calculate_progress(&catalogue, &state);
        assert!((0.0..=1.0).contains(&progress));
    }
}

#[test]
fn refresh_tracks_answers() {
    let catalogue = builtin();
    let mut state = state(json!({ "species": "zebrafish" }));
    state.refresh(&catalogue);
    assert_eq!(state.active_branches, vec!["fish_branch"]);
    assert!(!state.is_complete);

    state.set_answer("species", json!("rat"));
    state.refresh(&catalogue);
    assert_eq!(state.active_branches, vec!["rat_branch"]);
}

#[test]
fn rule_checks_use_catalogue_rules() {
    let catalogue = builtin();
    let errors = check_answer_rules(
        &catalogue,
        &state(json!({
            "protocol_title": "Short",
            "pi_email": "not an email",
            "total_animals": 0
        })),
    );
    let messages: Vec<&str> = errors.iter().map(|error| error.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Title must be at least 10 characters",
            "Please enter a valid email address",
            "At least 1 animal is required",
        ]
    );
}

#[test]
fn catalogue_can_be_shared_between_sessions() {
    let catalogue = Arc::new(builtin());
    let handles: Vec<_> = ["mouse", "rabbit", "primate", "zebrafish"]
        .into_iter()
        .map(|species| {
            let catalogue = Arc::clone(&catalogue);
            thread::spawn(move || {
                let mut state = QuestionnaireState::new();
                state.set_answer("species", json!(species));
                state.refresh(&catalogue);
                state.active_branches
            })
        })
        .collect();

    let results: Vec<Vec<String>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("session thread"))
        .collect();
    assert_eq!(results[0], vec!["mouse_branch"]);
    assert_eq!(results[1], vec!["usda_covered_branch"]);
    assert_eq!(results[2], vec!["primate_branch"]);
    assert_eq!(results[3], vec!["fish_branch"]);
}
