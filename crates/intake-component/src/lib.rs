use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use intake_spec::{
    Catalogue, CatalogueError, QuestionnaireState, ValidationError, check_answer_rules,
    get_active_branches, get_next_questions, next_groups, options_with_triggers, progress_summary,
    render_questionnaire as spec_render_questionnaire, render_single_group, render_text as spec_render_text,
    validate_questionnaire,
};

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse input: {0}")]
    InputParse(#[source] serde_json::Error),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
    #[error("group '{0}' is not available")]
    GroupUnavailable(String),
    #[error("question '{0}' is not available")]
    QuestionUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    /// Catalogue document overriding the built-in one.
    #[serde(default)]
    catalogue_json: Option<String>,
}

fn load_catalogue(config_json: &str) -> Result<Catalogue, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    match config.catalogue_json.as_deref() {
        Some(json) => Ok(Catalogue::from_json_str(json)?),
        None => Ok(Catalogue::builtin()?),
    }
}

/// Accepts either a full state object or a bare answers map.
fn parse_state(state_json: &str) -> Result<QuestionnaireState, ComponentError> {
    if state_json.trim().is_empty() {
        return Ok(QuestionnaireState::new());
    }
    let value: Value = serde_json::from_str(state_json).map_err(ComponentError::InputParse)?;
    let is_state = value
        .as_object()
        .is_some_and(|map| map.get("answers").is_some_and(Value::is_object));
    if is_state {
        serde_json::from_value(value).map_err(ComponentError::InputParse)
    } else {
        Ok(QuestionnaireState::from_answers_value(&value))
    }
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => {
            log::debug!("component call failed: {}", err);
            json!({ "error": err.to_string() }).to_string()
        }
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

pub fn describe(config_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| encode(catalogue.spec())))
}

/// Lints the configured catalogue; reports `{ "valid": true, ... }` or the
/// full list of issues.
pub fn lint(config_json: &str) -> String {
    let result = match load_catalogue(config_json) {
        Ok(catalogue) => Ok(json!({
            "valid": true,
            "id": catalogue.id(),
            "version": catalogue.version(),
            "groups": catalogue.groups().len(),
            "questions": catalogue.questions().count(),
            "branches": catalogue.branches().len(),
        })),
        Err(ComponentError::Catalogue(CatalogueError::Lint { id, report })) => Ok(json!({
            "valid": false,
            "id": id,
            "issues": report
                .issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        })),
        Err(err) => Err(err),
    };
    respond(result)
}

pub fn active_branches(config_json: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        let branches = get_active_branches(&catalogue, &state.answers)
            .into_iter()
            .map(|branch| {
                json!({
                    "id": branch.id,
                    "name": branch.name,
                    "question_group_id": branch.question_group_id,
                    "priority": branch.priority,
                })
            })
            .collect::<Vec<_>>();
        Ok(Value::Array(branches))
    }))
}

fn progress_value(catalogue: &Catalogue, state: &QuestionnaireState) -> Value {
    let summary = progress_summary(catalogue, state);
    json!({
        "answered": summary.answered,
        "total": summary.total,
        "ratio": summary.ratio,
    })
}

pub fn progress(config_json: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        Ok(progress_value(&catalogue, &state))
    }))
}

fn next_value(catalogue: &Catalogue, state: &QuestionnaireState) -> Value {
    let pending = get_next_questions(catalogue, state)
        .into_iter()
        .map(|question| question.id.clone())
        .collect::<Vec<_>>();
    let pending_group = pending
        .first()
        .and_then(|id| catalogue.group_of(id))
        .map(|group| group.id.clone());
    let groups = next_groups(catalogue, state)
        .into_iter()
        .map(|group| group.id.clone())
        .collect::<Vec<_>>();
    // Optional questions still on offer keep the session open.
    let complete = pending.is_empty() && validate_questionnaire(catalogue, state).is_empty();
    json!({
        "status": if complete { "complete" } else { "need_input" },
        "next_question_id": pending.first().cloned(),
        "next_question_ids": pending,
        "next_group_id": pending_group,
        "next_group_ids": groups,
        "progress": progress_value(catalogue, state),
    })
}

pub fn next(config_json: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        Ok(next_value(&catalogue, &state))
    }))
}

fn validation_value(errors: &[ValidationError]) -> Result<Value, ComponentError> {
    Ok(json!({
        "valid": errors.is_empty(),
        "errors": encode(&errors)?,
    }))
}

pub fn validate_answers(config_json: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        validation_value(&validate_questionnaire(&catalogue, &state))
    }))
}

pub fn check_rules(config_json: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        validation_value(&check_answer_rules(&catalogue, &state))
    }))
}

pub fn render_questionnaire(config_json: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        Ok(spec_render_questionnaire(&catalogue, &state))
    }))
}

pub fn render_group(config_json: &str, group_id: &str, state_json: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        render_single_group(&catalogue, group_id, &state.answers)
            .ok_or_else(|| ComponentError::GroupUnavailable(group_id.to_string()))
    }))
}

pub fn render_text(config_json: &str, state_json: &str) -> String {
    respond_string(load_catalogue(config_json).and_then(|catalogue| {
        let state = parse_state(state_json)?;
        Ok(spec_render_text(&catalogue, &state))
    }))
}

pub fn options(config_json: &str, question_id: &str) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        if catalogue.question(question_id).is_none() {
            return Err(ComponentError::QuestionUnavailable(question_id.to_string()));
        }
        encode(&options_with_triggers(&catalogue, question_id))
    }))
}

/// Merges one answer into the state, refreshes derived fields and reports
/// the next step along with rule violations for the submitted value.
pub fn submit_patch(
    config_json: &str,
    state_json: &str,
    question_id: &str,
    value_json: &str,
) -> String {
    respond(load_catalogue(config_json).and_then(|catalogue| {
        if catalogue.question(question_id).is_none() {
            return Err(ComponentError::QuestionUnavailable(question_id.to_string()));
        }
        let mut state = parse_state(state_json)?;
        let value: Value = serde_json::from_str(value_json).map_err(ComponentError::InputParse)?;

        let mut patch = Map::new();
        patch.insert(question_id.to_string(), value);
        state.merge_answers(patch);
        state.refresh(&catalogue);

        let rule_errors: Vec<ValidationError> = check_answer_rules(&catalogue, &state)
            .into_iter()
            .filter(|error| error.question_id == question_id)
            .collect();
        let mut response = next_value(&catalogue, &state);
        if !rule_errors.is_empty() {
            response["status"] = Value::String("error".into());
        }
        response["validation"] = validation_value(&rule_errors)?;
        response["state"] = encode(&state)?;
        Ok(response)
    }))
}
