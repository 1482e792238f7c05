use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
    answers::{Answers, QuestionnaireState, has_answer},
    branching::relevant_groups,
    catalogue::Catalogue,
    progress::progress_summary,
    spec::{Question, QuestionGroup, QuestionType, RuleType, ValidationRule},
    visibility::filter_visible_questions,
};

/// JSON Schema, UI schema and current form data for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub schema: Value,
    #[serde(rename = "uiSchema")]
    pub ui_schema: Value,
    #[serde(rename = "formData")]
    pub form_data: Value,
}

/// An option together with the branch it advertises.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTrigger {
    pub value: String,
    pub label: String,
    pub help_text: Option<String>,
    pub triggers_branch: Option<String>,
}

fn json_type(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::Number => "number",
        QuestionType::MultiSelect => "array",
        QuestionType::Boolean => "boolean",
        QuestionType::ShortText
        | QuestionType::LongText
        | QuestionType::SingleSelect
        | QuestionType::Date
        | QuestionType::File => "string",
    }
}

fn ui_widget(kind: QuestionType) -> Option<&'static str> {
    match kind {
        QuestionType::LongText => Some("textarea"),
        QuestionType::SingleSelect => Some("select"),
        QuestionType::MultiSelect => Some("checkboxes"),
        QuestionType::Date => Some("date"),
        QuestionType::Boolean => Some("radio"),
        QuestionType::File => Some("file"),
        QuestionType::ShortText | QuestionType::Number => None,
    }
}

fn rule_constraint(rule: &ValidationRule) -> Option<(&'static str, Value)> {
    let key = match rule.rule_type {
        RuleType::Required => return None,
        RuleType::MinLength => "minLength",
        RuleType::MaxLength => "maxLength",
        RuleType::NumericMin => "minimum",
        RuleType::NumericMax => "maximum",
        RuleType::Pattern => "pattern",
    };
    Some((key, rule.value.clone()))
}

/// Render a question as a JSON Schema property.
pub fn render_question_property(question: &Question) -> Value {
    let mut prop = Map::new();
    prop.insert("type".into(), Value::String(json_type(question.kind).into()));
    prop.insert("title".into(), Value::String(question.label.clone()));
    if let Some(help) = &question.help_text {
        prop.insert("description".into(), Value::String(help.clone()));
    }
    if let Some(default) = &question.default_value {
        prop.insert("default".into(), default.clone());
    }

    let values = || {
        question
            .options
            .iter()
            .map(|option| Value::String(option.value.clone()))
            .collect::<Vec<_>>()
    };
    let labels = || {
        question
            .options
            .iter()
            .map(|option| Value::String(option.label.clone()))
            .collect::<Vec<_>>()
    };

    match question.kind {
        QuestionType::SingleSelect if !question.options.is_empty() => {
            prop.insert("enum".into(), Value::Array(values()));
            prop.insert("enumNames".into(), Value::Array(labels()));
        }
        QuestionType::MultiSelect if !question.options.is_empty() => {
            prop.insert(
                "items".into(),
                json!({
                    "type": "string",
                    "enum": values(),
                    "enumNames": labels(),
                }),
            );
            prop.insert("uniqueItems".into(), Value::Bool(true));
        }
        QuestionType::Boolean => {
            prop.insert("enumNames".into(), json!(["No", "Yes"]));
        }
        QuestionType::Date => {
            prop.insert("format".into(), Value::String("date".into()));
        }
        _ => {}
    }

    for (key, value) in question.validation.iter().filter_map(rule_constraint) {
        prop.insert(key.into(), value);
    }

    Value::Object(prop)
}

/// Render the react-jsonschema-form UI hints for a question.
pub fn render_question_ui_schema(question: &Question) -> Value {
    let mut ui = Map::new();
    if let Some(widget) = ui_widget(question.kind) {
        ui.insert("ui:widget".into(), Value::String(widget.into()));
    }
    if let Some(placeholder) = &question.placeholder {
        ui.insert("ui:placeholder".into(), Value::String(placeholder.clone()));
    }
    if let Some(help) = &question.help_text {
        ui.insert("ui:help".into(), Value::String(help.clone()));
    }
    if question.kind == QuestionType::LongText {
        ui.insert("ui:options".into(), json!({ "rows": 5 }));
    }
    if let Some(reference) = &question.regulatory_reference {
        ui.insert(
            "ui:description".into(),
            Value::String(format!("Regulatory Reference: {}", reference)),
        );
    }
    Value::Object(ui)
}

/// Render the visible questions of a group as a complete form schema.
pub fn render_question_group(group: &QuestionGroup, answers: &Answers) -> FormSchema {
    let visible = filter_visible_questions(&group.questions, answers);

    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut ui_schema = Map::new();
    let mut form_data = Map::new();

    for question in &visible {
        properties.insert(question.id.clone(), render_question_property(question));
        if question.required {
            required.push(Value::String(question.id.clone()));
        }
        let ui = render_question_ui_schema(question);
        if ui.as_object().is_some_and(|ui| !ui.is_empty()) {
            ui_schema.insert(question.id.clone(), ui);
        }
        if let Some(value) = answers.get(&question.id) {
            form_data.insert(question.id.clone(), value.clone());
        }
    }

    ui_schema.insert(
        "ui:order".into(),
        Value::Array(
            visible
                .iter()
                .map(|question| Value::String(question.id.clone()))
                .collect(),
        ),
    );

    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("title".into(), Value::String(group.title.clone()));
    schema.insert("properties".into(), Value::Object(properties));
    schema.insert("required".into(), Value::Array(required));
    if let Some(description) = &group.description {
        schema.insert("description".into(), Value::String(description.clone()));
    }

    FormSchema {
        schema: Value::Object(schema),
        ui_schema: Value::Object(ui_schema),
        form_data: Value::Object(form_data),
    }
}

/// Render every relevant group, ordered by group `order`.
pub fn render_questionnaire(catalogue: &Catalogue, state: &QuestionnaireState) -> Value {
    let relevant = relevant_groups(catalogue, &state.answers);

    let mut entries: Vec<(i32, Value)> = relevant
        .iter()
        .map(|entry| {
            let form_schema = render_question_group(entry.group, &state.answers);
            let mut map = Map::new();
            map.insert("id".into(), Value::String(entry.group.id.clone()));
            map.insert("title".into(), Value::String(entry.group.title.clone()));
            map.insert("order".into(), json!(entry.group.order));
            map.insert("isBranch".into(), Value::Bool(entry.is_branch()));
            if let Some(branch) = entry.branch {
                map.insert("branchId".into(), Value::String(branch.id.clone()));
                map.insert("branchName".into(), Value::String(branch.name.clone()));
            }
            map.insert("formSchema".into(), json!(form_schema));
            (entry.group.order, Value::Object(map))
        })
        .collect();
    entries.sort_by_key(|(order, _)| *order);

    let active_branches = crate::branching::active_branch_ids(catalogue, &state.answers);
    let progress = progress_summary(catalogue, state);

    json!({
        "catalogueId": catalogue.id(),
        "groups": entries.into_iter().map(|(_, group)| group).collect::<Vec<_>>(),
        "activeBranches": active_branches,
        "progress": progress.ratio,
    })
}

/// Render one group by id; `None` when the id is unknown.
pub fn render_single_group(
    catalogue: &Catalogue,
    group_id: &str,
    answers: &Answers,
) -> Option<Value> {
    let group = catalogue.group(group_id)?;
    let form_schema = render_question_group(group, answers);
    Some(json!({
        "id": group.id,
        "title": group.title,
        "description": group.description,
        "formSchema": form_schema,
    }))
}

/// Options of a question with their advertised branches; empty when the
/// question is unknown or has no options.
pub fn options_with_triggers(catalogue: &Catalogue, question_id: &str) -> Vec<OptionTrigger> {
    catalogue
        .question(question_id)
        .map(|question| {
            question
                .options
                .iter()
                .map(|option| OptionTrigger {
                    value: option.value.clone(),
                    label: option.label.clone(),
                    help_text: option.help_text.clone(),
                    triggers_branch: option.triggers_branch.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Render the questionnaire state as human-friendly text.
pub fn render_text(catalogue: &Catalogue, state: &QuestionnaireState) -> String {
    let summary = progress_summary(catalogue, state);
    let mut lines = Vec::new();
    lines.push(format!(
        "Questionnaire: {} ({})",
        catalogue.title(),
        catalogue.id()
    ));
    lines.push(format!(
        "Progress: {:.0}% ({}/{})",
        summary.ratio * 100.0,
        summary.answered,
        summary.total
    ));

    for entry in relevant_groups(catalogue, &state.answers) {
        match entry.branch {
            Some(branch) => lines.push(format!("[{}] {}", branch.name, entry.group.title)),
            None => lines.push(entry.group.title.clone()),
        }
        for question in filter_visible_questions(&entry.group.questions, &state.answers) {
            let mut line = format!(" - {} ({})", question.id, question.label);
            if question.required {
                line.push_str(" [required]");
            }
            if let Some(value) = state.answers.get(&question.id)
                && has_answer(&state.answers, &question.id)
            {
                line.push_str(&format!(" = {}", value_to_display(value)));
            }
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_display)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
