use serde_json::{Number, Value};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, pending questions, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and progress as the engine hands out questions.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, title: &str, description: Option<&str>) {
        if self.header_printed {
            return;
        }
        println!("Questionnaire: {}", title);
        if self.verbosity.is_verbose()
            && let Some(description) = description
        {
            println!("{}", description);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, step: &NextStep) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} ({}/{})",
            step.status.as_str(),
            step.progress.answered,
            step.progress.total
        );
        if let Some(group) = &step.group_id {
            println!("Group: {}", group);
        }
        if !step.question_ids.is_empty() {
            println!("Pending: {}", step.question_ids.join(", "));
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.label)
        } else {
            format!("{} {}", prompt.index, prompt.label)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(help) = &prompt.help_text {
            println!("{}", help);
        }
        if self.verbosity.is_verbose() && !prompt.choices.is_empty() {
            println!("Choices: {}", prompt.choices.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_rule_errors(&self, errors: &[String]) {
        eprintln!("Validation errors:");
        for message in errors {
            eprintln!("  {}", message);
        }
    }

    pub fn show_completion(&self, answers: &Value) {
        println!("Done ✅");
        if self.show_answers_json {
            match serde_json::to_string_pretty(answers) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        }
    }
}

/// Progress counters reported by the engine.
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Status returned by `next` and `submit_patch`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    NeedInput,
    Complete,
    Error,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Error => "error",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "complete" => RenderStatus::Complete,
            "error" => RenderStatus::Error,
            _ => RenderStatus::NeedInput,
        }
    }
}

/// The engine's answer to "what should be asked next".
pub struct NextStep {
    pub status: RenderStatus,
    pub question_ids: Vec<String>,
    pub group_id: Option<String>,
    pub progress: RenderProgress,
}

impl NextStep {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let status = RenderStatus::from_label(
            json.get("status")
                .and_then(Value::as_str)
                .unwrap_or("need_input"),
        );
        let question_ids = json
            .get("next_question_ids")
            .and_then(Value::as_array)
            .ok_or_else(|| "next step missing next_question_ids".to_string())?
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
        let group_id = json
            .get("next_group_id")
            .and_then(Value::as_str)
            .map(String::from);
        let progress = json
            .get("progress")
            .and_then(Value::as_object)
            .ok_or_else(|| "next step missing progress".to_string())?;
        let answered = progress
            .get("answered")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let total = progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;
        Ok(Self {
            status,
            question_ids,
            group_id,
            progress: RenderProgress { answered, total },
        })
    }
}

/// Prompt-side view of a catalogue question.
pub struct WizardQuestion {
    pub id: String,
    pub label: String,
    pub help_text: Option<String>,
    pub kind: QuestionKind,
    pub required: bool,
    pub choices: Vec<String>,
    pub default: Option<Value>,
}

impl WizardQuestion {
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "question missing id".to_string())?
            .to_string();
        let label = value
            .get("label")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("question '{}' missing label", id))?
            .to_string();
        let help_text = value
            .get("help_text")
            .and_then(Value::as_str)
            .map(String::from);
        let kind = QuestionKind::from_label(
            value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("text"),
        );
        let required = value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let choices = value
            .get("options")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| option.get("value").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let default = value.get("default_value").filter(|v| !v.is_null()).cloned();
        Ok(Self {
            id,
            label,
            help_text,
            kind,
            required,
            choices,
            default,
        })
    }

    /// Turns raw input into an answer value. An empty answer to an optional
    /// question yields `Value::Null`.
    pub fn parse_answer(&self, raw: &str) -> Result<Value, AnswerParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return match &self.default {
                Some(Value::String(default)) if !default.trim().is_empty() => {
                    self.parse_answer(default)
                }
                Some(Value::String(_)) | None => {
                    if self.required {
                        Err(AnswerParseError::new(
                            "This question requires an answer.",
                            None,
                        ))
                    } else {
                        Ok(Value::Null)
                    }
                }
                Some(default) => Ok(default.clone()),
            };
        }

        match self.kind {
            QuestionKind::Boolean => parse_boolean(raw),
            QuestionKind::Number => parse_number(raw),
            QuestionKind::SingleSelect => self.parse_choice(raw).map(Value::String),
            QuestionKind::MultiSelect => self.parse_choices(raw),
            QuestionKind::Text | QuestionKind::Date | QuestionKind::File => {
                Ok(Value::String(raw.to_string()))
            }
        }
    }

    fn parse_choice(&self, raw: &str) -> Result<String, AnswerParseError> {
        self.choices
            .iter()
            .find(|choice| choice.eq_ignore_ascii_case(raw))
            .cloned()
            .ok_or_else(|| {
                AnswerParseError::new(
                    format!("Choose one of: {}.", self.choices.join(", ")),
                    Some(format!("allowed values: {}", self.choices.join(", "))),
                )
            })
    }

    fn parse_choices(&self, raw: &str) -> Result<Value, AnswerParseError> {
        let mut selected: Vec<Value> = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let choice = Value::String(self.parse_choice(part)?);
            if !selected.contains(&choice) {
                selected.push(choice);
            }
        }
        Ok(Value::Array(selected))
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub help_text: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
}

impl PromptContext {
    pub fn new(question: &WizardQuestion, progress: &RenderProgress) -> Self {
        Self {
            index: (progress.answered + 1).max(1),
            total: progress.total,
            label: question.label.clone(),
            help_text: question.help_text.clone(),
            required: question.required,
            hint: question.kind.hint(&question.choices),
            choices: question.choices.clone(),
        }
    }
}

/// Input kinds the wizard knows how to parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    Number,
    Boolean,
    SingleSelect,
    MultiSelect,
    Date,
    File,
}

impl QuestionKind {
    fn from_label(label: &str) -> Self {
        match label {
            "number" => QuestionKind::Number,
            "yes_no" => QuestionKind::Boolean,
            "single_select" => QuestionKind::SingleSelect,
            "multi_select" => QuestionKind::MultiSelect,
            "date" => QuestionKind::Date,
            "file" => QuestionKind::File,
            _ => QuestionKind::Text,
        }
    }

    fn hint(&self, choices: &[String]) -> Option<String> {
        match self {
            QuestionKind::Boolean => Some("(yes/no, y/n, true/false)".to_string()),
            QuestionKind::Number => Some("(number)".to_string()),
            QuestionKind::SingleSelect if !choices.is_empty() => {
                Some(format!("({})", choices.join("/")))
            }
            QuestionKind::MultiSelect if !choices.is_empty() => {
                Some(format!("(comma separated: {})", choices.join(", ")))
            }
            QuestionKind::Date => Some("(YYYY-MM-DD)".to_string()),
            QuestionKind::File => Some("(file path)".to_string()),
            _ => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn parse_boolean(raw: &str) -> Result<Value, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Ok(Value::Number(Number::from(integer)));
    }
    raw.parse::<f64>()
        .map_err(|_| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
        .and_then(|value| {
            Number::from_f64(value).map(Value::Number).ok_or_else(|| {
                AnswerParseError::new(
                    "Please enter a finite number.",
                    Some("number must be finite".to_string()),
                )
            })
        })
}
