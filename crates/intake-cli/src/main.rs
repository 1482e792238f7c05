mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use intake_component::{
    active_branches, check_rules, describe, lint, next, progress, render_group,
    render_questionnaire, render_text, submit_patch, validate_answers,
};
use intake_spec::{CatalogueSpec, QuestionnaireState};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use wizard::{NextStep, PromptContext, RenderStatus, Verbosity, WizardPresenter, WizardQuestion};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const CATALOGUE_ENV: &str = "PROTOCOL_INTAKE_CATALOGUE";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "IACUC protocol intake questionnaire CLI",
    long_about = "Lints questionnaire catalogues and evaluates branches, progress and validation for answer files"
)]
struct Cli {
    /// Catalogue JSON to use instead of the built-in one (defaults to PROTOCOL_INTAKE_CATALOGUE).
    #[arg(long, global = true, value_name = "PATH")]
    catalogue: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check the catalogue for dangling references and malformed entries.
    Lint,
    /// Print the JSON Schema of the catalogue document format.
    Schema,
    /// List the catalogue's question groups and branches.
    List,
    /// List the branches activated by an answers file, highest priority first.
    Branches {
        /// Path to the answers (or full state) JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Show completion progress for an answers file.
    Progress {
        /// Path to the answers (or full state) JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Report missing required answers; exits non-zero when any are missing.
    Validate {
        /// Path to the answers (or full state) JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Also apply length, bound and pattern rules.
        #[arg(long)]
        rules: bool,
    },
    /// Render the relevant groups (or a single group) as form schemas.
    Render {
        /// Optional answers (or full state) JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Render only this group.
        #[arg(long, short = 'g', value_name = "GROUP", conflicts_with = "branch")]
        group: Option<String>,
        /// Render the question group revealed by this branch.
        #[arg(long, short = 'b', value_name = "BRANCH")]
        branch: Option<String>,
        #[arg(long, value_enum, default_value_t = RenderFormat::Json)]
        format: RenderFormat,
        /// Write the result to this file instead of stdout.
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Walk through the questionnaire interactively.
    Wizard {
        /// Optional JSON file containing initial answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (status, pending questions, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Print the collected answers as JSON when done.
        #[arg(long)]
        answers_json: bool,
    },
}

fn main() -> CliResult<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config_json = catalogue_config(cli.catalogue)?;
    match cli.command {
        Command::Lint => run_lint(&config_json),
        Command::Schema => run_schema(),
        Command::List => run_list(&config_json),
        Command::Branches { answers } => run_branches(&config_json, &answers),
        Command::Progress { answers } => run_progress(&config_json, &answers),
        Command::Validate { answers, rules } => run_validate(&config_json, &answers, rules),
        Command::Render {
            answers,
            group,
            branch,
            format,
            output,
        } => {
            let target = match (group, branch) {
                (Some(group), _) => RenderTarget::Group(group),
                (None, Some(branch)) => RenderTarget::Branch(branch),
                (None, None) => RenderTarget::All,
            };
            run_render(
                &config_json,
                answers.as_deref(),
                target,
                format,
                output.as_deref(),
            )
        }
        Command::Wizard {
            answers,
            verbose,
            answers_json,
        } => run_wizard(&config_json, answers.as_deref(), verbose, answers_json),
    }
}

/// Component config for the chosen catalogue; empty means built-in.
fn catalogue_config(path: Option<PathBuf>) -> CliResult<String> {
    let path = path.or_else(|| env::var_os(CATALOGUE_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            log::debug!("using catalogue {}", path.display());
            let contents = fs::read_to_string(&path)
                .map_err(|err| format!("failed to read catalogue {}: {}", path.display(), err))?;
            Ok(json!({ "catalogue_json": contents }).to_string())
        }
        None => Ok(String::new()),
    }
}

fn read_state(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .map_err(|err| format!("failed to read answers {}: {}", path.display(), err))?;
            // Reject malformed files here so the error names the path.
            serde_json::from_str::<Value>(&contents)
                .map_err(|err| format!("invalid answers JSON in {}: {}", path.display(), err))?;
            Ok(contents)
        }
        None => Ok("{}".to_string()),
    }
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn run_lint(config_json: &str) -> CliResult<()> {
    let report = parse_component_result(&lint(config_json))?;
    let id = report["id"].as_str().unwrap_or("<unknown>");
    if report["valid"] == true {
        println!(
            "Catalogue '{}' v{} is valid: {} groups, {} questions, {} branches",
            id,
            report["version"].as_str().unwrap_or("?"),
            report["groups"],
            report["questions"],
            report["branches"]
        );
        return Ok(());
    }

    eprintln!("Catalogue '{}' has issues:", id);
    for issue in report["issues"].as_array().into_iter().flatten() {
        eprintln!("  - {}", issue.as_str().unwrap_or_default());
    }
    Err(format!("catalogue '{}' failed lint", id).into())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(CatalogueSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_branches(config_json: &str, answers: &Path) -> CliResult<()> {
    let state = read_state(Some(answers))?;
    let branches = parse_component_result(&active_branches(config_json, &state))?;
    let branches = branches.as_array().cloned().unwrap_or_default();
    if branches.is_empty() {
        println!("No active branches.");
        return Ok(());
    }
    println!("Active branches:");
    for branch in &branches {
        println!(
            " - {} (priority {}): {} -> {}",
            branch["id"].as_str().unwrap_or_default(),
            branch["priority"],
            branch["name"].as_str().unwrap_or_default(),
            branch["question_group_id"].as_str().unwrap_or_default()
        );
    }
    Ok(())
}

fn run_progress(config_json: &str, answers: &Path) -> CliResult<()> {
    let state = read_state(Some(answers))?;
    let summary = parse_component_result(&progress(config_json, &state))?;
    let ratio = summary["ratio"].as_f64().unwrap_or(0.0);
    println!(
        "Progress: {}% ({}/{})",
        (ratio * 100.0).round(),
        summary["answered"],
        summary["total"]
    );
    Ok(())
}

fn run_validate(config_json: &str, answers: &Path, rules: bool) -> CliResult<()> {
    let state = read_state(Some(answers))?;
    let mut errors = validation_messages(&parse_component_result(&validate_answers(
        config_json,
        &state,
    ))?);
    if rules {
        errors.extend(validation_messages(&parse_component_result(&check_rules(
            config_json,
            &state,
        ))?));
    }

    if errors.is_empty() {
        println!("Answers are valid.");
        return Ok(());
    }

    eprintln!("Validation errors:");
    for message in &errors {
        eprintln!("  {}", message);
    }
    Err(format!("{} validation error(s)", errors.len()).into())
}

fn validation_messages(response: &Value) -> Vec<String> {
    response["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|error| {
                    format!(
                        "{}: {}",
                        error["question_id"].as_str().unwrap_or("<unknown>"),
                        error["message"].as_str().unwrap_or("validation failed")
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn run_list(config_json: &str) -> CliResult<()> {
    let spec = parse_component_result(&describe(config_json))?;

    println!("Available question groups:");
    for group in spec["groups"].as_array().into_iter().flatten() {
        let branch_info = group["branch_id"]
            .as_str()
            .map(|branch| format!(" [branch: {}]", branch))
            .unwrap_or_default();
        println!(
            "  - {}: {}{}",
            group["id"].as_str().unwrap_or_default(),
            group["title"].as_str().unwrap_or_default(),
            branch_info
        );
    }

    println!();
    println!("Available branches:");
    for branch in spec["branches"].as_array().into_iter().flatten() {
        println!(
            "  - {}: {}",
            branch["id"].as_str().unwrap_or_default(),
            branch["name"].as_str().unwrap_or_default()
        );
    }
    Ok(())
}

/// What `render` should produce.
enum RenderTarget {
    All,
    Group(String),
    Branch(String),
}

fn branch_group_id(config_json: &str, branch_id: &str) -> CliResult<String> {
    let spec = parse_component_result(&describe(config_json))?;
    spec["branches"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|branch| branch["id"].as_str() == Some(branch_id))
        .and_then(|branch| branch["question_group_id"].as_str())
        .map(String::from)
        .ok_or_else(|| format!("branch '{}' not found", branch_id).into())
}

fn run_render(
    config_json: &str,
    answers: Option<&Path>,
    target: RenderTarget,
    format: RenderFormat,
    output: Option<&Path>,
) -> CliResult<()> {
    let state = read_state(answers)?;
    let rendered = match (format, target) {
        (RenderFormat::Text, RenderTarget::All) => {
            let text = render_text(config_json, &state);
            // `render_text` reports failures as a JSON error object.
            if text.starts_with('{') {
                parse_component_result(&text)?;
            }
            text
        }
        (RenderFormat::Text, _) => {
            return Err("--group and --branch are only supported with --format json".into());
        }
        (RenderFormat::Json, RenderTarget::Group(group)) => {
            let rendered = parse_component_result(&render_group(config_json, &group, &state))?;
            serde_json::to_string_pretty(&rendered)? + "\n"
        }
        (RenderFormat::Json, RenderTarget::Branch(branch)) => {
            let group = branch_group_id(config_json, &branch)?;
            let rendered = parse_component_result(&render_group(config_json, &group, &state))?;
            serde_json::to_string_pretty(&rendered)? + "\n"
        }
        (RenderFormat::Json, RenderTarget::All) => {
            let rendered = parse_component_result(&render_questionnaire(config_json, &state))?;
            serde_json::to_string_pretty(&rendered)? + "\n"
        }
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .map_err(|err| format!("failed to write {}: {}", path.display(), err))?;
            eprintln!("Schema written to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn catalogue_questions(spec: &Value) -> CliResult<HashMap<String, WizardQuestion>> {
    let mut questions = HashMap::new();
    for group in spec["groups"].as_array().into_iter().flatten() {
        for question in group["questions"].as_array().into_iter().flatten() {
            let question = WizardQuestion::from_json(question)
                .map_err(|err| format!("wizard catalogue error: {}", err))?;
            questions.insert(question.id.clone(), question);
        }
    }
    Ok(questions)
}

fn run_wizard(
    config_json: &str,
    answers_path: Option<&Path>,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let spec = parse_component_result(&describe(config_json))?;
    let questions = catalogue_questions(&spec)?;
    let mut state: Value = serde_json::from_str(&read_state(answers_path)?)?;
    if !state.get("answers").is_some_and(Value::is_object) {
        state = json!({ "answers": state.as_object().cloned().unwrap_or_else(Map::new) });
    }

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    presenter.show_header(
        spec["title"].as_str().unwrap_or("Questionnaire"),
        spec["description"].as_str(),
    );
    let mut skipped: HashSet<String> = HashSet::new();

    loop {
        let state_str = state.to_string();
        let step = NextStep::from_json(&parse_component_result(&next(config_json, &state_str))?)
            .map_err(|err| format!("wizard error: {}", err))?;
        if step.status == RenderStatus::Complete {
            presenter.show_completion(&state["answers"]);
            break;
        }
        presenter.show_status(&step);

        let Some(question_id) = step
            .question_ids
            .iter()
            .find(|id| !skipped.contains(*id))
            .cloned()
        else {
            // Everything left in this group was skipped; move past it.
            let group_id = step
                .group_id
                .ok_or("no further questions are available; check the catalogue branches")?;
            log::debug!("marking group '{}' complete", group_id);
            mark_group_complete(&mut state, &group_id)?;
            continue;
        };

        let question = questions
            .get(&question_id)
            .ok_or_else(|| format!("catalogue is missing question '{}'", question_id))?;
        let prompt = PromptContext::new(question, &step.progress);
        let answer = prompt_question(&prompt, question, &presenter)?;
        if answer.is_null() {
            skipped.insert(question_id);
            continue;
        }

        let value_json = serde_json::to_string(&answer)?;
        let submitted = parse_component_result(&submit_patch(
            config_json,
            &state_str,
            &question_id,
            &value_json,
        ))?;
        let status = RenderStatus::from_label(submitted["status"].as_str().unwrap_or_default());
        if status == RenderStatus::Error {
            presenter.show_rule_errors(&validation_messages(&submitted["validation"]));
            continue;
        }
        state = submitted["state"].clone();
    }

    Ok(())
}

/// Records `group_id` as completed and leaves it if it was the current group.
fn mark_group_complete(state: &mut Value, group_id: &str) -> CliResult<()> {
    let mut typed: QuestionnaireState = serde_json::from_value(state.take())?;
    typed.complete_group(group_id);
    if typed.current_group_id.as_deref() == Some(group_id) {
        typed.current_group_id = None;
    }
    *state = serde_json::to_value(&typed)?;
    Ok(())
}

fn prompt_question(
    prompt: &PromptContext,
    question: &WizardQuestion,
    presenter: &WizardPresenter,
) -> CliResult<Value> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("wizard input ended before the questionnaire was complete".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }

        match question.parse_answer(trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}
