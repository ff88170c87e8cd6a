use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde_json::{Value, json};
use starnight_script::{
    CommandRegistry, Executor, ResumeCondition, RunOutcome, Script, ScriptError, builtins,
};
use starnight_store::DialogLine;
use tracing::info;

use crate::cli::{OutputFormat, RunArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_suspension;

pub(crate) fn handle_run(ctx: &AppContext, args: RunArgs, format: OutputFormat) -> CliResult<()> {
    let script = load_script(&args.script)?;
    let scene = script.name.clone();
    let registry = builtins::register_defaults(CommandRegistry::builder(&ctx.store))
        .map_err(script_error)?
        .build();
    let mut executor = Executor::new(ctx.store.clone(), registry);
    executor.load(script);

    let mut choices = args.choices.into_iter();
    let result = loop {
        match executor.run() {
            Ok(RunOutcome::Finished) => break Ok(true),
            Ok(RunOutcome::Suspended { token, condition }) => {
                let dialog = ctx.store.system().get::<Option<DialogLine>>("dialog").ok().flatten();
                render_suspension(token.instruction(), &condition, dialog.as_ref(), format)?;
                if args.stop_at_suspend {
                    break Ok(false);
                }
                let answer = answer_for(&condition, &mut choices);
                if let Err(err) = executor.resolve_with(token, answer) {
                    break Err(err);
                }
            }
            Err(err) => break Err(err),
        }
    };

    // Mutations made before a fault are kept, so the store is saved either way.
    ctx.save()?;
    let finished = result.map_err(script_error)?;
    info!(scene = %scene, finished, "run ended");
    if format == OutputFormat::Table {
        if finished {
            println!("Scene '{scene}' finished.");
        } else if let Some(pointer) = executor.pointer() {
            println!("Scene '{scene}' suspended at instruction {pointer}.");
        }
    }
    Ok(())
}

fn load_script(path: &Path) -> CliResult<Script> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))
        .map_err(CliError::failure)?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let mut script = if is_json {
        Script::from_json(&source)
    } else {
        Script::parse_scene(stem.clone(), &source)
    }
    .map_err(|err| CliError::validation(format!("{}: {err}", path.display())))?;
    if script.name.is_empty() {
        script.name = stem;
    }
    Ok(script)
}

/// Only choice prompts consume an answer from `choices`.
fn answer_for(condition: &ResumeCondition, choices: &mut impl Iterator<Item = String>) -> Value {
    match condition {
        ResumeCondition::Choice(_) => match choices.next() {
            Some(choice) => choice
                .parse::<u64>()
                .map_or_else(|_| Value::String(choice), |index| json!(index)),
            None => json!(0),
        },
        _ => Value::Null,
    }
}

fn script_error(err: ScriptError) -> CliError {
    match err {
        ScriptError::Parse { .. } => CliError::validation(err.to_string()),
        other => CliError::failure(anyhow!(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(values: &[&str]) -> std::vec::IntoIter<String> {
        values
            .iter()
            .map(|value| (*value).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn choices_accept_text_or_index() {
        let condition = ResumeCondition::Choice(vec!["stay".into(), "leave".into()]);
        let mut choices = answers(&["leave", "1"]);
        assert_eq!(answer_for(&condition, &mut choices), json!("leave"));
        assert_eq!(answer_for(&condition, &mut choices), json!(1));
        assert_eq!(answer_for(&condition, &mut choices), json!(0));
    }

    #[test]
    fn dialog_and_timers_leave_answers_for_later_choices() {
        let mut choices = answers(&["leave"]);
        assert_eq!(
            answer_for(&ResumeCondition::UserInput, &mut choices),
            Value::Null
        );
        assert_eq!(
            answer_for(
                &ResumeCondition::Timer(std::time::Duration::from_millis(500)),
                &mut choices
            ),
            Value::Null
        );
        let condition = ResumeCondition::Choice(vec!["stay".into(), "leave".into()]);
        assert_eq!(answer_for(&condition, &mut choices), json!("leave"));
    }

    #[test]
    fn said_lines_before_a_choice_keep_the_answer() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("porch.txt");
        fs::write(
            &script,
            "say {\"text\": \"Stay a while?\"}\nchoose {\"options\": [\"stay\", \"leave\"], \"var\": \"route\"}\n",
        )?;
        let ctx = AppContext::load(&dir.path().join("store.json"))
            .map_err(|err| anyhow!(err.display_message()))?;
        let args = RunArgs {
            script,
            choices: vec!["leave".into()],
            stop_at_suspend: false,
        };

        handle_run(&ctx, args, OutputFormat::Json).map_err(|err| anyhow!(err.display_message()))?;

        assert_eq!(
            ctx.store.local().value("variables")?["route"],
            json!("leave")
        );
        Ok(())
    }

    #[test]
    fn json_scripts_take_the_file_stem_when_unnamed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ending.json");
        fs::write(&path, r#"{"instructions": [{"command": "noop"}]}"#)?;
        let script = load_script(&path).map_err(|err| anyhow!(err.display_message()))?;
        assert_eq!(script.name, "ending");
        assert_eq!(script.len(), 1);
        Ok(())
    }

    #[test]
    fn malformed_scenes_are_validation_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.txt");
        fs::write(&path, "say {oops")?;
        let Err(err) = load_script(&path) else {
            anyhow::bail!("expected parse failure");
        };
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }
}
