//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use serde_json::{Map, Value, json};
use starnight_script::ResumeCondition;
use starnight_store::{DialogLine, ScopeName, StoreSnapshot};

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

pub(crate) fn render_snapshot(
    snapshot: &StoreSnapshot,
    scope: Option<ScopeName>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let value = match scope {
                Some(scope) => Value::Object(snapshot.scope(scope).clone()),
                None => snapshot.to_value(),
            };
            println!("{}", to_pretty(&value)?);
        }
        OutputFormat::Table => {
            let scopes = scope.map_or_else(|| ScopeName::ALL.to_vec(), |scope| vec![scope]);
            for scope in scopes {
                for line in scope_lines(scope, snapshot.scope(scope)) {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn render_suspension(
    instruction: usize,
    condition: &ResumeCondition,
    dialog: Option<&DialogLine>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let event = json!({
                "instruction": instruction,
                "condition": condition,
                "dialog": dialog,
            });
            let text = serde_json::to_string(&event)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => println!("{}", suspension_line(condition, dialog)),
    }
    Ok(())
}

fn scope_lines(scope: ScopeName, fields: &Map<String, Value>) -> Vec<String> {
    fields
        .iter()
        .map(|(field, value)| format!("{scope}.{field} = {value}"))
        .collect()
}

fn suspension_line(condition: &ResumeCondition, dialog: Option<&DialogLine>) -> String {
    match (condition, dialog) {
        (ResumeCondition::UserInput, Some(line)) => match &line.speaker {
            Some(speaker) => format!("{speaker}: {}", line.text),
            None => line.text.clone(),
        },
        (ResumeCondition::Choice(options), _) => format!("? {}", options.join(" / ")),
        (other, _) => format!("[{other}]"),
    }
}

fn to_pretty(value: &Value) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}
