//! Scene scripts and their source formats.
//!
//! Text scenes hold one instruction per line: a command name optionally
//! followed by a JSON payload. Blank lines and `#` comments are skipped.
//!
//! ```text
//! # prologue
//! say {"speaker": "Mio", "text": "Morning."}
//! achievement {"index": 1}
//! noop
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ScriptError, ScriptResult};

/// One command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Command name resolved through the registry.
    pub command: String,
    /// Structured payload; `null` when the instruction has none.
    #[serde(default)]
    pub payload: Value,
}

impl Instruction {
    /// Instruction with a payload.
    #[must_use]
    pub fn new(command: impl Into<String>, payload: Value) -> Self {
        Self {
            command: command.into(),
            payload,
        }
    }

    /// Instruction without a payload.
    #[must_use]
    pub fn bare(command: impl Into<String>) -> Self {
        Self::new(command, Value::Null)
    }
}

/// A named, ordered list of instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Script {
    /// Scene name recorded in `local.scene` while the script runs.
    #[serde(default)]
    pub name: String,
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
}

impl Script {
    /// Script from already-built instructions.
    #[must_use]
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            instructions,
        }
    }

    /// Parse the line-oriented scene format.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] with the one-based line of the first
    /// malformed instruction.
    pub fn parse_scene(name: impl Into<String>, source: &str) -> ScriptResult<Self> {
        let instructions = source
            .lines()
            .enumerate()
            .filter_map(|(index, raw)| {
                let line = raw.trim();
                (!line.is_empty() && !line.starts_with('#')).then(|| parse_line(index + 1, line))
            })
            .collect::<ScriptResult<Vec<_>>>()?;
        Ok(Self::new(name, instructions))
    }

    /// Parse a JSON script document.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] carrying the JSON error position.
    pub fn from_json(source: &str) -> ScriptResult<Self> {
        serde_json::from_str(source).map_err(|err| ScriptError::Parse {
            line: err.line(),
            message: err.to_string(),
        })
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the script has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_scene("", s)
    }
}

fn parse_line(line: usize, text: &str) -> ScriptResult<Instruction> {
    let (command, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(command, rest)| (command, rest.trim()));

    if !command
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':'))
    {
        return Err(ScriptError::Parse {
            line,
            message: format!("invalid command name '{command}'"),
        });
    }

    let payload = if rest.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(rest).map_err(|err| ScriptError::Parse {
            line,
            message: format!("invalid payload for '{command}': {err}"),
        })?
    };
    Ok(Instruction::new(command, payload))
}
