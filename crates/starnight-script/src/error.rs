//! Error types for command dispatch and script execution.

use thiserror::Error;

use crate::executor::ExecutorState;

/// Primary error type for the script layer.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Instruction named a command that is not registered and no fallback exists.
    #[error("instruction {index}: unknown command '{name}'")]
    UnknownCommand {
        /// Instruction index within the script.
        index: usize,
        /// Command name found in the script.
        name: String,
    },
    /// A command handler or its continuation reported a failure.
    #[error("instruction {index}: command '{command}' failed: {reason}")]
    CommandFault {
        /// Instruction index within the script.
        index: usize,
        /// Command that failed.
        command: String,
        /// Failure reported by the handler.
        reason: String,
    },
    /// Stepping was requested outside the `Running` state.
    #[error("executor is not running (state: {state})")]
    NotRunning {
        /// State the executor was in.
        state: ExecutorState,
    },
    /// Two commands were registered under the same name.
    #[error("command '{name}' is already registered")]
    DuplicateCommand {
        /// Conflicting command name.
        name: String,
    },
    /// Scene source could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// One-based source line.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },
}

/// Convenience alias for script results.
pub type ScriptResult<T> = Result<T, ScriptError>;
