//! The script executor state machine.
//!
//! ```text
//! Idle --load--> Running --step (non-blocking)--> Running
//!                Running --step (blocking)-----> Suspended --resolve--> Running
//!                Running --step (past end)-----> Finished
//! any --abort--> Aborted          any --load--> Running (fresh run id)
//! ```
//!
//! Each `load` starts a new run with its own id. Suspension tokens carry that
//! id and the instruction index, so a token from an earlier run or an earlier
//! instruction never resumes the current one.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use starnight_store::{Scope, Store};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::{CommandFailure, Dispatch, ResumeCondition};
use crate::error::{ScriptError, ScriptResult};
use crate::registry::CommandRegistry;
use crate::script::Script;

/// Lifecycle of the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    /// Nothing loaded yet.
    Idle,
    /// Ready to dispatch the next instruction.
    Running,
    /// Waiting for a blocking command to be resolved.
    Suspended,
    /// Every instruction ran.
    Finished,
    /// Stopped by `abort` or by a failing instruction.
    Aborted,
}

impl ExecutorState {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Finished => "finished",
            Self::Aborted => "aborted",
        }
    }
}

impl Display for ExecutorState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Handle the host presents to resume a suspended instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuspensionToken {
    run: Uuid,
    instruction: usize,
}

impl SuspensionToken {
    /// Run the token belongs to.
    #[must_use]
    pub const fn run(&self) -> Uuid {
        self.run
    }

    /// Index of the suspended instruction.
    #[must_use]
    pub const fn instruction(&self) -> usize {
        self.instruction
    }
}

impl Display for SuspensionToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}#{}", self.run, self.instruction)
    }
}

/// Result of a single [`Executor::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A non-blocking command ran; the pointer moved on.
    Advanced {
        /// Index of the instruction that ran.
        index: usize,
        /// Command that handled it.
        command: String,
    },
    /// A blocking command ran; the executor waits for `resolve`.
    Suspended {
        /// Token that resumes this instruction.
        token: SuspensionToken,
        /// What the host has to wait for.
        condition: ResumeCondition,
    },
    /// The script has no instructions left.
    Finished,
}

/// Result of [`Executor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stopped at a blocking command.
    Suspended {
        /// Token that resumes the instruction.
        token: SuspensionToken,
        /// What the host has to wait for.
        condition: ResumeCondition,
    },
    /// Ran to the end.
    Finished,
}

/// Result of presenting a suspension token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The suspended instruction completed.
    Resumed {
        /// Index of the next instruction.
        next: usize,
    },
    /// The token did not match the outstanding suspension.
    Ignored,
}

type Continuation = Box<dyn FnOnce(Value) -> Result<(), CommandFailure>>;

struct Pending {
    token: SuspensionToken,
    command: String,
    condition: ResumeCondition,
    continuation: Option<Continuation>,
}

struct ExecutionContext {
    run: Uuid,
    script: Script,
    pointer: usize,
    pending: Option<Pending>,
}

/// Walks a script, dispatching each instruction through the registry.
pub struct Executor {
    store: Store,
    registry: CommandRegistry,
    state: ExecutorState,
    context: Option<ExecutionContext>,
}

impl Executor {
    /// Idle executor over `store` using the given commands.
    #[must_use]
    pub const fn new(store: Store, registry: CommandRegistry) -> Self {
        Self {
            store,
            registry,
            state: ExecutorState::Idle,
            context: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ExecutorState {
        self.state
    }

    /// Store the executor tracks progress in.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Commands available to scripts.
    #[must_use]
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Id of the active run.
    #[must_use]
    pub fn run_id(&self) -> Option<Uuid> {
        self.context.as_ref().map(|context| context.run)
    }

    /// Index of the next (or suspended) instruction of the active run.
    #[must_use]
    pub fn pointer(&self) -> Option<usize> {
        self.context.as_ref().map(|context| context.pointer)
    }

    /// Script of the active run.
    #[must_use]
    pub fn script(&self) -> Option<&Script> {
        self.context.as_ref().map(|context| &context.script)
    }

    /// Outstanding suspension token and its condition.
    #[must_use]
    pub fn pending(&self) -> Option<(SuspensionToken, &ResumeCondition)> {
        self.context
            .as_ref()
            .and_then(|context| context.pending.as_ref())
            .map(|pending| (pending.token, &pending.condition))
    }

    /// Start `script` from its first instruction, replacing any active run.
    pub fn load(&mut self, script: Script) -> Uuid {
        if let Some(previous) = self.context.take() {
            debug!(run = %previous.run, "discarding previous run");
        }
        let run = Uuid::new_v4();
        info!(%run, scene = %script.name, instructions = script.len(), "script loaded");
        write_field(self.store.local(), "scene", json!(script.name));
        self.context = Some(ExecutionContext {
            run,
            script,
            pointer: 0,
            pending: None,
        });
        self.set_pending(None);
        self.track_line();
        self.state = ExecutorState::Running;
        run
    }

    /// Dispatch the instruction under the pointer.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::NotRunning`] outside the `Running` state. An
    /// unknown command or a failing handler aborts the run and is returned as
    /// [`ScriptError::UnknownCommand`] or [`ScriptError::CommandFault`].
    pub fn step(&mut self) -> ScriptResult<StepOutcome> {
        let state = self.state;
        let Some(context) = self
            .context
            .as_mut()
            .filter(|_| state == ExecutorState::Running)
        else {
            return Err(ScriptError::NotRunning { state });
        };

        let index = context.pointer;
        let Some(instruction) = context.script.get(index) else {
            info!(run = %context.run, "script finished");
            self.finish(ExecutorState::Finished);
            return Ok(StepOutcome::Finished);
        };

        let Some(command) = self.registry.resolve(&instruction.command) else {
            let name = instruction.command.clone();
            warn!(run = %context.run, index, command = %name, "unknown command");
            self.finish(ExecutorState::Aborted);
            return Err(ScriptError::UnknownCommand { index, name });
        };
        debug!(run = %context.run, index, command = %instruction.command, "dispatching");

        match command.invoke(&instruction.payload) {
            Ok(Dispatch::Continue) => {
                let command = instruction.command.clone();
                context.pointer += 1;
                self.track_line();
                Ok(StepOutcome::Advanced { index, command })
            }
            Ok(Dispatch::Suspend(suspension)) => {
                let (condition, continuation) = suspension.into_parts();
                let token = SuspensionToken {
                    run: context.run,
                    instruction: index,
                };
                context.pending = Some(Pending {
                    token,
                    command: instruction.command.clone(),
                    condition: condition.clone(),
                    continuation,
                });
                self.state = ExecutorState::Suspended;
                self.set_pending(Some(&condition));
                debug!(%token, %condition, "suspended");
                Ok(StepOutcome::Suspended { token, condition })
            }
            Err(failure) => {
                let command = instruction.command.clone();
                self.fault(index, command, &failure)
            }
        }
    }

    /// Step until the script suspends or finishes.
    ///
    /// # Errors
    ///
    /// Propagates the first [`Executor::step`] failure.
    pub fn run(&mut self) -> ScriptResult<RunOutcome> {
        loop {
            match self.step()? {
                StepOutcome::Advanced { .. } => {}
                StepOutcome::Suspended { token, condition } => {
                    return Ok(RunOutcome::Suspended { token, condition });
                }
                StepOutcome::Finished => return Ok(RunOutcome::Finished),
            }
        }
    }

    /// Resume the suspended instruction with a `null` resolution value.
    ///
    /// # Errors
    ///
    /// See [`Executor::resolve_with`].
    pub fn resolve(&mut self, token: SuspensionToken) -> ScriptResult<ResolveOutcome> {
        self.resolve_with(token, Value::Null)
    }

    /// Resume the suspended instruction, passing `value` to its continuation.
    ///
    /// Tokens that do not match the outstanding suspension are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::CommandFault`] when the continuation fails; the
    /// run is aborted.
    pub fn resolve_with(
        &mut self,
        token: SuspensionToken,
        value: Value,
    ) -> ScriptResult<ResolveOutcome> {
        let matches = self.state == ExecutorState::Suspended
            && self
                .context
                .as_ref()
                .and_then(|context| context.pending.as_ref())
                .is_some_and(|pending| pending.token == token);
        let pending = match self.context.as_mut() {
            Some(context) if matches => context.pending.take(),
            _ => None,
        };
        let Some(pending) = pending else {
            warn!(%token, state = %self.state, "ignoring stale suspension token");
            return Ok(ResolveOutcome::Ignored);
        };

        if let Some(continuation) = pending.continuation
            && let Err(failure) = continuation(value)
        {
            return self.fault(token.instruction, pending.command, &failure);
        }

        let next = token.instruction + 1;
        if let Some(context) = self.context.as_mut() {
            context.pointer = next;
        }
        self.state = ExecutorState::Running;
        self.set_pending(None);
        self.track_line();
        debug!(%token, next, "resumed");
        Ok(ResolveOutcome::Resumed { next })
    }

    /// Stop the active run; outstanding tokens become stale.
    pub fn abort(&mut self) {
        if let Some(context) = &self.context {
            info!(run = %context.run, pointer = context.pointer, "script aborted");
        }
        self.finish(ExecutorState::Aborted);
    }

    fn fault<T>(
        &mut self,
        index: usize,
        command: String,
        failure: &CommandFailure,
    ) -> ScriptResult<T> {
        warn!(index, command = %command, reason = %failure, "command failed; aborting script");
        self.finish(ExecutorState::Aborted);
        Err(ScriptError::CommandFault {
            index,
            command,
            reason: failure.reason().to_string(),
        })
    }

    fn finish(&mut self, state: ExecutorState) {
        self.context = None;
        self.state = state;
        self.set_pending(None);
    }

    fn track_line(&self) {
        if let Some(pointer) = self.pointer() {
            write_field(self.store.local(), "line", json!(pointer));
        }
    }

    fn set_pending(&self, condition: Option<&ResumeCondition>) {
        let value = condition.map_or(Value::Null, |condition| json!(condition.to_string()));
        write_field(self.store.system(), "pending", value);
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Executor")
            .field("state", &self.state)
            .field("run", &self.run_id())
            .field("pointer", &self.pointer())
            .finish_non_exhaustive()
    }
}

// Stores built from a custom schema may omit the progress fields.
fn write_field(scope: &Scope, field: &str, value: Value) {
    if let Some(signal) = scope.field(field) {
        signal.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_defaults;
    use crate::command::{CommandFailure, non_blocking};
    use crate::script::Instruction;

    fn executor(store: &Store) -> Executor {
        let registry = register_defaults(CommandRegistry::builder(store))
            .unwrap()
            .build();
        Executor::new(store.clone(), registry)
    }

    fn scene(source: &str) -> Script {
        Script::parse_scene("test", source).unwrap()
    }

    #[test]
    fn stepping_before_load_is_rejected() {
        let mut executor = executor(&Store::new());
        assert!(matches!(
            executor.step(),
            Err(ScriptError::NotRunning {
                state: ExecutorState::Idle
            })
        ));
    }

    #[test]
    fn non_blocking_commands_advance_the_pointer() {
        let store = Store::new();
        let mut executor = executor(&store);
        executor.load(scene("noop\nset_var {\"name\": \"met\", \"value\": true}"));

        assert_eq!(
            executor.step().unwrap(),
            StepOutcome::Advanced {
                index: 0,
                command: "noop".into()
            }
        );
        assert_eq!(executor.state(), ExecutorState::Running);
        assert_eq!(executor.pointer(), Some(1));
        assert!(executor.pending().is_none());
        assert_eq!(store.local().get::<u64>("line").unwrap(), 1);
        assert_eq!(store.local().get::<String>("scene").unwrap(), "test");
    }

    #[test]
    fn blocking_commands_suspend_until_resolved() {
        let store = Store::new();
        let mut executor = executor(&store);
        executor.load(scene("say {\"text\": \"hi\"}\nnoop"));

        let StepOutcome::Suspended { token, condition } = executor.step().unwrap() else {
            panic!("expected suspension");
        };
        assert_eq!(condition, ResumeCondition::UserInput);
        assert_eq!(executor.state(), ExecutorState::Suspended);
        assert_eq!(executor.pointer(), Some(0));
        assert_eq!(
            store.system().get::<String>("pending").unwrap(),
            "waiting for user input"
        );
        assert!(matches!(
            executor.step(),
            Err(ScriptError::NotRunning {
                state: ExecutorState::Suspended
            })
        ));

        assert_eq!(
            executor.resolve(token).unwrap(),
            ResolveOutcome::Resumed { next: 1 }
        );
        assert_eq!(executor.state(), ExecutorState::Running);
        assert_eq!(executor.pointer(), Some(1));
        assert_eq!(store.system().value("pending").unwrap(), Value::Null);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let mut executor = executor(&Store::new());
        executor.load(scene("wait {\"ms\": 5}\nwait {\"ms\": 5}"));
        let RunOutcome::Suspended { token: first, .. } = executor.run().unwrap() else {
            panic!("expected suspension");
        };
        executor.resolve(first).unwrap();
        let RunOutcome::Suspended { token: second, .. } = executor.run().unwrap() else {
            panic!("expected suspension");
        };

        assert_eq!(executor.resolve(first).unwrap(), ResolveOutcome::Ignored);
        assert_eq!(executor.pointer(), Some(1));

        executor.load(scene("noop"));
        assert_eq!(executor.resolve(second).unwrap(), ResolveOutcome::Ignored);
        assert_eq!(executor.state(), ExecutorState::Running);
    }

    #[test]
    fn run_reaches_finished() {
        let store = Store::new();
        let mut executor = executor(&store);
        executor.load(scene("noop\nachievement {\"index\": 1}"));

        assert_eq!(executor.run().unwrap(), RunOutcome::Finished);
        assert_eq!(executor.state(), ExecutorState::Finished);
        assert!(executor.run_id().is_none());
        assert_eq!(store.local().get::<u64>("line").unwrap(), 2);
    }

    #[test]
    fn unknown_commands_abort_the_run() {
        let mut executor = executor(&Store::new());
        executor.load(scene("noop\nvideo {\"file\": \"op.webm\"}"));

        let err = executor.run().unwrap_err();
        assert!(matches!(
            err,
            ScriptError::UnknownCommand { index: 1, ref name } if name == "video"
        ));
        assert_eq!(executor.state(), ExecutorState::Aborted);
    }

    #[test]
    fn fallback_runs_in_place_of_unknown_commands() {
        let store = Store::new();
        let registry = register_defaults(CommandRegistry::builder(&store))
            .unwrap()
            .fallback(non_blocking("skip", |_store: &Store| {
                |_payload: Value| Ok::<(), CommandFailure>(())
            }))
            .build();
        let mut executor = Executor::new(store, registry);
        executor.load(Script::new("s", vec![Instruction::bare("video")]));

        assert_eq!(
            executor.step().unwrap(),
            StepOutcome::Advanced {
                index: 0,
                command: "video".into()
            }
        );
    }

    #[test]
    fn handler_faults_abort_without_rollback() {
        let store = Store::new();
        let mut executor = executor(&store);
        executor.load(scene(
            "set_var {\"name\": \"a\", \"value\": 1}\nset_config {\"key\": \"nope\", \"value\": 1}",
        ));

        let err = executor.run().unwrap_err();
        assert!(matches!(
            err,
            ScriptError::CommandFault { index: 1, ref command, .. } if command == "set_config"
        ));
        assert_eq!(executor.state(), ExecutorState::Aborted);
        assert_eq!(store.local().value("variables").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn continuation_failures_abort() {
        let mut executor = executor(&Store::new());
        executor.load(scene("choose {\"options\": [\"a\"], \"var\": \"v\"}"));
        let RunOutcome::Suspended { token, .. } = executor.run().unwrap() else {
            panic!("expected suspension");
        };

        assert!(executor.resolve_with(token, json!("b")).is_err());
        assert_eq!(executor.state(), ExecutorState::Aborted);
    }

    #[test]
    fn abort_discards_outstanding_tokens() {
        let mut executor = executor(&Store::new());
        executor.load(scene("wait {\"ms\": 5}"));
        let RunOutcome::Suspended { token, .. } = executor.run().unwrap() else {
            panic!("expected suspension");
        };

        executor.abort();
        assert_eq!(executor.state(), ExecutorState::Aborted);
        assert_eq!(executor.resolve(token).unwrap(), ResolveOutcome::Ignored);

        let run = executor.load(scene("noop"));
        assert_eq!(executor.run_id(), Some(run));
        assert_eq!(executor.state(), ExecutorState::Running);
    }
}
