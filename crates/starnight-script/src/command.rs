//! Command descriptors and the factories that build them.
//!
//! A command is declared with [`non_blocking`] or [`blocking`]. Both take a
//! `setup` closure that receives the store once, at registration, and returns
//! the handler invoked for every matching instruction. Handlers receive their
//! payload already deserialized into the declared type.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use starnight_store::Store;
use thiserror::Error;

/// Whether dispatching a command suspends the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
    /// Execution waits for an explicit resolve.
    Blocking,
    /// Execution advances as soon as the handler returns.
    NonBlocking,
}

/// Failure reported by a command handler or continuation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct CommandFailure {
    reason: String,
}

impl CommandFailure {
    /// Failure with a human-readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Reason supplied by the handler.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// What the host has to do before a suspended script can continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ResumeCondition {
    /// The reader acknowledges the current line.
    UserInput,
    /// The given delay elapses.
    Timer(Duration),
    /// The reader picks one of the options.
    Choice(Vec<String>),
    /// A host-defined event with the given label.
    External(String),
}

impl Display for ResumeCondition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserInput => formatter.write_str("waiting for user input"),
            Self::Timer(delay) => write!(formatter, "waiting {}ms", delay.as_millis()),
            Self::Choice(options) => {
                write!(formatter, "waiting for a choice of {}", options.join(" / "))
            }
            Self::External(label) => write!(formatter, "waiting for '{label}'"),
        }
    }
}

type Continuation = Box<dyn FnOnce(Value) -> Result<(), CommandFailure>>;

/// Returned by blocking handlers to describe how the script resumes.
pub struct Suspension {
    condition: ResumeCondition,
    continuation: Option<Continuation>,
}

impl Suspension {
    /// Suspension without follow-up work.
    #[must_use]
    pub fn new(condition: ResumeCondition) -> Self {
        Self {
            condition,
            continuation: None,
        }
    }

    /// Attach work to run with the resolution value once resolved.
    #[must_use]
    pub fn then<F>(mut self, continuation: F) -> Self
    where
        F: FnOnce(Value) -> Result<(), CommandFailure> + 'static,
    {
        self.continuation = Some(Box::new(continuation));
        self
    }

    /// Condition the host must satisfy.
    #[must_use]
    pub const fn condition(&self) -> &ResumeCondition {
        &self.condition
    }

    pub(crate) fn into_parts(self) -> (ResumeCondition, Option<Continuation>) {
        (self.condition, self.continuation)
    }
}

impl fmt::Debug for Suspension {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Suspension")
            .field("condition", &self.condition)
            .field("has_continuation", &self.continuation.is_some())
            .finish()
    }
}

/// Result of invoking a handler.
pub(crate) enum Dispatch {
    Continue,
    Suspend(Suspension),
}

type Handler = Box<dyn Fn(&Value) -> Result<Dispatch, CommandFailure>>;
type Setup = Box<dyn FnOnce(&Store) -> Handler>;

/// Unregistered command: a name, a mode, and the setup that binds it to a store.
pub struct CommandSpec {
    name: String,
    mode: CommandMode,
    setup: Setup,
}

impl CommandSpec {
    /// Name instructions use to invoke the command.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared mode.
    #[must_use]
    pub const fn mode(&self) -> CommandMode {
        self.mode
    }

    pub(crate) fn bind(self, store: &Store) -> Command {
        Command {
            handler: (self.setup)(store),
            name: self.name,
            mode: self.mode,
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Command bound to a store, as held by the registry.
pub struct Command {
    name: String,
    mode: CommandMode,
    handler: Handler,
}

impl Command {
    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared mode.
    #[must_use]
    pub const fn mode(&self) -> CommandMode {
        self.mode
    }

    pub(crate) fn invoke(&self, payload: &Value) -> Result<Dispatch, CommandFailure> {
        (self.handler)(payload)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Command")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Declare a command that completes synchronously.
pub fn non_blocking<P, S, H>(name: impl Into<String>, setup: S) -> CommandSpec
where
    P: DeserializeOwned,
    S: FnOnce(&Store) -> H + 'static,
    H: Fn(P) -> Result<(), CommandFailure> + 'static,
{
    CommandSpec {
        name: name.into(),
        mode: CommandMode::NonBlocking,
        setup: Box::new(move |store| {
            let handler = setup(store);
            Box::new(move |payload| {
                handler(decode(payload)?)?;
                Ok(Dispatch::Continue)
            })
        }),
    }
}

/// Declare a command that suspends the script until resolved.
pub fn blocking<P, S, H>(name: impl Into<String>, setup: S) -> CommandSpec
where
    P: DeserializeOwned,
    S: FnOnce(&Store) -> H + 'static,
    H: Fn(P) -> Result<Suspension, CommandFailure> + 'static,
{
    CommandSpec {
        name: name.into(),
        mode: CommandMode::Blocking,
        setup: Box::new(move |store| {
            let handler = setup(store);
            Box::new(move |payload| handler(decode(payload)?).map(Dispatch::Suspend))
        }),
    }
}

fn decode<P: DeserializeOwned>(payload: &Value) -> Result<P, CommandFailure> {
    P::deserialize(payload).map_err(|err| CommandFailure::new(format!("invalid payload: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Deserialize)]
    struct Add {
        amount: i64,
    }

    #[test]
    fn setup_runs_once_at_bind_time() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let spec = non_blocking("add", move |_store: &Store| {
            *counter.borrow_mut() += 1;
            |_payload: Add| Ok(())
        });
        assert_eq!(*calls.borrow(), 0);

        let command = spec.bind(&Store::new());
        command.invoke(&json!({"amount": 1})).unwrap();
        command.invoke(&json!({"amount": 2})).unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn handlers_receive_typed_payloads() {
        let store = Store::new();
        let command = non_blocking("add", |store: &Store| {
            let local = store.local().clone();
            move |payload: Add| {
                let line: i64 = local.get("line").map_err(|err| CommandFailure::new(err.to_string()))?;
                local
                    .set("line", line + payload.amount)
                    .map_err(|err| CommandFailure::new(err.to_string()))
            }
        })
        .bind(&store);

        command.invoke(&json!({"amount": 4})).unwrap();
        assert_eq!(store.local().get::<i64>("line").unwrap(), 4);
    }

    #[test]
    fn malformed_payload_is_a_failure() {
        let command = non_blocking("add", |_store: &Store| |_payload: Add| Ok(())).bind(&Store::new());
        let Err(failure) = command.invoke(&json!({"amount": "many"})) else {
            panic!("expected payload failure");
        };
        assert!(failure.reason().starts_with("invalid payload"));
    }

    #[test]
    fn blocking_handlers_return_suspensions() {
        let command = blocking("pause", |_store: &Store| {
            |_payload: Value| Ok(Suspension::new(ResumeCondition::External("fade".into())))
        })
        .bind(&Store::new());

        assert_eq!(command.mode(), CommandMode::Blocking);
        match command.invoke(&Value::Null) {
            Ok(Dispatch::Suspend(suspension)) => assert_eq!(
                suspension.condition(),
                &ResumeCondition::External("fade".into())
            ),
            _ => panic!("expected suspension"),
        }
    }

    #[test]
    fn conditions_describe_themselves() {
        assert_eq!(
            ResumeCondition::Timer(Duration::from_millis(250)).to_string(),
            "waiting 250ms"
        );
        assert_eq!(
            ResumeCondition::Choice(vec!["stay".into(), "leave".into()]).to_string(),
            "waiting for a choice of stay / leave"
        );
    }
}
