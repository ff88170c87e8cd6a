//! Commands every scene can rely on.
//!
//! | name | mode | payload |
//! |---|---|---|
//! | `achievement` | non-blocking | `{"index": u32}` |
//! | `set_var` | non-blocking | `{"name": string, "value": any}` |
//! | `set_config` | non-blocking | `{"key": string, "value": any}` |
//! | `say` | blocking | `{"speaker"?: string, "text": string}` |
//! | `wait` | blocking | `{"ms": u64}` |
//! | `choose` | blocking | `{"options": [string], "var": string}` |
//! | `noop` | non-blocking | ignored |

use std::time::Duration;

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::{Value, json};
use starnight_store::{DialogLine, Scope, Store, StoreError, validate_config_value};
use tracing::{debug, info};

use crate::command::{
    CommandFailure, CommandSpec, ResumeCondition, Suspension, blocking, non_blocking,
};
use crate::error::ScriptResult;
use crate::registry::RegistryBuilder;

/// Register every built-in command.
///
/// # Errors
///
/// Fails with [`ScriptError::DuplicateCommand`](crate::ScriptError::DuplicateCommand)
/// when the builder already holds one of the built-in names.
pub fn register_defaults(builder: RegistryBuilder) -> ScriptResult<RegistryBuilder> {
    [
        achievement(),
        set_var(),
        set_config(),
        say(),
        wait(),
        choose(),
        noop(),
    ]
    .into_iter()
    .try_fold(builder, RegistryBuilder::register)
}

#[derive(Debug, Deserialize)]
struct AchievementPayload {
    index: u32,
}

/// Unlock `global.achievement[index]`; unlocking twice writes nothing.
#[must_use]
pub fn achievement() -> CommandSpec {
    non_blocking("achievement", |store: &Store| {
        let global = store.global().clone();
        move |payload: AchievementPayload| {
            let signal = global.signal("achievement").map_err(fault)?;
            let key = payload.index.to_string();
            if signal.with(|value| value.get(&key) == Some(&Value::Bool(true))) {
                debug!(index = payload.index, "achievement already unlocked");
                return Ok(());
            }
            let mut unlocked = signal.get();
            let Some(entries) = unlocked.as_object_mut() else {
                return Err(CommandFailure::new("global.achievement is not an object"));
            };
            entries.insert(key, Value::Bool(true));
            signal.set(unlocked);
            info!(index = payload.index, "achievement unlocked");
            Ok(())
        }
    })
}

#[derive(Debug, Deserialize)]
struct SetVarPayload {
    name: String,
    value: Value,
}

/// Store a scene variable in `local.variables`.
#[must_use]
pub fn set_var() -> CommandSpec {
    non_blocking("set_var", |store: &Store| {
        let local = store.local().clone();
        move |payload: SetVarPayload| write_variable(&local, payload.name, payload.value)
    })
}

#[derive(Debug, Deserialize)]
struct SetConfigPayload {
    key: String,
    value: Value,
}

/// Change a declared preference after validating the value.
#[must_use]
pub fn set_config() -> CommandSpec {
    non_blocking("set_config", |store: &Store| {
        let config = store.config().clone();
        move |payload: SetConfigPayload| {
            if !config.contains(&payload.key) {
                return Err(CommandFailure::new(format!(
                    "unknown config key '{}'",
                    payload.key
                )));
            }
            validate_config_value(&payload.key, &payload.value).map_err(fault)?;
            config.set(&payload.key, payload.value).map_err(fault)
        }
    })
}

/// Show a line of dialogue in `system.dialog` and wait for the reader.
#[must_use]
pub fn say() -> CommandSpec {
    blocking("say", |store: &Store| {
        let system = store.system().clone();
        move |line: DialogLine| {
            system.set("dialog", line).map_err(fault)?;
            Ok(Suspension::new(ResumeCondition::UserInput))
        }
    })
}

#[derive(Debug, Deserialize)]
struct WaitPayload {
    ms: u64,
}

/// Pause for a fixed delay; the host resolves once it elapses.
#[must_use]
pub fn wait() -> CommandSpec {
    blocking("wait", |_store: &Store| {
        |payload: WaitPayload| {
            Ok(Suspension::new(ResumeCondition::Timer(Duration::from_millis(
                payload.ms,
            ))))
        }
    })
}

#[derive(Debug, Deserialize)]
struct ChoosePayload {
    options: Vec<String>,
    var: String,
}

/// Offer options and store the pick in `local.variables[var]`.
///
/// The resolution value is either the chosen option text or its zero-based
/// index.
#[must_use]
pub fn choose() -> CommandSpec {
    blocking("choose", |store: &Store| {
        let local = store.local().clone();
        move |payload: ChoosePayload| {
            if payload.options.is_empty() {
                return Err(CommandFailure::new("choose needs at least one option"));
            }
            let local = local.clone();
            let options = payload.options.clone();
            let var = payload.var;
            Ok(
                Suspension::new(ResumeCondition::Choice(payload.options)).then(move |picked| {
                    let choice = pick(&options, &picked)?;
                    write_variable(&local, var, Value::String(choice))
                }),
            )
        }
    })
}

/// Accept any payload and do nothing.
#[must_use]
pub fn noop() -> CommandSpec {
    non_blocking("noop", |_store: &Store| |_payload: IgnoredAny| Ok(()))
}

fn pick(options: &[String], picked: &Value) -> Result<String, CommandFailure> {
    let chosen = match picked {
        Value::String(text) => options.iter().find(|option| *option == text),
        Value::Number(number) => number
            .as_u64()
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| options.get(index)),
        _ => None,
    };
    chosen
        .cloned()
        .ok_or_else(|| CommandFailure::new(format!("{picked} is not one of the offered options")))
}

fn write_variable(local: &Scope, name: String, value: Value) -> Result<(), CommandFailure> {
    let signal = local.signal("variables").map_err(fault)?;
    let mut variables = signal.get();
    if variables.is_null() {
        variables = json!({});
    }
    let Some(entries) = variables.as_object_mut() else {
        return Err(CommandFailure::new("local.variables is not an object"));
    };
    entries.insert(name, value);
    signal.set(variables);
    Ok(())
}

fn fault(err: StoreError) -> CommandFailure {
    CommandFailure::new(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Dispatch;
    use crate::registry::CommandRegistry;
    use std::cell::Cell;
    use std::rc::Rc;

    fn registry(store: &Store) -> CommandRegistry {
        register_defaults(CommandRegistry::builder(store))
            .unwrap()
            .build()
    }

    fn suspend(registry: &CommandRegistry, name: &str, payload: Value) -> Suspension {
        match registry.resolve(name).unwrap().invoke(&payload) {
            Ok(Dispatch::Suspend(suspension)) => suspension,
            Ok(Dispatch::Continue) => panic!("{name} did not suspend"),
            Err(failure) => panic!("{name} failed: {failure}"),
        }
    }

    #[test]
    fn registers_every_builtin() {
        let registry = registry(&Store::new());
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["achievement", "choose", "noop", "say", "set_config", "set_var", "wait"]
        );
    }

    #[test]
    fn achievement_unlocks_once_without_rewriting() {
        let store = Store::new();
        let registry = registry(&store);
        let writes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&writes);
        let _sub = store
            .global()
            .signal("achievement")
            .unwrap()
            .subscribe(move |_| counter.set(counter.get() + 1));

        let command = registry.resolve("achievement").unwrap();
        command.invoke(&json!({"index": 3})).unwrap();
        command.invoke(&json!({"index": 3})).unwrap();

        assert_eq!(writes.get(), 1);
        assert_eq!(
            store.global().value("achievement").unwrap(),
            json!({"3": true})
        );
    }

    #[test]
    fn set_config_validates_keys_and_values() {
        let store = Store::new();
        let registry = registry(&store);
        let command = registry.resolve("set_config").unwrap();

        command
            .invoke(&json!({"key": "language", "value": "ja"}))
            .unwrap();
        assert_eq!(store.config().get::<String>("language").unwrap(), "ja");

        assert!(command.invoke(&json!({"key": "volume", "value": 3})).is_err());
        assert!(
            command
                .invoke(&json!({"key": "textspeed", "value": 400}))
                .is_err()
        );
        assert_eq!(store.config().get::<u32>("textspeed").unwrap(), 50);
    }

    #[test]
    fn say_records_the_dialog_line() {
        let store = Store::new();
        let registry = registry(&store);
        let suspension = suspend(&registry, "say", json!({"speaker": "Mio", "text": "Morning."}));

        assert_eq!(suspension.condition(), &ResumeCondition::UserInput);
        assert_eq!(
            store.system().get::<DialogLine>("dialog").unwrap(),
            DialogLine {
                speaker: Some("Mio".into()),
                text: "Morning.".into(),
            }
        );
    }

    #[test]
    fn wait_suspends_on_a_timer() {
        let registry = registry(&Store::new());
        let suspension = suspend(&registry, "wait", json!({"ms": 1500}));
        assert_eq!(
            suspension.condition(),
            &ResumeCondition::Timer(Duration::from_millis(1500))
        );
    }

    #[test]
    fn choose_continuation_stores_the_pick() {
        let store = Store::new();
        let registry = registry(&store);
        let payload = json!({"options": ["tea", "coffee"], "var": "drink"});

        let (_, continuation) = suspend(&registry, "choose", payload.clone()).into_parts();
        continuation.unwrap()(json!("coffee")).unwrap();
        assert_eq!(
            store.local().value("variables").unwrap(),
            json!({"drink": "coffee"})
        );

        let (_, continuation) = suspend(&registry, "choose", payload.clone()).into_parts();
        continuation.unwrap()(json!(0)).unwrap();
        assert_eq!(
            store.local().value("variables").unwrap(),
            json!({"drink": "tea"})
        );

        let (_, continuation) = suspend(&registry, "choose", payload).into_parts();
        assert!(continuation.unwrap()(json!("juice")).is_err());
    }

    #[test]
    fn choose_without_options_fails() {
        let registry = registry(&Store::new());
        let command = registry.resolve("choose").unwrap();
        assert!(command.invoke(&json!({"options": [], "var": "x"})).is_err());
    }

    #[test]
    fn noop_accepts_anything() {
        let registry = registry(&Store::new());
        let command = registry.resolve("noop").unwrap();
        assert!(command.invoke(&Value::Null).is_ok());
        assert!(command.invoke(&json!({"comment": "fade"})).is_ok());
    }
}
