//! The immutable command registry.

use std::collections::BTreeMap;

use starnight_store::Store;
use tracing::debug;

use crate::command::{Command, CommandSpec};
use crate::error::{ScriptError, ScriptResult};

/// Name-keyed set of commands bound to one store.
///
/// Built once through [`CommandRegistry::builder`] and never mutated after.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    fallback: Option<Command>,
}

impl CommandRegistry {
    /// Start registering commands against `store`.
    #[must_use]
    pub fn builder(store: &Store) -> RegistryBuilder {
        RegistryBuilder {
            store: store.clone(),
            commands: BTreeMap::new(),
            fallback: None,
        }
    }

    /// Command registered under `name`, ignoring the fallback.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Command to dispatch for `name`: the registered one, else the fallback.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Command> {
        self.commands.get(name).or(self.fallback.as_ref())
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Number of registered commands, not counting the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether unknown names dispatch to a fallback.
    #[must_use]
    pub const fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Accumulates command registrations for a [`CommandRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    store: Store,
    commands: BTreeMap<String, Command>,
    fallback: Option<Command>,
}

impl RegistryBuilder {
    /// Bind `spec` to the store and add it.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::DuplicateCommand`] when the name is taken.
    pub fn register(mut self, spec: CommandSpec) -> ScriptResult<Self> {
        if self.commands.contains_key(spec.name()) {
            return Err(ScriptError::DuplicateCommand {
                name: spec.name().to_string(),
            });
        }
        let command = spec.bind(&self.store);
        debug!(command = command.name(), mode = ?command.mode(), "command registered");
        self.commands.insert(command.name().to_string(), command);
        Ok(self)
    }

    /// Install the command dispatched for unregistered names.
    #[must_use]
    pub fn fallback(mut self, spec: CommandSpec) -> Self {
        self.fallback = Some(spec.bind(&self.store));
        self
    }

    /// Store the commands are bound to.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Freeze the registrations.
    #[must_use]
    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
            fallback: self.fallback,
        }
    }
}
