//! The aggregate store, its snapshots, and reset actions.

use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::schema::Schema;
use crate::scope::{Scope, ScopeName};

/// Immutable deep copy of all four scopes.
///
/// Serializes as `{"global": {..}, "local": {..}, "config": {..}, "system": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSnapshot {
    /// Cross-playthrough data.
    #[serde(default)]
    pub global: Map<String, Value>,
    /// Save-slot data.
    #[serde(default)]
    pub local: Map<String, Value>,
    /// User preferences.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Runtime bookkeeping.
    #[serde(default)]
    pub system: Map<String, Value>,
}

impl StoreSnapshot {
    /// Fields of one scope.
    #[must_use]
    pub const fn scope(&self, scope: ScopeName) -> &Map<String, Value> {
        match scope {
            ScopeName::Global => &self.global,
            ScopeName::Local => &self.local,
            ScopeName::Config => &self.config,
            ScopeName::System => &self.system,
        }
    }

    /// Plain JSON object keyed by scope name.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let object: Map<String, Value> = ScopeName::ALL
            .into_iter()
            .map(|scope| {
                (
                    scope.as_str().to_string(),
                    Value::Object(self.scope(scope).clone()),
                )
            })
            .collect();
        Value::Object(object)
    }
}

/// Reset actions offered by the system settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Clear save-slot progress and cross-playthrough data.
    ClearGameSave,
    /// Restore user preferences.
    ResetSettings,
    /// Restore every scope.
    ClearAll,
}

impl ResetKind {
    /// Scopes restored by this action.
    #[must_use]
    pub const fn scopes(self) -> &'static [ScopeName] {
        match self {
            Self::ClearGameSave => &[ScopeName::Local, ScopeName::Global],
            Self::ResetSettings => &[ScopeName::Config],
            Self::ClearAll => &ScopeName::ALL,
        }
    }

    /// Kebab-case identifier used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClearGameSave => "clear-game-save",
            Self::ResetSettings => "reset-settings",
            Self::ClearAll => "clear-all",
        }
    }
}

impl FromStr for ResetKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear-game-save" => Ok(Self::ClearGameSave),
            "reset-settings" => Ok(Self::ResetSettings),
            "clear-all" => Ok(Self::ClearAll),
            other => Err(StoreError::UnknownReset {
                value: other.to_string(),
            }),
        }
    }
}

/// Reactive state store partitioned into four scopes.
///
/// Cloning a store clones signal handles: both clones observe and mutate the
/// same state.
#[derive(Debug, Clone)]
pub struct Store {
    schema: Rc<Schema>,
    global: Scope,
    local: Scope,
    config: Scope,
    system: Scope,
}

impl Store {
    /// Store with the built-in schema.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schema(Schema::default())
    }

    /// Store with an extended schema.
    #[must_use]
    pub fn with_schema(schema: Schema) -> Self {
        let scope = |name| Scope::from_defaults(name, schema.defaults(name));
        Self {
            global: scope(ScopeName::Global),
            local: scope(ScopeName::Local),
            config: scope(ScopeName::Config),
            system: scope(ScopeName::System),
            schema: Rc::new(schema),
        }
    }

    /// Schema the store was built from.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Cross-playthrough scope.
    #[must_use]
    pub const fn global(&self) -> &Scope {
        &self.global
    }

    /// Save-slot scope.
    #[must_use]
    pub const fn local(&self) -> &Scope {
        &self.local
    }

    /// Preference scope.
    #[must_use]
    pub const fn config(&self) -> &Scope {
        &self.config
    }

    /// Runtime bookkeeping scope.
    #[must_use]
    pub const fn system(&self) -> &Scope {
        &self.system
    }

    /// Scope by name.
    #[must_use]
    pub const fn scope(&self, name: ScopeName) -> &Scope {
        match name {
            ScopeName::Global => &self.global,
            ScopeName::Local => &self.local,
            ScopeName::Config => &self.config,
            ScopeName::System => &self.system,
        }
    }

    /// Deep copy of every scope.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            global: self.global.to_map(),
            local: self.local.to_map(),
            config: self.config.to_map(),
            system: self.system.to_map(),
        }
    }

    /// Write plain data back into the store's signals.
    ///
    /// `data` must be an object keyed by scope names whose values are objects.
    /// Scopes named in `excluding` are validated but not written. Every
    /// declared field present in the data is written through its signal, so
    /// existing subscribers observe the change; absent fields keep their
    /// values and undeclared fields are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShapeMismatch`] when the layout does not match the
    /// declared scopes. Validation completes before any write, so a failed
    /// restore leaves the store unchanged.
    pub fn restore(&self, data: &Value, excluding: &[ScopeName]) -> StoreResult<()> {
        let Value::Object(incoming) = data else {
            return Err(StoreError::ShapeMismatch {
                reason: "top level is not an object".to_string(),
            });
        };

        let mut plan = Vec::with_capacity(incoming.len());
        for (key, value) in incoming {
            let scope = key
                .parse::<ScopeName>()
                .map_err(|_| StoreError::ShapeMismatch {
                    reason: format!("unknown scope '{key}'"),
                })?;
            let Value::Object(fields) = value else {
                return Err(StoreError::ShapeMismatch {
                    reason: format!("scope '{key}' is not an object"),
                });
            };
            if !excluding.contains(&scope) {
                plan.push((scope, fields));
            }
        }

        for (scope, fields) in plan {
            let target = self.scope(scope);
            for (field, value) in fields {
                match target.field(field) {
                    Some(signal) => signal.set(value.clone()),
                    None => warn!(%scope, field = %field, "skipping undeclared field during restore"),
                }
            }
            debug!(%scope, fields = fields.len(), "scope restored");
        }
        Ok(())
    }

    /// Restore from a typed snapshot; see [`Store::restore`].
    ///
    /// # Errors
    ///
    /// Propagates [`Store::restore`] failures.
    pub fn restore_snapshot(
        &self,
        snapshot: &StoreSnapshot,
        excluding: &[ScopeName],
    ) -> StoreResult<()> {
        self.restore(&snapshot.to_value(), excluding)
    }

    /// Write the schema default into every field of `scope`.
    pub fn reset(&self, scope: ScopeName) {
        let target = self.scope(scope);
        for (field, default) in self.schema.defaults(scope) {
            if let Some(signal) = target.field(field) {
                signal.set(default.clone());
            }
        }
        info!(%scope, "scope reset to defaults");
    }

    /// Reset several scopes in order.
    pub fn reset_many(&self, scopes: &[ScopeName]) {
        for scope in scopes {
            self.reset(*scope);
        }
    }

    /// Apply a settings-page reset action.
    pub fn apply_reset(&self, kind: ResetKind) {
        self.reset_many(kind.scopes());
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
