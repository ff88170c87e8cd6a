//! Scope names and per-scope field access.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use starnight_reactive::Signal;

use crate::error::{StoreError, StoreResult};

/// The four disjoint namespaces of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeName {
    /// Cross-playthrough data that survives across save slots.
    Global,
    /// Progress data owned by the current save slot.
    Local,
    /// User preferences.
    Config,
    /// Runtime bookkeeping; never transferred by export/import.
    System,
}

impl ScopeName {
    /// Every scope, in snapshot order.
    pub const ALL: [Self; 4] = [Self::Global, Self::Local, Self::Config, Self::System];

    /// Render the scope as its lowercase key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
            Self::Config => "config",
            Self::System => "system",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Global => 0,
            Self::Local => 1,
            Self::Config => 2,
            Self::System => 3,
        }
    }

    /// Whether the scope travels with exported data.
    #[must_use]
    pub const fn is_transferable(self) -> bool {
        !matches!(self, Self::System)
    }
}

impl Display for ScopeName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ScopeName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            "config" => Ok(Self::Config),
            "system" => Ok(Self::System),
            other => Err(StoreError::UnknownScope {
                value: other.to_string(),
            }),
        }
    }
}

/// One scope of the store: a fixed set of named fields, each backed by a
/// signal.
///
/// Cloning a scope clones the signal handles, not the values.
#[derive(Debug, Clone)]
pub struct Scope {
    name: ScopeName,
    fields: BTreeMap<String, Signal<Value>>,
}

impl Scope {
    pub(crate) fn from_defaults(name: ScopeName, defaults: &Map<String, Value>) -> Self {
        let fields = defaults
            .iter()
            .map(|(field, value)| (field.clone(), Signal::new(value.clone())))
            .collect();
        Self { name, fields }
    }

    /// Name of this scope.
    #[must_use]
    pub const fn name(&self) -> ScopeName {
        self.name
    }

    /// Signal backing `field`, if declared.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&Signal<Value>> {
        self.fields.get(field)
    }

    /// Handle to the signal backing `field`.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::UnknownField`] for undeclared fields.
    pub fn signal(&self, field: &str) -> StoreResult<Signal<Value>> {
        self.field(field)
            .cloned()
            .ok_or_else(|| self.unknown_field(field))
    }

    /// Whether `field` is declared in this scope.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Declared field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Raw JSON value of `field`.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::UnknownField`] for undeclared fields.
    pub fn value(&self, field: &str) -> StoreResult<Value> {
        self.field(field)
            .map(Signal::get)
            .ok_or_else(|| self.unknown_field(field))
    }

    /// Read `field` as `T`.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::UnknownField`] for undeclared fields and
    /// [`StoreError::FieldType`] when the value does not convert.
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> StoreResult<T> {
        let value = self.value(field)?;
        serde_json::from_value(value).map_err(|source| StoreError::FieldType {
            scope: self.name,
            field: field.to_string(),
            source,
        })
    }

    /// Serialize `value` and write it to `field`, notifying its subscribers.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::UnknownField`] for undeclared fields and
    /// [`StoreError::FieldType`] when the value does not convert.
    pub fn set<T: Serialize>(&self, field: &str, value: T) -> StoreResult<()> {
        let signal = self.field(field).ok_or_else(|| self.unknown_field(field))?;
        let value = serde_json::to_value(value).map_err(|source| StoreError::FieldType {
            scope: self.name,
            field: field.to_string(),
            source,
        })?;
        signal.set(value);
        Ok(())
    }

    /// Deep copy of every field value.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(field, signal)| (field.clone(), signal.get()))
            .collect()
    }

    /// Read the whole scope as a typed record.
    ///
    /// Fields the record does not name are ignored, so extended scopes still
    /// read as their built-in record.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Record`] when the scope does not convert.
    pub fn record<R: DeserializeOwned>(&self) -> StoreResult<R> {
        serde_json::from_value(Value::Object(self.to_map())).map_err(|source| {
            StoreError::Record {
                scope: self.name,
                source,
            }
        })
    }

    fn unknown_field(&self, field: &str) -> StoreError {
        StoreError::UnknownField {
            scope: self.name,
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_scope() -> Scope {
        let defaults = match json!({"count": 1, "label": "x"}) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Scope::from_defaults(ScopeName::Local, &defaults)
    }

    #[test]
    fn scope_names_round_trip_through_strings() {
        for scope in ScopeName::ALL {
            assert_eq!(scope.as_str().parse::<ScopeName>().unwrap(), scope);
        }
        assert!(matches!(
            "saves".parse::<ScopeName>(),
            Err(StoreError::UnknownScope { value }) if value == "saves"
        ));
    }

    #[test]
    fn only_system_is_not_transferable() {
        let excluded: Vec<_> = ScopeName::ALL
            .into_iter()
            .filter(|scope| !scope.is_transferable())
            .collect();
        assert_eq!(excluded, vec![ScopeName::System]);
    }

    #[test]
    fn typed_get_and_set_go_through_signals() {
        let scope = sample_scope();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0_i64));
        let observer = std::rc::Rc::clone(&seen);
        let _sub = scope
            .field("count")
            .unwrap()
            .subscribe(move |value| observer.set(value.as_i64().unwrap_or(-1)));

        scope.set("count", 5).unwrap();

        assert_eq!(scope.get::<i64>("count").unwrap(), 5);
        assert_eq!(seen.get(), 5);
    }

    #[test]
    fn unknown_fields_are_reported() {
        let scope = sample_scope();
        let err = scope.get::<i64>("missing").unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnknownField { scope: ScopeName::Local, ref field } if field == "missing"
        ));
        assert!(scope.set("missing", 1).is_err());
    }

    #[test]
    fn type_mismatch_is_reported() {
        let scope = sample_scope();
        assert!(matches!(
            scope.get::<bool>("label"),
            Err(StoreError::FieldType { .. })
        ));
    }

    #[test]
    fn to_map_is_a_detached_copy() {
        let scope = sample_scope();
        let copy = scope.to_map();
        scope.set("count", 9).unwrap();
        assert_eq!(copy.get("count"), Some(&json!(1)));
    }
}
