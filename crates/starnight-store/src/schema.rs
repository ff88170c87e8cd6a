//! Field registration for the open scope records.
//!
//! A [`Schema`] lists every field of every scope together with its default
//! value. The built-in fields come from [`scope_defaults`]; collaborators add
//! their own through [`SchemaBuilder::field`] before the store is built.
//! Registration is additive only: a field cannot be redeclared or removed.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::defaults::scope_defaults;
use crate::error::{StoreError, StoreResult};
use crate::scope::ScopeName;

/// Declared fields and defaults for all four scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    scopes: [Map<String, Value>; 4],
}

impl Schema {
    /// Builder seeded with the built-in fields.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Default values of every field declared in `scope`.
    #[must_use]
    pub const fn defaults(&self, scope: ScopeName) -> &Map<String, Value> {
        &self.scopes[scope.index()]
    }

    /// Default value of a single field.
    #[must_use]
    pub fn default_value(&self, scope: ScopeName, field: &str) -> Option<&Value> {
        self.defaults(scope).get(field)
    }

    /// Whether `field` is declared in `scope`.
    #[must_use]
    pub fn declares(&self, scope: ScopeName, field: &str) -> bool {
        self.defaults(scope).contains_key(field)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            scopes: ScopeName::ALL.map(scope_defaults),
        }
    }
}

/// Builder that merges extra field registrations onto a base schema.
#[derive(Debug)]
pub struct SchemaBuilder {
    scopes: [Map<String, Value>; 4],
    failures: Vec<StoreError>,
}

impl SchemaBuilder {
    /// Builder seeded with the built-in fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: Schema::default().scopes,
            failures: Vec::new(),
        }
    }

    /// Builder with four empty scopes.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            scopes: ScopeName::ALL.map(|_| Map::new()),
            failures: Vec::new(),
        }
    }

    /// Declare `name` in `scope` with the given default.
    ///
    /// Conflicts and serialization failures are reported by [`Self::build`].
    #[must_use]
    pub fn field(
        mut self,
        scope: ScopeName,
        name: impl Into<String>,
        default: impl Serialize,
    ) -> Self {
        let name = name.into();
        match serde_json::to_value(default) {
            Ok(value) => self.insert(scope, name, value),
            Err(source) => self.failures.push(StoreError::FieldType {
                scope,
                field: name,
                source,
            }),
        }
        self
    }

    /// Declare every field of a serializable record in `scope`.
    #[must_use]
    pub fn record<R: Serialize>(mut self, scope: ScopeName, record: &R) -> Self {
        match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => {
                for (name, value) in fields {
                    self.insert(scope, name, value);
                }
            }
            Ok(_) => self.failures.push(StoreError::ShapeMismatch {
                reason: format!("record for scope '{scope}' is not an object"),
            }),
            Err(source) => self.failures.push(StoreError::Record { scope, source }),
        }
        self
    }

    /// Finish registration.
    ///
    /// # Errors
    ///
    /// Returns the first registration failure, such as
    /// [`StoreError::DuplicateField`].
    pub fn build(self) -> StoreResult<Schema> {
        if let Some(failure) = self.failures.into_iter().next() {
            return Err(failure);
        }
        Ok(Schema {
            scopes: self.scopes,
        })
    }

    fn insert(&mut self, scope: ScopeName, name: String, value: Value) {
        let fields = &mut self.scopes[scope.index()];
        if fields.contains_key(&name) {
            self.failures
                .push(StoreError::DuplicateField { scope, field: name });
        } else {
            fields.insert(name, value);
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
