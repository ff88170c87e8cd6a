#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Scoped reactive state store for the Starnight runtime.
//!
//! The store is split into four disjoint scopes (`global`, `local`, `config`,
//! `system`). Each scope is an open record: a set of named fields, each backed
//! by a [`Signal`](starnight_reactive::Signal) of JSON values. Collaborators
//! add fields with defaults through [`SchemaBuilder`] before the store is
//! constructed.
//!
//! Layout: `scope.rs` (scope names and field access), `schema.rs` (field
//! registration), `defaults.rs` (built-in defaults and option catalogues),
//! `model.rs` (typed views of the built-in records), `store.rs` (`Store`,
//! snapshots, resets), `validate.rs` (config value rules), `sliders.rs`
//! (settings-screen lenses).

pub mod defaults;
pub mod error;
pub mod model;
pub mod schema;
pub mod scope;
pub mod sliders;
pub mod store;
pub mod validate;

pub use error::{StoreError, StoreResult};
pub use model::{ConfigData, DialogLine, GlobalData, LocalData, SystemData};
pub use schema::{Schema, SchemaBuilder};
pub use scope::{Scope, ScopeName};
pub use sliders::{auto_speed_slider, opacity_slider, text_speed_slider};
pub use store::{ResetKind, Store, StoreSnapshot};
pub use validate::validate_config_value;

pub use starnight_reactive::{Lens, Signal, Subscription};
