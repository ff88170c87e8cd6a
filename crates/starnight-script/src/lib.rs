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

//! Command registry and scene script executor.
//!
//! Scenes are lists of [`Instruction`]s. The [`Executor`] dispatches each one
//! to a command registered in the [`CommandRegistry`]; non-blocking commands
//! run to completion while blocking commands suspend the script until the
//! host presents the matching [`SuspensionToken`].

pub mod builtins;
pub mod command;
pub mod error;
pub mod executor;
pub mod registry;
pub mod script;

pub use command::{
    Command, CommandFailure, CommandMode, CommandSpec, ResumeCondition, Suspension, blocking,
    non_blocking,
};
pub use error::{ScriptError, ScriptResult};
pub use executor::{
    Executor, ExecutorState, ResolveOutcome, RunOutcome, StepOutcome, SuspensionToken,
};
pub use registry::{CommandRegistry, RegistryBuilder};
pub use script::{Instruction, Script};
