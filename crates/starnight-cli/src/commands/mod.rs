//! Command handlers, one module per subcommand.

pub(crate) mod export;
pub(crate) mod import;
pub(crate) mod reset;
pub(crate) mod run;
pub(crate) mod show;
