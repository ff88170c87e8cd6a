//! Shared context, error types, and store persistence for CLI commands.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use starnight_persist::snapshot_file;
use starnight_store::Store;
use tracing::debug;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Store loaded from disk, passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) store: Store,
    pub(crate) store_path: PathBuf,
}

impl AppContext {
    /// Load the store file, falling back to defaults when it does not exist.
    pub(crate) fn load(store_path: &Path) -> CliResult<Self> {
        let store = Store::new();
        let loaded = snapshot_file::load_into(&store, store_path).map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context(format!(
                "failed to load store from {}",
                store_path.display()
            )))
        })?;
        debug!(path = %store_path.display(), loaded, "store ready");
        Ok(Self {
            store,
            store_path: store_path.to_path_buf(),
        })
    }

    /// Persist the store back to its file.
    pub(crate) fn save(&self) -> CliResult<()> {
        snapshot_file::save(&self.store, &self.store_path).map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context(format!(
                "failed to save store to {}",
                self.store_path.display()
            )))
        })
    }
}
