//! Export/import through a token carrier, reported as user-facing outcomes.

use starnight_store::Store;
use tracing::{info, warn};

use crate::codec::{self, LAST_EXPORT_FIELD};
use crate::error::{DecodeStep, PersistError};
use crate::transport::TokenTransport;

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Store to carrier.
    Export,
    /// Carrier to store.
    Import,
}

/// What happened during a transfer.
#[derive(Debug)]
pub enum TransferOutcome {
    /// The token was written to the carrier.
    Exported {
        /// Token that was written.
        token: String,
    },
    /// The carrier's token was applied to the store.
    Imported,
    /// Nothing was applied.
    Failed {
        /// Direction that failed.
        direction: TransferDirection,
        /// Cause of the failure.
        error: PersistError,
    },
}

impl TransferOutcome {
    /// Whether the transfer completed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Failure cause, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&PersistError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Message suitable for a toast or status line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Exported { .. } => "Save data exported.".to_string(),
            Self::Imported => "Save data imported.".to_string(),
            Self::Failed { direction, error } => failure_message(*direction, error),
        }
    }
}

/// Export `store` and hand the token to `transport`.
///
/// On success the token is also recorded in `system.last_export`.
pub fn export_to(store: &Store, transport: &mut dyn TokenTransport) -> TransferOutcome {
    let failed = |error| TransferOutcome::Failed {
        direction: TransferDirection::Export,
        error,
    };
    let token = match codec::export(store) {
        Ok(token) => token,
        Err(error) => return failed(error),
    };
    if let Err(source) = transport.write_token(&token) {
        warn!(error = %source, "writing export token failed");
        return failed(PersistError::Transport {
            operation: "write_token",
            source,
        });
    }
    if let Some(signal) = store.system().field(LAST_EXPORT_FIELD) {
        signal.set(token.clone().into());
    }
    info!(token_bytes = token.len(), "export token written");
    TransferOutcome::Exported { token }
}

/// Read a token from `transport` and import it into `store`.
pub fn import_from(store: &Store, transport: &mut dyn TokenTransport) -> TransferOutcome {
    let failed = |error| TransferOutcome::Failed {
        direction: TransferDirection::Import,
        error,
    };
    let token = match transport.read_token() {
        Ok(token) => token,
        Err(source) => {
            warn!(error = %source, "reading export token failed");
            return failed(PersistError::Transport {
                operation: "read_token",
                source,
            });
        }
    };
    match codec::import(store, &token) {
        Ok(()) => TransferOutcome::Imported,
        Err(error) => {
            warn!(error = %error, "import rejected");
            failed(error)
        }
    }
}

fn failure_message(direction: TransferDirection, error: &PersistError) -> String {
    match (direction, error) {
        (TransferDirection::Export, PersistError::Transport { source, .. }) => {
            format!("Could not write the export token: {source}.")
        }
        (TransferDirection::Import, PersistError::Transport { source, .. }) => {
            format!("Could not read an export token: {source}.")
        }
        (_, PersistError::BadFormat) => "That text is not a Starnight export token.".to_string(),
        (_, PersistError::DecodeFailure { step: DecodeStep::Decompress, .. }) => {
            "The export token is damaged or incomplete.".to_string()
        }
        (_, PersistError::DecodeFailure { step: DecodeStep::Parse, .. }) => {
            "The export token does not contain readable save data.".to_string()
        }
        (_, PersistError::ShapeMismatch(source)) => {
            format!("The export token does not match this game's save layout ({source}).")
        }
        (_, PersistError::Encode { detail }) => format!("Save data could not be encoded: {detail}."),
        (_, PersistError::SnapshotFile { path, .. }) => {
            format!("Save file {} could not be used.", path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use std::io;

    struct Broken;

    impl TokenTransport for Broken {
        fn write_token(&mut self, _token: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "clipboard locked"))
        }

        fn read_token(&mut self) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "clipboard locked"))
        }
    }

    #[test]
    fn export_records_last_export() {
        let store = Store::new();
        let mut transport = MemoryTransport::new();
        let outcome = export_to(&store, &mut transport);

        let TransferOutcome::Exported { token } = &outcome else {
            panic!("export failed: {}", outcome.message());
        };
        assert_eq!(transport.token().as_ref(), Some(token));
        assert_eq!(
            store.system().get::<String>("last_export").unwrap(),
            *token
        );
        assert_eq!(outcome.message(), "Save data exported.");
    }

    #[test]
    fn repeated_exports_do_not_grow() {
        let store = Store::new();
        let mut transport = MemoryTransport::new();
        let lengths: Vec<usize> = (0..3)
            .map(|_| match export_to(&store, &mut transport) {
                TransferOutcome::Exported { token } => token.len(),
                outcome => panic!("export failed: {}", outcome.message()),
            })
            .collect();
        assert_eq!(lengths[0], lengths[1]);
        assert_eq!(lengths[1], lengths[2]);
    }

    #[test]
    fn transport_failures_are_reported_not_raised() {
        let store = Store::new();
        let outcome = export_to(&store, &mut Broken);
        assert!(!outcome.is_success());
        assert!(matches!(
            outcome.error(),
            Some(PersistError::Transport { operation: "write_token", .. })
        ));
        assert!(outcome.message().contains("clipboard locked"));
        assert_eq!(store.system().value("last_export").unwrap(), serde_json::Value::Null);

        let outcome = import_from(&store, &mut Broken);
        assert!(outcome.message().starts_with("Could not read"));
    }

    #[test]
    fn garbage_tokens_fail_with_a_readable_message() {
        let store = Store::new();
        let before = store.snapshot();
        let outcome = import_from(&store, &mut MemoryTransport::with_token("garbage"));

        assert!(matches!(outcome.error(), Some(PersistError::BadFormat)));
        assert_eq!(outcome.message(), "That text is not a Starnight export token.");
        assert_eq!(store.snapshot(), before);
    }
}
