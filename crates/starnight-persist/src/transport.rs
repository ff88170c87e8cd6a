//! Carriers that move export tokens between devices.
//!
//! A desktop host would back [`TokenTransport`] with the system clipboard;
//! the runtime ships a file carrier and an in-memory one.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Reads and writes a single export token.
pub trait TokenTransport {
    /// Replace the carried token.
    ///
    /// # Errors
    ///
    /// Returns the carrier's IO failure.
    fn write_token(&mut self, token: &str) -> io::Result<()>;

    /// Current carried token.
    ///
    /// # Errors
    ///
    /// Returns the carrier's IO failure, or [`io::ErrorKind::NotFound`] when
    /// nothing has been written.
    fn read_token(&mut self) -> io::Result<String>;
}

/// Token kept in a text file, one line.
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    /// Carrier backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File holding the token.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenTransport for FileTransport {
    fn write_token(&mut self, token: &str) -> io::Result<()> {
        fs::write(&self.path, format!("{token}\n"))
    }

    fn read_token(&mut self) -> io::Result<String> {
        Ok(fs::read_to_string(&self.path)?.trim().to_string())
    }
}

/// Token kept in memory; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryTransport {
    /// Empty carrier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Carrier pre-loaded with `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(token.into()))),
        }
    }

    /// Carried token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl TokenTransport for MemoryTransport {
    fn write_token(&mut self, token: &str) -> io::Result<()> {
        *self.slot.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    fn read_token(&mut self) -> io::Result<String> {
        self.slot
            .borrow()
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no token has been written"))
    }
}
