//! Seeded stores, sample scenes, and scratch directories.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;
use starnight_store::Store;
use tempfile::TempDir;

/// Scene exercising every built-in command once.
pub const PROLOGUE_SCENE: &str = r#"# prologue
say {"speaker": "Mio", "text": "You made it."}
achievement {"index": 1}
set_var {"name": "met_mio", "value": true}
wait {"ms": 500}
choose {"options": ["stay", "leave"], "var": "route"}
set_config {"key": "textspeed", "value": 80}
noop
"#;

/// Scene made only of non-blocking commands.
pub const FLAT_SCENE: &str = r#"set_var {"name": "chapter", "value": 1}
achievement {"index": 2}
noop
"#;

/// Store with progress in every transferable scope and a populated `system`.
///
/// # Errors
///
/// Fails when the built-in schema lacks one of the seeded fields.
pub fn seeded_store() -> Result<Store> {
    let store = Store::new();
    store
        .global()
        .set("achievement", json!({"1": true, "4": true}))
        .context("seeding global.achievement")?;
    store
        .local()
        .set("variables", json!({"route": "stay", "affection": {"mio": 3}}))
        .context("seeding local.variables")?;
    store.local().set("scene", "chapter2")?;
    store.local().set("line", 17)?;
    store.config().set("language", "ja")?;
    store.config().set("textspeed", 80)?;
    store.system().set("pending", "waiting for user input")?;
    store.system().set("last_export", "SL://seeded")?;
    Ok(store)
}

/// Temporary directory removed when dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh scratch directory.
    ///
    /// # Errors
    ///
    /// Fails when the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("creating scratch directory")?;
        Ok(Self { dir })
    }

    /// Path of `name` inside the scratch directory.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `contents` to `name` and return its path.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_differs_from_defaults() -> Result<()> {
        let store = seeded_store()?;
        let defaults = Store::new().snapshot();
        let seeded = store.snapshot();
        assert_ne!(seeded.global, defaults.global);
        assert_ne!(seeded.local, defaults.local);
        assert_ne!(seeded.config, defaults.config);
        assert_ne!(seeded.system, defaults.system);
        Ok(())
    }

    #[test]
    fn scratch_files_live_in_the_directory() -> Result<()> {
        let scratch = Scratch::new()?;
        let path = scratch.write("scene.txt", FLAT_SCENE)?;
        assert_eq!(fs::read_to_string(&path)?, FLAT_SCENE);
        assert!(path.starts_with(scratch.dir.path()));
        Ok(())
    }
}
