//! Typed views of the built-in scope records.
//!
//! # Design
//! - Pure data carriers read through [`Scope::record`](crate::Scope::record).
//! - Every field defaults, so data written by older players still reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults::{LANGUAGES, TEXT_FONTS, TEXT_SIZES};

/// Cross-playthrough data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalData {
    /// Achievement index to unlocked flag.
    pub achievement: BTreeMap<u32, bool>,
}

impl GlobalData {
    /// Whether the achievement at `index` is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, index: u32) -> bool {
        self.achievement.get(&index).copied().unwrap_or(false)
    }
}

/// Progress data of the current save slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalData {
    /// Script variables set by scenes.
    pub variables: Map<String, Value>,
    /// Scene currently being played.
    pub scene: String,
    /// Instruction index within the scene.
    pub line: u64,
}

/// User preferences shown on the display and system settings pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    /// Whether the player runs fullscreen.
    pub fullscreen: bool,
    /// Text box font size, one of [`TEXT_SIZES`].
    pub textboxfontsize: String,
    /// Text box font, one of [`TEXT_FONTS`].
    pub textboxfont: String,
    /// Text box opacity in `0.0..=1.0`.
    pub textboxopacity: f64,
    /// Auto-read delay in milliseconds.
    pub autoreadspeed: f64,
    /// Text reveal speed in `0..=100`.
    pub textspeed: f64,
    /// Interface language, one of [`LANGUAGES`].
    pub language: String,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            fullscreen: true,
            textboxfontsize: TEXT_SIZES[1].to_string(),
            textboxfont: TEXT_FONTS[0].to_string(),
            textboxopacity: 0.75,
            autoreadspeed: 1000.0,
            textspeed: 50.0,
            language: LANGUAGES[0].to_string(),
        }
    }
}

/// Line of dialogue currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogLine {
    /// Speaking character, if any.
    #[serde(default)]
    pub speaker: Option<String>,
    /// Spoken text.
    pub text: String,
}

/// Runtime bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemData {
    /// Token of the most recent export.
    pub last_export: Option<String>,
    /// Dialogue line awaiting the reader.
    pub dialog: Option<DialogLine>,
    /// Description of the executor's outstanding suspension.
    pub pending: Option<String>,
}
