//! Built-in field defaults and option catalogues.
//!
//! # Design
//! - Defaults are plain JSON so schema construction cannot fail.
//! - `model.rs` mirrors these records as typed structs; a test keeps them in step.

use serde_json::{Map, Value, json};

use crate::scope::ScopeName;

/// Upper bound of `config.autoreadspeed`, in milliseconds.
pub const AUTOREAD_SPEED_MAX: f64 = 2000.0;
/// Upper bound of `config.textspeed`.
pub const TEXT_SPEED_MAX: f64 = 100.0;
/// Selectable `config.textboxfontsize` values (small, medium, large).
pub const TEXT_SIZES: [&str; 3] = ["155%", "205%", "230%"];
/// Selectable `config.textboxfont` values.
pub const TEXT_FONTS: [&str; 3] = ["思源宋体", "LXGW", "WebgalUI"];
/// Selectable `config.language` values.
pub const LANGUAGES: [&str; 3] = ["zh-CN", "en", "ja"];

/// Default fields of the given scope.
#[must_use]
pub fn scope_defaults(scope: ScopeName) -> Map<String, Value> {
    let record = match scope {
        ScopeName::Global => json!({
            "achievement": {},
        }),
        ScopeName::Local => json!({
            "variables": {},
            "scene": "",
            "line": 0,
        }),
        ScopeName::Config => json!({
            "fullscreen": true,
            "textboxfontsize": TEXT_SIZES[1],
            "textboxfont": TEXT_FONTS[0],
            "textboxopacity": 0.75,
            "autoreadspeed": 1000,
            "textspeed": 50,
            "language": LANGUAGES[0],
        }),
        ScopeName::System => json!({
            "last_export": null,
            "dialog": null,
            "pending": null,
        }),
    };
    match record {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}
