//! Validation rules for user preference values.

use serde_json::Value;

use crate::defaults::{AUTOREAD_SPEED_MAX, LANGUAGES, TEXT_FONTS, TEXT_SIZES, TEXT_SPEED_MAX};
use crate::error::{StoreError, StoreResult};
use crate::scope::ScopeName;

/// Check a value destined for `config.<field>`.
///
/// Built-in preference fields are checked against their option lists and
/// ranges; fields contributed by schema extensions carry no rules and are
/// accepted as-is.
///
/// # Errors
///
/// Returns [`StoreError::InvalidField`] describing the violated rule.
pub fn validate_config_value(field: &str, value: &Value) -> StoreResult<()> {
    match field {
        "fullscreen" => require(field, value, value.is_boolean(), "must be a boolean"),
        "textboxfontsize" => one_of(field, value, &TEXT_SIZES),
        "textboxfont" => one_of(field, value, &TEXT_FONTS),
        "language" => one_of(field, value, &LANGUAGES),
        "textboxopacity" => in_range(field, value, 1.0),
        "autoreadspeed" => in_range(field, value, AUTOREAD_SPEED_MAX),
        "textspeed" => in_range(field, value, TEXT_SPEED_MAX),
        _ => Ok(()),
    }
}

fn one_of(field: &str, value: &Value, options: &[&str]) -> StoreResult<()> {
    let valid = value.as_str().is_some_and(|text| options.contains(&text));
    require(field, value, valid, "must be one of the listed options")
}

fn in_range(field: &str, value: &Value, max: f64) -> StoreResult<()> {
    let valid = value
        .as_f64()
        .is_some_and(|number| (0.0..=max).contains(&number));
    require(field, value, valid, "must be a number within the allowed range")
}

fn require(field: &str, value: &Value, valid: bool, reason: &'static str) -> StoreResult<()> {
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField {
            scope: ScopeName::Config,
            field: field.to_string(),
            value: Some(value.to_string()),
            reason,
        })
    }
}
