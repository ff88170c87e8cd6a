//! Slider views over numeric preference fields.
//!
//! The settings pages present speeds as a `0.0..=1.0` slider where further
//! right means faster, while the store keeps delays and rates in their own
//! units. Each lens maps between the two and writes through the field's
//! signal.

use serde_json::{Value, json};
use starnight_reactive::Lens;

use crate::defaults::{AUTOREAD_SPEED_MAX, TEXT_SPEED_MAX};
use crate::error::StoreResult;
use crate::store::Store;

/// Slider over `config.autoreadspeed` (view = 1 - delay / 2000).
///
/// # Errors
///
/// Fails when the store's schema has no `autoreadspeed` field.
pub fn text_speed_slider(store: &Store) -> StoreResult<Lens<Value, f64>> {
    inverted(store, "autoreadspeed", AUTOREAD_SPEED_MAX)
}

/// Slider over `config.textspeed` (view = 1 - speed / 100).
///
/// # Errors
///
/// Fails when the store's schema has no `textspeed` field.
pub fn auto_speed_slider(store: &Store) -> StoreResult<Lens<Value, f64>> {
    inverted(store, "textspeed", TEXT_SPEED_MAX)
}

/// Slider over `config.textboxopacity` (view = opacity).
///
/// # Errors
///
/// Fails when the store's schema has no `textboxopacity` field.
pub fn opacity_slider(store: &Store) -> StoreResult<Lens<Value, f64>> {
    let signal = store.config().signal("textboxopacity")?;
    Ok(Lens::new(
        signal,
        |value: &Value| value.as_f64().unwrap_or(0.0).clamp(0.0, 1.0),
        |view: f64| json!(view.clamp(0.0, 1.0)),
    ))
}

fn inverted(store: &Store, field: &str, max: f64) -> StoreResult<Lens<Value, f64>> {
    let signal = store.config().signal(field)?;
    Ok(Lens::new(
        signal,
        move |value: &Value| 1.0 - value.as_f64().unwrap_or(0.0).clamp(0.0, max) / max,
        move |view: f64| json!(to_whole(view.clamp(0.0, 1.0).mul_add(-max, max))),
    ))
}

#[allow(clippy::cast_possible_truncation)]
fn to_whole(value: f64) -> i64 {
    value.round() as i64
}
