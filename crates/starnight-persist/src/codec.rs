//! Export token codec.
//!
//! A token is [`EXPORT_PREFIX`] followed by the standard base64 encoding of
//! the raw-deflate compressed JSON snapshot. Importing runs a fixed pipeline
//! (prefix, decompress, parse, shape check, merge) and stops at the first
//! failing step; the store is written only after every step has passed.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde_json::Value;
use starnight_store::{ScopeName, Store, StoreError};
use tracing::{debug, info};

use crate::error::{DecodeStep, PersistError, PersistResult};
use crate::merge::deep_merge;

/// Literal prefix every export token starts with.
pub const EXPORT_PREFIX: &str = "SL://";

/// Upper bound on the inflated size of a token payload.
pub const MAX_DECODED_BYTES: u64 = 16 * 1024 * 1024;

pub(crate) const LAST_EXPORT_FIELD: &str = "last_export";

/// Encode the full store snapshot as an export token.
///
/// `system.last_export` is written as `null` so a token never embeds the
/// previous one.
///
/// # Errors
///
/// Returns [`PersistError::Encode`] when serialization or compression fails.
pub fn export(store: &Store) -> PersistResult<String> {
    let mut snapshot = store.snapshot();
    if let Some(previous) = snapshot.system.get_mut(LAST_EXPORT_FIELD) {
        *previous = Value::Null;
    }
    let json = serde_json::to_vec(&snapshot).map_err(encode_failure)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(encode_failure)?;
    let compressed = encoder.finish().map_err(encode_failure)?;
    let token = format!("{EXPORT_PREFIX}{}", STANDARD.encode(compressed));
    debug!(json_bytes = json.len(), token_bytes = token.len(), "store exported");
    Ok(token)
}

/// Decode a token into plain JSON without touching any store.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`PersistError::BadFormat`] without the prefix and
/// [`PersistError::DecodeFailure`] naming the step that rejected the payload.
/// Payloads inflating past [`MAX_DECODED_BYTES`] fail at the decompress step.
pub fn decode(token: &str) -> PersistResult<Value> {
    let payload = token
        .trim()
        .strip_prefix(EXPORT_PREFIX)
        .ok_or(PersistError::BadFormat)?;

    let compressed = STANDARD
        .decode(payload.trim())
        .map_err(|err| decode_failure(DecodeStep::Decompress, &err))?;
    let mut text = String::new();
    let inflated = DeflateDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_BYTES + 1)
        .read_to_string(&mut text)
        .map_err(|err| decode_failure(DecodeStep::Decompress, &err))?;
    if u64::try_from(inflated).unwrap_or(u64::MAX) > MAX_DECODED_BYTES {
        return Err(PersistError::DecodeFailure {
            step: DecodeStep::Decompress,
            detail: format!("payload inflates past {MAX_DECODED_BYTES} bytes"),
        });
    }

    serde_json::from_str(&text).map_err(|err| decode_failure(DecodeStep::Parse, &err))
}

/// Apply a token to `store`.
///
/// Transferable scopes in the token are deep-merged onto the current
/// snapshot and written back through the store's signals. The `system` scope
/// always keeps its in-memory values.
///
/// # Errors
///
/// Any [`decode`] failure, or [`PersistError::ShapeMismatch`] when the data
/// is not an object of declared scopes. On error the store is unchanged.
pub fn import(store: &Store, token: &str) -> PersistResult<()> {
    let mut incoming = decode(token)?;
    check_shape(&incoming).map_err(PersistError::ShapeMismatch)?;
    if let Some(scopes) = incoming.as_object_mut() {
        scopes.remove(ScopeName::System.as_str());
    }

    let mut merged = store.snapshot().to_value();
    deep_merge(&mut merged, incoming);
    store
        .restore(&merged, &[ScopeName::System])
        .map_err(PersistError::ShapeMismatch)?;
    info!("store imported from token");
    Ok(())
}

fn check_shape(data: &Value) -> Result<(), StoreError> {
    let Value::Object(scopes) = data else {
        return Err(StoreError::ShapeMismatch {
            reason: "top level is not an object".to_string(),
        });
    };
    for (key, fields) in scopes {
        key.parse::<ScopeName>()
            .map_err(|_| StoreError::ShapeMismatch {
                reason: format!("unknown scope '{key}'"),
            })?;
        if !fields.is_object() {
            return Err(StoreError::ShapeMismatch {
                reason: format!("scope '{key}' is not an object"),
            });
        }
    }
    Ok(())
}

fn encode_failure(err: impl std::error::Error) -> PersistError {
    PersistError::Encode {
        detail: err.to_string(),
    }
}

fn decode_failure(step: DecodeStep, err: &dyn std::error::Error) -> PersistError {
    PersistError::DecodeFailure {
        step,
        detail: err.to_string(),
    }
}
