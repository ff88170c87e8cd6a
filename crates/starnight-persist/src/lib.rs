#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Persistence for the Starnight store.
//!
//! Layout: `codec.rs` (export tokens and the import pipeline), `merge.rs`
//! (deep merge), `transport.rs` (token carriers), `transfer.rs` (user-facing
//! export/import outcomes), `snapshot_file.rs` (on-disk snapshots).

pub mod codec;
pub mod error;
pub mod merge;
pub mod snapshot_file;
pub mod transfer;
pub mod transport;

pub use codec::{EXPORT_PREFIX, MAX_DECODED_BYTES, decode, export, import};
pub use error::{DecodeStep, PersistError, PersistResult};
pub use merge::deep_merge;
pub use transfer::{TransferDirection, TransferOutcome, export_to, import_from};
pub use transport::{FileTransport, MemoryTransport, TokenTransport};
