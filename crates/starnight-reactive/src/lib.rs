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

//! Observable values for the Starnight runtime.
//!
//! A [`Signal`] holds one value and notifies its subscribers synchronously on
//! every write, in the order they subscribed. Notification happens before the
//! write returns and is never skipped, even when the new value equals the old
//! one; dependents use notifications as a clock tick, not a change detector.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); signals are not `Send`.
//!
//! Layout: `signal.rs` (`Signal`, `Subscription`), `lens.rs` (derived
//! read/write views).

pub mod lens;
pub mod signal;

pub use lens::Lens;
pub use signal::{Signal, SubscriberId, Subscription};
