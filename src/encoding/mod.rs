//! A small shared error type for malformed low-level input (a truncated
//! scan key, an unparseable spec token). Keys in this crate are already
//! human-readable ordered strings (see `spec.rs`), so unlike a typical
//! storage engine there is no binary keycode/formatting layer here.

pub use error::Error;

mod error;

pub type Result<T> = std::result::Result<T, Error>;
