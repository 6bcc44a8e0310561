//! `causalog`: the causal operation-log storage engine behind a Host's
//! routing layer. Persists per-object operation history, compacted state
//! snapshots, out-of-order bookkeeping, and per-peer bookmarks; answers
//! subscriptions with minimal patches. See `spec.md`/`SPEC_FULL.md` in the
//! repository root for the full design.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use config::EngineConfig;
pub use dispatch::OpKind;
pub use engine::Engine;
pub use error::Error;
pub use kv::{KvStore, MemoryKv, Write};
pub use op::{ChannelHost, Host, Op};
pub use patch::{BaseShape, DiffLine};
pub use spec::Spec;
pub use table::EngineTable;
pub use version::Version;
pub use version_map::VersionMap;

mod config;
mod dispatch;
pub mod encoding;
mod engine;
mod error;
mod ingest;
mod keys;
mod kv;
mod op;
mod patch;
mod queue;
mod reciprocal;
mod request;
mod spec;
mod state;
mod table;
mod version;
mod version_map;

pub type Result<T> = std::result::Result<T, Error>;
