//! The wire-level unit exchanged with the outside world: one spec, one
//! value, and the immediate sender (spec.md §6). `Host` is the engine's
//! outbound side -- whatever delivers accepted/derived ops back out to a
//! transport.

use crate::spec::Spec;
use crossbeam_channel::Sender;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Op {
    pub spec: Spec,
    pub value: String,
    /// The replica id of the immediate sender, not necessarily the
    /// original author embedded in `spec`'s version token.
    pub source: String,
}

impl Op {
    pub fn new(spec: Spec, value: impl Into<String>, source: impl Into<String>) -> Self {
        Op { spec, value: value.into(), source: source.into() }
    }
}

/// Receives ops the engine decides to deliver: patches, reciprocal
/// subscriptions, echoes, and `.error` ops.
pub trait Host: Send + Sync {
    fn deliver(&self, op: Op);
}

/// A `Host` backed by a `crossbeam_channel`, for callers that want to drain
/// delivered ops from a consumer thread rather than implement `Host`
/// themselves.
pub struct ChannelHost {
    tx: Sender<Op>,
}

impl ChannelHost {
    pub fn new(tx: Sender<Op>) -> Self {
        ChannelHost { tx }
    }
}

impl Host for ChannelHost {
    fn deliver(&self, op: Op) {
        // The receiving end may have been dropped (e.g. shutdown); that's
        // not this engine's problem to report.
        let _ = self.tx.send(op);
    }
}
