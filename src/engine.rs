//! The top-level per-object engine: submits ops through the queue,
//! dispatches them to the right handler, drives the reentrant scan loop,
//! and commits writes plus responses atomically per op (spec.md §4.9).

use crate::config::EngineConfig;
use crate::dispatch::{self, OpKind};
use crate::kv::KvStore;
use crate::op::{Host, Op};
use crate::patch::{self, PatchStatus};
use crate::queue::{self, Queue};
use crate::reciprocal::{self, ReciprocalStatus};
use crate::request::Request;
use crate::spec::Spec;
use crate::version_map::VersionMap;
use crate::{Error, Result};
use tracing::{instrument, trace, warn};

pub struct Engine<K: KvStore, H: Host> {
    kv: K,
    host: H,
    config: EngineConfig,
    local_source: String,
    queue: Queue,
}

impl<K: KvStore, H: Host> Engine<K, H> {
    pub fn new(kv: K, host: H, local_source: impl Into<String>, config: EngineConfig) -> Self {
        Engine { kv, host, config, local_source: local_source.into(), queue: Queue::new() }
    }

    /// Submits an op for processing. Drains the queue inline until empty or
    /// busy (the engine has no background worker of its own; embed it in
    /// whatever scheduling the caller prefers).
    #[instrument(skip(self, op), fields(spec = %op.spec))]
    pub fn submit(&self, op: Op) {
        self.queue.push(op);
        while let Some(next) = self.queue.try_pop() {
            self.process_one(next);
            self.queue.release();
        }
    }

    fn process_one(&self, op: Op) {
        let prefix = op.spec.object_prefix();
        if let Err(err) = self.dispatch(&op) {
            warn!(error = %err, spec = %op.spec, "op rejected");
            let error_spec = prefix
                .map(|p| format!("{p}.error"))
                .unwrap_or_else(|| ".error".to_string());
            if let Ok(spec) = Spec::parse(&error_spec) {
                self.host.deliver(Op::new(spec, err.wire_message(), self.local_source.clone()));
            }
        }
    }

    fn dispatch(&self, op: &Op) -> Result<()> {
        let prefix = op.spec.object_prefix().ok_or_else(|| Error::Parse("op has no object prefix".into()))?;

        match dispatch::classify(op) {
            OpKind::Off => Ok(()),
            OpKind::Error => {
                trace!(spec = %op.spec, "peer reported an error, no action taken");
                Ok(())
            }
            OpKind::Diff => {
                // Diffs are unbundled by the queue before they ever reach
                // here; a lone `.diff` reaching dispatch is a no-op.
                Ok(())
            }
            OpKind::On => {
                let mut req = Request::new(&self.kv, prefix);
                self.handle_on(&mut req, &op.value, &op.source)?;
                self.commit(req);
                Ok(())
            }
            OpKind::State => {
                let version_vector = VersionMap::from_spec(&op.spec.filter('!'));
                let author = op.spec.author().unwrap_or_default().to_string();
                let mut req = Request::new(&self.kv, prefix);
                crate::state::handle_state(&mut req, &version_vector, &author, &self.local_source, &op.value)?;
                self.commit(req);
                Ok(())
            }
            OpKind::Regular => {
                let version = op.spec.version().ok_or_else(|| Error::Parse("regular op missing a version".into()))?;
                let op_name = op.spec.op().ok_or_else(|| Error::Parse("regular op missing an op name".into()))?;
                let mut req = Request::new(&self.kv, prefix);
                let emit =
                    crate::ingest::handle_regular(&mut req, &version, op_name, &op.value, &op.source, self.config.bookmarking)?;
                if emit {
                    req.respond(op.clone());
                }
                self.commit(req);
                Ok(())
            }
        }
    }

    /// Drives patch building and reciprocal-subscription choice to
    /// completion, extending the scan floor as each reports it needs more
    /// (spec.md §4.4).
    fn handle_on(&self, req: &mut Request<'_, K>, base: &str, origin: &str) -> Result<()> {
        req.ensure_meta()?;
        loop {
            let patch_status = if base == "~" { PatchStatus::Ready(vec![]) } else { patch::build_patch(req, base, origin)? };
            let recip_status = reciprocal::compute(req, base, origin)?;

            let patch_floor = match &patch_status {
                PatchStatus::NeedFloor(f) => Some(f.clone()),
                PatchStatus::Ready(_) => None,
            };
            let recip_floor = match &recip_status {
                ReciprocalStatus::NeedFloor(f) => Some(f.clone()),
                ReciprocalStatus::Ready(_) => None,
            };

            let target = match (patch_floor, recip_floor) {
                (Some(a), Some(b)) => Some(if a.as_str() <= b.as_str() { a } else { b }),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            };

            if let Some(floor) = target {
                req.ensure_floor(&floor)?;
                continue;
            }

            if let PatchStatus::Ready(lines) = patch_status {
                if !lines.is_empty() {
                    let payload = queue::render_diff_payload(&lines);
                    let spec = Spec::parse(&format!("{}.diff", req.object_prefix))?;
                    req.respond(Op::new(spec, payload, self.local_source.clone()));
                }
            }
            if let ReciprocalStatus::Ready(recip_base) = recip_status {
                if origin != self.local_source {
                    let spec = Spec::parse(&format!("{}.on", req.object_prefix))?;
                    req.respond(Op::new(spec, recip_base, self.local_source.clone()));
                }
            }
            return Ok(());
        }
    }

    fn commit(&self, req: Request<'_, K>) {
        if !req.writes.is_empty() {
            if let Err(err) = self.kv.batch(req.writes) {
                warn!(error = %err, "failed to commit write batch");
                return;
            }
        }
        for response in req.responses {
            self.host.deliver(response);
        }
    }

    /// Releases this engine's resources. A no-op for in-memory backends;
    /// present so embedders have a place to flush a real backend.
    pub fn close(&self) {}
}
