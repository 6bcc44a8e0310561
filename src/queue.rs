//! A FIFO queue in front of the dispatcher, with a `busy` flag so only one
//! drain runs at a time, and `diff` unbundling: a bundled `.diff` op is
//! flattened into its constituent ops (in order) before being queued,
//! since the dispatcher only ever processes single ops (spec.md §4.4,
//! §4.8).

use crate::op::Op;
use crate::spec::Spec;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Renders a patch's lines into the tab-delimited payload carried by a
/// bundled `.diff` op: one `\t{spec}\t{value}\n` line per record.
pub fn render_diff_payload(lines: &[crate::patch::DiffLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push('\t');
        out.push_str(&line.spec);
        out.push('\t');
        out.push_str(&line.value);
        out.push('\n');
    }
    out
}

/// Splits a `.diff` op's payload back into its constituent ops, in order.
/// Malformed lines are skipped rather than failing the whole batch --
/// losing one stray line is preferable to dropping an entire catch-up.
pub fn unbundle(source: &str, payload: &str) -> Vec<Op> {
    let mut ops = Vec::new();
    for line in payload.split('\n') {
        let Some(rest) = line.strip_prefix('\t') else { continue };
        let Some((spec_str, value)) = rest.split_once('\t') else { continue };
        let Ok(spec) = Spec::parse(spec_str) else { continue };
        ops.push(Op::new(spec, value, source));
    }
    ops
}

#[derive(Default)]
struct Inner {
    items: VecDeque<Op>,
    busy: bool,
}

/// A process-local FIFO of ops awaiting dispatch.
pub struct Queue {
    inner: Mutex<Inner>,
}

impl Queue {
    pub fn new() -> Self {
        Queue { inner: Mutex::new(Inner::default()) }
    }

    /// Enqueues `op`, unbundling it first if it is a `.diff`.
    pub fn push(&self, op: Op) {
        let mut inner = self.inner.lock();
        if op.spec.op() == Some("diff") {
            let source = op.source.clone();
            let payload = op.value.clone();
            inner.items.extend(unbundle(&source, &payload));
        } else {
            inner.items.push_back(op);
        }
    }

    /// Pops the next op, marking the queue busy. Returns `None` if already
    /// busy or empty.
    pub fn try_pop(&self) -> Option<Op> {
        let mut inner = self.inner.lock();
        if inner.busy {
            return None;
        }
        let op = inner.items.pop_front();
        if op.is_some() {
            inner.busy = true;
        }
        op
    }

    /// Marks the queue free to drain again after a dispatched op has been
    /// fully committed.
    pub fn release(&self) {
        self.inner.lock().busy = false;
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::DiffLine;

    #[test]
    fn diff_payload_round_trips_through_unbundle() {
        let lines = vec![
            DiffLine { spec: "/T#A!10+X.state".to_string(), value: "s0".to_string() },
            DiffLine { spec: "/T#A!11+X.set".to_string(), value: "v1".to_string() },
        ];
        let payload = render_diff_payload(&lines);
        let ops = unbundle("peer", &payload);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].spec.render(), "/T#A!10+X.state");
        assert_eq!(ops[0].value, "s0");
        assert_eq!(ops[1].spec.render(), "/T#A!11+X.set");
    }

    #[test]
    fn pushing_a_diff_unbundles_in_order() {
        let queue = Queue::new();
        let lines =
            vec![DiffLine { spec: "/T#A!10+X.state".to_string(), value: "s0".to_string() }];
        let payload = render_diff_payload(&lines);
        queue.push(Op::new(Spec::parse("/T#A.diff").unwrap(), payload, "peer"));
        let first = queue.try_pop().unwrap();
        assert_eq!(first.spec.render(), "/T#A!10+X.state");
    }

    #[test]
    fn busy_queue_refuses_a_second_pop() {
        let queue = Queue::new();
        queue.push(Op::new(Spec::parse("/T#A!1+X.set").unwrap(), "v", "peer"));
        queue.push(Op::new(Spec::parse("/T#A!2+X.set").unwrap(), "v", "peer"));
        assert!(queue.try_pop().is_some());
        assert!(queue.try_pop().is_none());
        queue.release();
        assert!(queue.try_pop().is_some());
    }
}
