//! End-to-end scenarios from spec.md §8, driven through the public
//! `Engine` API with a `MemoryKv` backend and a channel-backed `Host`.

use causalog::{ChannelHost, Engine, EngineConfig, MemoryKv, Op, Spec};
use crossbeam_channel::{unbounded, Receiver};

fn op(spec: &str, value: &str, source: &str) -> Op {
    Op::new(Spec::parse(spec).unwrap(), value, source)
}

fn new_engine() -> (Engine<MemoryKv, ChannelHost>, Receiver<Op>) {
    let (tx, rx) = unbounded();
    let engine = Engine::new(MemoryKv::new(), ChannelHost::new(tx), "local", EngineConfig::default());
    (engine, rx)
}

/// Drains whatever the host has been sent so far without blocking.
fn drain(rx: &Receiver<Op>) -> Vec<Op> {
    let mut out = Vec::new();
    while let Ok(op) = rx.try_recv() {
        out.push(op);
    }
    out
}

#[test]
fn scenario_1_fresh_object_snapshot_then_op_then_subscribe() {
    let (engine, rx) = new_engine();

    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    assert!(drain(&rx).is_empty(), "a snapshot alone produces no response");

    engine.submit(op("/T#A!11+X.set", "v", "X"));
    let after_set = drain(&rx);
    assert_eq!(after_set.len(), 1, "the new in-order op is echoed back to the Host");
    assert_eq!(after_set[0].spec.render(), "/T#A!11+X.set");
    assert_eq!(after_set[0].value, "v");

    engine.submit(op("/T#A.on", "", "peer"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 2);

    assert_eq!(responses[0].spec.render(), "/T#A.diff");
    assert_eq!(responses[0].value, "\t/T#A!10+X.state\ts0\n\t/T#A!11+X.set\tv\n");

    assert_eq!(responses[1].spec.render(), "/T#A.on");
    assert_eq!(responses[1].value, "11+X", "the reciprocal base is our tip as a self-fulfilling bookmark");
}

#[test]
fn scenario_2_echo_of_latest_produces_no_write_and_no_response() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    drain(&rx);

    // Relayed by peer "Y", but the version's own author is still X.
    engine.submit(op("/T#A!11+X.set", "v", "Y"));
    assert!(drain(&rx).is_empty(), "an echo of the current tip produces no response");

    // A subsequent `on` with `base = "-"` uses the echo bookmark we just
    // recorded for Y, proving `.ebm&Y` was written (not `.ebm&X`): Y is
    // already at our tip, so no `.diff` is produced, only the reciprocal
    // bookmark telling Y our tip.
    engine.submit(op("/T#A.on", "-", "Y"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 1, "nothing to patch, so only the reciprocal `.on` is sent");
    assert_eq!(responses[0].spec.render(), "/T#A.on");
    assert_eq!(responses[0].value, "11+X");
}

#[test]
fn scenario_3_in_order_new_op_from_second_source() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    drain(&rx);

    engine.submit(op("/T#A!12+Z.set", "w", "Z"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.render(), "/T#A!12+Z.set");
    assert_eq!(responses[0].value, "w");

    // The tip advanced: a subscription with `base = ""` now includes Z's op.
    engine.submit(op("/T#A.on", "", "peer"));
    let on_responses = drain(&rx);
    assert_eq!(on_responses[0].value, "\t/T#A!10+X.state\ts0\n\t/T#A!11+X.set\tv\n\t/T#A!12+Z.set\tw\n");
}

#[test]
fn scenario_4_reorder_records_a_backreference() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    engine.submit(op("/T#A!12+Z.set", "w", "Z"));
    drain(&rx);

    engine.submit(op("/T#A!09+W.set", "u", "W"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 1, "a reorder still echoes the op to the Host");
    assert_eq!(responses[0].spec.render(), "/T#A!09+W.set");
    assert_eq!(responses[0].value, "u");
}

#[test]
fn scenario_5_vector_base_subscription_resolves_through_the_backreference() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    engine.submit(op("/T#A!12+Z.set", "w", "Z"));
    engine.submit(op("/T#A!09+W.set", "u", "W"));
    drain(&rx);

    engine.submit(op("/T#A.on", "!11+X", "peer"));
    let responses = drain(&rx);

    assert_eq!(responses[0].spec.render(), "/T#A.diff");
    let payload = &responses[0].value;
    assert!(payload.contains("\t/T#A!12+Z.set\tw\n"), "payload was: {payload:?}");
    assert!(payload.contains("\t/T#A!09+W.set\tu\n"), "payload was: {payload:?}");
    assert!(!payload.contains(".state"), "the state snapshot must not be re-sent: {payload:?}");
    assert!(!payload.contains("!11+X.set"), "X's own op up to the peer's base must not be re-sent: {payload:?}");
}

#[test]
fn scenario_6_causal_violation_yields_an_error_op_and_no_writes() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    drain(&rx);

    engine.submit(op("/T#A!09+X.set", "bad", "P"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.render(), "/T#A.error");
    assert_eq!(responses[0].value, "op is out of order");
}

#[test]
fn first_op_with_no_prior_snapshot_is_rejected() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X.set", "v", "X"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.render(), "/T#A.error");
    assert_eq!(responses[0].value, "no such object");
}

#[test]
fn ingesting_the_same_op_twice_is_idempotent() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    drain(&rx);

    // Replaying the exact same op a second time must be a pure no-op: no
    // second write, no second response.
    engine.submit(op("/T#A!11+X.set", "v", "X"));
    assert!(drain(&rx).is_empty());
}

#[test]
fn unrelated_objects_do_not_interfere() {
    let (engine, rx) = new_engine();
    engine.submit(op("/T#A!10+X!10+X.state", "s0", "X"));
    engine.submit(op("/T#B!05+Y!05+Y.state", "s1", "Y"));
    drain(&rx);

    engine.submit(op("/T#A!11+X.set", "v", "X"));
    let responses = drain(&rx);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.render(), "/T#A!11+X.set");
}
