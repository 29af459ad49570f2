use super::helpers::*;
use crate::avatar::{
    load_config, AvatarBridge, AvatarCommand, AvatarEmotion, BridgeError, BrowsingContext,
    CommandMessage, CommandPayload, CommandSink, MemoryContext, SinkOutcome,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ── Host callable faults ────────────────────────────────────

#[test]
fn test_throwing_host_does_not_block_other_transports() {
    let (bridge, ctx) = setup_bridge();
    let host = FailingHost::new();
    ctx.set_host_callable(host.clone());

    bridge.play("https://a/x.mp3", "hi", AvatarEmotion::Serious);
    bridge.stop();

    // SetEmotion, Play, Stop: each still went out locally and cross-context.
    assert_eq!(
        transport_sequence(&ctx),
        ["local", "broadcast", "local", "broadcast", "local", "broadcast"]
    );
    assert_eq!(host.calls(), 3);
    assert!(!bridge.is_playing());
}

#[test]
fn test_throwing_host_is_reported_as_failure() {
    let (bridge, ctx) = setup_bridge();
    ctx.set_host_callable(FailingHost::new());

    let report = bridge.dispatch(AvatarCommand::Stop, CommandPayload::new());

    assert!(report.attempted);
    assert_eq!(report.delivered_count(), 2);
    let failures: Vec<_> = report.failures().map(|d| d.sink).collect();
    assert_eq!(failures, ["host-callable"]);
}

#[test]
fn test_panicking_host_is_contained() {
    let (bridge, ctx) = setup_bridge();
    ctx.set_host_callable(panicking_host());

    bridge.play("https://a/x.mp3", "hi", AvatarEmotion::Calm);

    assert_eq!(transport_sequence(&ctx), ["local", "broadcast"]);
    let state = bridge.state();
    assert!(state.is_playing);
    assert_eq!(state.last_audio_url, "https://a/x.mp3");
}

#[test]
fn test_host_can_attach_late() {
    let (bridge, ctx) = setup_bridge();

    bridge.stop();
    assert_eq!(transport_sequence(&ctx), ["local", "broadcast"]);

    ctx.set_host_callable(Arc::new(|_: &str, _: &str, _: &str| Ok::<(), BridgeError>(())));
    ctx.take_deliveries();
    bridge.stop();
    assert_eq!(transport_sequence(&ctx), ["local", "broadcast", "host"]);

    ctx.clear_host_callable();
    ctx.take_deliveries();
    bridge.stop();
    assert_eq!(transport_sequence(&ctx), ["local", "broadcast"]);
}

// ── Window transport faults ─────────────────────────────────

#[test]
fn test_local_failure_does_not_block_broadcast_or_host() {
    let (bridge, ctx) = bound_bridge_with_host();
    ctx.fail_local(Some("dispatchEvent rejected"));

    let report = bridge.dispatch(AvatarCommand::Stop, CommandPayload::new());

    assert_eq!(transport_sequence(&ctx), ["broadcast", "host"]);
    assert!(matches!(
        report.outcome_of("local-notify"),
        Some(SinkOutcome::Failed(reason)) if reason.contains("dispatchEvent rejected")
    ));
}

#[test]
fn test_broadcast_failure_does_not_block_host() {
    let (bridge, ctx) = bound_bridge_with_host();
    ctx.fail_broadcast(Some("DataCloneError"));

    bridge.set_emotion(AvatarEmotion::Warning);

    assert_eq!(transport_sequence(&ctx), ["local", "host"]);
    assert_eq!(bridge.state().emotion, AvatarEmotion::Warning);
}

#[test]
fn test_everything_failing_still_updates_state() {
    let (bridge, ctx) = setup_bridge();
    ctx.fail_local(Some("gone"));
    ctx.fail_broadcast(Some("gone"));
    ctx.set_host_callable(panicking_host());

    bridge.play("https://a/x.mp3", "hi", AvatarEmotion::Supportive);

    assert!(ctx.deliveries().is_empty());
    let state = bridge.state();
    assert!(state.is_playing);
    assert_eq!(state.emotion, AvatarEmotion::Supportive);
}

// ── Custom sinks ────────────────────────────────────────────

struct ExplodingSink;

impl CommandSink for ExplodingSink {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn deliver(
        &self,
        _context: &dyn BrowsingContext,
        _message: &CommandMessage,
    ) -> Result<SinkOutcome, BridgeError> {
        panic!("sink exploded")
    }
}

#[derive(Default)]
struct CountingSink {
    calls: Arc<AtomicUsize>,
}

impl CommandSink for CountingSink {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn deliver(
        &self,
        _context: &dyn BrowsingContext,
        _message: &CommandMessage,
    ) -> Result<SinkOutcome, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SinkOutcome::Delivered)
    }
}

#[test]
fn test_panicking_sink_does_not_abort_later_sinks() {
    let ctx = Arc::new(MemoryContext::new());
    ctx.set_host_callable(Arc::new(|_: &str, _: &str, _: &str| Ok::<(), BridgeError>(())));
    let counting = CountingSink::default();
    let calls = counting.calls.clone();
    let bridge = AvatarBridge::builder()
        .context(ctx.clone())
        .extra_sink(Box::new(ExplodingSink))
        .extra_sink(Box::new(counting))
        .build();

    let report = bridge.dispatch(AvatarCommand::Stop, CommandPayload::new());

    let names: Vec<_> = report.deliveries.iter().map(|d| d.sink).collect();
    assert_eq!(
        names,
        ["local-notify", "broadcast", "host-callable", "exploding", "counting"]
    );
    assert_eq!(transport_sequence(&ctx), ["local", "broadcast", "host"]);
    assert!(matches!(
        report.outcome_of("exploding"),
        Some(SinkOutcome::Failed(reason)) if reason.contains("sink exploded")
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ── Config cannot drop guaranteed transports ────────────────

#[test]
fn test_config_cannot_suppress_local_or_broadcast() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("avatar_bridge.json");
    std::fs::write(
        &path,
        r#"{"transports": {"local_notify": false, "broadcast": false}}"#,
    )
    .unwrap();
    let (bridge, ctx) = setup_bridge_with(load_config(&path));
    let host = FailingHost::new();
    ctx.set_host_callable(host.clone());

    bridge.play("https://a/x.mp3", "hi", AvatarEmotion::Serious);

    // SetEmotion then Play, each on both guaranteed transports.
    assert_eq!(
        transport_sequence(&ctx),
        ["local", "broadcast", "local", "broadcast"]
    );
    let commands: Vec<_> = broadcast_commands(&ctx).into_iter().map(|(c, _)| c).collect();
    assert_eq!(commands, ["Avatar.SetEmotion", "Avatar.Play"]);
    assert_eq!(host.calls(), 2);
    assert!(bridge.is_playing());
}

// ── Malformed inbound traffic ───────────────────────────────

#[test]
fn test_malformed_messages_leave_state_untouched() {
    let (bridge, ctx) = bound_bridge_with_host();
    bridge.play("https://a/x.mp3", "hi", AvatarEmotion::Calm);
    let before = bridge.state();

    for data in [
        json!(null),
        json!("OnPlayFinished"),
        json!({"event": "OnPlayFinished "}),
        json!({"event": ["OnPlayFinished"]}),
        json!({"evt": "OnAvatarReady"}),
        json!({"type": "webpackOk"}),
    ] {
        ctx.deliver_message(&data);
    }

    assert_eq!(bridge.state(), before);
}

#[test]
fn test_duplicate_and_reordered_events_are_tolerated() {
    let (bridge, ctx) = bound_bridge_with_host();

    ctx.deliver_message(&json!({"event": "OnPlayFinished"}));
    ctx.deliver_message(&json!({"event": "OnAvatarReady"}));
    ctx.deliver_message(&json!({"event": "OnAvatarReady"}));
    bridge.play("https://a/x.mp3", "hi", AvatarEmotion::Calm);
    ctx.notify("avatar:play-finished");
    ctx.notify("avatar:play-finished");

    let state = bridge.state();
    assert!(state.ready);
    assert!(!state.is_playing);
    assert_eq!(state.last_event, "OnPlayFinished");
}
