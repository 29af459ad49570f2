use crate::avatar::{
    AvatarBridge, BridgeConfig, BridgeError, Delivery, HostCallable, MemoryContext,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Bridge setup helpers ────────────────────────────────────

/// Bridge over a fresh in-memory context. Listeners are NOT bound.
pub fn setup_bridge() -> (AvatarBridge, Arc<MemoryContext>) {
    setup_bridge_with(BridgeConfig::default())
}

pub fn setup_bridge_with(config: BridgeConfig) -> (AvatarBridge, Arc<MemoryContext>) {
    let ctx = Arc::new(MemoryContext::new());
    let bridge = AvatarBridge::builder()
        .context(ctx.clone())
        .config(config)
        .build();
    (bridge, ctx)
}

/// Bridge with listeners bound and a well-behaved host callable attached.
pub fn bound_bridge_with_host() -> (AvatarBridge, Arc<MemoryContext>) {
    let (bridge, ctx) = setup_bridge();
    ctx.set_host_callable(Arc::new(|_: &str, _: &str, _: &str| Ok::<(), BridgeError>(())));
    bridge.bind_event_listeners();
    (bridge, ctx)
}

// ── Host callables ──────────────────────────────────────────

/// Host callable that errors on every call and counts attempts.
pub struct FailingHost {
    pub calls: AtomicUsize,
}

impl FailingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HostCallable for FailingHost {
    fn send_message(&self, _: &str, _: &str, _: &str) -> Result<(), BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BridgeError::HostCallable(
            "SendMessage: object WebBridge not found".to_string(),
        ))
    }
}

/// Host callable that panics on every call.
pub fn panicking_host() -> Arc<dyn HostCallable> {
    Arc::new(|_: &str, _: &str, _: &str| -> Result<(), BridgeError> {
        panic!("unityInstance torn down")
    })
}

// ── Delivery inspection ─────────────────────────────────────

/// `(command, payload)` of every cross-context broadcast, in order.
pub fn broadcast_commands(ctx: &MemoryContext) -> Vec<(String, Value)> {
    ctx.deliveries()
        .into_iter()
        .filter_map(|d| match d {
            Delivery::Broadcast { message, .. } => Some((
                message["command"].as_str().unwrap_or_default().to_string(),
                message["payload"].clone(),
            )),
            _ => None,
        })
        .collect()
}

/// Transport label of every delivery, in order.
pub fn transport_sequence(ctx: &MemoryContext) -> Vec<&'static str> {
    ctx.deliveries()
        .iter()
        .map(|d| match d {
            Delivery::Local { .. } => "local",
            Delivery::Broadcast { .. } => "broadcast",
            Delivery::Host { .. } => "host",
        })
        .collect()
}
