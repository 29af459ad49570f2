//! Outbound command sinks.
//!
//! Each transport is one [`CommandSink`]. The bridge walks its sinks in order
//! and isolates every call: an error or panic in one sink is logged, recorded
//! in the [`DispatchReport`], and the walk continues.

use super::config::BridgeConfig;
use super::context::{BrowsingContext, HostDelivery};
use super::error::BridgeError;
use super::protocol::{AvatarCommand, CommandMessage};
use std::panic::{self, AssertUnwindSafe};

/// What a single sink did with a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Delivered,
    /// The transport is not attached (e.g. no host callable registered).
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDelivery {
    pub sink: &'static str,
    pub outcome: SinkOutcome,
}

/// Per-sink record of one dispatch. Purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub command: AvatarCommand,
    /// False when no browsing context was available and nothing was attempted.
    pub attempted: bool,
    pub deliveries: Vec<SinkDelivery>,
}

impl DispatchReport {
    pub fn headless(command: AvatarCommand) -> Self {
        Self {
            command,
            attempted: false,
            deliveries: Vec::new(),
        }
    }

    pub fn delivered_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.outcome == SinkOutcome::Delivered)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SinkDelivery> {
        self.deliveries
            .iter()
            .filter(|d| matches!(d.outcome, SinkOutcome::Failed(_)))
    }

    pub fn outcome_of(&self, sink: &str) -> Option<&SinkOutcome> {
        self.deliveries
            .iter()
            .find(|d| d.sink == sink)
            .map(|d| &d.outcome)
    }
}

// ── Sink trait ─────────────────────────────────────────

pub trait CommandSink: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &'static str;

    fn deliver(
        &self,
        context: &dyn BrowsingContext,
        message: &CommandMessage,
    ) -> Result<SinkOutcome, BridgeError>;
}

/// Same-document custom event carrying the command as its detail.
pub struct LocalNotifySink {
    event_name: String,
}

impl LocalNotifySink {
    pub const NAME: &'static str = "local-notify";

    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
        }
    }
}

impl CommandSink for LocalNotifySink {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn deliver(
        &self,
        context: &dyn BrowsingContext,
        message: &CommandMessage,
    ) -> Result<SinkOutcome, BridgeError> {
        context.dispatch_local(&self.event_name, &message.to_value()?)?;
        Ok(SinkOutcome::Delivered)
    }
}

/// Cross-context post to the global target.
pub struct BroadcastSink {
    target_origin: String,
}

impl BroadcastSink {
    pub const NAME: &'static str = "broadcast";

    pub fn new(target_origin: impl Into<String>) -> Self {
        Self {
            target_origin: target_origin.into(),
        }
    }
}

impl CommandSink for BroadcastSink {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn deliver(
        &self,
        context: &dyn BrowsingContext,
        message: &CommandMessage,
    ) -> Result<SinkOutcome, BridgeError> {
        context.post_message(&message.to_value()?, &self.target_origin)?;
        Ok(SinkOutcome::Delivered)
    }
}

/// Direct call into the renderer's native bridge object, when present.
pub struct HostCallableSink {
    object: String,
    method: String,
}

impl HostCallableSink {
    pub const NAME: &'static str = "host-callable";

    pub fn new(object: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
        }
    }
}

impl CommandSink for HostCallableSink {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn deliver(
        &self,
        context: &dyn BrowsingContext,
        message: &CommandMessage,
    ) -> Result<SinkOutcome, BridgeError> {
        let parameter = message.to_json()?;
        match context.send_to_host(&self.object, &self.method, &parameter)? {
            HostDelivery::Delivered => Ok(SinkOutcome::Delivered),
            HostDelivery::NotRegistered => Ok(SinkOutcome::Skipped),
        }
    }
}

/// Build the ordered sink list: local notification, cross-context post, then
/// the host callable. The host sink skips itself until one is registered.
pub fn default_sinks(config: &BridgeConfig) -> Vec<Box<dyn CommandSink>> {
    vec![
        Box::new(LocalNotifySink::new(config.command_event.clone())),
        Box::new(BroadcastSink::new(config.target_origin.clone())),
        Box::new(HostCallableSink::new(
            config.host_object.clone(),
            config.host_method.clone(),
        )),
    ]
}

// ── Fan-out ────────────────────────────────────────────

/// Offer `message` to every sink in order. Never fails and never panics
/// outward.
pub fn fan_out(
    sinks: &[Box<dyn CommandSink>],
    context: &dyn BrowsingContext,
    message: &CommandMessage,
) -> DispatchReport {
    let deliveries = sinks
        .iter()
        .map(|sink| SinkDelivery {
            sink: sink.name(),
            outcome: deliver_isolated(sink.as_ref(), context, message),
        })
        .collect();

    DispatchReport {
        command: message.command,
        attempted: true,
        deliveries,
    }
}

fn deliver_isolated(
    sink: &dyn CommandSink,
    context: &dyn BrowsingContext,
    message: &CommandMessage,
) -> SinkOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| sink.deliver(context, message)))
        .unwrap_or_else(|payload| Err(BridgeError::HostPanicked(panic_message(&*payload))));

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                "[AvatarSink] {} dropped {}: {}",
                sink.name(),
                message.command.wire_name(),
                e
            );
            SinkOutcome::Failed(e.to_string())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
