//! Avatar Bridge: drives the externally rendered avatar and folds its
//! lifecycle events into shared state.
//!
//! Every operation is synchronous, fire-and-forget and total. Commands fan
//! out over every sink; events arrive on listeners bound once per
//! bridge. The two streams are independent: no command waits for, or is
//! correlated with, any event.

use super::config::BridgeConfig;
use super::context::BrowsingContext;
use super::protocol::{
    emotion_payload, gesture_payload, parse_host_event, play_payload, AvatarCommand,
    CommandMessage, CommandPayload, HostEvent,
};
use super::sinks::{default_sinks, fan_out, CommandSink, DispatchReport};
use super::state::{AvatarState, SharedAvatarState};
use super::vocabulary::{normalize_emotion, AvatarEmotion, AvatarGesture};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct AvatarBridge {
    state: SharedAvatarState,
    /// `None` when running outside a browsing context.
    context: Option<Arc<dyn BrowsingContext>>,
    sinks: Vec<Box<dyn CommandSink>>,
    config: BridgeConfig,
    listeners_bound: AtomicBool,
}

#[derive(Default)]
pub struct AvatarBridgeBuilder {
    context: Option<Arc<dyn BrowsingContext>>,
    config: Option<BridgeConfig>,
    extra_sinks: Vec<Box<dyn CommandSink>>,
}

impl AvatarBridgeBuilder {
    pub fn context(mut self, context: Arc<dyn BrowsingContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach a context only if one is available.
    pub fn maybe_context(mut self, context: Option<Arc<dyn BrowsingContext>>) -> Self {
        self.context = context;
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Append a sink after the built-in transports. The built-in sinks
    /// cannot be removed or reordered.
    pub fn extra_sink(mut self, sink: Box<dyn CommandSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    pub fn build(self) -> AvatarBridge {
        let config = self.config.unwrap_or_default();
        let mut sinks = default_sinks(&config);
        sinks.extend(self.extra_sinks);
        AvatarBridge {
            state: SharedAvatarState::new(),
            context: self.context,
            sinks,
            config,
            listeners_bound: AtomicBool::new(false),
        }
    }
}

impl AvatarBridge {
    pub fn builder() -> AvatarBridgeBuilder {
        AvatarBridgeBuilder::default()
    }

    pub fn new(context: Arc<dyn BrowsingContext>) -> Self {
        Self::builder().context(context).build()
    }

    /// A bridge with no browsing context: state still updates, commands go
    /// nowhere and listeners are never bound.
    pub fn headless() -> Self {
        Self::builder().build()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Shared handle for views that render from the state reactively.
    pub fn state_handle(&self) -> SharedAvatarState {
        self.state.clone()
    }

    pub fn state(&self) -> AvatarState {
        self.state.snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.state.read(|s| s.ready)
    }

    pub fn is_playing(&self) -> bool {
        self.state.read(|s| s.is_playing)
    }

    // ── Outbound ───────────────────────────────────────

    /// Broadcast one command on every transport.
    ///
    /// Silently skipped without a browsing context. Transport failures are
    /// logged and reported, never returned. Crate-private: every public
    /// operation pairs its command with the matching state update.
    pub(crate) fn dispatch(
        &self,
        command: AvatarCommand,
        payload: CommandPayload,
    ) -> DispatchReport {
        let Some(context) = self.context.as_deref() else {
            tracing::trace!(
                "[AvatarBridge] No browsing context, skipping {}",
                command.wire_name()
            );
            return DispatchReport::headless(command);
        };

        let message = CommandMessage::new(
            self.config.source.as_str(),
            self.config.target.as_str(),
            command,
            payload,
        );
        let report = fan_out(&self.sinks, context, &message);
        tracing::debug!(
            "[AvatarBridge] {} delivered on {}/{} transports",
            command.wire_name(),
            report.delivered_count(),
            report.deliveries.len()
        );
        report
    }

    // ── Inbound ────────────────────────────────────────

    /// Attach the host event listeners. Safe to call any number of times;
    /// listeners are attached at most once per bridge.
    pub fn bind_event_listeners(&self) {
        let Some(context) = self.context.as_deref() else {
            return;
        };
        if self.listeners_bound.swap(true, Ordering::SeqCst) {
            return;
        }

        let state = self.state.clone();
        context.on_message(Arc::new(move |data: &Value| match parse_host_event(data) {
            Some(event) => fold_host_event(&state, event),
            None => tracing::trace!("[AvatarBridge] Ignored unrelated message"),
        }));

        for (event_name, event) in [
            (&self.config.ready_event, HostEvent::AvatarReady),
            (&self.config.play_finished_event, HostEvent::PlayFinished),
        ] {
            let state = self.state.clone();
            context.on_notification(event_name, Arc::new(move || fold_host_event(&state, event)));
        }

        tracing::info!("[AvatarBridge] Host event listeners bound");
    }

    pub fn listeners_bound(&self) -> bool {
        self.listeners_bound.load(Ordering::SeqCst)
    }

    /// Apply one lifecycle event pumped in by the caller.
    pub fn handle_host_event(&self, event: HostEvent) {
        fold_host_event(&self.state, event);
    }

    /// Parse and apply raw message data pumped in by the caller. Returns the
    /// recognised event, if any.
    pub fn handle_host_message(&self, data: &Value) -> Option<HostEvent> {
        let event = parse_host_event(data)?;
        fold_host_event(&self.state, event);
        Some(event)
    }

    // ── Convenience operations ─────────────────────────

    pub fn set_subtitle(&self, text: &str) {
        let trimmed = text.trim().to_string();
        self.state.update(|state| state.subtitle = trimmed);
    }

    pub fn set_emotion(&self, emotion: AvatarEmotion) {
        self.state.update(|state| state.emotion = emotion);
        self.dispatch(AvatarCommand::SetEmotion, emotion_payload(emotion));
    }

    /// Admit an emotion sourced from outside the typed API. Unknown values
    /// keep the current emotion and dispatch nothing.
    pub fn apply_untrusted_emotion(&self, value: &Value) -> AvatarEmotion {
        let current = self.state.read(|s| s.emotion);
        let emotion = normalize_emotion(value, current);
        if emotion != current {
            self.set_emotion(emotion);
        }
        emotion
    }

    /// One-shot cue; not kept in state.
    pub fn set_gesture(&self, gesture: AvatarGesture) {
        self.dispatch(AvatarCommand::SetGesture, gesture_payload(gesture));
    }

    /// Start playback of `audio_url` with `subtitle_text`.
    ///
    /// A blank URL makes the whole call a no-op. When `emotion` differs from
    /// the current one, `SetEmotion` is dispatched before `Play`. A play
    /// issued while already playing simply replaces the previous request.
    pub fn play(&self, audio_url: &str, subtitle_text: &str, emotion: AvatarEmotion) {
        let url = audio_url.trim();
        if url.is_empty() {
            tracing::debug!("[AvatarBridge] Ignoring play request without audio URL");
            return;
        }

        if emotion != self.state.read(|s| s.emotion) {
            self.set_emotion(emotion);
        }

        let subtitle = self.state.update(|state| {
            state.is_playing = true;
            state.last_audio_url = url.to_string();
            state.subtitle = subtitle_text.trim().to_string();
            state.subtitle.clone()
        });

        self.dispatch(AvatarCommand::Play, play_payload(url, &subtitle));
    }

    pub fn play_with_current_emotion(&self, audio_url: &str, subtitle_text: &str) {
        let current = self.state.read(|s| s.emotion);
        self.play(audio_url, subtitle_text, current);
    }

    /// Advisory stop; always dispatched, even when idle.
    pub fn stop(&self) {
        self.state.update(|state| state.is_playing = false);
        self.dispatch(AvatarCommand::Stop, CommandPayload::new());
    }
}

fn fold_host_event(state: &SharedAvatarState, event: HostEvent) {
    tracing::debug!("[AvatarBridge] Host event {}", event.wire_name());
    state.apply(event);
}
