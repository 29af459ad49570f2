//! Shared avatar state read by the view layer and folded by host events.

use super::protocol::HostEvent;
use super::vocabulary::AvatarEmotion;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarState {
    /// Latched by the first `OnAvatarReady`; never cleared.
    pub ready: bool,
    pub is_playing: bool,
    pub emotion: AvatarEmotion,
    /// Trimmed subtitle text, possibly empty.
    pub subtitle: String,
    pub last_audio_url: String,
    /// Wire name of the most recent inbound event.
    pub last_event: String,
}

impl AvatarState {
    /// Fold one inbound lifecycle event.
    pub fn apply(&mut self, event: HostEvent) {
        self.last_event = event.wire_name().to_string();
        match event {
            HostEvent::AvatarReady => self.ready = true,
            HostEvent::PlayFinished => self.is_playing = false,
        }
    }
}

/// Owning handle to the single [`AvatarState`] of a bridge.
///
/// Cloning shares the record. Inbound listeners hold a clone so they can fold
/// events after the binding call has returned.
#[derive(Debug, Clone, Default)]
pub struct SharedAvatarState {
    inner: Arc<RwLock<AvatarState>>,
}

impl SharedAvatarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for display.
    pub fn snapshot(&self) -> AvatarState {
        self.read(|state| state.clone())
    }

    pub fn read<R>(&self, f: impl FnOnce(&AvatarState) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut AvatarState) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn apply(&self, event: HostEvent) {
        self.update(|state| state.apply(event));
    }
}
