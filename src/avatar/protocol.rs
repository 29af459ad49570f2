//! Wire protocol between the web page and the avatar renderer.
//!
//! Commands flow out as `{source, target, command, payload}` records with
//! string-only payloads. Events flow back as any object carrying an `event`
//! field; only the two lifecycle names below are recognised.

use super::vocabulary::{AvatarEmotion, AvatarGesture};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_SOURCE: &str = "law-web";
pub const DEFAULT_TARGET: &str = "unity-avatar";

/// Object and method the renderer's native bridge listens on.
pub const HOST_OBJECT: &str = "WebBridge";
pub const HOST_METHOD: &str = "OnWebCommand";

/// Same-document notification names.
pub const COMMAND_EVENT: &str = "avatar:command";
pub const READY_EVENT: &str = "avatar:ready";
pub const PLAY_FINISHED_EVENT: &str = "avatar:play-finished";

pub type CommandPayload = BTreeMap<String, String>;

// ── Commands ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvatarCommand {
    #[serde(rename = "Avatar.Play")]
    Play,
    #[serde(rename = "Avatar.SetEmotion")]
    SetEmotion,
    #[serde(rename = "Avatar.SetGesture")]
    SetGesture,
    #[serde(rename = "Avatar.Stop")]
    Stop,
}

impl AvatarCommand {
    pub fn wire_name(&self) -> &'static str {
        match self {
            AvatarCommand::Play => "Avatar.Play",
            AvatarCommand::SetEmotion => "Avatar.SetEmotion",
            AvatarCommand::SetGesture => "Avatar.SetGesture",
            AvatarCommand::Stop => "Avatar.Stop",
        }
    }
}

/// One outbound, fire-and-forget command as it appears on every transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub source: String,
    pub target: String,
    pub command: AvatarCommand,
    pub payload: CommandPayload,
}

impl CommandMessage {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        command: AvatarCommand,
        payload: CommandPayload,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            command,
            payload,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Payload builders ───────────────────────────────────

pub fn play_payload(audio_url: &str, subtitle_text: &str) -> CommandPayload {
    CommandPayload::from([
        ("audioUrl".to_string(), audio_url.to_string()),
        ("subtitleText".to_string(), subtitle_text.to_string()),
    ])
}

pub fn emotion_payload(emotion: AvatarEmotion) -> CommandPayload {
    CommandPayload::from([("emotionTag".to_string(), emotion.as_str().to_string())])
}

pub fn gesture_payload(gesture: AvatarGesture) -> CommandPayload {
    CommandPayload::from([("gestureTag".to_string(), gesture.as_str().to_string())])
}

// ── Inbound events ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostEvent {
    #[serde(rename = "OnAvatarReady")]
    AvatarReady,
    #[serde(rename = "OnPlayFinished")]
    PlayFinished,
}

impl HostEvent {
    pub fn wire_name(&self) -> &'static str {
        match self {
            HostEvent::AvatarReady => "OnAvatarReady",
            HostEvent::PlayFinished => "OnPlayFinished",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "OnAvatarReady" => Some(HostEvent::AvatarReady),
            "OnPlayFinished" => Some(HostEvent::PlayFinished),
            _ => None,
        }
    }
}

/// Pick a lifecycle event out of arbitrary cross-context message data.
///
/// Anything that is not an object with a recognised `event` string yields
/// `None`; the channel is shared with unrelated traffic, including this
/// bridge's own outbound commands.
pub fn parse_host_event(data: &Value) -> Option<HostEvent> {
    data.as_object()?
        .get("event")?
        .as_str()
        .and_then(HostEvent::from_wire)
}
