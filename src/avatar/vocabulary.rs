//! Closed emotion and gesture vocabularies understood by the avatar renderer.
//!
//! Emotion is a standing mood kept in [`AvatarState`](super::state::AvatarState);
//! gesture is a one-shot cue that is only ever forwarded.

use super::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ── Emotion ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarEmotion {
    #[default]
    Calm,
    Serious,
    Supportive,
    Warning,
}

impl AvatarEmotion {
    pub const ALL: [AvatarEmotion; 4] = [
        AvatarEmotion::Calm,
        AvatarEmotion::Serious,
        AvatarEmotion::Supportive,
        AvatarEmotion::Warning,
    ];

    /// Wire tag sent as `emotionTag`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarEmotion::Calm => "calm",
            AvatarEmotion::Serious => "serious",
            AvatarEmotion::Supportive => "supportive",
            AvatarEmotion::Warning => "warning",
        }
    }
}

impl fmt::Display for AvatarEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarEmotion {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AvatarEmotion::ALL
            .into_iter()
            .find(|emotion| emotion.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownEmotion(s.to_string()))
    }
}

/// Admit an untrusted value (e.g. decoded from a host message) into the
/// emotion vocabulary.
///
/// Returns the matching emotion when `value` is a string equal to one of the
/// known tags, otherwise `fallback`. Matching is exact: no trimming, no case
/// folding.
pub fn normalize_emotion(value: &Value, fallback: AvatarEmotion) -> AvatarEmotion {
    value
        .as_str()
        .and_then(|tag| tag.parse().ok())
        .unwrap_or(fallback)
}

// ── Gesture ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarGesture {
    Idle,
    Explain,
    Point,
    Confirm,
}

impl AvatarGesture {
    pub const ALL: [AvatarGesture; 4] = [
        AvatarGesture::Idle,
        AvatarGesture::Explain,
        AvatarGesture::Point,
        AvatarGesture::Confirm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarGesture::Idle => "idle",
            AvatarGesture::Explain => "explain",
            AvatarGesture::Point => "point",
            AvatarGesture::Confirm => "confirm",
        }
    }
}

impl fmt::Display for AvatarGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarGesture {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AvatarGesture::ALL
            .into_iter()
            .find(|gesture| gesture.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownGesture(s.to_string()))
    }
}
