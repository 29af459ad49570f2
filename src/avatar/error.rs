use thiserror::Error;

// ── Error Types ────────────────────────────────────────

/// Failures inside the bridge. None of these escape a public avatar
/// operation; they are logged at the fan-out point and recorded in the
/// [`DispatchReport`](super::sinks::DispatchReport).
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("transport '{transport}' failed: {reason}")]
    Transport {
        transport: &'static str,
        reason: String,
    },

    #[error("failed to encode avatar message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("host callable failed: {0}")]
    HostCallable(String),

    #[error("host callable panicked: {0}")]
    HostPanicked(String),

    #[error("unknown avatar emotion: {0}")]
    UnknownEmotion(String),

    #[error("unknown avatar gesture: {0}")]
    UnknownGesture(String),

    #[error("avatar config error: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn transport(transport: &'static str, reason: impl Into<String>) -> Self {
        BridgeError::Transport {
            transport,
            reason: reason.into(),
        }
    }
}
