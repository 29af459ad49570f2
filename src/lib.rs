//! Bridge between a web page and an externally rendered avatar.
//!
//! [`avatar::AvatarBridge`] sends fire-and-forget commands to the renderer on
//! every available transport and folds the renderer's lifecycle events into a
//! shared [`avatar::AvatarState`] that views read for display.

pub mod avatar;
pub mod config;
pub mod utils;

pub use avatar::{AvatarBridge, AvatarEmotion, AvatarGesture, AvatarState, BridgeConfig};
pub use utils::logging::init_logging;

/// Bridge for the current page, or a headless one when no window exists.
#[cfg(target_arch = "wasm32")]
pub fn attach_to_window(config: BridgeConfig) -> AvatarBridge {
    let bridge = AvatarBridge::builder()
        .maybe_context(avatar::WebContext::attach())
        .config(config)
        .build();
    bridge.bind_event_listeners();
    bridge
}
