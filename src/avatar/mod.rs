pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod protocol;
pub mod sinks;
pub mod state;
pub mod vocabulary;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod tests;

pub use bridge::{AvatarBridge, AvatarBridgeBuilder};
pub use config::{load_config, save_config, BridgeConfig};
pub use context::{
    BrowsingContext, Delivery, HostCallable, HostDelivery, MemoryContext, MessageHandler,
    NotificationHandler,
};
pub use error::BridgeError;
pub use protocol::{parse_host_event, AvatarCommand, CommandMessage, CommandPayload, HostEvent};
pub use sinks::{
    BroadcastSink, CommandSink, DispatchReport, HostCallableSink, LocalNotifySink, SinkDelivery,
    SinkOutcome,
};
pub use state::{AvatarState, SharedAvatarState};
pub use vocabulary::{normalize_emotion, AvatarEmotion, AvatarGesture};
#[cfg(target_arch = "wasm32")]
pub use web::WebContext;
