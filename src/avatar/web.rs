//! `window`-backed browsing context for wasm32 builds.
//!
//! The window is looked up on every call rather than stored, so the context
//! stays `Send + Sync` and degrades to transport errors if the page goes
//! away. Listener closures are leaked; they live for the lifetime
//! of the page, matching the once-per-bridge binding latch.

use super::context::{
    BrowsingContext, HostDelivery, MessageHandler, NotificationHandler,
};
use super::error::BridgeError;
use serde_json::{json, Value};
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, Event, MessageEvent, Window};

const HOST_INSTANCE: &str = "unityInstance";
const HOST_SEND: &str = "SendMessage";

#[derive(Debug, Default, Clone, Copy)]
pub struct WebContext;

impl WebContext {
    /// The page's context, or `None` outside a window (workers, SSR).
    pub fn attach() -> Option<Arc<dyn BrowsingContext>> {
        web_sys::window().map(|_| Arc::new(WebContext) as Arc<dyn BrowsingContext>)
    }

    fn window(transport: &'static str) -> Result<Window, BridgeError> {
        web_sys::window().ok_or_else(|| BridgeError::transport(transport, "window unavailable"))
    }
}

fn js_reason(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn to_js(transport: &'static str, value: &Value) -> Result<JsValue, BridgeError> {
    let json = serde_json::to_string(value)?;
    js_sys::JSON::parse(&json).map_err(|e| BridgeError::transport(transport, js_reason(&e)))
}

/// Reduce inbound message data to `{"event": <name>}`. Only the `event`
/// field is read; the rest of the payload is never serialized.
fn event_envelope(data: &JsValue) -> Option<Value> {
    if !data.is_object() {
        return None;
    }
    let name = js_sys::Reflect::get(data, &JsValue::from_str("event"))
        .ok()?
        .as_string()?;
    Some(json!({ "event": name }))
}

impl BrowsingContext for WebContext {
    fn dispatch_local(&self, event_name: &str, detail: &Value) -> Result<(), BridgeError> {
        const TRANSPORT: &str = "local-notify";
        let window = Self::window(TRANSPORT)?;
        let init = CustomEventInit::new();
        init.set_detail(&to_js(TRANSPORT, detail)?);
        let event = CustomEvent::new_with_event_init_dict(event_name, &init)
            .map_err(|e| BridgeError::transport(TRANSPORT, js_reason(&e)))?;
        window
            .dispatch_event(&event)
            .map(|_| ())
            .map_err(|e| BridgeError::transport(TRANSPORT, js_reason(&e)))
    }

    fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), BridgeError> {
        const TRANSPORT: &str = "broadcast";
        let window = Self::window(TRANSPORT)?;
        window
            .post_message(&to_js(TRANSPORT, message)?, target_origin)
            .map_err(|e| BridgeError::transport(TRANSPORT, js_reason(&e)))
    }

    fn send_to_host(
        &self,
        object: &str,
        method: &str,
        parameter: &str,
    ) -> Result<HostDelivery, BridgeError> {
        let Some(window) = web_sys::window() else {
            return Ok(HostDelivery::NotRegistered);
        };
        let instance = js_sys::Reflect::get(&window, &JsValue::from_str(HOST_INSTANCE))
            .map_err(|e| BridgeError::HostCallable(js_reason(&e)))?;
        if instance.is_undefined() || instance.is_null() {
            return Ok(HostDelivery::NotRegistered);
        }
        let sender = js_sys::Reflect::get(&instance, &JsValue::from_str(HOST_SEND))
            .map_err(|e| BridgeError::HostCallable(js_reason(&e)))?;
        let Ok(sender) = sender.dyn_into::<js_sys::Function>() else {
            return Ok(HostDelivery::NotRegistered);
        };

        sender
            .call3(
                &instance,
                &JsValue::from_str(object),
                &JsValue::from_str(method),
                &JsValue::from_str(parameter),
            )
            .map(|_| HostDelivery::Delivered)
            .map_err(|e| BridgeError::HostCallable(js_reason(&e)))
    }

    fn on_message(&self, handler: MessageHandler) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = Closure::<dyn FnMut(MessageEvent)>::new(move |evt: MessageEvent| {
            if let Some(envelope) = event_envelope(&evt.data()) {
                handler(&envelope);
            }
        });
        if let Err(e) =
            window.add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())
        {
            tracing::warn!("[AvatarBridge] Failed to bind message listener: {}", js_reason(&e));
        }
        callback.forget();
    }

    fn on_notification(&self, event_name: &str, handler: NotificationHandler) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = Closure::<dyn FnMut(Event)>::new(move |_evt: Event| handler());
        if let Err(e) =
            window.add_event_listener_with_callback(event_name, callback.as_ref().unchecked_ref())
        {
            tracing::warn!(
                "[AvatarBridge] Failed to bind '{}' listener: {}",
                event_name,
                js_reason(&e)
            );
        }
        callback.forget();
    }
}
