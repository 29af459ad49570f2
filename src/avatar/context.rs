//! Browsing Context: trait-based abstraction over the page hosting the avatar.
//!
//! The bridge never talks to `window` directly. A [`BrowsingContext`] exposes
//! the three outbound surfaces (local notification, cross-context post,
//! optional host callable) and the two inbound surfaces (message listener,
//! named notification listener). `WebContext` implements it on wasm32;
//! [`MemoryContext`] implements it in-process.

use super::error::BridgeError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;
pub type NotificationHandler = Arc<dyn Fn() + Send + Sync>;

/// Outcome of offering a command to the host callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDelivery {
    Delivered,
    /// No `SendMessage`-shaped callable has been registered by the host.
    NotRegistered,
}

// ── Host callable ──────────────────────────────────────

/// A `SendMessage(objectName, methodName, parameter)` capability provided by
/// the embedded renderer.
pub trait HostCallable: Send + Sync {
    fn send_message(&self, object: &str, method: &str, parameter: &str)
        -> Result<(), BridgeError>;
}

impl<F> HostCallable for F
where
    F: Fn(&str, &str, &str) -> Result<(), BridgeError> + Send + Sync,
{
    fn send_message(
        &self,
        object: &str,
        method: &str,
        parameter: &str,
    ) -> Result<(), BridgeError> {
        self(object, method, parameter)
    }
}

// ── Context trait ──────────────────────────────────────

pub trait BrowsingContext: Send + Sync {
    /// Fire a same-document notification carrying `detail`.
    fn dispatch_local(&self, event_name: &str, detail: &Value) -> Result<(), BridgeError>;

    /// Post `message` to the global target for other realms/frames.
    fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), BridgeError>;

    /// Invoke the host callable if one is registered.
    fn send_to_host(
        &self,
        object: &str,
        method: &str,
        parameter: &str,
    ) -> Result<HostDelivery, BridgeError>;

    /// Subscribe to cross-context message data.
    fn on_message(&self, handler: MessageHandler);

    /// Subscribe to a named same-document notification.
    fn on_notification(&self, event_name: &str, handler: NotificationHandler);
}

// ── In-memory context ──────────────────────────────────

/// Everything a [`MemoryContext`] was asked to deliver, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Local {
        event_name: String,
        detail: Value,
    },
    Broadcast {
        message: Value,
        target_origin: String,
    },
    Host {
        object: String,
        method: String,
        parameter: String,
    },
}

#[derive(Default)]
struct Faults {
    local: Option<String>,
    broadcast: Option<String>,
}

/// In-process browsing context.
///
/// Records outbound deliveries and lets the caller inject inbound traffic.
/// Posted messages loop back to message listeners and local notifications to
/// listeners of the same name, like a window posting to itself.
#[derive(Default)]
pub struct MemoryContext {
    deliveries: Mutex<Vec<Delivery>>,
    message_handlers: Mutex<Vec<MessageHandler>>,
    notification_handlers: Mutex<HashMap<String, Vec<NotificationHandler>>>,
    host: Mutex<Option<Arc<dyn HostCallable>>>,
    faults: Mutex<Faults>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the host's `SendMessage` capability.
    pub fn set_host_callable(&self, callable: Arc<dyn HostCallable>) {
        *lock(&self.host) = Some(callable);
    }

    pub fn clear_host_callable(&self) {
        *lock(&self.host) = None;
    }

    /// Make every subsequent local notification fail with `reason`.
    pub fn fail_local(&self, reason: Option<&str>) {
        lock(&self.faults).local = reason.map(str::to_string);
    }

    /// Make every subsequent cross-context post fail with `reason`.
    pub fn fail_broadcast(&self, reason: Option<&str>) {
        lock(&self.faults).broadcast = reason.map(str::to_string);
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        lock(&self.deliveries).clone()
    }

    pub fn take_deliveries(&self) -> Vec<Delivery> {
        std::mem::take(&mut *lock(&self.deliveries))
    }

    pub fn message_listener_count(&self) -> usize {
        lock(&self.message_handlers).len()
    }

    pub fn notification_listener_count(&self, event_name: &str) -> usize {
        lock(&self.notification_handlers)
            .get(event_name)
            .map_or(0, Vec::len)
    }

    /// Deliver cross-context message data to every message listener.
    pub fn deliver_message(&self, data: &Value) {
        // Handlers run outside the lock so they may re-enter the context.
        let handlers = lock(&self.message_handlers).clone();
        for handler in handlers {
            handler(data);
        }
    }

    /// Fire a named same-document notification.
    pub fn notify(&self, event_name: &str) {
        let handlers = lock(&self.notification_handlers)
            .get(event_name)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler();
        }
    }

    fn record(&self, delivery: Delivery) {
        lock(&self.deliveries).push(delivery);
    }
}

impl BrowsingContext for MemoryContext {
    fn dispatch_local(&self, event_name: &str, detail: &Value) -> Result<(), BridgeError> {
        if let Some(reason) = lock(&self.faults).local.clone() {
            return Err(BridgeError::transport("local-notify", reason));
        }
        self.record(Delivery::Local {
            event_name: event_name.to_string(),
            detail: detail.clone(),
        });
        self.notify(event_name);
        Ok(())
    }

    fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), BridgeError> {
        if let Some(reason) = lock(&self.faults).broadcast.clone() {
            return Err(BridgeError::transport("broadcast", reason));
        }
        self.record(Delivery::Broadcast {
            message: message.clone(),
            target_origin: target_origin.to_string(),
        });
        self.deliver_message(message);
        Ok(())
    }

    fn send_to_host(
        &self,
        object: &str,
        method: &str,
        parameter: &str,
    ) -> Result<HostDelivery, BridgeError> {
        let Some(host) = lock(&self.host).clone() else {
            return Ok(HostDelivery::NotRegistered);
        };
        host.send_message(object, method, parameter)?;
        self.record(Delivery::Host {
            object: object.to_string(),
            method: method.to_string(),
            parameter: parameter.to_string(),
        });
        Ok(HostDelivery::Delivered)
    }

    fn on_message(&self, handler: MessageHandler) {
        lock(&self.message_handlers).push(handler);
    }

    fn on_notification(&self, event_name: &str, handler: NotificationHandler) {
        lock(&self.notification_handlers)
            .entry(event_name.to_string())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn host_is_optional() {
        let ctx = MemoryContext::new();
        let outcome = ctx.send_to_host("WebBridge", "OnWebCommand", "{}").unwrap();
        assert_eq!(outcome, HostDelivery::NotRegistered);
        assert!(ctx.deliveries().is_empty());
    }

    #[test]
    fn closures_act_as_host_callables() {
        let ctx = MemoryContext::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        ctx.set_host_callable(Arc::new(move |_: &str, _: &str, _: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), BridgeError>(())
        }));
        let outcome = ctx.send_to_host("WebBridge", "OnWebCommand", "{}").unwrap();
        assert_eq!(outcome, HostDelivery::Delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn posted_messages_loop_back() {
        let ctx = MemoryContext::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.on_message(Arc::new(move |data: &Value| {
            sink.lock().unwrap().push(data.clone());
        }));
        ctx.post_message(&json!({"event": "OnAvatarReady"}), "*").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!({"event": "OnAvatarReady"})]);
    }

    #[test]
    fn faults_prevent_recording() {
        let ctx = MemoryContext::new();
        ctx.fail_broadcast(Some("detached"));
        let err = ctx.post_message(&json!({}), "*").unwrap_err();
        assert!(err.to_string().contains("detached"));
        assert!(ctx.deliveries().is_empty());

        ctx.fail_broadcast(None);
        ctx.post_message(&json!({}), "*").unwrap();
        assert_eq!(ctx.deliveries().len(), 1);
    }

    #[test]
    fn notifications_reach_named_listeners_only() {
        let ctx = MemoryContext::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        ctx.on_notification(
            "avatar:ready",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        ctx.notify("avatar:play-finished");
        ctx.notify("avatar:ready");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.notification_listener_count("avatar:ready"), 1);
    }
}
