//! In-process stand-ins for the message bus and the instance container.
//!
//! `courier route` installs the manifest's shadow handlers on a [`LocalBus`]
//! and resolves every service to an [`EchoInstance`], so a single envelope can
//! be traced through the generated dispatch without any real services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tracing::debug;

use courier_core::{
    ContainerError, DispatchError, Envelope, EnvelopeHandler, InstanceContext, MessageBus,
    MethodCall, ReplyEnvelope, ReplySink, ServiceError, ServiceInstance,
};

/// Bus that keeps registrations and replies in memory.
#[derive(Default)]
pub(crate) struct LocalBus {
    handlers: Mutex<Vec<(String, Arc<dyn EnvelopeHandler>)>>,
    replies: Mutex<Vec<ReplyEnvelope>>,
}

impl LocalBus {
    /// Delivers `envelope` to the first handler registered under `label`.
    ///
    /// Returns `Ok(false)` when nothing is registered on the label.
    pub(crate) fn deliver(&self, label: &str, envelope: &Envelope) -> Result<bool, DispatchError> {
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(registered, _)| registered == label)
            .map(|(_, handler)| Arc::clone(handler));
        match handler {
            Some(handler) => handler.handle(envelope).map(|()| true),
            None => Ok(false),
        }
    }

    /// Drains the replies published so far.
    pub(crate) fn take_replies(&self) -> Vec<ReplyEnvelope> {
        std::mem::take(&mut *self.replies.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ReplySink for LocalBus {
    fn publish(&self, reply: ReplyEnvelope) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reply);
    }
}

impl MessageBus for LocalBus {
    fn register(&self, label: &str, handler: Arc<dyn EnvelopeHandler>) {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if handlers.iter().any(|(registered, _)| registered == label) {
            debug!(label, "channel already has a handler; the first registration serves it");
        }
        handlers.push((label.to_owned(), handler));
    }
}

/// Container that hands out [`EchoInstance`]s and counts lifecycle calls.
#[derive(Default)]
pub(crate) struct EchoContext {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    delegated: Arc<Mutex<Vec<String>>>,
}

impl EchoContext {
    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Services whose pure-shadow handler received an envelope.
    pub(crate) fn delegated(&self) -> Vec<String> {
        self.delegated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears the lifecycle counters, e.g. after installation.
    pub(crate) fn reset(&self) {
        self.created.store(0, Ordering::SeqCst);
        self.destroyed.store(0, Ordering::SeqCst);
    }
}

impl InstanceContext for EchoContext {
    fn create_instance(&self, service: &str) -> Result<Arc<dyn ServiceInstance>, ContainerError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(EchoInstance {
            service: service.to_owned(),
            delegated: Arc::clone(&self.delegated),
        }))
    }

    fn destroy_instance(&self, _instance: Arc<dyn ServiceInstance>) -> Result<(), ContainerError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Instance that answers every call with a description of the call.
pub(crate) struct EchoInstance {
    service: String,
    delegated: Arc<Mutex<Vec<String>>>,
}

impl ServiceInstance for EchoInstance {
    fn invoke(&self, call: &MethodCall<'_>) -> Result<Value, ServiceError> {
        let arguments: Vec<&Value> = call.arguments().iter().map(|arg| arg.value()).collect();
        Ok(json!({
            "service": self.service,
            "method": call.method_name(),
            "arguments": arguments,
        }))
    }

    fn on_envelope(&self, _envelope: &Envelope) -> Result<(), ServiceError> {
        self.delegated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.service.clone());
        Ok(())
    }
}
