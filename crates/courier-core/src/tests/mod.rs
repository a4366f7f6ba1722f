//! Crate-level test doubles, end-to-end tests, and BDD scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::bus::{EnvelopeHandler, MessageBus, ReplySink};
use crate::container::{
    InstanceContext, InstanceScope, MethodCall, ServiceInstance, encode_return,
};
use crate::contract::{MethodDescriptor, ServiceContract, TypeRef};
use crate::error::{ContainerError, DispatchError, ServiceError};
use crate::protocol::{ConversationId, Envelope, ReplyEnvelope};
use crate::shadow::{ServiceDeclaration, ShadowRegistrationPolicy};


pub(crate) const GREET: &str = "OnlineService|greet(String)";
pub(crate) const ADD: &str = "OnlineService|add(i64,i64)";
pub(crate) const DISPOSE: &str = "OnlineService|dispose()";
pub(crate) const FAIL: &str = "OnlineService|fail()";

/// The remote contract used across tests.
pub(crate) fn online_service() -> ServiceContract {
    ServiceContract::builder("OnlineService")
        .remote(true)
        .method(
            MethodDescriptor::new("greet")
                .with_parameter(TypeRef::text())
                .returning(TypeRef::text()),
        )
        .method(
            MethodDescriptor::new("add")
                .with_parameter(TypeRef::integer())
                .with_parameter(TypeRef::integer())
                .returning(TypeRef::integer()),
        )
        .method(MethodDescriptor::new("dispose"))
        .method(MethodDescriptor::new("fail").returning(TypeRef::text()))
        .build()
        .expect("valid contract")
}

/// A local-only contract.
pub(crate) fn local_contract(name: &str) -> ServiceContract {
    ServiceContract::builder(name)
        .method(MethodDescriptor::new("ping"))
        .build()
        .expect("valid contract")
}

/// Builds an envelope addressed to `conv-1`.
pub(crate) fn envelope(label: &str, parameters: Vec<Value>) -> Envelope {
    Envelope::new(label, parameters, ConversationId::new("conv-1"))
}

/// Service instance recording every call it receives.
#[derive(Debug, Default)]
pub(crate) struct Greeter {
    invocations: Mutex<Vec<String>>,
    envelopes: Mutex<Vec<String>>,
}

impl Greeter {
    pub(crate) fn invocations(&self) -> Vec<String> {
        self.invocations.lock().expect("invocations lock").clone()
    }

    pub(crate) fn envelopes(&self) -> Vec<String> {
        self.envelopes.lock().expect("envelopes lock").clone()
    }
}

impl ServiceInstance for Greeter {
    fn invoke(&self, call: &MethodCall<'_>) -> Result<Value, ServiceError> {
        self.invocations
            .lock()
            .expect("invocations lock")
            .push(call.method_name().to_owned());
        match call.method_name() {
            "greet" => {
                let name: String = call.argument(0)?;
                Ok(Value::String(format!("Hello, {name}")))
            }
            "add" => {
                let left: i64 = call.argument(0)?;
                let right: i64 = call.argument(1)?;
                encode_return(&(left + right))
            }
            "dispose" => Ok(Value::Null),
            "fail" => Err(ServiceError::failed("greeter is offline")),
            other => Err(ServiceError::unknown_method(other)),
        }
    }

    fn on_envelope(&self, envelope: &Envelope) -> Result<(), ServiceError> {
        self.envelopes
            .lock()
            .expect("envelopes lock")
            .push(envelope.command_label().to_owned());
        Ok(())
    }
}

/// Service instance that only supports method calls.
#[derive(Debug, Default)]
pub(crate) struct MethodOnly;

impl ServiceInstance for MethodOnly {
    fn invoke(&self, call: &MethodCall<'_>) -> Result<Value, ServiceError> {
        Err(ServiceError::unknown_method(call.method_name()))
    }
}

/// Container double counting lifecycle calls.
pub(crate) struct RecordingContext {
    instance: Option<Arc<dyn ServiceInstance>>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl RecordingContext {
    pub(crate) fn new(instance: Arc<dyn ServiceInstance>) -> Self {
        Self {
            instance: Some(instance),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            instance: None,
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl InstanceContext for RecordingContext {
    fn create_instance(&self, service: &str) -> Result<Arc<dyn ServiceInstance>, ContainerError> {
        let instance = self
            .instance
            .clone()
            .ok_or_else(|| ContainerError::Unavailable {
                service: service.to_owned(),
                message: "container is shut down".to_owned(),
            })?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(instance)
    }

    fn destroy_instance(&self, _instance: Arc<dyn ServiceInstance>) -> Result<(), ContainerError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Bus double recording registrations and published replies.
#[derive(Default)]
pub(crate) struct RecordingBus {
    handlers: Mutex<Vec<(String, Arc<dyn EnvelopeHandler>)>>,
    replies: Mutex<Vec<ReplyEnvelope>>,
}

impl RecordingBus {
    pub(crate) fn labels(&self) -> Vec<String> {
        self.handlers
            .lock()
            .expect("handlers lock")
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    pub(crate) fn replies(&self) -> Vec<ReplyEnvelope> {
        self.replies.lock().expect("replies lock").clone()
    }

    /// Delivers `envelope` to the handler registered under `label`.
    pub(crate) fn deliver(&self, label: &str, envelope: &Envelope) -> Result<(), DispatchError> {
        let handler = self
            .handlers
            .lock()
            .expect("handlers lock")
            .iter()
            .find(|(registered, _)| registered == label)
            .map(|(_, handler)| Arc::clone(handler))
            .unwrap_or_else(|| panic!("no handler registered under '{label}'"));
        handler.handle(envelope)
    }
}

impl ReplySink for RecordingBus {
    fn publish(&self, reply: ReplyEnvelope) {
        self.replies.lock().expect("replies lock").push(reply);
    }
}

impl MessageBus for RecordingBus {
    fn register(&self, label: &str, handler: Arc<dyn EnvelopeHandler>) {
        self.handlers
            .lock()
            .expect("handlers lock")
            .push((label.to_owned(), handler));
    }
}

#[test]
fn end_to_end_greet_through_the_bus() {
    let declaration = ServiceDeclaration::new("OfflineServiceImpl", InstanceScope::Shared)
        .implementing(online_service());
    let policy = ShadowRegistrationPolicy::new();
    let plan = policy.plan(&declaration).expect("plan");

    let bus = Arc::new(RecordingBus::default());
    let greeter = Arc::new(Greeter::default());
    let context = Arc::new(RecordingContext::new(greeter.clone()));
    policy
        .install(&plan, &bus, context.clone())
        .expect("install");

    bus.deliver("OnlineService:RPC", &envelope(GREET, vec![json!("Ada")]))
        .expect("deliver");

    let replies = bus.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(
        serde_json::to_value(&replies[0]).expect("serialise reply"),
        json!({"topic": "MethodReply", "conversationId": "conv-1", "value": "Hello, Ada"})
    );
    assert_eq!(greeter.invocations(), ["greet"]);
    assert_eq!(context.destroyed(), 0);
}

#[test]
fn parsed_envelope_drives_dispatch() {
    let declaration = ServiceDeclaration::new("OfflineServiceImpl", InstanceScope::Dependent)
        .implementing(online_service());
    let policy = ShadowRegistrationPolicy::new();
    let plan = policy.plan(&declaration).expect("plan");
    let bus = Arc::new(RecordingBus::default());
    let context = Arc::new(RecordingContext::new(Arc::new(Greeter::default())));
    policy
        .install(&plan, &bus, context.clone())
        .expect("install");

    let line = br#"{"commandLabel":"OnlineService|add(i64,i64)","parameters":[2,3],"replyTo":"conv-7"}
"#;
    let request = Envelope::parse(line).expect("parse envelope");
    bus.deliver("OnlineService:RPC", &request).expect("deliver");

    let replies = bus.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].conversation_id().as_str(), "conv-7");
    assert_eq!(replies[0].value(), &json!(5));
    assert_eq!(context.created(), 1);
    assert_eq!(context.destroyed(), 1);
}
