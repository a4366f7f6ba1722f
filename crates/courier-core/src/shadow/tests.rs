//! Unit tests for shadow registration planning and installation.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::contract::{MethodDescriptor, TypeRef};
use crate::error::{DispatchFailure, ServiceError};
use crate::tests::{
    GREET, Greeter, MethodOnly, RecordingBus, RecordingContext, envelope, local_contract,
    online_service,
};

fn remote(name: &str, methods: &[&str]) -> ServiceContract {
    ServiceContract::builder(name)
        .remote(true)
        .methods(methods.iter().map(|method| MethodDescriptor::new(*method)))
        .build()
        .expect("valid contract")
}

fn plan(declaration: &ServiceDeclaration) -> RegistrationPlan {
    ShadowRegistrationPolicy::new()
        .plan(declaration)
        .expect("plan")
}

#[rstest]
#[case::no_contracts(ServiceDeclaration::new("Offline", InstanceScope::Shared), "Offline")]
#[case::local_only(
    ServiceDeclaration::new("Offline", InstanceScope::Shared).implementing(local_contract("Local")),
    "Offline"
)]
#[case::explicit_name(
    ServiceDeclaration::new("Offline", InstanceScope::Shared).with_shadow_name("Shadowed"),
    "Shadowed"
)]
#[case::empty_remote(
    ServiceDeclaration::new("Offline", InstanceScope::Shared).implementing(remote("Empty", &[])),
    "Offline"
)]
fn falls_back_to_pure_shadow(#[case] declaration: ServiceDeclaration, #[case] label: &str) {
    let plan = plan(&declaration);
    let [binding] = plan.bindings() else {
        panic!("expected one binding, got {:?}", plan.bindings());
    };
    assert_eq!(binding.label(), label);
    assert_eq!(binding.kind(), BindingKind::PureShadow);
    assert!(!binding.has_remote_delegate());
    assert!(binding.table().is_none());
}

#[test]
fn remote_contract_ignores_shadow_name() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Shared)
        .implementing(online_service())
        .with_shadow_name("Shadowed");
    let plan = plan(&declaration);
    assert_eq!(plan.labels().collect::<Vec<_>>(), ["OnlineService:RPC"]);
    let binding = &plan.bindings()[0];
    assert_eq!(binding.kind(), BindingKind::ShadowForRemote);
    assert!(binding.has_remote_delegate());
    assert_eq!(binding.contract(), Some("OnlineService"));
    assert_eq!(binding.table().map(|table| table.len()), Some(4));
}

#[test]
fn remote_contracts_register_in_declaration_order() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Dependent)
        .implementing(remote("Second", &["b"]))
        .implementing(local_contract("Local"))
        .implementing(remote("Empty", &[]))
        .implementing(remote("First", &["a"]));
    let plan = plan(&declaration);
    assert_eq!(plan.service(), "Offline");
    assert_eq!(
        plan.labels().collect::<Vec<_>>(),
        ["Second:RPC", "First:RPC"]
    );
}

#[test]
fn each_remote_binding_covers_its_own_contract() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Shared)
        .implementing(remote("Alpha", &["a"]))
        .implementing(remote("Beta", &["b"]));
    let plan = plan(&declaration);
    let tables: Vec<Vec<&str>> = plan
        .bindings()
        .iter()
        .map(|binding| {
            binding
                .table()
                .expect("method-routed binding")
                .rules()
                .iter()
                .map(|rule| rule.signature().as_str())
                .collect()
        })
        .collect();
    assert_eq!(tables, [["Alpha|a()"], ["Beta|b()"]]);
}

#[test]
fn collisions_within_a_contract_fail_planning() {
    let contract = ServiceContract::builder("Dup")
        .remote(true)
        .method(MethodDescriptor::new("echo").with_parameter(TypeRef::text()))
        .method(MethodDescriptor::new("echo").with_parameter(TypeRef::text()))
        .build()
        .expect("valid contract");
    let declaration =
        ServiceDeclaration::new("Offline", InstanceScope::Shared).implementing(contract);
    let err = ShadowRegistrationPolicy::new()
        .plan(&declaration)
        .expect_err("collision");
    assert!(matches!(err, GenerationError::SignatureCollision { .. }));
}

#[test]
fn install_registers_method_dispatchers() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Shared)
        .implementing(online_service());
    let policy = ShadowRegistrationPolicy::new();
    let plan = policy.plan(&declaration).expect("plan");
    let bus = Arc::new(RecordingBus::default());
    let context = Arc::new(RecordingContext::new(Arc::new(Greeter::default())));

    policy
        .install(&plan, &bus, context.clone())
        .expect("install");

    assert_eq!(bus.labels(), ["OnlineService:RPC"]);
    assert_eq!(context.created(), 0, "instances resolve per envelope");
    bus.deliver("OnlineService:RPC", &envelope(GREET, vec![json!("Ada")]))
        .expect("deliver");
    assert_eq!(context.created(), 1);
    assert_eq!(bus.replies().len(), 1);
}

#[test]
fn install_resolves_pure_shadow_instance_once() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Shared);
    let policy = ShadowRegistrationPolicy::new();
    let plan = policy.plan(&declaration).expect("plan");
    let bus = Arc::new(RecordingBus::default());
    let greeter = Arc::new(Greeter::default());
    let context = Arc::new(RecordingContext::new(greeter.clone()));

    policy
        .install(&plan, &bus, context.clone())
        .expect("install");
    for label in ["first", "second"] {
        bus.deliver("Offline", &envelope(label, Vec::new()))
            .expect("deliver");
    }

    assert_eq!(context.created(), 1);
    assert_eq!(greeter.envelopes(), ["first", "second"]);
    assert!(bus.replies().is_empty());
}

#[test]
fn pure_shadow_requires_a_callback_instance() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Shared);
    let policy = ShadowRegistrationPolicy::new();
    let plan = policy.plan(&declaration).expect("plan");
    let bus = Arc::new(RecordingBus::default());
    let context = Arc::new(RecordingContext::new(Arc::new(MethodOnly)));
    policy.install(&plan, &bus, context).expect("install");

    let err = bus
        .deliver("Offline", &envelope("Ping", Vec::new()))
        .expect_err("not a callback");
    assert_eq!(err.command(), "Offline");
    assert!(matches!(
        err.cause(),
        DispatchFailure::Service(ServiceError::NotACallback)
    ));
}

#[test]
fn install_fails_when_pure_shadow_instance_is_unavailable() {
    let declaration = ServiceDeclaration::new("Offline", InstanceScope::Shared);
    let policy = ShadowRegistrationPolicy::new();
    let plan = policy.plan(&declaration).expect("plan");
    let bus = Arc::new(RecordingBus::default());

    let err = policy
        .install(&plan, &bus, Arc::new(RecordingContext::unavailable()))
        .expect_err("unavailable");
    assert!(matches!(err, ContainerError::Unavailable { .. }));
    assert!(bus.labels().is_empty());
}

#[test]
fn remote_channel_label_appends_suffix() {
    assert_eq!(remote_channel_label("OnlineService"), "OnlineService:RPC");
}
