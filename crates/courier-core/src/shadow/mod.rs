//! Shadow registration: which handlers a decorated service installs, and
//! under which channel labels.
//!
//! A decorated service is backed locally ("shadowed") so that callers can
//! still be served when no live remote endpoint answers. The policy is:
//!
//! - every remote contract with at least one method yields a
//!   [`BindingKind::ShadowForRemote`] binding on `"<Contract>:RPC"`, backed
//!   by a method-routed [`MethodDispatcher`] over that contract's methods;
//! - if no remote contract yields a binding, the service registers a single
//!   [`BindingKind::PureShadow`] binding under its shadow name (or its own
//!   name), backed by direct delegation to the instance.
//!
//! Every decorated service therefore has at least one binding. Choosing
//! between a remote endpoint and its shadow at delivery time is the bus's
//! concern.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bus::{EnvelopeHandler, MessageBus, ReplySink};
use crate::container::{InstanceContext, InstanceScope, ServiceInstance};
use crate::contract::ServiceContract;
use crate::dispatch::{DispatchBuilder, DispatchTable, MethodDispatcher};
use crate::error::{ContainerError, DispatchError, GenerationError};
use crate::protocol::{Envelope, REMOTE_CHANNEL_SUFFIX};

/// Tracing target for shadow registration.
pub(crate) const SHADOW_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shadow");

/// Returns the channel label a remote contract is served on.
#[must_use]
pub fn remote_channel_label(contract: &str) -> String {
    format!("{contract}{REMOTE_CHANNEL_SUFFIX}")
}

/// Registration metadata for one decorated service implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDeclaration {
    name: String,
    contracts: Vec<ServiceContract>,
    shadow_name: Option<String>,
    scope: InstanceScope,
}

impl ServiceDeclaration {
    /// Declares a service implementation with no contracts.
    pub fn new(name: impl Into<String>, scope: InstanceScope) -> Self {
        Self {
            name: name.into(),
            contracts: Vec::new(),
            shadow_name: None,
            scope,
        }
    }

    /// Appends a realised contract. Declaration order is preserved.
    #[must_use]
    pub fn implementing(mut self, contract: ServiceContract) -> Self {
        self.contracts.push(contract);
        self
    }

    /// Sets an explicit name for the pure-shadow fallback.
    #[must_use]
    pub fn with_shadow_name(mut self, name: impl Into<String>) -> Self {
        self.shadow_name = Some(name.into());
        self
    }

    /// Returns the implementation name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the realised contracts in declaration order.
    #[must_use]
    pub fn contracts(&self) -> &[ServiceContract] {
        &self.contracts
    }

    /// Returns the explicit shadow name, if any.
    #[must_use]
    pub fn shadow_name(&self) -> Option<&str> {
        self.shadow_name.as_deref()
    }

    /// Returns the instance scope.
    #[must_use]
    pub const fn scope(&self) -> InstanceScope {
        self.scope
    }

    /// Returns the label used by the pure-shadow fallback.
    #[must_use]
    pub fn fallback_label(&self) -> &str {
        self.shadow_name().unwrap_or(self.name())
    }
}

/// How a binding's handler is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// A method-routed handler on a remote contract's channel. A genuine
    /// remote endpoint may answer the same label.
    ShadowForRemote,
    /// A handler that delegates envelopes directly to the instance.
    PureShadow,
}

impl BindingKind {
    /// Returns the kind's stable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShadowForRemote => "shadow_for_remote",
            Self::PureShadow => "pure_shadow",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (label, handler) registration computed for a service.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowBinding {
    label: String,
    kind: BindingKind,
    contract: Option<String>,
    table: Option<Arc<DispatchTable>>,
}

impl ShadowBinding {
    fn for_remote(contract: &ServiceContract, table: DispatchTable) -> Self {
        Self {
            label: remote_channel_label(contract.name()),
            kind: BindingKind::ShadowForRemote,
            contract: Some(contract.name().to_owned()),
            table: Some(Arc::new(table)),
        }
    }

    fn pure(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            kind: BindingKind::PureShadow,
            contract: None,
            table: None,
        }
    }

    /// Returns the channel label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the binding kind.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Returns `true` when a remote endpoint may also serve this label.
    #[must_use]
    pub fn has_remote_delegate(&self) -> bool {
        self.kind == BindingKind::ShadowForRemote
    }

    /// Returns the remote contract backing the binding, if any.
    #[must_use]
    pub fn contract(&self) -> Option<&str> {
        self.contract.as_deref()
    }

    /// Returns the dispatch table for method-routed bindings.
    #[must_use]
    pub fn table(&self) -> Option<&Arc<DispatchTable>> {
        self.table.as_ref()
    }
}

/// The ordered bindings computed for one service.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationPlan {
    service: String,
    bindings: Vec<ShadowBinding>,
}

impl RegistrationPlan {
    /// Returns the service the plan registers.
    #[must_use]
    pub fn service(&self) -> &str {
        self.service.as_str()
    }

    /// Returns the bindings in registration order.
    #[must_use]
    pub fn bindings(&self) -> &[ShadowBinding] {
        &self.bindings
    }

    /// Returns the labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(ShadowBinding::label)
    }
}

/// Computes and installs shadow registrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowRegistrationPolicy;

impl ShadowRegistrationPolicy {
    /// Creates the policy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the bindings for `declaration`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::SignatureCollision`] if a remote contract
    /// declares two methods with the same signature.
    pub fn plan(
        &self,
        declaration: &ServiceDeclaration,
    ) -> Result<RegistrationPlan, GenerationError> {
        let mut bindings = Vec::new();
        for contract in declaration.contracts().iter().filter(|c| c.is_remote()) {
            let table = DispatchBuilder::new(declaration.name(), declaration.scope())
                .contract(contract)?
                .build();
            if table.is_empty() {
                debug!(
                    target: SHADOW_TARGET,
                    service = declaration.name(),
                    contract = contract.name(),
                    "remote contract has no methods; skipping"
                );
                continue;
            }
            bindings.push(ShadowBinding::for_remote(contract, table));
        }

        if bindings.is_empty() {
            bindings.push(ShadowBinding::pure(declaration.fallback_label()));
        }

        Ok(RegistrationPlan {
            service: declaration.name().to_owned(),
            bindings,
        })
    }

    /// Registers every binding of `plan` on `bus`, in order.
    ///
    /// Method-routed bindings resolve an instance per envelope. Pure-shadow
    /// bindings resolve theirs once, here.
    ///
    /// # Errors
    ///
    /// Returns a [`ContainerError`] if a pure-shadow instance cannot be
    /// resolved. Bindings registered before the failure stay registered.
    pub fn install<B>(
        &self,
        plan: &RegistrationPlan,
        bus: &Arc<B>,
        context: Arc<dyn InstanceContext>,
    ) -> Result<(), ContainerError>
    where
        B: MessageBus + 'static,
    {
        let replies: Arc<dyn ReplySink> = bus.clone();
        for binding in plan.bindings() {
            let handler: Arc<dyn EnvelopeHandler> = match binding.table() {
                Some(table) => Arc::new(MethodDispatcher::new(
                    Arc::clone(table),
                    Arc::clone(&context),
                    Arc::clone(&replies),
                )),
                None => {
                    let instance = context.create_instance(plan.service())?;
                    Arc::new(DelegatingHandler::new(binding.label(), instance))
                }
            };
            info!(
                target: SHADOW_TARGET,
                service = plan.service(),
                label = binding.label(),
                kind = %binding.kind(),
                "registering shadow handler"
            );
            bus.register(binding.label(), handler);
        }
        Ok(())
    }
}

/// Pure-shadow handler: hands every envelope to one resolved instance.
struct DelegatingHandler {
    label: String,
    instance: Arc<dyn ServiceInstance>,
}

impl DelegatingHandler {
    fn new(label: &str, instance: Arc<dyn ServiceInstance>) -> Self {
        Self {
            label: label.to_owned(),
            instance,
        }
    }
}

impl EnvelopeHandler for DelegatingHandler {
    fn handle(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        debug!(
            target: SHADOW_TARGET,
            label = self.label.as_str(),
            command = envelope.command_label(),
            "delegating envelope to shadow instance"
        );
        self.instance
            .on_envelope(envelope)
            .map_err(|cause| DispatchError::new(self.label.as_str(), cause))
    }
}

#[cfg(test)]
mod tests;
