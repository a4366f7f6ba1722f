//! Dispatch tables and the runtime handler that interprets them.
//!
//! The generation pass turns a service's remotely exposed methods into a
//! [`DispatchTable`]: one [`DispatchRule`] per method, each binding a
//! [`CallSignature`] to per-parameter casts, a return-presence flag, and a
//! teardown flag. [`MethodDispatcher`] interprets the table at runtime:
//!
//! 1. Match the envelope's command label against each rule in declaration
//!    order. Unmatched envelopes are ignored without error, so one channel
//!    can carry several unrelated command families.
//! 2. Cast each parameter to its declared type by position.
//! 3. Resolve the instance and invoke the method.
//! 4. Destroy a dependent-scoped instance, but only when the invocation
//!    returned normally. A failed invocation skips teardown and propagates.
//! 5. Publish a `MethodReply` if the method declares a return value.
//!
//! Any failure in steps 2 to 4 crosses the handler boundary as a single
//! [`DispatchError`]. Failures never become reply envelopes.

mod render;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::bus::{EnvelopeHandler, ReplySink};
use crate::cast::{Cast, EvalScope, Expr, TypedValue};
use crate::container::{InstanceContext, InstanceScope, MethodCall};
use crate::contract::{MethodDescriptor, ServiceContract};
use crate::error::{CastError, DispatchError, DispatchFailure, GenerationError};
use crate::protocol::{Envelope, ReplyEnvelope};
use crate::signature::CallSignature;

pub use self::render::RenderedDispatch;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Binds one call signature to its invocation template.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRule {
    signature: CallSignature,
    method: MethodDescriptor,
    parameters: Vec<Cast>,
    teardown: bool,
}

impl DispatchRule {
    /// Builds the rule for `method` as declared on the contract named
    /// `contract`.
    #[must_use]
    pub fn new(contract: &str, method: &MethodDescriptor, scope: InstanceScope) -> Self {
        let parameters = method
            .parameters()
            .iter()
            .enumerate()
            .map(|(position, ty)| Cast::to(ty.clone(), Expr::parameter(position)))
            .collect();
        Self {
            signature: CallSignature::derive(contract, method),
            method: method.clone(),
            parameters,
            teardown: scope == InstanceScope::Dependent,
        }
    }

    /// Returns the signature this rule answers to.
    #[must_use]
    pub const fn signature(&self) -> &CallSignature {
        &self.signature
    }

    /// Returns the target method.
    #[must_use]
    pub const fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Returns the per-parameter casts in position order.
    #[must_use]
    pub fn parameters(&self) -> &[Cast] {
        &self.parameters
    }

    /// Returns whether a reply is published after a successful call.
    #[must_use]
    pub const fn returns_value(&self) -> bool {
        self.method.has_return()
    }

    /// Returns whether the instance is destroyed after a successful call.
    #[must_use]
    pub const fn tears_down(&self) -> bool {
        self.teardown
    }

    /// Casts the envelope's parameters to the declared types.
    ///
    /// # Errors
    ///
    /// Returns the first [`CastError`] raised by a parameter cast.
    pub fn adapt(&self, envelope: &Envelope) -> Result<Vec<TypedValue>, CastError> {
        let scope = EvalScope::new(envelope.parameters());
        self.parameters
            .iter()
            .map(|cast| cast.evaluate(&scope))
            .collect()
    }
}

/// The ordered rule set for one service implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTable {
    service: String,
    scope: InstanceScope,
    rules: Vec<DispatchRule>,
}

impl DispatchTable {
    /// Returns the implementation the table dispatches to.
    #[must_use]
    pub fn service(&self) -> &str {
        self.service.as_str()
    }

    /// Returns the instance scope the table was generated for.
    #[must_use]
    pub const fn scope(&self) -> InstanceScope {
        self.scope
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[DispatchRule] {
        &self.rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the first rule whose signature matches `command_label`.
    #[must_use]
    pub fn find(&self, command_label: &str) -> Option<&DispatchRule> {
        self.rules
            .iter()
            .find(|rule| rule.signature().matches(command_label))
    }

    /// Renders the table as the equivalent ahead-of-time dispatch routine.
    #[must_use]
    pub const fn render(&self) -> RenderedDispatch<'_> {
        RenderedDispatch::new(self)
    }
}

/// Assembles a [`DispatchTable`] from one or more contracts.
///
/// # Example
///
/// ```
/// use courier_core::container::InstanceScope;
/// use courier_core::contract::{MethodDescriptor, ServiceContract, TypeRef};
/// use courier_core::dispatch::DispatchBuilder;
///
/// let contract = ServiceContract::builder("OnlineService")
///     .remote(true)
///     .method(
///         MethodDescriptor::new("greet")
///             .with_parameter(TypeRef::text())
///             .returning(TypeRef::text()),
///     )
///     .build()
///     .expect("valid contract");
///
/// let table = DispatchBuilder::new("OfflineServiceImpl", InstanceScope::Shared)
///     .contract(&contract)
///     .expect("no collisions")
///     .build();
/// assert!(table.find("OnlineService|greet(String)").is_some());
/// ```
#[derive(Debug)]
pub struct DispatchBuilder {
    service: String,
    scope: InstanceScope,
    rules: Vec<DispatchRule>,
    seen: HashSet<CallSignature>,
}

impl DispatchBuilder {
    /// Starts a table for the named implementation.
    pub fn new(service: impl Into<String>, scope: InstanceScope) -> Self {
        Self {
            service: service.into(),
            scope,
            rules: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Adds a rule for every method of `contract`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::SignatureCollision`] if a method's
    /// signature is already present in the table.
    pub fn contract(mut self, contract: &ServiceContract) -> Result<Self, GenerationError> {
        for method in contract.methods() {
            let rule = DispatchRule::new(contract.name(), method, self.scope);
            if !self.seen.insert(rule.signature().clone()) {
                return Err(GenerationError::SignatureCollision {
                    service: self.service,
                    signature: rule.signature,
                });
            }
            self.rules.push(rule);
        }
        Ok(self)
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(self) -> DispatchTable {
        DispatchTable {
            service: self.service,
            scope: self.scope,
            rules: self.rules,
        }
    }
}

/// Runtime handler that interprets a [`DispatchTable`].
///
/// The dispatcher owns no mutable state. Everything it needs per call comes
/// from the envelope and the container, so one registration can serve
/// concurrent deliveries.
pub struct MethodDispatcher {
    table: Arc<DispatchTable>,
    context: Arc<dyn InstanceContext>,
    replies: Arc<dyn ReplySink>,
}

impl MethodDispatcher {
    /// Creates a dispatcher over `table`.
    #[must_use]
    pub fn new(
        table: Arc<DispatchTable>,
        context: Arc<dyn InstanceContext>,
        replies: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            table,
            context,
            replies,
        }
    }

    /// Returns the interpreted table.
    #[must_use]
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    fn dispatch(&self, rule: &DispatchRule, envelope: &Envelope) -> Result<(), DispatchFailure> {
        let arguments = rule.adapt(envelope)?;
        let instance = self.context.create_instance(self.table.service())?;
        let call = MethodCall::new(rule.signature(), rule.method(), arguments);
        let value = instance.invoke(&call)?;

        if rule.tears_down() {
            self.context.destroy_instance(instance)?;
        }

        if rule.returns_value() {
            self.replies
                .publish(ReplyEnvelope::method_reply(envelope, value));
        }
        Ok(())
    }
}

impl fmt::Debug for MethodDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDispatcher")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl EnvelopeHandler for MethodDispatcher {
    fn handle(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let Some(rule) = self.table.find(envelope.command_label()) else {
            debug!(
                target: DISPATCH_TARGET,
                service = self.table.service(),
                command = envelope.command_label(),
                "no rule matches envelope; ignoring"
            );
            return Ok(());
        };

        debug!(
            target: DISPATCH_TARGET,
            service = self.table.service(),
            signature = %rule.signature(),
            conversation = %envelope.reply_to(),
            "dispatching envelope"
        );

        self.dispatch(rule, envelope).map_err(|cause| {
            let error = DispatchError::new(rule.signature().as_str(), cause);
            warn!(target: DISPATCH_TARGET, %error, "dispatch failed");
            error
        })
    }
}
