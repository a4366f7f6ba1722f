//! Seams to the object-lifecycle container and the service instances it
//! manages.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cast::TypedValue;
use crate::contract::MethodDescriptor;
use crate::error::{CastError, ContainerError, ServiceError};
use crate::protocol::Envelope;
use crate::signature::CallSignature;

/// Lifetime of the instance that serves a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceScope {
    /// One instance serves every call.
    #[default]
    Shared,
    /// A fresh instance serves a single call and is destroyed afterwards.
    Dependent,
}

/// A matched invocation with its adapted arguments.
#[derive(Debug)]
pub struct MethodCall<'a> {
    signature: &'a CallSignature,
    method: &'a MethodDescriptor,
    arguments: Vec<TypedValue>,
}

impl<'a> MethodCall<'a> {
    /// Creates a call.
    #[must_use]
    pub const fn new(
        signature: &'a CallSignature,
        method: &'a MethodDescriptor,
        arguments: Vec<TypedValue>,
    ) -> Self {
        Self {
            signature,
            method,
            arguments,
        }
    }

    /// Returns the matched signature.
    #[must_use]
    pub const fn signature(&self) -> &CallSignature {
        self.signature
    }

    /// Returns the invoked method's name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// Returns the invoked method's descriptor.
    #[must_use]
    pub const fn method(&self) -> &MethodDescriptor {
        self.method
    }

    /// Returns the adapted arguments in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[TypedValue] {
        &self.arguments
    }

    /// Decodes the argument at `index` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Argument`] if the argument is absent or does
    /// not decode as `T`.
    pub fn argument<T: DeserializeOwned>(&self, index: usize) -> Result<T, ServiceError> {
        let argument = self
            .arguments
            .get(index)
            .ok_or(CastError::MissingParameter {
                index,
                available: self.arguments.len(),
            })?;
        Ok(argument.decode()?)
    }
}

/// Encodes a method's return value for the reply envelope.
///
/// # Errors
///
/// Returns [`ServiceError::Encode`] if the value cannot be serialised.
pub fn encode_return<T: Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|source| ServiceError::Encode(Arc::new(source)))
}

/// A service instance resolved from the container.
pub trait ServiceInstance: Send + Sync {
    /// Invokes the matched method. Methods without a return type should
    /// return [`Value::Null`]; the value is discarded.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the method fails.
    fn invoke(&self, call: &MethodCall<'_>) -> Result<Value, ServiceError>;

    /// Receives an envelope directly. Pure-shadow bindings delegate to this
    /// without any method routing.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`ServiceError::NotACallback`].
    fn on_envelope(&self, envelope: &Envelope) -> Result<(), ServiceError> {
        let _ = envelope;
        Err(ServiceError::NotACallback)
    }
}

/// The container's instance lifecycle hooks.
pub trait InstanceContext: Send + Sync {
    /// Resolves an instance of `service`. Shared services return the same
    /// instance on every call; dependent services return a fresh one.
    ///
    /// # Errors
    ///
    /// Returns a [`ContainerError`] if no instance can be supplied.
    fn create_instance(&self, service: &str) -> Result<Arc<dyn ServiceInstance>, ContainerError>;

    /// Destroys a dependent-scoped instance after its call.
    ///
    /// # Errors
    ///
    /// Returns a [`ContainerError`] if teardown fails.
    fn destroy_instance(&self, instance: Arc<dyn ServiceInstance>) -> Result<(), ContainerError>;
}
