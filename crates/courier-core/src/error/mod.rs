//! Domain errors raised while generating and running shadow dispatchers.
//!
//! Errors fall into two families. Generation errors are detected while the
//! build step derives signatures and registration plans; they are fatal to the
//! build. Runtime errors surface while a generated handler processes an
//! envelope; every runtime failure crosses the handler boundary as a single
//! [`DispatchError`] wrapping the original cause. Foreign error types are
//! wrapped in `Arc` so the enums stay cheap to clone and small enough for the
//! `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::signature::CallSignature;

/// Errors detected during the generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Two methods on one service produce the same call signature.
    #[error("signature collision in service '{service}': '{signature}' is declared more than once")]
    SignatureCollision {
        /// Implementation whose dispatch table was being built.
        service: String,
        /// The colliding signature.
        signature: CallSignature,
    },

    /// A service declares a contract that the manifest does not define.
    #[error("service '{service}' implements unknown contract '{contract}'")]
    UnknownContract {
        /// Declaring service.
        service: String,
        /// Contract name that failed to resolve.
        contract: String,
    },

    /// A contract extends a contract that the manifest does not define.
    #[error("contract '{contract}' extends unknown contract '{parent}'")]
    UnknownParent {
        /// Extending contract.
        contract: String,
        /// Parent name that failed to resolve.
        parent: String,
    },

    /// A contract reaches itself through its inheritance chain.
    #[error("contract '{contract}' inherits from itself")]
    InheritanceCycle {
        /// Contract at which the cycle was detected.
        contract: String,
    },

    /// The same contract name is defined twice.
    #[error("contract '{name}' is declared more than once")]
    DuplicateContract {
        /// Duplicated contract name.
        name: String,
    },

    /// The same service name is defined twice.
    #[error("service '{name}' is declared more than once")]
    DuplicateService {
        /// Duplicated service name.
        name: String,
    },

    /// A contract, method, or service was declared with a blank name.
    #[error("{kind} name must not be empty")]
    EmptyName {
        /// What kind of declaration carried the blank name.
        kind: &'static str,
    },
}

/// Failures raised while asserting an envelope value against a static type.
#[derive(Debug, Clone, Error)]
pub enum CastError {
    /// The envelope carries fewer parameters than the rule reads.
    #[error("parameter {index} is missing: envelope carries {available} value(s)")]
    MissingParameter {
        /// Position the rule tried to read.
        index: usize,
        /// Number of values the envelope carried.
        available: usize,
    },

    /// The runtime value is not assignable to the declared type.
    #[error("cannot cast {found} value to '{expected}'")]
    TypeMismatch {
        /// Declared target type.
        expected: String,
        /// Kind of value found on the wire.
        found: &'static str,
    },

    /// The value passed the cast but could not be decoded into a Rust type.
    #[error("failed to decode value as '{target}': {source}")]
    Decode {
        /// Rust type requested by the service.
        target: String,
        /// Underlying marshalling error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

/// Failures raised by a service implementation while handling a call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The instance has no implementation for the requested method.
    #[error("service does not implement method '{method}'")]
    UnknownMethod {
        /// Requested method name.
        method: String,
    },

    /// The instance cannot receive envelopes directly.
    #[error("service instance does not accept envelopes directly")]
    NotACallback,

    /// An argument could not be read as the requested type.
    #[error(transparent)]
    Argument(#[from] CastError),

    /// A return value could not be encoded for the wire.
    #[error("failed to encode return value: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// The method body reported a failure.
    #[error("{message}")]
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl ServiceError {
    /// Creates a failure raised by a method body.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Creates an unknown method error.
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }
}

/// Failures reported by the instance container collaborator.
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    /// The container could not supply an instance.
    #[error("no instance available for service '{service}': {message}")]
    Unavailable {
        /// Service that was requested.
        service: String,
        /// Human-readable failure description.
        message: String,
    },

    /// Destroying a dependent-scoped instance failed.
    #[error("failed to destroy instance of service '{service}': {message}")]
    Destroy {
        /// Service whose instance was being destroyed.
        service: String,
        /// Human-readable failure description.
        message: String,
    },
}

/// Cause carried by a [`DispatchError`].
#[derive(Debug, Error)]
pub enum DispatchFailure {
    /// Parameter adaptation failed.
    #[error(transparent)]
    Cast(#[from] CastError),

    /// Instance resolution or teardown failed.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The invoked method failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// The single runtime error a generated handler raises.
///
/// The handler never turns a failure into a reply envelope; it wraps the cause
/// and hands it to whatever error surface the bus provides.
#[derive(Debug, Error)]
#[error("dispatch of '{command}' failed: {cause}")]
pub struct DispatchError {
    command: String,
    #[source]
    cause: DispatchFailure,
}

impl DispatchError {
    /// Wraps a failure raised while handling the given command.
    pub fn new(command: impl Into<String>, cause: impl Into<DispatchFailure>) -> Self {
        Self {
            command: command.into(),
            cause: cause.into(),
        }
    }

    /// Returns the command label or channel that was being handled.
    #[must_use]
    pub fn command(&self) -> &str {
        self.command.as_str()
    }

    /// Returns the wrapped cause.
    #[must_use]
    pub const fn cause(&self) -> &DispatchFailure {
        &self.cause
    }
}

/// Failures raised while parsing an envelope line.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The line was empty or contained only whitespace.
    #[error("empty envelope line")]
    Empty,

    /// The line is not a valid envelope.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Failures raised while loading a service manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest '{path}': {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The manifest is not valid JSON or does not match the schema.
    #[error("malformed manifest: {message}")]
    Malformed {
        /// Human-readable description of the parse failure.
        message: String,
        /// Optional underlying JSON error.
        #[source]
        source: Option<Arc<serde_json::Error>>,
    },

    /// The manifest parsed but describes an invalid service set.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl ManifestError {
    /// Creates a malformed manifest error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a malformed manifest error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }
}
