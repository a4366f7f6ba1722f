//! Shadow-service dispatch generation for envelope-style message buses.
//!
//! A service implementation realises one or more contracts. Contracts marked
//! remote are normally served by a genuine remote endpoint on a channel named
//! after the contract. `courier-core` generates the local ("shadow") handler
//! that can back the same channel, and decides which channels a decorated
//! service registers on.
//!
//! # Architecture
//!
//! Generation runs once per service:
//!
//! - [`signature`] derives a [`CallSignature`] per method from the contract
//!   name, method name, and erased parameter types.
//! - [`dispatch`] assembles a [`DispatchTable`] of rules, each casting
//!   positional envelope parameters to their declared types through
//!   [`cast::Cast`] expressions.
//! - [`shadow`] computes a [`RegistrationPlan`] and installs the handlers on
//!   a [`MessageBus`].
//!
//! At runtime a [`MethodDispatcher`] matches each [`Envelope`] against its
//! table, invokes the resolved instance, and publishes a
//! [`ReplyEnvelope`] when the method returns a value. The bus and the
//! instance container are collaborators behind the [`bus`] and [`container`]
//! traits. A [`Manifest`] records contracts and decorated services as data.
//!
//! # Example
//!
//! ```
//! use courier_core::{InstanceScope, ServiceDeclaration, ShadowRegistrationPolicy};
//! use courier_core::contract::{MethodDescriptor, ServiceContract, TypeRef};
//!
//! let contract = ServiceContract::builder("OnlineService")
//!     .remote(true)
//!     .method(
//!         MethodDescriptor::new("greet")
//!             .with_parameter(TypeRef::text())
//!             .returning(TypeRef::text()),
//!     )
//!     .build()
//!     .expect("valid contract");
//! let declaration = ServiceDeclaration::new("OfflineServiceImpl", InstanceScope::Shared)
//!     .implementing(contract);
//!
//! let plan = ShadowRegistrationPolicy::new()
//!     .plan(&declaration)
//!     .expect("no collisions");
//! assert_eq!(plan.labels().collect::<Vec<_>>(), ["OnlineService:RPC"]);
//! ```

pub mod bus;
pub mod cast;
pub mod container;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod manifest;
pub mod protocol;
pub mod shadow;
pub mod signature;

#[cfg(test)]
mod tests;

pub use self::bus::{EnvelopeHandler, MessageBus, ReplySink};
pub use self::container::{InstanceContext, InstanceScope, MethodCall, ServiceInstance};
pub use self::dispatch::{DispatchBuilder, DispatchRule, DispatchTable, MethodDispatcher};
pub use self::error::{
    CastError, ContainerError, DispatchError, DispatchFailure, EnvelopeError, GenerationError,
    ManifestError, ServiceError,
};
pub use self::manifest::Manifest;
pub use self::protocol::{ConversationId, Envelope, ReplyEnvelope};
pub use self::shadow::{
    BindingKind, RegistrationPlan, ServiceDeclaration, ShadowBinding, ShadowRegistrationPolicy,
};
pub use self::signature::CallSignature;
