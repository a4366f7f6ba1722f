//! Seams to the message bus collaborator.
//!
//! Delivery, connection lifecycle, and remote-versus-shadow arbitration all
//! belong to the bus. This crate only needs to register handlers under channel
//! labels and to publish replies.

use std::sync::Arc;

use crate::error::DispatchError;
use crate::protocol::{Envelope, ReplyEnvelope};

/// Callback the bus invokes for every envelope delivered on a channel.
///
/// Implementations hold no per-envelope state, so the bus may invoke a
/// registered handler any number of times and from any thread.
pub trait EnvelopeHandler: Send + Sync {
    /// Handles one envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] wrapping whatever failed while handling
    /// the envelope. The bus decides how the failure is reported.
    fn handle(&self, envelope: &Envelope) -> Result<(), DispatchError>;
}

impl<T> EnvelopeHandler for Arc<T>
where
    T: EnvelopeHandler + ?Sized,
{
    fn handle(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        (**self).handle(envelope)
    }
}

/// Outbound half of the bus used for replies.
pub trait ReplySink: Send + Sync {
    /// Publishes a reply. Delivery failures are the bus's concern and are
    /// not reported back.
    fn publish(&self, reply: ReplyEnvelope);
}

/// Registration half of the bus.
pub trait MessageBus: ReplySink {
    /// Installs `handler` under the channel `label`.
    fn register(&self, label: &str, handler: Arc<dyn EnvelopeHandler>);
}
