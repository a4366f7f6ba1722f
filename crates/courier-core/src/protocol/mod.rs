//! Envelope types exchanged with the message bus.
//!
//! The byte-level encoding belongs to the bus's marshalling layer. These types
//! fix the logical shape only, using the camel-cased wire names the bus
//! expects:
//!
//! ```json
//! {"commandLabel":"OnlineService|greet(String)","parameters":["Ada"],"replyTo":"conv-1"}
//! {"topic":"MethodReply","conversationId":"conv-1","value":"Hello, Ada"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvelopeError;

/// Topic carried by every reply a generated handler publishes.
pub const METHOD_REPLY_TOPIC: &str = "MethodReply";

/// Suffix appended to a remote contract's name to form its channel label.
pub const REMOTE_CHANNEL_SUFFIX: &str = ":RPC";

/// Identity of the conversation a request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wraps a conversation identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of routed work delivered by the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    command_label: String,
    #[serde(default)]
    parameters: Vec<Value>,
    reply_to: ConversationId,
}

impl Envelope {
    /// Creates an envelope.
    pub fn new(
        command_label: impl Into<String>,
        parameters: Vec<Value>,
        reply_to: ConversationId,
    ) -> Self {
        Self {
            command_label: command_label.into(),
            parameters,
            reply_to,
        }
    }

    /// Parses a single JSONL line into an envelope.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed
    /// before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Empty`] for a blank line and
    /// [`EnvelopeError::Malformed`] if the line is not a valid envelope.
    pub fn parse(line: &[u8]) -> Result<Self, EnvelopeError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(EnvelopeError::Empty);
        }
        serde_json::from_slice(trimmed).map_err(EnvelopeError::Malformed)
    }

    /// Returns the command label matched against call signatures.
    #[must_use]
    pub fn command_label(&self) -> &str {
        self.command_label.as_str()
    }

    /// Returns the ordered parameter values.
    #[must_use]
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Returns the conversation a reply must be addressed to.
    #[must_use]
    pub const fn reply_to(&self) -> &ConversationId {
        &self.reply_to
    }
}

/// A response correlated to the request's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEnvelope {
    topic: String,
    conversation_id: ConversationId,
    value: Value,
}

impl ReplyEnvelope {
    /// Builds a method reply addressed back to `request`'s conversation.
    #[must_use]
    pub fn method_reply(request: &Envelope, value: Value) -> Self {
        Self {
            topic: METHOD_REPLY_TOPIC.to_owned(),
            conversation_id: request.reply_to().clone(),
            value,
        }
    }

    /// Returns the reply topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    /// Returns the conversation the reply is addressed to.
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns the reply value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}
