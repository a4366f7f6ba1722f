//! Call-signature derivation.
//!
//! A [`CallSignature`] is the textual key that ties an incoming envelope's
//! command label to one method of one contract. It is a pure function of the
//! declaring contract's name, the method name, and the erased parameter
//! types, rendered as `Contract|method(P1,P2)`. Return types and declaration
//! positions never take part, so reordering a contract's methods or changing
//! a return type leaves every label stable.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::contract::{MethodDescriptor, ServiceContract};
use crate::error::GenerationError;

/// Stable key identifying one (contract, method, parameter types) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CallSignature(String);

impl CallSignature {
    /// Derives the signature of `method` as declared on `contract`.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_core::contract::{MethodDescriptor, TypeRef};
    /// use courier_core::signature::CallSignature;
    ///
    /// let greet = MethodDescriptor::new("greet")
    ///     .with_parameter(TypeRef::text())
    ///     .returning(TypeRef::text());
    /// let signature = CallSignature::derive("OnlineService", &greet);
    /// assert_eq!(signature.as_str(), "OnlineService|greet(String)");
    /// ```
    #[must_use]
    pub fn derive(contract: &str, method: &MethodDescriptor) -> Self {
        let mut text = String::with_capacity(contract.len() + method.name().len() + 16);
        text.push_str(contract);
        text.push('|');
        text.push_str(method.name());
        text.push('(');
        for (position, parameter) in method.parameters().iter().enumerate() {
            if position > 0 {
                text.push(',');
            }
            text.push_str(parameter.erased_name());
        }
        text.push(')');
        Self(text)
    }

    /// Returns the signature text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether an envelope's command label selects this signature.
    #[must_use]
    pub fn matches(&self, command_label: &str) -> bool {
        self.0 == command_label
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CallSignature {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for CallSignature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CallSignature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Derives the signatures of every method on `contract`, in declaration
/// order.
///
/// A contract with no methods yields an empty set.
///
/// # Errors
///
/// Returns [`GenerationError::SignatureCollision`] if two methods share a
/// name and erased parameter list.
pub fn signature_set(
    contract: &ServiceContract,
) -> Result<Vec<(CallSignature, &MethodDescriptor)>, GenerationError> {
    let mut seen = HashSet::with_capacity(contract.methods().len());
    contract
        .methods()
        .iter()
        .map(|method| {
            let signature = CallSignature::derive(contract.name(), method);
            if seen.insert(signature.clone()) {
                Ok((signature, method))
            } else {
                Err(GenerationError::SignatureCollision {
                    service: contract.name().to_owned(),
                    signature,
                })
            }
        })
        .collect()
}
