//! The service manifest: the build step's declarative record of contracts
//! and decorated services.
//!
//! ```json
//! {
//!   "contracts": [
//!     {
//!       "name": "OnlineService",
//!       "remote": true,
//!       "extends": ["Lifecycle"],
//!       "methods": [{ "name": "greet", "parameters": ["String"], "returns": "String" }]
//!     },
//!     { "name": "Lifecycle", "methods": [{ "name": "dispose" }] }
//!   ],
//!   "services": [
//!     {
//!       "name": "OfflineServiceImpl",
//!       "implements": ["OnlineService"],
//!       "shadow": {},
//!       "scope": "dependent"
//!     }
//!   ]
//! }
//! ```
//!
//! Resolution flattens contract inheritance. A contract's method set is its
//! own methods followed by each parent's methods, in `extends` order, skipping
//! any method the set already declares with the same name and erased
//! parameter types. Only services carrying a `shadow` marking become
//! [`ServiceDeclaration`]s.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::container::InstanceScope;
use crate::contract::{MethodDescriptor, ServiceContract, TypeRef};
use crate::error::{GenerationError, ManifestError};
use crate::shadow::ServiceDeclaration;

/// A parsed, unresolved manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    contracts: Vec<ContractEntry>,
    #[serde(default)]
    services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContractEntry {
    name: String,
    #[serde(default)]
    remote: bool,
    #[serde(default)]
    extends: Vec<String>,
    #[serde(default)]
    methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodEntry {
    name: String,
    #[serde(default)]
    parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    returns: Option<String>,
}

impl MethodEntry {
    fn descriptor(&self) -> MethodDescriptor {
        let method = self
            .parameters
            .iter()
            .fold(MethodDescriptor::new(self.name.as_str()), |method, ty| {
                method.with_parameter(TypeRef::parse(ty))
            });
        match &self.returns {
            Some(returns) => method.returning(TypeRef::parse(returns)),
            None => method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceEntry {
    name: String,
    #[serde(default)]
    implements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shadow: Option<ShadowEntry>,
    #[serde(default)]
    scope: InstanceScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShadowEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Manifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] if the text is not a valid
    /// manifest document.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(text).map_err(ManifestError::from_json_error)
    }

    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] if the file cannot be read, or
    /// [`ManifestError::Malformed`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::from_json(&text)
    }

    /// Resolves every contract, flattening inheritance, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] for duplicate or blank names, unknown
    /// parents, and inheritance cycles.
    pub fn resolve_contracts(&self) -> Result<Vec<ServiceContract>, GenerationError> {
        let mut index = HashMap::with_capacity(self.contracts.len());
        for entry in &self.contracts {
            if index.insert(entry.name.as_str(), entry).is_some() {
                return Err(GenerationError::DuplicateContract {
                    name: entry.name.clone(),
                });
            }
        }

        let mut resolver = Resolver {
            index,
            resolved: HashMap::new(),
            visiting: Vec::new(),
        };
        self.contracts
            .iter()
            .map(|entry| resolver.resolve(entry))
            .collect()
    }

    /// Resolves the decorated services into registration metadata.
    ///
    /// Services without a `shadow` marking are validated but not returned.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::resolve_contracts`], plus
    /// [`GenerationError::UnknownContract`] and
    /// [`GenerationError::DuplicateService`].
    pub fn resolve(&self) -> Result<Vec<ServiceDeclaration>, GenerationError> {
        let contracts: HashMap<String, ServiceContract> = self
            .resolve_contracts()?
            .into_iter()
            .map(|contract| (contract.name().to_owned(), contract))
            .collect();

        let mut seen = HashSet::with_capacity(self.services.len());
        let mut declarations = Vec::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(GenerationError::EmptyName { kind: "service" });
            }
            if !seen.insert(service.name.as_str()) {
                return Err(GenerationError::DuplicateService {
                    name: service.name.clone(),
                });
            }

            let mut declaration = ServiceDeclaration::new(service.name.as_str(), service.scope);
            for name in &service.implements {
                let contract =
                    contracts
                        .get(name)
                        .ok_or_else(|| GenerationError::UnknownContract {
                            service: service.name.clone(),
                            contract: name.clone(),
                        })?;
                declaration = declaration.implementing(contract.clone());
            }

            let Some(shadow) = &service.shadow else {
                continue;
            };
            if let Some(name) = &shadow.name {
                declaration = declaration.with_shadow_name(name.as_str());
            }
            declarations.push(declaration);
        }
        Ok(declarations)
    }
}

struct Resolver<'a> {
    index: HashMap<&'a str, &'a ContractEntry>,
    resolved: HashMap<&'a str, ServiceContract>,
    visiting: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn resolve(&mut self, entry: &'a ContractEntry) -> Result<ServiceContract, GenerationError> {
        if let Some(contract) = self.resolved.get(entry.name.as_str()) {
            return Ok(contract.clone());
        }
        if self.visiting.contains(&entry.name.as_str()) {
            return Err(GenerationError::InheritanceCycle {
                contract: entry.name.clone(),
            });
        }
        self.visiting.push(entry.name.as_str());

        let mut methods: Vec<MethodDescriptor> =
            entry.methods.iter().map(MethodEntry::descriptor).collect();
        for parent_name in &entry.extends {
            let parent_entry = self.index.get(parent_name.as_str()).copied().ok_or_else(|| {
                GenerationError::UnknownParent {
                    contract: entry.name.clone(),
                    parent: parent_name.clone(),
                }
            })?;
            let parent = self.resolve(parent_entry)?;
            for inherited in parent.methods() {
                if !methods.iter().any(|method| method.overrides(inherited)) {
                    methods.push(inherited.clone());
                }
            }
        }

        self.visiting.pop();
        let contract = ServiceContract::builder(entry.name.as_str())
            .remote(entry.remote)
            .methods(methods)
            .build()?;
        self.resolved.insert(entry.name.as_str(), contract.clone());
        Ok(contract)
    }
}
