//! Parameter registry
//!
//! Session-scoped, idempotent store of parameter handles keyed by canonical
//! name. The first request for a name creates the engine object and wires its
//! references; later requests return the same handle untouched.

use crate::engine::Engine;
use crate::types::{
    ObjectRef, ParameterKind, ReferenceBinding, ReferenceKind, ResolveError, Result, ValueKind,
};
use serde::Serialize;
use std::collections::HashMap;

/// A registered parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterHandle {
    /// Dotted name, also the engine object name
    pub canonical_name: String,
    /// Role the parameter was first registered for
    pub kind: ParameterKind,
    /// Entity that owns the parameter
    pub owner_entity: String,
    /// Value type, fixed at registration
    pub value_kind: ValueKind,
    /// References attached to the parameter, in application order
    pub bound_references: Vec<ReferenceBinding>,
    /// Backing engine object
    pub object: ObjectRef,
}

impl ParameterHandle {
    /// Engine type name of the parameter (last path segment)
    pub fn parameter_type(&self) -> &str {
        &self.object.type_name
    }

    /// Name of the bound reference of the given kind, if any
    pub fn reference(&self, kind: ReferenceKind) -> Option<&str> {
        self.bound_references
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.name.as_str())
    }
}

/// The parameter registry
#[derive(Debug, Default)]
pub struct ParameterRegistry {
    /// Key: canonical name
    parameters: HashMap<String, ParameterHandle>,
    created: usize,
    adopted: usize,
    reused: usize,
}

impl ParameterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the parameter named `canonical_name`, creating it if needed
    ///
    /// # Arguments
    /// * `engine` - Engine the parameter lives in
    /// * `canonical_name` - Dotted name; the last segment is the parameter type
    /// * `kind` - Role the caller needs the parameter for
    /// * `bindings` - References to attach if the parameter is created here
    ///
    /// # Returns
    /// * The registered handle if the name is already known
    /// * A handle adopting the engine's object if the engine already has one
    /// * A freshly created and wired handle otherwise
    ///
    /// # Errors
    /// * `DependencyNotReady` if a bound reference is not defined in the engine
    pub fn get_or_create(
        &mut self,
        engine: &mut dyn Engine,
        canonical_name: &str,
        kind: ParameterKind,
        bindings: &[ReferenceBinding],
    ) -> Result<ParameterHandle> {
        if let Some(existing) = self.parameters.get(canonical_name) {
            log::debug!("Reusing registered parameter '{}'", canonical_name);
            self.reused += 1;
            return Ok(existing.clone());
        }

        let parameter_type = canonical_name
            .rsplit('.')
            .next()
            .unwrap_or(canonical_name);
        let owner_entity = bindings
            .iter()
            .find(|b| b.kind == ReferenceKind::Entity)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| {
                canonical_name
                    .split('.')
                    .next()
                    .unwrap_or(canonical_name)
                    .to_string()
            });

        let (object, bound_references) = match engine.get_object(canonical_name) {
            Some(object) => {
                // Report the engine's own wiring; adopted objects are not re-bound
                let references = engine.get_references(canonical_name)?;
                log::info!(
                    "Adopting existing engine parameter '{}' ({} references)",
                    canonical_name,
                    references.len()
                );
                self.adopted += 1;
                (object, references)
            }
            None => {
                let object = Self::create(engine, canonical_name, parameter_type, bindings)?;
                log::info!(
                    "Registered {} parameter '{}' ({} references)",
                    kind,
                    canonical_name,
                    bindings.len()
                );
                self.created += 1;
                (object, bindings.to_vec())
            }
        };

        let handle = ParameterHandle {
            canonical_name: canonical_name.to_string(),
            kind,
            owner_entity,
            value_kind: ValueKind::for_parameter(parameter_type),
            bound_references,
            object,
        };
        self.parameters
            .insert(canonical_name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Check that `get_or_create` would succeed without touching the engine
    ///
    /// Registered names and names the engine already holds are always ready.
    /// Otherwise every bound reference must be defined.
    ///
    /// # Errors
    /// * `DependencyNotReady` naming the first undefined reference
    pub fn check_ready(
        &self,
        engine: &dyn Engine,
        canonical_name: &str,
        bindings: &[ReferenceBinding],
    ) -> Result<()> {
        if self.parameters.contains_key(canonical_name) || engine.is_defined(canonical_name) {
            return Ok(());
        }
        Self::check_bindings(engine, canonical_name, bindings)
    }

    fn check_bindings(
        engine: &dyn Engine,
        canonical_name: &str,
        bindings: &[ReferenceBinding],
    ) -> Result<()> {
        match bindings.iter().find(|b| !engine.is_defined(&b.name)) {
            Some(missing) => Err(ResolveError::DependencyNotReady {
                parameter: canonical_name.to_string(),
                dependency: missing.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Create the engine object and attach every binding in order
    fn create(
        engine: &mut dyn Engine,
        canonical_name: &str,
        parameter_type: &str,
        bindings: &[ReferenceBinding],
    ) -> Result<ObjectRef> {
        Self::check_bindings(&*engine, canonical_name, bindings)?;

        let object = engine.create_object(parameter_type, canonical_name)?;
        for binding in bindings {
            engine.set_reference(canonical_name, binding.kind, &binding.name)?;
        }
        Ok(object)
    }

    /// Look up a registered parameter
    pub fn get(&self, canonical_name: &str) -> Option<&ParameterHandle> {
        self.parameters.get(canonical_name)
    }

    /// Check whether a parameter is registered
    pub fn contains(&self, canonical_name: &str) -> bool {
        self.parameters.contains_key(canonical_name)
    }

    /// All registered canonical names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parameters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Forget every handle (session cleared)
    pub fn clear(&mut self) {
        self.parameters.clear();
        self.created = 0;
        self.adopted = 0;
        self.reused = 0;
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            num_parameters: self.parameters.len(),
            num_created: self.created,
            num_adopted: self.adopted,
            num_reused: self.reused,
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Parameters currently registered
    pub num_parameters: usize,
    /// Parameters created in the engine by this registry
    pub num_created: usize,
    /// Pre-existing engine parameters wrapped by this registry
    pub num_adopted: usize,
    /// Lookups answered from the registry
    pub num_reused: usize,
}
