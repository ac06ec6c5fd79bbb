//! Simulation engine collaborator
//!
//! The resolver never constructs or propagates anything itself. Everything it
//! needs from the engine goes through the [`Engine`] trait: named object
//! creation, field access, reference wiring and directory lookups. All calls
//! are synchronous and may fail; failures are returned as
//! [`ResolveError::Engine`](crate::types::ResolveError::Engine) and are never retried.

use crate::types::{FieldValue, ObjectRef, ReferenceBinding, ReferenceKind, Result};

pub mod memory;

pub use memory::InMemoryEngine;

/// Minimum surface the resolution pipeline needs from a simulation engine
pub trait Engine {
    /// Create a named object of the given engine type
    fn create_object(&mut self, type_name: &str, name: &str) -> Result<ObjectRef>;

    /// Read a field of a named object
    ///
    /// Returns `Ok(None)` when the object exists but the field is unset.
    fn get_field(&self, object: &str, field: &str) -> Result<Option<FieldValue>>;

    /// Write a field of a named object
    fn set_field(&mut self, object: &str, field: &str, value: FieldValue) -> Result<()>;

    /// Attach a named reference object to a named object
    fn set_reference(&mut self, object: &str, kind: ReferenceKind, name: &str) -> Result<()>;

    /// References currently attached to a named object, in attachment order
    fn get_references(&self, object: &str) -> Result<Vec<ReferenceBinding>>;

    /// Look up an object in the directory
    fn get_object(&self, name: &str) -> Option<ObjectRef>;

    /// Check whether an object is defined in the directory
    fn is_defined(&self, name: &str) -> bool {
        self.get_object(name).is_some()
    }
}

/// Read a field that names another object (frame, body, ...)
///
/// Unset fields and non-text values both come back as `None`.
pub(crate) fn text_field(engine: &dyn Engine, object: &str, field: &str) -> Result<Option<String>> {
    Ok(engine
        .get_field(object, field)?
        .and_then(|value| value.as_text().map(str::to_string))
        .filter(|name| !name.is_empty()))
}
