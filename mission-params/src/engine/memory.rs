//! In-process engine object directory
//!
//! Stores objects by name with their type, fields and attached references.
//! Used by the CLI to resolve mission files without a real propagator, and by
//! tests as a spy: every successful `create_object` call is counted.

use super::Engine;
use crate::types::{FieldValue, ObjectRef, ReferenceBinding, ReferenceKind, ResolveError, Result};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct StoredObject {
    object: ObjectRef,
    fields: BTreeMap<String, FieldValue>,
    references: Vec<ReferenceBinding>,
}

/// Engine implementation backed by a hash map
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    objects: HashMap<String, StoredObject>,
    /// Creation order, used for listings
    order: Vec<String>,
    next_id: u64,
}

impl InMemoryEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object and set its fields in one call
    pub fn declare<I, K, V>(&mut self, type_name: &str, name: &str, fields: I) -> Result<ObjectRef>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let object = self.create_object(type_name, name)?;
        for (field, value) in fields {
            self.set_field(name, field.as_ref(), value.into())?;
        }
        Ok(object)
    }

    /// Total number of objects created so far
    pub fn creation_count(&self) -> usize {
        self.order.len()
    }

    /// Number of objects created with the given type name
    pub fn count_of_type(&self, type_name: &str) -> usize {
        self.objects
            .values()
            .filter(|o| o.object.type_name == type_name)
            .count()
    }

    /// References attached to an object, in the order they were set
    pub fn references(&self, name: &str) -> Option<&[ReferenceBinding]> {
        self.objects.get(name).map(|o| o.references.as_slice())
    }

    /// All objects in creation order
    pub fn objects(&self) -> Vec<&ObjectRef> {
        self.order
            .iter()
            .filter_map(|name| self.objects.get(name))
            .map(|o| &o.object)
            .collect()
    }

    fn stored(&self, name: &str) -> Result<&StoredObject> {
        self.objects
            .get(name)
            .ok_or_else(|| ResolveError::Engine(format!("Object '{}' is not defined", name)))
    }

    fn stored_mut(&mut self, name: &str) -> Result<&mut StoredObject> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| ResolveError::Engine(format!("Object '{}' is not defined", name)))
    }
}

impl Engine for InMemoryEngine {
    fn create_object(&mut self, type_name: &str, name: &str) -> Result<ObjectRef> {
        if self.objects.contains_key(name) {
            return Err(ResolveError::Engine(format!(
                "An object named '{}' already exists",
                name
            )));
        }

        self.next_id += 1;
        let object = ObjectRef {
            id: self.next_id,
            name: name.to_string(),
            type_name: type_name.to_string(),
        };
        log::trace!("Created {} '{}' (id {})", type_name, name, object.id);

        self.objects.insert(
            name.to_string(),
            StoredObject {
                object: object.clone(),
                fields: BTreeMap::new(),
                references: Vec::new(),
            },
        );
        self.order.push(name.to_string());
        Ok(object)
    }

    fn get_field(&self, object: &str, field: &str) -> Result<Option<FieldValue>> {
        Ok(self.stored(object)?.fields.get(field).cloned())
    }

    fn set_field(&mut self, object: &str, field: &str, value: FieldValue) -> Result<()> {
        log::trace!("{}.{} = {}", object, field, value);
        self.stored_mut(object)?.fields.insert(field.to_string(), value);
        Ok(())
    }

    fn set_reference(&mut self, object: &str, kind: ReferenceKind, name: &str) -> Result<()> {
        let stored = self.stored_mut(object)?;
        // Re-setting a kind replaces the previous reference of that kind
        stored.references.retain(|r| r.kind != kind);
        stored.references.push(ReferenceBinding::new(kind, name));
        Ok(())
    }

    fn get_references(&self, object: &str) -> Result<Vec<ReferenceBinding>> {
        Ok(self.stored(object)?.references.clone())
    }

    fn get_object(&self, name: &str) -> Option<ObjectRef> {
        self.objects.get(name).map(|o| o.object.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_read_fields() {
        let mut engine = InMemoryEngine::new();
        engine
            .declare("CoordinateSystem", "EarthMJ2000Eq", [("Origin", "Earth")])
            .unwrap();

        assert!(engine.is_defined("EarthMJ2000Eq"));
        assert_eq!(
            engine.get_field("EarthMJ2000Eq", "Origin").unwrap(),
            Some(FieldValue::from("Earth"))
        );
        assert_eq!(engine.get_field("EarthMJ2000Eq", "Axes").unwrap(), None);
        assert_eq!(engine.creation_count(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut engine = InMemoryEngine::new();
        engine.create_object("Spacecraft", "Sat").unwrap();
        assert!(engine.create_object("Spacecraft", "Sat").is_err());
        assert_eq!(engine.creation_count(), 1);
    }

    #[test]
    fn test_unknown_object_is_an_error() {
        let mut engine = InMemoryEngine::new();
        assert!(engine.get_field("Ghost", "Origin").is_err());
        assert!(engine.set_field("Ghost", "Origin", "Earth".into()).is_err());
        assert!(engine
            .set_reference("Ghost", ReferenceKind::Entity, "Sat")
            .is_err());
    }

    #[test]
    fn test_reference_of_same_kind_is_replaced() {
        let mut engine = InMemoryEngine::new();
        engine.create_object("Periapsis", "Sat.Earth.Periapsis").unwrap();
        engine
            .set_reference("Sat.Earth.Periapsis", ReferenceKind::OriginBody, "Luna")
            .unwrap();
        engine
            .set_reference("Sat.Earth.Periapsis", ReferenceKind::OriginBody, "Earth")
            .unwrap();

        let refs = engine.references("Sat.Earth.Periapsis").unwrap();
        assert_eq!(refs, &[ReferenceBinding::body("Earth")]);
        assert_eq!(
            engine.get_references("Sat.Earth.Periapsis").unwrap(),
            vec![ReferenceBinding::body("Earth")]
        );
        assert!(engine.get_references("Ghost").is_err());
    }

    #[test]
    fn test_object_ids_are_unique() {
        let mut engine = InMemoryEngine::new();
        let a = engine.create_object("Spacecraft", "A").unwrap();
        let b = engine.create_object("Spacecraft", "B").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(engine.count_of_type("Spacecraft"), 2);
        assert_eq!(engine.objects().len(), 2);
    }
}
