//! Reference resolution
//!
//! Works out which reference objects a parameter must be wired to:
//! the owning entity, the coordinate frame (when the body is implicit) and the
//! origin body.
//!
//! Resolution runs in two phases. [`ReferenceResolver::bind_frame`] reads the
//! entity's assigned frame; [`ReferenceResolver::derive_body`] consumes that
//! [`FrameBinding`] and reads the body off the frame's declared origin. The body
//! of an implicit path can only come from a bound frame.

use crate::config::ResolverConfig;
use crate::engine::{text_field, Engine};
use crate::expression::CanonicalPath;
use crate::types::{ReferenceBinding, ResolveError, Result};

/// Output of the first resolution phase
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBinding {
    path: CanonicalPath,
    frame: Option<String>,
}

impl FrameBinding {
    /// Frame inferred from the entity, if the path needed one
    pub fn frame(&self) -> Option<&str> {
        self.frame.as_deref()
    }
}

/// Fully resolved references for a canonical path
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The path as parsed (body stays implicit if it was omitted)
    pub path: CanonicalPath,
    /// Origin body, explicit or inferred
    pub body: String,
    /// Bindings in application order: entity, frame, body
    pub bindings: Vec<ReferenceBinding>,
}

/// Resolves canonical paths against the engine's object directory
pub struct ReferenceResolver<'a> {
    engine: &'a dyn Engine,
    config: &'a ResolverConfig,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(engine: &'a dyn Engine, config: &'a ResolverConfig) -> Self {
        Self { engine, config }
    }

    /// Run both phases
    pub fn resolve(&self, path: &CanonicalPath) -> Result<Resolution> {
        let bound = self.bind_frame(path)?;
        self.derive_body(bound)
    }

    /// Phase one: look up the entity's coordinate frame if the body is implicit
    pub fn bind_frame(&self, path: &CanonicalPath) -> Result<FrameBinding> {
        if path.body.is_some() {
            return Ok(FrameBinding {
                path: path.clone(),
                frame: None,
            });
        }

        if !self.engine.is_defined(&path.entity) {
            return Err(ResolveError::unresolved(
                path,
                format!("coordinate frame: entity '{}' is not defined", path.entity),
            ));
        }

        let frame = text_field(self.engine, &path.entity, &self.config.frame_field)?
            .ok_or_else(|| {
                ResolveError::unresolved(
                    path,
                    format!(
                        "coordinate frame: entity '{}' has no {} assigned",
                        path.entity, self.config.frame_field
                    ),
                )
            })?;

        log::debug!("{}: entity '{}' uses frame '{}'", path, path.entity, frame);

        Ok(FrameBinding {
            path: path.clone(),
            frame: Some(frame),
        })
    }

    /// Phase two: take the body from the path or from the bound frame's origin
    pub fn derive_body(&self, bound: FrameBinding) -> Result<Resolution> {
        let FrameBinding { path, frame } = bound;

        let body = match (&path.body, &frame) {
            (Some(body), _) => body.clone(),
            (None, Some(frame)) => self.frame_origin(&path, frame)?,
            (None, None) => {
                return Err(ResolveError::unresolved(
                    &path,
                    "origin body: no body in the expression and no frame bound",
                ))
            }
        };

        let mut bindings = vec![ReferenceBinding::entity(&path.entity)];
        if let Some(frame) = frame {
            bindings.push(ReferenceBinding::frame(frame));
        }
        bindings.push(ReferenceBinding::body(&body));

        log::debug!("{}: resolved body '{}'", path, body);

        Ok(Resolution {
            path,
            body,
            bindings,
        })
    }

    fn frame_origin(&self, path: &CanonicalPath, frame: &str) -> Result<String> {
        if !self.engine.is_defined(frame) {
            return Err(ResolveError::unresolved(
                path,
                format!("origin body: coordinate frame '{}' is not defined", frame),
            ));
        }

        text_field(self.engine, frame, &self.config.origin_field)?.ok_or_else(|| {
            ResolveError::unresolved(
                path,
                format!(
                    "origin body: coordinate frame '{}' declares no {}",
                    frame, self.config.origin_field
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use crate::types::{FieldValue, ReferenceKind};

    fn engine_with_frame() -> InMemoryEngine {
        let mut engine = InMemoryEngine::new();
        engine.declare("CelestialBody", "Earth", Vec::<(&str, FieldValue)>::new()).unwrap();
        engine
            .declare("CoordinateSystem", "EarthMJ2000Eq", [("Origin", "Earth")])
            .unwrap();
        engine
            .declare("Spacecraft", "Sat", [("CoordinateSystem", "EarthMJ2000Eq")])
            .unwrap();
        engine
    }

    #[test]
    fn test_body_inferred_from_frame() {
        let engine = engine_with_frame();
        let config = ResolverConfig::default();
        let resolver = ReferenceResolver::new(&engine, &config);

        let resolution = resolver
            .resolve(&CanonicalPath::new("Sat", None, "ElapsedSecs"))
            .unwrap();

        assert_eq!(resolution.body, "Earth");
        assert_eq!(resolution.path.body, None);
        assert_eq!(
            resolution.bindings,
            vec![
                ReferenceBinding::entity("Sat"),
                ReferenceBinding::frame("EarthMJ2000Eq"),
                ReferenceBinding::body("Earth"),
            ]
        );
    }

    #[test]
    fn test_explicit_body_skips_engine() {
        let engine = InMemoryEngine::new();
        let config = ResolverConfig::default();
        let resolver = ReferenceResolver::new(&engine, &config);

        let resolution = resolver
            .resolve(&CanonicalPath::new("Sat", Some("Luna".to_string()), "Periapsis"))
            .unwrap();

        assert_eq!(resolution.body, "Luna");
        assert!(resolution
            .bindings
            .iter()
            .all(|b| b.kind != ReferenceKind::CoordinateFrame));
    }

    #[test]
    fn test_frame_phase_exposes_frame() {
        let engine = engine_with_frame();
        let config = ResolverConfig::default();
        let resolver = ReferenceResolver::new(&engine, &config);

        let bound = resolver
            .bind_frame(&CanonicalPath::new("Sat", None, "ElapsedDays"))
            .unwrap();
        assert_eq!(bound.frame(), Some("EarthMJ2000Eq"));
    }

    #[test]
    fn test_undefined_entity() {
        let engine = InMemoryEngine::new();
        let config = ResolverConfig::default();
        let resolver = ReferenceResolver::new(&engine, &config);

        let err = resolver
            .resolve(&CanonicalPath::new("Sat", None, "ElapsedSecs"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedReference { .. }));
        assert!(err.to_string().contains("Sat.ElapsedSecs"));
    }

    #[test]
    fn test_entity_without_frame() {
        let mut engine = InMemoryEngine::new();
        engine.create_object("Spacecraft", "Sat").unwrap();
        let config = ResolverConfig::default();
        let resolver = ReferenceResolver::new(&engine, &config);

        let err = resolver
            .resolve(&CanonicalPath::new("Sat", None, "ElapsedSecs"))
            .unwrap_err();
        assert!(err.to_string().contains("CoordinateSystem"));
    }

    #[test]
    fn test_frame_not_defined_yet() {
        let mut engine = InMemoryEngine::new();
        engine
            .declare("Spacecraft", "Sat", [("CoordinateSystem", "MarsFixed")])
            .unwrap();
        let config = ResolverConfig::default();
        let resolver = ReferenceResolver::new(&engine, &config);

        let err = resolver
            .resolve(&CanonicalPath::new("Sat", None, "ElapsedSecs"))
            .unwrap_err();
        match err {
            ResolveError::UnresolvedReference { path, reference } => {
                assert_eq!(path, "Sat.ElapsedSecs");
                assert!(reference.contains("MarsFixed"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_custom_field_names() {
        let mut engine = InMemoryEngine::new();
        engine.declare("Frame", "F1", [("Center", "Sun")]).unwrap();
        engine.declare("Spacecraft", "Probe", [("Frame", "F1")]).unwrap();
        let config = ResolverConfig::new().with_frame_fields("Frame", "Center");
        let resolver = ReferenceResolver::new(&engine, &config);

        let resolution = resolver
            .resolve(&CanonicalPath::new("Probe", None, "RMAG"))
            .unwrap();
        assert_eq!(resolution.body, "Sun");
    }
}
