//! Command builders
//!
//! Stop conditions and targeting goals all run the same pipeline:
//! parse → resolve references → register the parameter. [`ResolveContext`]
//! carries the engine, the registry and the configuration through that
//! pipeline so that no builder reaches for shared global state.

use crate::config::ResolverConfig;
use crate::engine::Engine;
use crate::expression::{self, Expression, ParsedExpression};
use crate::registry::{ParameterHandle, ParameterRegistry};
use crate::resolver::{ReferenceResolver, Resolution};
use crate::types::{FieldValue, ObjectRef, ParameterKind, Result};

pub mod goal;
pub mod stop;

pub use goal::{AchieveBuilder, Goal, GoalBuilder, GoalSpec, PreparedGoal, VaryBuilder};
pub use stop::{PreparedStop, StopCondition, StopConditionBuilder};

/// Everything a builder needs from the session
pub struct ResolveContext<'a> {
    pub engine: &'a mut dyn Engine,
    pub registry: &'a mut ParameterRegistry,
    pub config: &'a ResolverConfig,
}

/// An expression taken through parsing and reference resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExpression {
    pub parsed: ParsedExpression,
    pub resolution: Resolution,
}

impl ResolvedExpression {
    pub fn canonical_name(&self) -> String {
        self.parsed.path.canonical_name()
    }
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        engine: &'a mut dyn Engine,
        registry: &'a mut ParameterRegistry,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            engine,
            registry,
            config,
        }
    }

    /// Parse and resolve an expression without touching the registry
    pub fn resolve(&self, entity: &str, expression: &Expression) -> Result<ResolvedExpression> {
        let parsed = expression::parse(expression, entity)?;
        let resolution = ReferenceResolver::new(&*self.engine, self.config).resolve(&parsed.path)?;
        Ok(ResolvedExpression { parsed, resolution })
    }

    /// Register (or reuse) the parameter behind a resolved expression
    pub fn register(&mut self, resolved: &ResolvedExpression, kind: ParameterKind) -> Result<ParameterHandle> {
        self.registry.get_or_create(
            &mut *self.engine,
            &resolved.canonical_name(),
            kind,
            &resolved.resolution.bindings,
        )
    }

    /// Full pipeline: parse, resolve, register
    pub fn parameter(
        &mut self,
        entity: &str,
        expression: &Expression,
        kind: ParameterKind,
    ) -> Result<ParameterHandle> {
        let resolved = self.resolve(entity, expression)?;
        self.register(&resolved, kind)
    }

    /// Parse and resolve an expression, and check its parameter could be
    /// registered, without creating anything
    pub fn check(&self, entity: &str, expression: &Expression) -> Result<ResolvedExpression> {
        let resolved = self.resolve(entity, expression)?;
        self.registry.check_ready(
            &*self.engine,
            &resolved.canonical_name(),
            &resolved.resolution.bindings,
        )?;
        Ok(resolved)
    }

    /// Find or create the command object carrying exactly `fields`
    ///
    /// `base_name` is tried first. An existing object is reused only if it has
    /// the same type and every field matches (`None` meaning unset); otherwise
    /// it belongs to another command and the next `<base_name>_<n>` is tried.
    /// Objects found in the engine are never written to.
    pub(crate) fn command_object(
        &mut self,
        type_name: &str,
        base_name: &str,
        fields: &[(&str, Option<FieldValue>)],
    ) -> Result<ObjectRef> {
        let mut index = 1;
        loop {
            let name = match index {
                1 => base_name.to_string(),
                n => format!("{}_{}", base_name, n),
            };
            match self.engine.get_object(&name) {
                None => {
                    let object = self.engine.create_object(type_name, &name)?;
                    for (field, value) in fields {
                        if let Some(value) = value {
                            self.engine.set_field(&name, field, value.clone())?;
                        }
                    }
                    return Ok(object);
                }
                Some(object) => {
                    if object.type_name == type_name && self.carries(&name, fields)? {
                        log::debug!("Reusing {} '{}'", type_name, name);
                        return Ok(object);
                    }
                    log::debug!("'{}' belongs to another command", name);
                }
            }
            index += 1;
        }
    }

    fn carries(&self, object: &str, fields: &[(&str, Option<FieldValue>)]) -> Result<bool> {
        for (field, expected) in fields {
            if self.engine.get_field(object, field)? != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
