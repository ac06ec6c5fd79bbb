//! Simulation session
//!
//! The session is the entry point of the library. It owns the engine
//! collaborator, the parameter registry, the resolver configuration and the
//! mission sequence. Registry lifetime is tied to the session: handles are
//! dropped only when the session is cleared or dropped.

use crate::builders::{
    AchieveBuilder, Goal, GoalBuilder, ResolveContext, StopCondition, StopConditionBuilder,
    VaryBuilder,
};
use crate::config::ResolverConfig;
use crate::engine::Engine;
use crate::expression::Expression;
use crate::registry::{ParameterHandle, ParameterRegistry, RegistryStats};
use crate::sequence::{MissionSequence, MissionStep};
use crate::types::{ParameterKind, ResolveError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A resolution session bound to one engine
#[derive(Debug)]
pub struct Session<E: Engine> {
    engine: E,
    registry: ParameterRegistry,
    config: ResolverConfig,
    sequence: MissionSequence,
    started_at: DateTime<Utc>,
}

impl<E: Engine> Session<E> {
    /// Create a session with the default configuration
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, ResolverConfig::default())
    }

    /// Create a session with an explicit configuration
    pub fn with_config(engine: E, config: ResolverConfig) -> Self {
        log::info!("Starting session (epoch parameter {})", config.epoch_parameter);
        Self {
            engine,
            registry: ParameterRegistry::new(),
            config,
            sequence: MissionSequence::new(),
            started_at: Utc::now(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access, for declaring entities, frames and bodies
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn sequence(&self) -> &MissionSequence {
        &self.sequence
    }

    /// Borrow the engine, registry and configuration as a builder context
    pub fn context(&mut self) -> ResolveContext<'_> {
        ResolveContext::new(&mut self.engine, &mut self.registry, &self.config)
    }

    /// Parse, resolve and register a parameter
    pub fn parameter(
        &mut self,
        entity: &str,
        expression: impl Into<Expression>,
        kind: ParameterKind,
    ) -> Result<ParameterHandle> {
        self.context().parameter(entity, &expression.into(), kind)
    }

    /// Build a stop condition outside of any sequence step
    pub fn stop_condition(&mut self, builder: &StopConditionBuilder) -> Result<StopCondition> {
        builder.build(&mut self.context())
    }

    /// Build a Vary goal outside of any sequence step
    pub fn vary(&mut self, builder: &VaryBuilder) -> Result<Goal> {
        builder.build(&mut self.context())
    }

    /// Build an Achieve goal outside of any sequence step
    pub fn achieve(&mut self, builder: &AchieveBuilder) -> Result<Goal> {
        builder.build(&mut self.context())
    }

    /// Append a Propagate step advancing `entity` until one of `stops` fires
    ///
    /// Every stop condition is checked before any of them is created, so a
    /// failing step leaves both the engine and the sequence unchanged.
    pub fn propagate(
        &mut self,
        propagator: &str,
        entity: &str,
        stops: &[StopConditionBuilder],
    ) -> Result<&MissionStep> {
        if stops.is_empty() {
            return Err(ResolveError::InvalidStep(format!(
                "Propagate {}({}) has no stop conditions",
                propagator, entity
            )));
        }
        check_entity(entity, stops.iter().map(StopConditionBuilder::entity))?;

        let mut ctx = self.context();
        let prepared = stops
            .iter()
            .map(|builder| builder.prepare(&ctx))
            .collect::<Result<Vec<_>>>()?;
        let stop_conditions = prepared
            .into_iter()
            .map(|stop| stop.commit(&mut ctx))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Propagate {}({}) with {} stop conditions",
            propagator,
            entity,
            stop_conditions.len()
        );

        Ok(self.sequence.push(MissionStep::Propagate {
            propagator: propagator.to_string(),
            entity: entity.to_string(),
            stop_conditions,
        }))
    }

    /// Append a Target step running `solver` over `goals`
    ///
    /// Like `propagate`, nothing is created unless every goal checks out.
    pub fn target(&mut self, solver: &str, entity: &str, goals: &[GoalBuilder]) -> Result<&MissionStep> {
        if goals.is_empty() {
            return Err(ResolveError::InvalidStep(format!(
                "Target {} ({}) has no goals",
                solver, entity
            )));
        }
        check_entity(entity, goals.iter().map(GoalBuilder::entity))?;

        let mut ctx = self.context();
        let prepared = goals
            .iter()
            .map(|builder| builder.clone().with_solver(solver).prepare(&ctx))
            .collect::<Result<Vec<_>>>()?;
        let goals = prepared
            .into_iter()
            .map(|goal| goal.commit(&mut ctx))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.sequence.push(MissionStep::Target {
            solver: solver.to_string(),
            entity: entity.to_string(),
            goals,
        }))
    }

    /// Reset the registry and the sequence
    ///
    /// Engine objects are left in place; parameters requested again after a
    /// clear are adopted from the engine rather than re-created.
    pub fn clear(&mut self) {
        log::info!(
            "Clearing session ({} parameters, {} steps)",
            self.registry.len(),
            self.sequence.len()
        );
        self.registry.clear();
        self.sequence.clear();
        self.started_at = Utc::now();
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            started_at: self.started_at,
            registry: self.registry.stats(),
            num_steps: self.sequence.len(),
        }
    }

}

fn check_entity<'a>(entity: &str, mut bound: impl Iterator<Item = &'a str>) -> Result<()> {
    match bound.find(|other| *other != entity) {
        Some(other) => Err(ResolveError::ReferenceMismatch {
            expression: other.to_string(),
            expected: entity.to_string(),
            found: other.to_string(),
        }),
        None => Ok(()),
    }
}

/// Session statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStats {
    pub started_at: DateTime<Utc>,
    pub registry: RegistryStats,
    pub num_steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use crate::types::FieldValue;

    fn session() -> Session<InMemoryEngine> {
        let mut engine = InMemoryEngine::new();
        engine.declare("CelestialBody", "Earth", Vec::<(&str, FieldValue)>::new()).unwrap();
        engine
            .declare("CoordinateSystem", "EarthMJ2000Eq", [("Origin", "Earth")])
            .unwrap();
        engine
            .declare("Spacecraft", "Sat", [("CoordinateSystem", "EarthMJ2000Eq")])
            .unwrap();
        Session::new(engine)
    }

    #[test]
    fn test_session_creation() {
        let session = session();
        let stats = session.stats();
        assert_eq!(stats.registry.num_parameters, 0);
        assert_eq!(stats.num_steps, 0);
    }

    #[test]
    fn test_propagate_step_owns_stop_conditions() {
        let mut session = session();
        let step = session
            .propagate(
                "DefaultProp",
                "Sat",
                &[
                    StopConditionBuilder::new("Sat", ("Sat.ElapsedDays", 1)),
                    StopConditionBuilder::new("Sat", "Sat.Earth.Periapsis"),
                ],
            )
            .unwrap();
        assert_eq!(step.label(), "Propagate DefaultProp(Sat)");

        assert_eq!(session.sequence().stop_conditions().count(), 2);
        // Epoch parameter shared by both conditions
        assert_eq!(session.engine().count_of_type("A1ModJulian"), 1);
        assert_eq!(session.registry().len(), 3);
    }

    #[test]
    fn test_failed_step_leaves_sequence_unchanged() {
        let mut session = session();
        let err = session
            .propagate(
                "DefaultProp",
                "Sat",
                &[
                    StopConditionBuilder::new("Sat", ("Sat.ElapsedDays", 1)),
                    StopConditionBuilder::new("Sat", "Sat.Too.Many.Dots"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::Syntax { .. }));
        assert!(session.sequence().is_empty());
    }

    #[test]
    fn test_failed_step_creates_no_objects() {
        let mut session = session();
        let before = session.engine().creation_count();
        let err = session
            .propagate(
                "DefaultProp",
                "Sat",
                &[
                    StopConditionBuilder::new("Sat", ("Sat.ElapsedDays", 1)),
                    StopConditionBuilder::new("Sat", "Sat.Luna.Periapsis"),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, ResolveError::DependencyNotReady { .. }));
        assert_eq!(session.engine().creation_count(), before);
        assert!(session.registry().is_empty());
        assert!(!session.engine().is_defined("StopOnSat.ElapsedDays"));
    }

    #[test]
    fn test_failed_target_creates_no_objects() {
        let mut session = session();
        let before = session.engine().creation_count();
        let err = session
            .target(
                "DC",
                "Sat",
                &[
                    AchieveBuilder::new("Sat", "Sat.Earth.RMAG", 42164.0).into(),
                    VaryBuilder::new("Sat", "Sat.SMA", 200.0)
                        .with_bounds(0.0, 100.0)
                        .into(),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, ResolveError::Range { .. }));
        assert_eq!(session.engine().creation_count(), before);
        assert!(session.sequence().is_empty());
    }

    #[test]
    fn test_empty_propagate_rejected() {
        let mut session = session();
        let err = session.propagate("DefaultProp", "Sat", &[]).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidStep(_)));
    }

    #[test]
    fn test_step_entity_must_match_builders() {
        let mut session = session();
        let err = session
            .propagate(
                "DefaultProp",
                "Sat",
                &[StopConditionBuilder::new("Other", "Other.ElapsedSecs")],
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::ReferenceMismatch { .. }));
    }

    #[test]
    fn test_target_step_sets_solver() {
        let mut session = session();
        session
            .target(
                "DC",
                "Sat",
                &[
                    VaryBuilder::new("Sat", "Sat.SMA", 7000.0).into(),
                    AchieveBuilder::new("Sat", "Sat.Earth.RMAG", 42164.0).into(),
                ],
            )
            .unwrap();

        let goals: Vec<&Goal> = session.sequence().goals().collect();
        assert_eq!(goals.len(), 2);
        assert!(goals.iter().all(|g| g.solver.as_deref() == Some("DC")));
    }

    #[test]
    fn test_clear_then_adopt() {
        let mut session = session();
        let first = session
            .parameter("Sat", "Sat.ElapsedSecs", ParameterKind::Stop)
            .unwrap();
        session.clear();
        assert!(session.registry().is_empty());

        let again = session
            .parameter("Sat", "Sat.ElapsedSecs", ParameterKind::Stop)
            .unwrap();
        assert_eq!(first.object.id, again.object.id);
        assert_eq!(session.registry().stats().num_adopted, 1);
    }
}
