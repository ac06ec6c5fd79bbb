//! Targeting goals
//!
//! `Vary` frees a variable within bounds for the solver to adjust; `Achieve`
//! asks the solver to drive a resolved parameter to a target value. Both
//! resolve their variable through the same pipeline as stop conditions.

use super::{ResolveContext, ResolvedExpression};
use crate::expression::Expression;
use crate::registry::ParameterHandle;
use crate::types::{FieldValue, GoalValue, ObjectRef, ParameterKind, ResolveError, Result};
use serde::Serialize;

/// Bound used when the caller does not restrict a Vary variable
pub const UNBOUNDED: f64 = 9.999999e300;

const DEFAULT_PERTURBATION: f64 = 1e-4;
const DEFAULT_ACHIEVE_TOLERANCE: f64 = 0.1;

/// Goal-specific settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalSpec {
    Vary {
        initial_value: f64,
        lower: f64,
        upper: f64,
        perturbation: f64,
        max_step: f64,
    },
    Achieve {
        target_value: GoalValue,
        tolerance: f64,
    },
}

/// A resolved targeting goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    /// Engine command name (`Vary<variable>` or `Achieve<variable>`, suffixed
    /// `_<n>` when that object already serves a goal with other settings)
    pub name: String,
    pub variable: ParameterHandle,
    pub solver: Option<String>,
    pub spec: GoalSpec,
    pub object: ObjectRef,
}

impl Goal {
    pub fn is_vary(&self) -> bool {
        matches!(self.spec, GoalSpec::Vary { .. })
    }

    /// Lower and upper bounds of a Vary goal
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.spec {
            GoalSpec::Vary { lower, upper, .. } => Some((lower, upper)),
            GoalSpec::Achieve { .. } => None,
        }
    }
}

/// Builds a Vary goal
#[derive(Debug, Clone)]
pub struct VaryBuilder {
    entity: String,
    expression: Expression,
    initial_value: f64,
    lower: f64,
    upper: f64,
    perturbation: f64,
    max_step: f64,
    solver: Option<String>,
}

impl VaryBuilder {
    pub fn new(entity: impl Into<String>, expression: impl Into<Expression>, initial_value: f64) -> Self {
        Self {
            entity: entity.into(),
            expression: expression.into(),
            initial_value,
            lower: -UNBOUNDED,
            upper: UNBOUNDED,
            perturbation: DEFAULT_PERTURBATION,
            max_step: UNBOUNDED,
            solver: None,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Builder method: set lower and upper bounds
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Builder method: set the finite-difference perturbation
    pub fn with_perturbation(mut self, perturbation: f64) -> Self {
        self.perturbation = perturbation;
        self
    }

    /// Builder method: set the largest step the solver may take
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Builder method: name the solver that owns this goal
    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = Some(solver.into());
        self
    }

    /// Validate bounds, resolve the variable and create the Vary command
    ///
    /// # Errors
    /// * `Range` unless `lower <= initial_value <= upper`
    /// * Any parse, resolution or registration error for the variable
    pub fn build(&self, ctx: &mut ResolveContext<'_>) -> Result<Goal> {
        self.prepare(ctx)?.commit(ctx)
    }

    /// Run every check `build` makes without touching the engine
    pub fn prepare(&self, ctx: &ResolveContext<'_>) -> Result<PreparedGoal> {
        let within = self.lower <= self.initial_value && self.initial_value <= self.upper;
        if !within {
            return Err(ResolveError::Range {
                variable: self.expression.path().to_string(),
                initial: self.initial_value,
                lower: self.lower,
                upper: self.upper,
            });
        }

        Ok(PreparedGoal {
            resolved: ctx.check(&self.entity, &self.expression)?,
            solver: self.solver.clone(),
            spec: GoalSpec::Vary {
                initial_value: self.initial_value,
                lower: self.lower,
                upper: self.upper,
                perturbation: self.perturbation,
                max_step: self.max_step,
            },
        })
    }
}

/// Builds an Achieve goal
#[derive(Debug, Clone)]
pub struct AchieveBuilder {
    entity: String,
    expression: Expression,
    target_value: GoalValue,
    tolerance: f64,
    solver: Option<String>,
}

impl AchieveBuilder {
    pub fn new(
        entity: impl Into<String>,
        expression: impl Into<Expression>,
        target_value: impl Into<GoalValue>,
    ) -> Self {
        Self {
            entity: entity.into(),
            expression: expression.into(),
            target_value: target_value.into(),
            tolerance: DEFAULT_ACHIEVE_TOLERANCE,
            solver: None,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Builder method: set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder method: name the solver that owns this goal
    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = Some(solver.into());
        self
    }

    /// Resolve the goal parameter and create the Achieve command
    pub fn build(&self, ctx: &mut ResolveContext<'_>) -> Result<Goal> {
        self.prepare(ctx)?.commit(ctx)
    }

    /// Run every check `build` makes without touching the engine
    pub fn prepare(&self, ctx: &ResolveContext<'_>) -> Result<PreparedGoal> {
        if let Some(goal) = self.expression.goal() {
            if *goal != self.target_value {
                log::debug!(
                    "Achieve on '{}': explicit target {} overrides expression goal {}",
                    self.expression.path(),
                    self.target_value,
                    goal
                );
            }
        }

        Ok(PreparedGoal {
            resolved: ctx.check(&self.entity, &self.expression)?,
            solver: self.solver.clone(),
            spec: GoalSpec::Achieve {
                target_value: self.target_value.clone(),
                tolerance: self.tolerance,
            },
        })
    }
}

/// A goal that passed every check and has not been created yet
#[derive(Debug, Clone)]
pub struct PreparedGoal {
    resolved: ResolvedExpression,
    solver: Option<String>,
    spec: GoalSpec,
}

impl PreparedGoal {
    /// Register the variable and create (or reuse) the Vary/Achieve command
    pub fn commit(self, ctx: &mut ResolveContext<'_>) -> Result<Goal> {
        let variable = ctx.register(&self.resolved, ParameterKind::Goal)?;
        let solver = self.solver.as_deref().map(FieldValue::from);
        let target = FieldValue::from(variable.canonical_name.as_str());

        let (command, fields) = match &self.spec {
            GoalSpec::Vary {
                initial_value,
                lower,
                upper,
                perturbation,
                max_step,
            } => (
                "Vary",
                vec![
                    ("SolverName", solver),
                    ("Variable", Some(target)),
                    ("InitialValue", Some(FieldValue::Real(*initial_value))),
                    ("Perturbation", Some(FieldValue::Real(*perturbation))),
                    ("Lower", Some(FieldValue::Real(*lower))),
                    ("Upper", Some(FieldValue::Real(*upper))),
                    ("MaxStep", Some(FieldValue::Real(*max_step))),
                ],
            ),
            GoalSpec::Achieve {
                target_value,
                tolerance,
            } => (
                "Achieve",
                vec![
                    ("SolverName", solver),
                    ("Goal", Some(target)),
                    ("GoalValue", Some(target_value.to_field())),
                    ("Tolerance", Some(FieldValue::Real(*tolerance))),
                ],
            ),
        };

        let base_name = format!("{}{}", command, variable.canonical_name);
        let object = ctx.command_object(command, &base_name, &fields)?;
        log::info!("Built {} goal '{}'", command.to_lowercase(), object.name);

        Ok(Goal {
            name: object.name.clone(),
            variable,
            solver: self.solver,
            spec: self.spec,
            object,
        })
    }
}

/// Either half of a targeting pair
#[derive(Debug, Clone)]
pub enum GoalBuilder {
    Vary(VaryBuilder),
    Achieve(AchieveBuilder),
}

impl GoalBuilder {
    pub fn entity(&self) -> &str {
        match self {
            GoalBuilder::Vary(b) => b.entity(),
            GoalBuilder::Achieve(b) => b.entity(),
        }
    }

    /// Builder method: name the solver that owns this goal
    pub fn with_solver(self, solver: impl Into<String>) -> Self {
        match self {
            GoalBuilder::Vary(b) => GoalBuilder::Vary(b.with_solver(solver)),
            GoalBuilder::Achieve(b) => GoalBuilder::Achieve(b.with_solver(solver)),
        }
    }

    pub fn build(&self, ctx: &mut ResolveContext<'_>) -> Result<Goal> {
        self.prepare(ctx)?.commit(ctx)
    }

    pub fn prepare(&self, ctx: &ResolveContext<'_>) -> Result<PreparedGoal> {
        match self {
            GoalBuilder::Vary(b) => b.prepare(ctx),
            GoalBuilder::Achieve(b) => b.prepare(ctx),
        }
    }
}

impl From<VaryBuilder> for GoalBuilder {
    fn from(builder: VaryBuilder) -> Self {
        GoalBuilder::Vary(builder)
    }
}

impl From<AchieveBuilder> for GoalBuilder {
    fn from(builder: AchieveBuilder) -> Self {
        GoalBuilder::Achieve(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::engine::{Engine, InMemoryEngine};
    use crate::registry::ParameterRegistry;

    fn engine() -> InMemoryEngine {
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
    fn test_vary_out_of_range_cites_all_values() {
        let mut engine = engine();
        let before = engine.creation_count();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let err = VaryBuilder::new("Sat", "Sat.SMA", 200.0)
            .with_bounds(0.0, 100.0)
            .build(&mut ctx)
            .unwrap_err();

        assert_eq!(
            err,
            ResolveError::Range {
                variable: "Sat.SMA".to_string(),
                initial: 200.0,
                lower: 0.0,
                upper: 100.0,
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("200") && msg.contains("0") && msg.contains("100"));
        assert_eq!(engine.creation_count(), before);
    }

    #[test]
    fn test_vary_writes_fields() {
        let mut engine = engine();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let goal = VaryBuilder::new("Sat", "Sat.SMA", 7000.0)
            .with_bounds(6500.0, 42000.0)
            .with_perturbation(0.5)
            .with_max_step(100.0)
            .with_solver("DC")
            .build(&mut ctx)
            .unwrap();

        assert!(goal.is_vary());
        assert_eq!(goal.name, "VarySat.SMA");
        assert_eq!(goal.bounds(), Some((6500.0, 42000.0)));
        assert_eq!(goal.variable.kind, ParameterKind::Goal);
        assert_eq!(
            engine.get_field("VarySat.SMA", "MaxStep").unwrap(),
            Some(FieldValue::Real(100.0))
        );
        assert_eq!(
            engine.get_field("VarySat.SMA", "SolverName").unwrap(),
            Some(FieldValue::from("DC"))
        );
    }

    #[test]
    fn test_vary_defaults_are_unbounded() {
        let mut engine = engine();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let goal = VaryBuilder::new("Sat", "Sat.ECC", 0.01).build(&mut ctx).unwrap();
        assert_eq!(goal.bounds(), Some((-UNBOUNDED, UNBOUNDED)));
        assert_eq!(goal.solver, None);
    }

    #[test]
    fn test_achieve_resolves_like_stop_conditions() {
        let mut engine = engine();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let goal = AchieveBuilder::new("Sat", "Sat.Earth.RMAG", 42164.0)
            .with_tolerance(0.01)
            .build(&mut ctx)
            .unwrap();

        assert!(!goal.is_vary());
        assert_eq!(goal.variable.canonical_name, "Sat.Earth.RMAG");
        assert_eq!(
            goal.spec,
            GoalSpec::Achieve {
                target_value: GoalValue::Numeric(42164.0),
                tolerance: 0.01,
            }
        );
        assert_eq!(
            engine.get_field("AchieveSat.Earth.RMAG", "GoalValue").unwrap(),
            Some(FieldValue::Real(42164.0))
        );
    }

    #[test]
    fn test_second_target_gets_its_own_command() {
        let mut engine = engine();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let geo = AchieveBuilder::new("Sat", "Sat.Earth.RMAG", 42164.0)
            .build(&mut ctx)
            .unwrap();
        let leo = AchieveBuilder::new("Sat", "Sat.Earth.RMAG", 7000.0)
            .with_tolerance(0.5)
            .build(&mut ctx)
            .unwrap();

        assert_eq!(geo.name, "AchieveSat.Earth.RMAG");
        assert_eq!(leo.name, "AchieveSat.Earth.RMAG_2");
        assert_eq!(geo.variable.object, leo.variable.object);
        assert_eq!(
            engine.get_field(&geo.name, "GoalValue").unwrap(),
            Some(FieldValue::Real(42164.0))
        );
        assert_eq!(
            engine.get_field(&geo.name, "Tolerance").unwrap(),
            Some(FieldValue::Real(0.1))
        );
        assert_eq!(
            engine.get_field(&leo.name, "GoalValue").unwrap(),
            Some(FieldValue::Real(7000.0))
        );
        assert_eq!(
            engine.get_field(&leo.name, "Tolerance").unwrap(),
            Some(FieldValue::Real(0.5))
        );
    }

    #[test]
    fn test_same_vary_settings_reuse_command() {
        let mut engine = engine();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let builder = VaryBuilder::new("Sat", "Sat.SMA", 7000.0).with_solver("DC");
        let first = builder.build(&mut ctx).unwrap();
        let second = builder.build(&mut ctx).unwrap();
        let unsolved = VaryBuilder::new("Sat", "Sat.SMA", 7000.0).build(&mut ctx).unwrap();

        assert_eq!(first.object, second.object);
        assert_eq!(unsolved.name, "VarySat.SMA_2");
        assert_eq!(engine.get_field(&unsolved.name, "SolverName").unwrap(), None);
        assert_eq!(engine.count_of_type("Vary"), 2);
    }

    #[test]
    fn test_achieve_with_unknown_frame() {
        let mut engine = InMemoryEngine::new();
        engine
            .declare("Spacecraft", "Sat", [("CoordinateSystem", "MoonFixed")])
            .unwrap();
        let mut registry = ParameterRegistry::new();
        let config = ResolverConfig::default();
        let mut ctx = ResolveContext::new(&mut engine, &mut registry, &config);

        let err = AchieveBuilder::new("Sat", "Sat.RMAG", 1000.0)
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedReference { .. }));
    }
}
