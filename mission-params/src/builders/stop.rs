//! Stop condition builder
//!
//! A stop condition pairs the entity's epoch parameter with the resolved stop
//! parameter and a goal. It is handed to the engine's mission sequencer as a
//! `StopCondition` object named `StopOn<stop parameter>`.

use super::{ResolveContext, ResolvedExpression};
use crate::classifier::GoallessClassifier;
use crate::expression::Expression;
use crate::registry::ParameterHandle;
use crate::types::{
    FieldValue, GoalValue, ObjectRef, ParameterKind, ReferenceBinding, ResolveError, Result,
};
use serde::Serialize;

/// Engine type name of stop condition objects
pub const STOP_CONDITION_TYPE: &str = "StopCondition";

/// A fully wired stop condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopCondition {
    /// `StopOn<stop parameter canonical name>`, suffixed `_<n>` when that
    /// object already serves a condition with other settings
    pub name: String,
    pub epoch_parameter: ParameterHandle,
    pub stop_parameter: ParameterHandle,
    /// Value the stop parameter must reach (None for event conditions)
    pub goal_value: Option<GoalValue>,
    pub tolerance: Option<f64>,
    /// True if the condition triggers on an event rather than a value
    pub is_goalless: bool,
    /// Goal the caller supplied for an event condition, which was not applied
    pub discarded_goal: Option<GoalValue>,
    /// Backing engine object
    pub object: ObjectRef,
}

/// Builds stop conditions for one entity
#[derive(Debug, Clone)]
pub struct StopConditionBuilder {
    entity: String,
    expression: Expression,
    tolerance: Option<f64>,
    default_goal: Option<GoalValue>,
}

impl StopConditionBuilder {
    /// Create a builder for `expression` on the propagated `entity`
    pub fn new(entity: impl Into<String>, expression: impl Into<Expression>) -> Self {
        Self {
            entity: entity.into(),
            expression: expression.into(),
            tolerance: None,
            default_goal: None,
        }
    }

    /// Entity the stop condition is bound to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Builder method: set the stop tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Builder method: goal used when the expression is a bare path
    pub fn with_default_goal(mut self, goal: impl Into<GoalValue>) -> Self {
        self.default_goal = Some(goal.into());
        self
    }

    /// Resolve the expression and create (or reuse) the stop condition
    ///
    /// # Errors
    /// * Any parse or resolution error for the expression
    /// * `GoalOnEventParameter` if a goal is given for an event parameter
    ///   and `strict_goalless` is set
    /// * `DependencyNotReady` if the entity or a reference is not defined
    pub fn build(&self, ctx: &mut ResolveContext<'_>) -> Result<StopCondition> {
        self.prepare(ctx)?.commit(ctx)
    }

    /// Run every check `build` makes without touching the engine
    pub fn prepare(&self, ctx: &ResolveContext<'_>) -> Result<PreparedStop> {
        let resolved = ctx.check(&self.entity, &self.expression)?;
        let canonical_name = resolved.canonical_name();

        let is_goalless = GoallessClassifier::classify(&resolved.parsed.path.parameter);
        let supplied_goal = resolved
            .parsed
            .goal
            .clone()
            .or_else(|| self.default_goal.clone());

        let (goal_value, discarded_goal) = match (is_goalless, supplied_goal) {
            (true, Some(goal)) if ctx.config.strict_goalless => {
                return Err(ResolveError::GoalOnEventParameter {
                    parameter: canonical_name,
                    goal: goal.to_string(),
                });
            }
            (true, Some(goal)) => {
                log::warn!(
                    "'{}' is an event condition; ignoring supplied goal {}",
                    canonical_name,
                    goal
                );
                (None, Some(goal))
            }
            (true, None) => (None, None),
            (false, goal) => {
                if goal.is_none() {
                    log::warn!("Stop condition on '{}' has no goal", canonical_name);
                }
                (goal, None)
            }
        };

        let epoch_binding = [ReferenceBinding::entity(&self.entity)];
        let epoch_name = format!("{}.{}", self.entity, ctx.config.epoch_parameter);
        ctx.registry
            .check_ready(&*ctx.engine, &epoch_name, &epoch_binding)?;

        Ok(PreparedStop {
            resolved,
            epoch_name,
            epoch_binding,
            goal_value,
            tolerance: self.tolerance.or(ctx.config.default_tolerance),
            is_goalless,
            discarded_goal,
        })
    }
}

/// A stop condition that passed every check and has not been created yet
#[derive(Debug, Clone)]
pub struct PreparedStop {
    resolved: ResolvedExpression,
    epoch_name: String,
    epoch_binding: [ReferenceBinding; 1],
    goal_value: Option<GoalValue>,
    tolerance: Option<f64>,
    is_goalless: bool,
    discarded_goal: Option<GoalValue>,
}

impl PreparedStop {
    /// Register both parameters and create (or reuse) the command object
    pub fn commit(self, ctx: &mut ResolveContext<'_>) -> Result<StopCondition> {
        let epoch_parameter = ctx.registry.get_or_create(
            &mut *ctx.engine,
            &self.epoch_name,
            ParameterKind::Epoch,
            &self.epoch_binding,
        )?;
        let stop_parameter = ctx.register(&self.resolved, ParameterKind::Stop)?;

        let fields = [
            ("EpochVar", Some(FieldValue::from(epoch_parameter.canonical_name.as_str()))),
            ("StopVar", Some(FieldValue::from(stop_parameter.canonical_name.as_str()))),
            ("Goal", self.goal_value.as_ref().map(GoalValue::to_field)),
            ("Tol", self.tolerance.map(FieldValue::Real)),
        ];
        let base_name = format!("StopOn{}", stop_parameter.canonical_name);
        let object = ctx.command_object(STOP_CONDITION_TYPE, &base_name, &fields)?;

        log::info!("Built stop condition '{}'", object.name);

        Ok(StopCondition {
            name: object.name.clone(),
            epoch_parameter,
            stop_parameter,
            goal_value: self.goal_value,
            tolerance: self.tolerance,
            is_goalless: self.is_goalless,
            discarded_goal: self.discarded_goal,
            object,
        })
    }
}
