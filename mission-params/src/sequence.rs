//! Mission sequence
//!
//! Ordered list of built commands. A `Propagate` step owns the stop
//! conditions it advances until; a `Target` step owns its Vary/Achieve goals.
//! Steps are not modified once pushed.

use crate::builders::{Goal, StopCondition};
use serde::Serialize;

/// One command of the mission sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MissionStep {
    /// Advance `entity` with `propagator` until any stop condition fires
    Propagate {
        propagator: String,
        entity: String,
        stop_conditions: Vec<StopCondition>,
    },
    /// Run `solver` over a block of goals
    Target {
        solver: String,
        entity: String,
        goals: Vec<Goal>,
    },
}

impl MissionStep {
    pub fn entity(&self) -> &str {
        match self {
            MissionStep::Propagate { entity, .. } => entity,
            MissionStep::Target { entity, .. } => entity,
        }
    }

    /// Short command label for listings
    pub fn label(&self) -> String {
        match self {
            MissionStep::Propagate { propagator, entity, .. } => {
                format!("Propagate {}({})", propagator, entity)
            }
            MissionStep::Target { solver, entity, .. } => format!("Target {} ({})", solver, entity),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MissionSequence {
    steps: Vec<MissionStep>,
}

impl MissionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, step: MissionStep) -> &MissionStep {
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[MissionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every stop condition across all Propagate steps
    pub fn stop_conditions(&self) -> impl Iterator<Item = &StopCondition> {
        self.steps.iter().flat_map(|step| match step {
            MissionStep::Propagate { stop_conditions, .. } => stop_conditions.as_slice(),
            MissionStep::Target { .. } => &[],
        })
    }

    /// Every goal across all Target steps
    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.steps.iter().flat_map(|step| match step {
            MissionStep::Target { goals, .. } => goals.as_slice(),
            MissionStep::Propagate { .. } => &[],
        })
    }

    pub(crate) fn clear(&mut self) {
        self.steps.clear();
    }
}
