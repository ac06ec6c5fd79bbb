//! Mission execution
//!
//! Declares the mission's bodies, frames and entities into an in-memory
//! engine (in file order), then replays the sequence through a session.

use crate::config::{
    AchieveConfig, EntityConfig, MissionConfig, StepConfig, StopConfig, VaryConfig,
};
use anyhow::{Context, Result};
use mission_params::builders::goal::UNBOUNDED;
use mission_params::{
    AchieveBuilder, Expression, FieldValue, GoalBuilder, InMemoryEngine, ResolverConfig, Session,
    StopConditionBuilder, VaryBuilder,
};

/// Engine date format for entity epochs
const EPOCH_FORMAT: &str = "%d %b %Y %H:%M:%S%.3f";

/// Create every declared object in the engine
pub fn build_engine(config: &MissionConfig) -> Result<InMemoryEngine> {
    let resolver = &config.resolver;
    let mut engine = InMemoryEngine::new();

    for body in &config.bodies {
        log::debug!("Declaring body {}", body.name);
        engine
            .declare("CelestialBody", &body.name, Vec::<(&str, FieldValue)>::new())
            .with_context(|| format!("Failed to declare body '{}'", body.name))?;
    }

    for frame in &config.frames {
        log::debug!("Declaring frame {} (origin {})", frame.name, frame.origin);
        let fields = [
            (resolver.origin_field.as_str(), frame.origin.as_str()),
            ("Axes", frame.axes.as_str()),
        ];
        engine
            .declare("CoordinateSystem", &frame.name, fields)
            .with_context(|| format!("Failed to declare frame '{}'", frame.name))?;
    }

    for entity in &config.entities {
        log::debug!("Declaring {} {}", entity.kind, entity.name);
        engine
            .declare(&entity.kind, &entity.name, entity_fields(entity, resolver))
            .with_context(|| format!("Failed to declare entity '{}'", entity.name))?;
    }

    log::info!("Declared {} engine objects", engine.creation_count());
    Ok(engine)
}

fn entity_fields(entity: &EntityConfig, resolver: &ResolverConfig) -> Vec<(String, FieldValue)> {
    let mut fields: Vec<(String, FieldValue)> = entity
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    if let Some(frame) = &entity.coordinate_system {
        fields.push((resolver.frame_field.clone(), frame.as_str().into()));
    }
    if let Some(epoch) = entity.epoch {
        fields.push(("DateFormat".to_string(), "UTCGregorian".into()));
        fields.push(("Epoch".to_string(), epoch.format(EPOCH_FORMAT).to_string().into()));
    }
    fields
}

/// Build the engine and replay the whole sequence
pub fn run(config: &MissionConfig) -> Result<Session<InMemoryEngine>> {
    let engine = build_engine(config)?;
    let mut session = Session::with_config(engine, config.resolver.clone());

    for (index, step) in config.sequence.iter().enumerate() {
        run_step(&mut session, step).with_context(|| {
            format!("Sequence step {} ({}) failed", index + 1, step.entity())
        })?;
    }

    let stats = session.stats();
    log::info!(
        "Resolved {} steps, {} parameters ({} created, {} reused)",
        stats.num_steps,
        stats.registry.num_parameters,
        stats.registry.num_created,
        stats.registry.num_reused
    );
    Ok(session)
}

fn run_step(session: &mut Session<InMemoryEngine>, step: &StepConfig) -> Result<()> {
    match step {
        StepConfig::Propagate {
            entity,
            propagator,
            stop,
        } => {
            let builders: Vec<StopConditionBuilder> =
                stop.iter().map(|s| stop_builder(entity, s)).collect();
            let step = session.propagate(propagator, entity, &builders)?;
            log::debug!("Appended {}", step.label());
        }
        StepConfig::Target {
            entity,
            solver,
            vary,
            achieve,
        } => {
            let goals: Vec<GoalBuilder> = vary
                .iter()
                .map(|v| vary_builder(entity, v).into())
                .chain(achieve.iter().map(|a| achieve_builder(entity, a).into()))
                .collect();
            let step = session.target(solver, entity, &goals)?;
            log::debug!("Appended {}", step.label());
        }
    }
    Ok(())
}

fn stop_builder(entity: &str, stop: &StopConfig) -> StopConditionBuilder {
    match stop {
        StopConfig::Path(path) => StopConditionBuilder::new(entity, path.as_str()),
        StopConfig::Detailed {
            expression,
            goal,
            tolerance,
        } => {
            let expression = match goal {
                Some(goal) => Expression::WithGoal(expression.clone(), goal.clone()),
                None => Expression::Path(expression.clone()),
            };
            let builder = StopConditionBuilder::new(entity, expression);
            match tolerance {
                Some(tolerance) => builder.with_tolerance(*tolerance),
                None => builder,
            }
        }
    }
}

fn vary_builder(entity: &str, vary: &VaryConfig) -> VaryBuilder {
    let mut builder = VaryBuilder::new(entity, vary.variable.as_str(), vary.initial);
    if vary.lower.is_some() || vary.upper.is_some() {
        builder = builder.with_bounds(
            vary.lower.unwrap_or(-UNBOUNDED),
            vary.upper.unwrap_or(UNBOUNDED),
        );
    }
    if let Some(perturbation) = vary.perturbation {
        builder = builder.with_perturbation(perturbation);
    }
    if let Some(max_step) = vary.max_step {
        builder = builder.with_max_step(max_step);
    }
    builder
}

fn achieve_builder(entity: &str, achieve: &AchieveConfig) -> AchieveBuilder {
    let builder = AchieveBuilder::new(entity, achieve.goal.as_str(), achieve.value.clone());
    match achieve.tolerance {
        Some(tolerance) => builder.with_tolerance(tolerance),
        None => builder,
    }
}
