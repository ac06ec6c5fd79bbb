//! Resolve a small transfer mission against the in-memory engine
//!
//! Usage:
//!   RUST_LOG=debug cargo run -p mission-params --example resolve_mission

use mission_params::{
    AchieveBuilder, FieldValue, InMemoryEngine, MissionStep, ParameterKind, ResolverConfig,
    Session, StopConditionBuilder, VaryBuilder,
};

fn main() -> mission_params::Result<()> {
    env_logger::init();

    let mut engine = InMemoryEngine::new();
    engine.declare("CelestialBody", "Earth", Vec::<(&str, FieldValue)>::new())?;
    engine.declare("CoordinateSystem", "EarthMJ2000Eq", [("Origin", "Earth")])?;
    engine.declare("Spacecraft", "Sat", [("CoordinateSystem", "EarthMJ2000Eq")])?;

    let config = ResolverConfig::new().with_default_tolerance(1e-7);
    let mut session = Session::with_config(engine, config);

    session.propagate(
        "DefaultProp",
        "Sat",
        &[StopConditionBuilder::new("Sat", "Sat.Earth.Periapsis")],
    )?;
    session.target(
        "DC",
        "Sat",
        &[
            VaryBuilder::new("Sat", "Sat.SMA", 7000.0)
                .with_bounds(6500.0, 50000.0)
                .with_max_step(500.0)
                .into(),
            AchieveBuilder::new("Sat", "Sat.Earth.RMAG", 42164.0)
                .with_tolerance(0.1)
                .into(),
        ],
    )?;
    session.propagate(
        "DefaultProp",
        "Sat",
        &[
            StopConditionBuilder::new("Sat", "Sat.Earth.Apoapsis"),
            StopConditionBuilder::new("Sat", ("Sat.ElapsedDays", 10)),
        ],
    )?;

    // A bare parameter, e.g. for a report column
    let epoch = session.parameter("Sat", "Sat.UTCGregorian", ParameterKind::Goal)?;
    println!("Report column: {} ({})", epoch.canonical_name, epoch.value_kind);

    println!("\n=== MISSION SEQUENCE ===");
    for step in session.sequence().steps() {
        println!("{}", step.label());
        match step {
            MissionStep::Propagate { stop_conditions, .. } => {
                for stop in stop_conditions {
                    let goal = stop
                        .goal_value
                        .as_ref()
                        .map(|g| g.to_string())
                        .unwrap_or_else(|| "event".to_string());
                    println!("  {} -> {}", stop.name, goal);
                }
            }
            MissionStep::Target { goals, .. } => {
                for goal in goals {
                    println!("  {}", goal.name);
                }
            }
        }
    }

    let stats = session.stats();
    println!("\n=== REGISTRY ===");
    println!("Parameters: {}", stats.registry.num_parameters);
    println!("Created:    {}", stats.registry.num_created);
    println!("Reused:     {}", stats.registry.num_reused);

    Ok(())
}
