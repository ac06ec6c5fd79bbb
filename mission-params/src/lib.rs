//! Mission Parameter Resolver Library
//!
//! Turns compact dotted-path expressions such as `"Sat.ElapsedSecs"` or
//! `("Sat.Earth.Periapsis", 0)` into fully wired parameter objects in an
//! external simulation engine, and builds the stop conditions and targeting
//! goals that consume them.
//!
//! # Architecture
//!
//! - Parses expressions into canonical `{entity, body, parameter}` paths
//! - Resolves implicit references (entity frame → frame origin → body)
//! - Registers each parameter once per session, idempotently
//! - Classifies event parameters (periapsis, apoapsis) that take no goal
//! - Builds stop conditions and Vary/Achieve goals on top of the above
//!
//! The library does NOT:
//! - Propagate trajectories or evaluate parameters
//! - Parse the engine's scripting language
//!
//! The engine is reached only through the [`Engine`] trait.
//!
//! # Example Usage
//!
//! ```
//! use mission_params::{InMemoryEngine, Session, StopConditionBuilder};
//!
//! let mut engine = InMemoryEngine::new();
//! engine.declare("CelestialBody", "Earth", Vec::<(&str, mission_params::FieldValue)>::new()).unwrap();
//! engine.declare("CoordinateSystem", "EarthMJ2000Eq", [("Origin", "Earth")]).unwrap();
//! engine.declare("Spacecraft", "Sat", [("CoordinateSystem", "EarthMJ2000Eq")]).unwrap();
//!
//! let mut session = Session::new(engine);
//! let stop = session
//!     .stop_condition(&StopConditionBuilder::new("Sat", ("Sat.ElapsedSecs", 12000)))
//!     .unwrap();
//!
//! assert_eq!(stop.name, "StopOnSat.ElapsedSecs");
//! assert_eq!(stop.stop_parameter.bound_references.len(), 3);
//! ```

// Public modules
pub mod builders;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod expression;
pub mod registry;
pub mod resolver;
pub mod sequence;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use builders::{
    AchieveBuilder, Goal, GoalBuilder, GoalSpec, ResolveContext, StopCondition,
    StopConditionBuilder, VaryBuilder,
};
pub use classifier::GoallessClassifier;
pub use config::ResolverConfig;
pub use engine::{Engine, InMemoryEngine};
pub use expression::{parse, CanonicalPath, Expression, ParsedExpression};
pub use registry::{ParameterHandle, ParameterRegistry, RegistryStats};
pub use resolver::{FrameBinding, ReferenceResolver, Resolution};
pub use sequence::{MissionSequence, MissionStep};
pub use session::{Session, SessionStats};
pub use types::{
    FieldValue, GoalValue, ObjectRef, ParameterKind, ReferenceBinding, ReferenceKind,
    ResolveError, Result, ValueKind,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
