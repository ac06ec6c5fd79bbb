//! Mission file loading and parsing

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use mission_params::{FieldValue, GoalValue, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Mission description (loaded from a .toml file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MissionConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub sequence: Vec<StepConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BodyConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrameConfig {
    pub name: String,
    pub origin: String,
    #[serde(default = "default_axes")]
    pub axes: String,
}

fn default_axes() -> String {
    "MJ2000Eq".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default = "default_entity_kind")]
    pub kind: String,
    pub coordinate_system: Option<String>,
    /// RFC 3339 string, e.g. "2026-01-01T12:00:00Z"
    pub epoch: Option<DateTime<Utc>>,
    /// Extra fields written verbatim to the engine object
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

fn default_entity_kind() -> String {
    "Spacecraft".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum StepConfig {
    Propagate {
        entity: String,
        #[serde(default = "default_propagator")]
        propagator: String,
        stop: Vec<StopConfig>,
    },
    Target {
        entity: String,
        solver: String,
        #[serde(default)]
        vary: Vec<VaryConfig>,
        #[serde(default)]
        achieve: Vec<AchieveConfig>,
    },
}

fn default_propagator() -> String {
    "DefaultProp".to_string()
}

impl StepConfig {
    pub fn entity(&self) -> &str {
        match self {
            StepConfig::Propagate { entity, .. } => entity,
            StepConfig::Target { entity, .. } => entity,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StopConfig {
    Path(String),
    Detailed {
        expression: String,
        goal: Option<GoalValue>,
        tolerance: Option<f64>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VaryConfig {
    pub variable: String,
    pub initial: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub perturbation: Option<f64>,
    pub max_step: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AchieveConfig {
    pub goal: String,
    pub value: GoalValue,
    pub tolerance: Option<f64>,
}

impl MissionConfig {
    /// Check the mission for problems the engine would not report clearly
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let names = self
            .bodies
            .iter()
            .map(|b| &b.name)
            .chain(self.frames.iter().map(|f| &f.name))
            .chain(self.entities.iter().map(|e| &e.name));
        for name in names {
            if !seen.insert(name.as_str()) {
                bail!("Object '{}' is declared more than once", name);
            }
        }

        for (index, step) in self.sequence.iter().enumerate() {
            if !seen.contains(step.entity()) {
                bail!(
                    "Sequence step {} uses entity '{}', which is not declared",
                    index + 1,
                    step.entity()
                );
            }
        }

        if self.sequence.is_empty() {
            log::warn!("Mission has an empty sequence");
        }
        Ok(())
    }
}

/// Load a mission description from a TOML file
pub fn load_config(path: &Path) -> Result<MissionConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mission file: {:?}", path))?;

    let config: MissionConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse mission file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid mission file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MISSION: &str = r#"
        [resolver]
        strict_goalless = false

        [[bodies]]
        name = "Earth"

        [[frames]]
        name = "EarthMJ2000Eq"
        origin = "Earth"

        [[entities]]
        name = "Sat"
        coordinate_system = "EarthMJ2000Eq"
        epoch = "2026-01-01T12:00:00Z"
        fields = { DryMass = 850.0 }

        [[sequence]]
        command = "propagate"
        entity = "Sat"
        stop = ["Sat.Earth.Periapsis", { expression = "Sat.ElapsedDays", goal = 10 }]

        [[sequence]]
        command = "target"
        entity = "Sat"
        solver = "DC"
        vary = [{ variable = "Sat.SMA", initial = 7000.0, lower = 6500.0 }]
        achieve = [{ goal = "Sat.Earth.RMAG", value = 42164.0, tolerance = 0.1 }]
    "#;

    #[test]
    fn test_mission_deserialization() {
        let config: MissionConfig = toml::from_str(MISSION).unwrap();

        assert_eq!(config.bodies.len(), 1);
        assert_eq!(config.frames[0].axes, "MJ2000Eq");
        assert_eq!(config.entities[0].kind, "Spacecraft");
        assert!(config.entities[0].epoch.is_some());
        assert_eq!(config.resolver.epoch_parameter, "A1ModJulian");
        assert_eq!(config.sequence.len(), 2);

        match &config.sequence[0] {
            StepConfig::Propagate { propagator, stop, .. } => {
                assert_eq!(propagator, "DefaultProp");
                assert!(matches!(stop[0], StopConfig::Path(_)));
                assert!(matches!(stop[1], StopConfig::Detailed { .. }));
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config: MissionConfig = toml::from_str(
            r#"
            [[bodies]]
            name = "Earth"
            [[entities]]
            name = "Earth"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_undeclared_step_entity_rejected() {
        let config: MissionConfig = toml::from_str(
            r#"
            [[sequence]]
            command = "propagate"
            entity = "Sat"
            stop = ["Sat.ElapsedSecs"]
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Sat"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MISSION.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.entities[0].name, "Sat");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read mission file"));
    }
}
