//! Resolver configuration types
//!
//! Names of the engine fields the resolver reads, the epoch parameter paired
//! with every stop condition, and how goals on event parameters are treated.

use serde::{Deserialize, Serialize};

/// Configuration for the resolution pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Parameter type used for the epoch half of a stop condition
    #[serde(default = "default_epoch_parameter")]
    pub epoch_parameter: String,

    /// Entity field holding the name of its coordinate frame
    #[serde(default = "default_frame_field")]
    pub frame_field: String,

    /// Frame field holding the name of its origin body
    #[serde(default = "default_origin_field")]
    pub origin_field: String,

    /// Reject goals supplied for event parameters instead of discarding them
    #[serde(default)]
    pub strict_goalless: bool,

    /// Tolerance applied to stop conditions that do not set one
    #[serde(default)]
    pub default_tolerance: Option<f64>,
}

fn default_epoch_parameter() -> String {
    "A1ModJulian".to_string()
}

fn default_frame_field() -> String {
    "CoordinateSystem".to_string()
}

fn default_origin_field() -> String {
    "Origin".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            epoch_parameter: default_epoch_parameter(),
            frame_field: default_frame_field(),
            origin_field: default_origin_field(),
            strict_goalless: false,
            default_tolerance: None,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the epoch parameter type
    pub fn with_epoch_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.epoch_parameter = parameter.into();
        self
    }

    /// Builder method: set the entity and frame field names
    pub fn with_frame_fields(mut self, frame_field: impl Into<String>, origin_field: impl Into<String>) -> Self {
        self.frame_field = frame_field.into();
        self.origin_field = origin_field.into();
        self
    }

    /// Builder method: reject goals on event parameters
    pub fn with_strict_goalless(mut self, strict: bool) -> Self {
        self.strict_goalless = strict;
        self
    }

    /// Builder method: set the fallback stop tolerance
    pub fn with_default_tolerance(mut self, tolerance: f64) -> Self {
        self.default_tolerance = Some(tolerance);
        self
    }
}
