//! Core types for the mission parameter resolver
//!
//! This module defines the values that flow through the resolution pipeline:
//! errors, reference bindings, parameter and value kinds, and the field values
//! exchanged with the engine collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur while resolving expressions or building commands
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid expression '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    #[error("Expression '{expression}' names entity '{found}' but the command is bound to '{expected}'")]
    ReferenceMismatch {
        expression: String,
        expected: String,
        found: String,
    },

    #[error("Cannot resolve {reference} for '{path}'")]
    UnresolvedReference { path: String, reference: String },

    #[error("Parameter '{parameter}' depends on '{dependency}', which is not defined yet")]
    DependencyNotReady { parameter: String, dependency: String },

    #[error("Initial value {initial} of '{variable}' is outside bounds [{lower}, {upper}]")]
    Range {
        variable: String,
        initial: f64,
        lower: f64,
        upper: f64,
    },

    #[error("Parameter '{parameter}' is an event condition and takes no goal (got {goal})")]
    GoalOnEventParameter { parameter: String, goal: String },

    #[error("Invalid mission step: {0}")]
    InvalidStep(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

impl ResolveError {
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        ResolveError::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolved(path: impl fmt::Display, reference: impl Into<String>) -> Self {
        ResolveError::UnresolvedReference {
            path: path.to_string(),
            reference: reference.into(),
        }
    }
}

/// Kind of reference object a parameter can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// The moving object that owns the parameter
    Entity,
    /// Coordinate frame the parameter is expressed in
    CoordinateFrame,
    /// Body the parameter is measured from
    OriginBody,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Entity => write!(f, "entity"),
            ReferenceKind::CoordinateFrame => write!(f, "coordinate frame"),
            ReferenceKind::OriginBody => write!(f, "origin body"),
        }
    }
}

/// A single reference attached to a parameter
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceBinding {
    pub kind: ReferenceKind,
    pub name: String,
}

impl ReferenceBinding {
    pub fn new(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Entity, name)
    }

    pub fn frame(name: impl Into<String>) -> Self {
        Self::new(ReferenceKind::CoordinateFrame, name)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(ReferenceKind::OriginBody, name)
    }
}

impl fmt::Display for ReferenceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// Role a parameter was registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Time tag read alongside a stop parameter
    Epoch,
    /// Parameter a propagation stops on
    Stop,
    /// Variable or result of a targeting goal
    Goal,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Epoch => write!(f, "epoch"),
            ParameterKind::Stop => write!(f, "stop"),
            ParameterKind::Goal => write!(f, "goal"),
        }
    }
}

/// Value type a parameter produces, fixed when the parameter is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Real,
    String,
    Object,
    Boolean,
}

const STRING_PARAMETERS: &[&str] = &[
    "A1Gregorian",
    "TAIGregorian",
    "TTGregorian",
    "TDBGregorian",
    "UTCGregorian",
];

const OBJECT_PARAMETERS: &[&str] = &["CoordinateSystem", "Origin", "CentralBody"];

const BOOLEAN_PARAMETERS: &[&str] = &["IsFiring"];

impl ValueKind {
    /// Look up the value kind of a parameter type name
    ///
    /// Anything not listed in the string/object/boolean tables is real-valued.
    pub fn for_parameter(parameter_name: &str) -> Self {
        if STRING_PARAMETERS.contains(&parameter_name) {
            ValueKind::String
        } else if OBJECT_PARAMETERS.contains(&parameter_name) {
            ValueKind::Object
        } else if BOOLEAN_PARAMETERS.contains(&parameter_name) {
            ValueKind::Boolean
        } else {
            ValueKind::Real
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Real => write!(f, "Real"),
            ValueKind::String => write!(f, "String"),
            ValueKind::Object => write!(f, "Object"),
            ValueKind::Boolean => write!(f, "Boolean"),
        }
    }
}

/// Value stored in an engine object field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Text content, if this is a text field
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content as f64, if the field is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Real(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Real(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

/// Goal of a stop condition or targeting command
///
/// Text goals name another parameter or variable the engine evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GoalValue {
    Numeric(f64),
    Text(String),
}

impl GoalValue {
    /// Field value written to the engine for this goal
    pub fn to_field(&self) -> FieldValue {
        match self {
            GoalValue::Numeric(v) => FieldValue::Real(*v),
            GoalValue::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for GoalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalValue::Numeric(v) => write!(f, "{}", v),
            GoalValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for GoalValue {
    fn from(v: f64) -> Self {
        GoalValue::Numeric(v)
    }
}

impl From<i32> for GoalValue {
    fn from(v: i32) -> Self {
        GoalValue::Numeric(v as f64)
    }
}

impl From<&str> for GoalValue {
    fn from(v: &str) -> Self {
        GoalValue::Text(v.to_string())
    }
}

impl From<String> for GoalValue {
    fn from(v: String) -> Self {
        GoalValue::Text(v)
    }
}

/// Identity of an object living in the engine's object directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Engine-assigned identity, unique per engine instance
    pub id: u64,
    /// Object name in the directory
    pub name: String,
    /// Engine type name (e.g. "Spacecraft", "Periapsis")
    pub type_name: String,
}
