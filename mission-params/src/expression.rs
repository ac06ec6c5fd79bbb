//! Dotted-path expression parser
//!
//! Expressions name a parameter of a moving object:
//! - `"Sat.ElapsedSecs"`: entity and parameter, body inferred later
//! - `"Sat.Earth.Periapsis"`: entity, body and parameter
//! - `("Sat.ElapsedDays", 10)`: any of the above plus a goal
//!
//! Parsing is pure; nothing here touches the engine.

use crate::types::{GoalValue, ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw caller-supplied expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    /// Bare dotted path
    Path(String),
    /// Dotted path with a goal
    WithGoal(String, GoalValue),
}

impl Expression {
    /// The dotted path part of the expression
    pub fn path(&self) -> &str {
        match self {
            Expression::Path(path) => path,
            Expression::WithGoal(path, _) => path,
        }
    }

    /// The goal part, if the expression was given as a tuple
    pub fn goal(&self) -> Option<&GoalValue> {
        match self {
            Expression::Path(_) => None,
            Expression::WithGoal(_, goal) => Some(goal),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Path(path) => write!(f, "{}", path),
            Expression::WithGoal(path, goal) => write!(f, "({}, {})", path, goal),
        }
    }
}

impl From<&str> for Expression {
    fn from(path: &str) -> Self {
        Expression::Path(path.to_string())
    }
}

impl From<String> for Expression {
    fn from(path: String) -> Self {
        Expression::Path(path)
    }
}

impl<G: Into<GoalValue>> From<(&str, G)> for Expression {
    fn from((path, goal): (&str, G)) -> Self {
        Expression::WithGoal(path.to_string(), goal.into())
    }
}

/// Normalized `{entity, body, parameter}` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalPath {
    pub entity: String,
    pub body: Option<String>,
    pub parameter: String,
}

impl CanonicalPath {
    pub fn new(entity: impl Into<String>, body: Option<String>, parameter: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            body,
            parameter: parameter.into(),
        }
    }

    /// Dotted name of the parameter object in the engine
    pub fn canonical_name(&self) -> String {
        self.to_string()
    }

    /// Same path with the body filled in
    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self {
            entity: self.entity.clone(),
            body: Some(body.into()),
            parameter: self.parameter.clone(),
        }
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{}.{}.{}", self.entity, body, self.parameter),
            None => write!(f, "{}.{}", self.entity, self.parameter),
        }
    }
}

/// Parser output: the canonical path and the goal carried by the expression
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpression {
    pub path: CanonicalPath,
    pub goal: Option<GoalValue>,
}

/// Parse an expression owned by `owning_entity`
///
/// # Errors
/// * `Syntax` if the path does not have two or three non-empty segments
/// * `ReferenceMismatch` if the first segment is not `owning_entity`
pub fn parse(expression: &Expression, owning_entity: &str) -> Result<ParsedExpression> {
    let raw = expression.path();
    let segments: Vec<&str> = raw.split('.').map(str::trim).collect();

    let path = match segments.as_slice() {
        [entity, parameter] => CanonicalPath::new(*entity, None, *parameter),
        [entity, body, parameter] => CanonicalPath::new(*entity, Some(body.to_string()), *parameter),
        _ => {
            return Err(ResolveError::syntax(
                raw,
                "expression must have two or three dotted segments",
            ))
        }
    };

    if segments.iter().any(|s| s.is_empty()) {
        return Err(ResolveError::syntax(raw, "expression contains an empty segment"));
    }

    if path.entity != owning_entity {
        return Err(ResolveError::ReferenceMismatch {
            expression: raw.to_string(),
            expected: owning_entity.to_string(),
            found: path.entity,
        });
    }

    Ok(ParsedExpression {
        path,
        goal: expression.goal().cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_segments_defer_body() {
        let parsed = parse(&Expression::from(("Sat.ElapsedSecs", 12000)), "Sat").unwrap();

        assert_eq!(parsed.path, CanonicalPath::new("Sat", None, "ElapsedSecs"));
        assert_eq!(parsed.goal.unwrap().to_string(), "12000");
    }

    #[test]
    fn test_three_segments() {
        let parsed = parse(&Expression::from("Sat.Earth.Periapsis"), "Sat").unwrap();

        assert_eq!(parsed.path.body.as_deref(), Some("Earth"));
        assert_eq!(parsed.path.parameter, "Periapsis");
        assert_eq!(parsed.path.canonical_name(), "Sat.Earth.Periapsis");
        assert!(parsed.goal.is_none());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let expr = Expression::from("Sat.Luna.RMAG");
        assert_eq!(parse(&expr, "Sat").unwrap(), parse(&expr, "Sat").unwrap());
    }

    #[test]
    fn test_wrong_segment_count() {
        for raw in ["Sat", "Sat.Foo.Bar.Baz"] {
            let err = parse(&Expression::from(raw), "Sat").unwrap_err();
            match err {
                ResolveError::Syntax { reason, .. } => {
                    assert!(reason.contains("two or three"));
                }
                other => panic!("expected syntax error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_segment() {
        let err = parse(&Expression::from("Sat..Periapsis"), "Sat").unwrap_err();
        assert!(matches!(err, ResolveError::Syntax { .. }));
    }

    #[test]
    fn test_entity_mismatch_names_both() {
        let err = parse(&Expression::from("Other.ElapsedSecs"), "Sat").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Other"));
        assert!(msg.contains("Sat"));
        assert!(matches!(err, ResolveError::ReferenceMismatch { .. }));
    }

    #[test]
    fn test_segments_are_trimmed() {
        let parsed = parse(&Expression::from(" Sat . ElapsedDays "), "Sat").unwrap();
        assert_eq!(parsed.path.canonical_name(), "Sat.ElapsedDays");
    }
}
