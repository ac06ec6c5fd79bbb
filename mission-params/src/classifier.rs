//! Event parameter classification
//!
//! Some parameters mark an instant (crossing an orbital extremum) rather than a
//! continuous value. Stop conditions on them trigger on the event and carry no
//! numeric goal.

/// Parameters that denote events with no natural continuous value
const GOALLESS_PARAMETERS: &[&str] = &["Periapsis", "Apoapsis"];

/// Classifies parameter names as event-style or value-bearing
pub struct GoallessClassifier;

impl GoallessClassifier {
    /// True if stop conditions on `parameter_name` trigger on event occurrence
    pub fn classify(parameter_name: &str) -> bool {
        GOALLESS_PARAMETERS.contains(&parameter_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extrema_are_goalless() {
        assert!(GoallessClassifier::classify("Periapsis"));
        assert!(GoallessClassifier::classify("Apoapsis"));
    }

    #[test]
    fn test_value_parameters_are_not() {
        for name in ["ElapsedSecs", "ElapsedDays", "RMAG", "periapsis"] {
            assert!(!GoallessClassifier::classify(name), "{}", name);
        }
    }
}
