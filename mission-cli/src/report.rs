//! Report generation
//!
//! Summarises a resolved session as plain text or JSON.

use chrono::{DateTime, Utc};
use mission_params::{
    Engine, GoalSpec, MissionStep, ParameterHandle, Session, SessionStats, VERSION,
};
use serde::Serialize;
use std::fmt;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Txt,
    Json,
}

/// Snapshot of a resolved session
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub library_version: &'static str,
    pub mission: String,
    pub stats: SessionStats,
    pub steps: &'a [MissionStep],
    pub parameters: Vec<&'a ParameterHandle>,
}

impl<'a> Report<'a> {
    pub fn new<E: Engine>(mission: impl Into<String>, session: &'a Session<E>) -> Self {
        let registry = session.registry();
        let parameters = registry
            .names()
            .into_iter()
            .filter_map(|name| registry.get(name))
            .collect();

        Self {
            generated_at: Utc::now(),
            library_version: VERSION,
            mission: mission.into(),
            stats: session.stats(),
            steps: session.sequence().steps(),
            parameters,
        }
    }

    pub fn render(&self, format: ReportFormat) -> serde_json::Result<String> {
        match format {
            ReportFormat::Txt => Ok(self.to_txt()),
            ReportFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    pub fn to_txt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);

        writeln!(f, "{}", rule)?;
        writeln!(f, "  Mission Report: {}", self.mission)?;
        writeln!(
            f,
            "  Generated {} (mission-params v{})",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.library_version
        )?;
        writeln!(
            f,
            "  Session started {}",
            self.stats.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "{}", rule)?;

        writeln!(f, "\nSequence ({} steps):", self.steps.len())?;
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {}", index + 1, step.label())?;
            write_commands(f, step)?;
        }

        writeln!(f, "\nParameters ({}):", self.parameters.len())?;
        for handle in &self.parameters {
            let refs: Vec<&str> = handle
                .bound_references
                .iter()
                .map(|r| r.name.as_str())
                .collect();
            writeln!(
                f,
                "  {:<28} {:<6} [{}]",
                handle.canonical_name,
                handle.value_kind.to_string(),
                refs.join(", ")
            )?;
        }

        let registry = &self.stats.registry;
        writeln!(f, "\nRegistry:")?;
        writeln!(f, "  Created: {}", registry.num_created)?;
        writeln!(f, "  Adopted: {}", registry.num_adopted)?;
        writeln!(f, "  Reused:  {}", registry.num_reused)
    }
}

fn write_commands(f: &mut fmt::Formatter<'_>, step: &MissionStep) -> fmt::Result {
    match step {
        MissionStep::Propagate { stop_conditions, .. } => {
            for stop in stop_conditions {
                let goal = match (&stop.goal_value, stop.is_goalless) {
                    (_, true) => "event".to_string(),
                    (Some(goal), false) => goal.to_string(),
                    (None, false) => "-".to_string(),
                };
                writeln!(f, "     {} -> {}", stop.name, goal)?;
            }
        }
        MissionStep::Target { goals, .. } => {
            for goal in goals {
                let detail = match &goal.spec {
                    GoalSpec::Vary {
                        initial_value,
                        lower,
                        upper,
                        ..
                    } => format!("{} in [{:e}, {:e}]", initial_value, lower, upper),
                    GoalSpec::Achieve {
                        target_value,
                        tolerance,
                    } => format!("{} (tol {})", target_value, tolerance),
                };
                writeln!(f, "     {} = {}", goal.name, detail)?;
            }
        }
    }
    Ok(())
}
