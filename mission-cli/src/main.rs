//! Mission Parameter CLI Application
//!
//! Command-line front end for the mission-params library. It reads a mission
//! description (TOML), declares its bodies, frames and entities into an
//! in-memory engine, resolves every step of the sequence and writes a
//! TXT or JSON report of the resulting commands and parameters.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

mod config;
mod mission;
mod report;

use report::{Report, ReportFormat};

/// Mission Parameter Resolver - resolve a mission sequence into engine commands
#[derive(Parser, Debug)]
#[command(name = "mission-cli")]
#[command(about = "Resolve mission sequences into wired engine parameters", long_about = None)]
#[command(version)]
struct Args {
    /// Path to mission description (mission.toml)
    #[arg(short, long, value_name = "FILE")]
    mission: PathBuf,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "txt")]
    format: ReportFormat,

    /// Reject goals given for event stop conditions (periapsis, apoapsis)
    #[arg(long)]
    strict: bool,

    /// Only load and validate the mission file
    #[arg(long)]
    check: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Mission CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using mission-params library v{}", mission_params::VERSION);

    log::info!("Loading mission from: {:?}", args.mission);
    let mut mission = config::load_config(&args.mission)?;
    if args.strict {
        mission.resolver.strict_goalless = true;
    }
    log::debug!(
        "Mission loaded: {} bodies, {} frames, {} entities, {} steps",
        mission.bodies.len(),
        mission.frames.len(),
        mission.entities.len(),
        mission.sequence.len()
    );

    if args.check {
        println!("✓ Mission file is valid: {:?}", args.mission);
        return Ok(());
    }

    let session = mission::run(&mission)?;
    let report = Report::new(args.mission.display().to_string(), &session);
    let rendered = report
        .render(args.format)
        .context("Failed to render report")?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
