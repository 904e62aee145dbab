//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Maneuver harness for the wall robot, running against the simulated arena.
#[derive(Parser, Debug)]
#[command(name = "wallbot_cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config
    #[arg(long, default_value = "wallbot.toml")]
    pub config: PathBuf,

    /// Optional echo calibration CSV (headers: micros,inches)
    #[arg(long)]
    pub calibration: Option<PathBuf>,

    /// Emit results as JSON lines on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Give up after this many control-loop polls
    #[arg(long, global = true)]
    pub max_polls: Option<u64>,

    /// Simulated IR beacon raw ADC sample
    #[arg(long, global = true)]
    pub ir_raw: Option<u16>,

    /// Simulated wall distance from the start pose (inches)
    #[arg(long, global = true)]
    pub wall_in: Option<f32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a straight line (negative = reverse)
    Drive {
        #[arg(long, allow_hyphen_values = true)]
        inches: f32,
    },
    /// Turn in place (positive = clockwise)
    Turn {
        #[arg(long, allow_hyphen_values = true)]
        degrees: f32,
    },
    /// Rotate until facing the wall's normal
    Align,
    /// Center at a target standoff distance
    Center {
        #[arg(long, default_value_t = 24.0)]
        target: f32,
    },
    /// Validate the config and exercise the ranging pipeline end to end
    SelfCheck,
}
