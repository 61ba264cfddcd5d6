use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
pub use commands::*;

#[derive(Parser)]
#[command(name = "nowplay")]
#[command(about = "Mirror a player's transport state into the system now playing controls")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "NOWPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute one now playing snapshot and print it as JSON
    Info {
        /// Playback rate (0 is paused)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rate: f64,
        /// Elapsed time in seconds
        #[arg(long, default_value_t = 0.0)]
        elapsed: f64,
        /// Item duration in seconds (omitted when unknown)
        #[arg(long)]
        duration: Option<f64>,
        /// Asset URL of the item
        #[arg(long)]
        url: Option<String>,
        /// Title override
        #[arg(long)]
        title: Option<String>,
        /// Artist override
        #[arg(long)]
        artist: Option<String>,
        /// Simulate a player with nothing loaded
        #[arg(long)]
        no_item: bool,
    },

    /// Play a simulated item and mirror it to a now playing surface
    Simulate {
        /// Item duration in seconds
        #[arg(long, default_value_t = 30.0)]
        duration: f64,
        /// How long to run, in seconds
        #[arg(long, default_value_t = 6)]
        seconds: u64,
        /// Title shown by the media controls
        #[arg(long, default_value = "Simulated video")]
        title: String,
        /// Asset URL of the item
        #[arg(long)]
        url: Option<String>,
        /// Where to publish updates
        #[arg(long, value_enum, default_value_t = SurfaceKind::System)]
        surface: SurfaceKind,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SurfaceKind {
    /// The platform now playing service
    System,
    /// Log every update instead
    Log,
}
