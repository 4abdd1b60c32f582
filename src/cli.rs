//! Command-line interface for voxline
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live voice conversations from the terminal
#[derive(Parser, Debug)]
#[command(name = "voxline", version, about = "Live voice conversations from the terminal")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress transcript output (status lines only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Audio input device (see `voxline devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Live model identifier
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Prebuilt voice for synthesized replies (e.g. Zephyr)
    #[arg(long, value_name = "VOICE")]
    pub voice: Option<String>,

    /// Start the session muted
    #[arg(long)]
    pub muted: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
