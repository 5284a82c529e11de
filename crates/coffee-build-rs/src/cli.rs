//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// CoffeeScript package compiler.
#[derive(Debug, Parser)]
#[command(name = "coffee-build-rs")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Working directory for the build
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Output directory for compiled artifacts
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Package-exported names, kept out of file-local declarations
    #[arg(long = "export")]
    pub export: Vec<String>,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Path to the node binary (default: found on PATH)
    #[arg(long = "node-path")]
    pub node_path: Option<String>,

    /// Output generated JavaScript to stderr (for debugging)
    #[arg(long = "emit-js")]
    pub emit_js: bool,

    /// Print timing breakdowns
    #[arg(long)]
    pub timings: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
    /// Machine-readable (one line per diagnostic)
    Machine,
}
