//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// devrig - Idempotent workstation provisioning and verification.
#[derive(Debug, Parser)]
#[command(name = "devrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to manifest (replaces .devrig/config.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install whatever the manifest's existence checks report missing
    Provision(ProvisionArgs),

    /// Probe every check and update the report (default if no command specified)
    Verify(VerifyArgs),

    /// Show the saved report
    Report(ReportArgs),

    /// List steps and checks
    List(ListArgs),

    /// Write a starter manifest
    Init(InitArgs),

    /// Print the manifest JSON Schema
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `provision` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProvisionArgs {
    /// Evaluate existence checks without installing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Run only specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Exit non-zero if any step fails
    #[arg(long)]
    pub strict: bool,

    /// Timeout in seconds for every step command
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// Arguments for the `verify` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VerifyArgs {
    /// Start from an empty report
    #[arg(long)]
    pub fresh: bool,

    /// Run only specified checks (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Exit non-zero if any check fails
    #[arg(long)]
    pub strict: bool,

    /// Number of checks to run concurrently
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Timeout in seconds for every probe
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Report path (overrides settings.report)
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Log directory (overrides settings.log_dir)
    #[arg(long, value_name = "PATH")]
    pub log_dir: Option<PathBuf>,
}

/// Arguments for the `report` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ReportArgs {
    /// Print the raw JSON report
    #[arg(long)]
    pub json: bool,

    /// Report path (overrides settings.report)
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `init` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InitArgs {
    /// Overwrite an existing manifest
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
