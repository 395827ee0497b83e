//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `inspect`: Parse a module and report its input variables
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Inspect a local module
//! tfinputs inspect ./modules/vpc
//!
//! # Inspect a tagged release of a GitHub module, one subfolder deep
//! tfinputs inspect https://github.com/org/terraform-modules --ref v2.1.0 --subfolder modules/vpc
//!
//! # Emit the inputs as a JSON Schema
//! tfinputs inspect terraform-aws-modules/vpc/aws --format schema --output vpc.schema.json
//!
//! # Initialize configuration
//! tfinputs init
//!
//! # Validate configuration
//! tfinputs validate tfinputs.yaml
//! ```

use crate::config::ConverterMode;
use crate::types::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tfinputs - Terraform module input variable inspector.
#[derive(Parser, Debug)]
#[command(
    name = "tfinputs",
    author,
    version,
    about = "Terraform module input variable inspector",
    long_about = "tfinputs resolves a Terraform module from a local path, Git, HTTP or S3 \
                  source, parses its variable blocks and reports each input's type, \
                  default, requiredness and an example value."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TFINPUTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a module and report its input variables
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Module source: local path, GitHub/GitLab URL, git::, git://, s3:// or http(s):// URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Git branch, tag or commit to check out
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Directory inside the source to use as the module root
    #[arg(long, value_name = "PATH")]
    pub subfolder: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Treat warnings as failures (exit code 1)
    #[arg(long)]
    pub strict: bool,

    /// HCL converter to use
    #[arg(long, value_enum)]
    pub converter: Option<ConverterMode>,

    /// Number of files converted concurrently
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Patterns to exclude from scanning (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tfinputs.yaml")]
    pub file: PathBuf,
}
