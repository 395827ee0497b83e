//! tfinputs CLI entry point.
//!
//! This binary provides the command-line interface for tfinputs.

use clap::Parser;
use std::process::ExitCode;
use tfinputs::cli::{Cli, Commands, InspectArgs, LogFormat};
use tfinputs::git::redact;
use tfinputs::reporter::Reporter;
use tfinputs::{Config, ModuleParser, TfInputsError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet, cli.log_format);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e}");

            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<TfInputsError>()
                .map_or(1, TfInputsError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over -v
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfinputs={base_level}"))
        })
    };

    // Logs go to stderr so reports on stdout stay machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect(args) => {
            config.merge_cli_args(&args);
            inspect(&config, args).await
        }

        Commands::Init => {
            let config_path = std::path::Path::new("tfinputs.yaml");
            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: tfinputs.yaml");
            Ok(ExitCode::from(0))
        }

        Commands::Validate(args) => match Config::from_file(&args.file) {
            Ok(_) => {
                println!("Configuration is valid: {}", args.file.display());
                Ok(ExitCode::from(0))
            }
            Err(e) => {
                eprintln!("Configuration error: {e}");
                Ok(ExitCode::from(1))
            }
        },
    }
}

async fn inspect(config: &Config, args: InspectArgs) -> anyhow::Result<ExitCode> {
    tracing::debug!(source = %redact(&args.source, None), "Executing inspect command");

    let mut parser = ModuleParser::new(args.source.clone(), config);
    if let Some(reference) = &args.reference {
        parser = parser.with_ref(reference);
    }
    if let Some(subfolder) = &args.subfolder {
        parser = parser.with_subfolder(subfolder);
    }
    let parsed = parser.get_variables().await?;

    let report = Reporter::new(config).generate(&parsed, args.format)?;
    if let Some(output_path) = &args.output {
        std::fs::write(output_path, &report)?;
        tracing::info!(path = %output_path.display(), "Report written");
    } else {
        println!("{report}");
    }

    let exit_code = if parsed.has_errors() {
        2
    } else if parsed.has_warnings() && args.strict {
        1
    } else {
        0
    };
    Ok(ExitCode::from(exit_code))
}
