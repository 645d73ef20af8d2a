use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deployflow::{
    config::StackConfig,
    errors::{DeployflowError, ValidationFailure},
    events::LoggingEventSink,
    stack::{DeliveryStack, StackPlan},
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deployflow")]
#[command(version)]
#[command(about = "Assemble and validate a container delivery stack")]
#[command(long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble the stack and print its plan
    Synth {
        /// Configuration file path (TOML or JSON); defaults apply when omitted
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Assemble the stack and report every validation error
    Validate {
        /// Configuration file path (TOML or JSON); defaults apply when omitted
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// The full plan as JSON
    Json,
    /// Stage overview followed by the effective configuration as TOML
    TomlSummary,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the plan.
    let log_filter = format!("deployflow={}", cli.log_level);
    let json = matches!(cli.log_format, LogFormat::Json);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    info!("Starting deployflow v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Synth { config, format } => {
            let config = load_config(config.as_deref())?;
            let Some(stack) = assemble(&config)? else {
                return Ok(ExitCode::FAILURE);
            };
            let sink = LoggingEventSink::default();
            let plan = stack.synthesize_with(&sink);
            match format {
                OutputFormat::Json => println!("{}", plan.to_json_pretty()?),
                OutputFormat::TomlSummary => print!("{}", toml_summary(&plan, &config)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { config } => {
            let config = load_config(config.as_deref())?;
            match assemble(&config)? {
                Some(stack) => {
                    println!(
                        "Pipeline '{}' is valid ({} stages, fingerprint {})",
                        stack.pipeline().name(),
                        stack.pipeline().stage_count(),
                        stack.pipeline().fingerprint()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::FAILURE),
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<StackConfig> {
    let mut config = match path {
        Some(path) => StackConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            info!("No configuration file given, using defaults");
            StackConfig::default()
        }
    };
    config.apply_env_overrides();
    Ok(config)
}

/// Assembles the stack. Validation failures are printed and yield `None`;
/// any other error is returned.
fn assemble(config: &StackConfig) -> Result<Option<DeliveryStack>> {
    let sink = Arc::new(LoggingEventSink::debug());
    match DeliveryStack::assemble_with(config, sink) {
        Ok(stack) => Ok(Some(stack)),
        Err(DeployflowError::Validation(failure)) => {
            report(&failure);
            Ok(None)
        }
        Err(err) => Err(err).context("Failed to assemble stack"),
    }
}

fn report(failure: &ValidationFailure) {
    warn!(pipeline = %failure.pipeline, errors = failure.errors.len(), "Validation failed");
    eprintln!(
        "Pipeline '{}' failed validation with {} error(s):",
        failure.pipeline,
        failure.errors.len()
    );
    for error in &failure.errors {
        let info = error.error_info();
        eprintln!("  [{}] {}", info.code, info.summary);
        if let Some(hint) = info.fix_hint {
            eprintln!("      hint: {hint}");
        }
    }
}

fn toml_summary(plan: &StackPlan, config: &StackConfig) -> Result<String> {
    let mut out = format!(
        "# Stack {} ({}/{})\n# Plan {} at {}\n# Pipeline '{}' fingerprint {}\n",
        plan.stack_name,
        plan.account,
        plan.region,
        plan.plan_id,
        plan.synthesized_at.to_rfc3339(),
        plan.pipeline.name(),
        plan.pipeline_fingerprint
    );
    for (index, stage) in plan.pipeline.stages().iter().enumerate() {
        for action in &stage.actions {
            writeln!(
                out,
                "#   {index}. {} / {} ({}): in [{}] out [{}]",
                stage.name,
                action.name,
                action.kind(),
                join(&action.inputs),
                join(&action.outputs)
            )?;
        }
    }
    out.push('\n');
    out.push_str(&config.to_toml_string()?);
    Ok(out)
}

fn join(artifacts: &[deployflow::core::Artifact]) -> String {
    artifacts
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_has_no_short_flag() {
        let cli = Cli::try_parse_from(["deployflow", "--log-level", "debug", "validate"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(Cli::try_parse_from(["deployflow", "-v", "debug", "validate"]).is_err());
    }

    #[test]
    fn test_toml_summary_lists_every_action() {
        let config = StackConfig::default();
        let plan = DeliveryStack::assemble(&config).unwrap().synthesize();
        let summary = toml_summary(&plan, &config).unwrap();

        assert!(summary.contains("#   0. Source / github_source (source_fetch): in [] out [source_output]\n"));
        assert!(summary.contains("#   1. Build / Build (build): in [source_output] out [build_output]\n"));
        assert!(summary.contains("#   2. Deploy / EcsDeployAction (deploy): in [build_output] out []\n"));
        assert!(summary.contains("[pipeline]"));
    }
}
