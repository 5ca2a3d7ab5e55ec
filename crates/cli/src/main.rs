mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use depkit_lib::build::BuildType;
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// depkit - fetch and build pinned third-party native dependencies
#[derive(Parser)]
#[command(name = "depkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the manifest (default: $DEPKIT_CONFIG or ./depkit.toml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

/// Dependencies a command applies to.
#[derive(Args, Debug, Clone)]
pub struct Selection {
  /// Dependency names
  #[arg(value_name = "DEP")]
  pub deps: Vec<String>,

  /// Select every configured dependency
  #[arg(long, conflicts_with = "deps")]
  pub all: bool,
}

/// Options that shape a run.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
  /// Build configuration (overrides settings.build_type)
  #[arg(short = 't', long, value_name = "debug|release")]
  pub build_type: Option<BuildType>,

  /// Dependencies processed at once (overrides settings.jobs)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Limit for each git or cmake invocation, in seconds or as "30m" (0 disables)
  #[arg(long, value_parser = parse_timeout)]
  pub timeout: Option<Duration>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check out and build dependencies
  Build {
    #[command(flatten)]
    selection: Selection,

    #[command(flatten)]
    run: RunArgs,
  },

  /// Remove built libraries, keeping the checkouts
  Clean {
    #[command(flatten)]
    selection: Selection,

    /// Dependencies processed at once (overrides settings.jobs)
    #[arg(short, long)]
    jobs: Option<usize>,
  },

  /// List configured dependencies
  List,

  /// Show the state of dependencies
  Status {
    /// Dependency names (default: all)
    #[arg(value_name = "DEP")]
    deps: Vec<String>,

    /// Build configuration to report on (overrides settings.build_type)
    #[arg(short = 't', long, value_name = "debug|release")]
    build_type: Option<BuildType>,
  },
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
  if let Ok(secs) = value.parse::<u64>() {
    return Ok(Duration::from_secs(secs));
  }
  humantime::parse_duration(value).map_err(|e| e.to_string())
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = cli.config.as_deref();
  let result = match cli.command {
    Commands::Build { selection, run } => cmd::cmd_build(config, &selection, &run, cli.output),
    Commands::Clean { selection, jobs } => cmd::cmd_clean(config, &selection, jobs, cli.output),
    Commands::List => cmd::cmd_list(config, cli.output),
    Commands::Status { deps, build_type } => cmd::cmd_status(config, &deps, build_type, cli.output),
  };

  if let Err(e) = result {
    print_error(&format!("{e:#}"));
    std::process::exit(1);
  }
}
