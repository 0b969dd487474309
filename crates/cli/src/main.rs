mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snapforge_lib::platform::paths::project_dir;
use snapforge_lib::project::ProjectPaths;
use snapforge_lib::step::Step;

use crate::cmd::{cmd_clean, cmd_cleanbuild, cmd_init, cmd_snap, cmd_step};
use crate::output::{OutputFormat, print_error};

/// snapforge - build parts into a packaged filesystem image
#[derive(Parser)]
#[command(name = "snapforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project directory (default: current directory)
  #[arg(short = 'C', long, global = true, env = "SNAPFORGE_PROJECT_DIR")]
  project_dir: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format for command results
  #[arg(long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct PartArgs {
  /// Parts to process (default: all parts)
  parts: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Create a template snapforge.yaml
  Init,

  /// Fetch the source of parts
  Pull(PartArgs),

  /// Build parts
  Build(PartArgs),

  /// Merge built parts into the staging area
  Stage(PartArgs),

  /// Copy staged files into the stripped tree
  Strip(PartArgs),

  /// Remove step output for parts and their dependents
  Clean {
    /// Parts to clean (default: all parts)
    parts: Vec<String>,

    /// Clean this step and every later one (default: all steps)
    #[arg(short, long)]
    step: Option<Step>,
  },

  /// Run the full lifecycle and pack the stripped tree into an image
  Snap {
    /// Pack this directory instead of running the lifecycle
    directory: Option<PathBuf>,

    /// Image path (default: <name>_<version>_<arch>.snap)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Build the image inside a fresh LXD container
  Cleanbuild,
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let root = match cli.project_dir {
    Some(dir) => dir,
    None => project_dir().context("Failed to determine project directory")?,
  };
  let paths = ProjectPaths::new(root);

  match cli.command {
    Commands::Init => cmd_init(&paths),
    Commands::Pull(args) => cmd_step(Step::Pull, &paths, &args.parts, cli.format),
    Commands::Build(args) => cmd_step(Step::Build, &paths, &args.parts, cli.format),
    Commands::Stage(args) => cmd_step(Step::Stage, &paths, &args.parts, cli.format),
    Commands::Strip(args) => cmd_step(Step::Strip, &paths, &args.parts, cli.format),
    Commands::Clean { parts, step } => cmd_clean(&paths, &parts, step, cli.format),
    Commands::Snap { directory, output } => cmd_snap(&paths, directory.as_deref(), output.as_deref(), cli.format),
    Commands::Cleanbuild => cmd_cleanbuild(&paths),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
