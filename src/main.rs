mod commands;
mod core;
mod graph;
mod logging;
mod project;
mod release;
mod ui;
mod utils;

use clap::{Args, Parser, Subcommand};
use crate::commands::PlanOptions;
use crate::core::config::NoChangesPolicy;
use crate::core::error::{ReleaseError, print_error};
use std::path::PathBuf;

/// Release only what changed, in dependency order, with one tag per module
#[derive(Parser)]
#[command(name = "release-reactor")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Print diagnostic logging to stderr (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project root (default: current directory)
  #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
  directory: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the next release plan and its tags without building anything
  Next {
    #[command(flatten)]
    plan: PlanArgs,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Build the changed modules in dependency order, then tag and record them
  Release {
    #[command(flatten)]
    plan: PlanArgs,
    /// Append the configured skip-tests arguments to the build command
    #[arg(long)]
    skip_tests: bool,
    /// Create tags locally but do not push them
    #[arg(long)]
    no_push: bool,
  },
}

#[derive(Args)]
struct PlanArgs {
  /// Increment the patch component of previously released modules
  #[arg(long)]
  bugfix: bool,
  /// Release a module even if it did not change (repeatable)
  #[arg(long, value_name = "MODULE")]
  force: Vec<String>,
  /// What to do when no module changed
  #[arg(long, value_enum, value_name = "POLICY")]
  no_changes: Option<NoChangesPolicy>,
}

impl From<PlanArgs> for PlanOptions {
  fn from(args: PlanArgs) -> Self {
    Self {
      bugfix: args.bugfix,
      force: args.force,
      no_changes: args.no_changes,
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let root = match cli.directory {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(ReleaseError::from(e).context("Failed to get current directory")),
    },
  };

  // Build the run context once (config, repository, loader, record store)
  let ctx = match core::context::RunContext::build(&root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Next { plan, json } => commands::run_next(&ctx, &plan.into(), json),
    Commands::Release {
      plan,
      skip_tests,
      no_push,
    } => commands::run_release(&ctx, &plan.into(), skip_tests, no_push),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
