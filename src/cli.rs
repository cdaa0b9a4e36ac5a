//! Command line argument parsing and command dispatch.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use freeze_bundler::{Freezer, Platform, ProjectConfig, Settings};

/// Freeze an application and assemble its bundle directory
#[derive(Parser, Debug)]
#[command(name = "freeze_bundler", version, about)]
pub struct Cli {
  /// Project directory containing `src/` and `target/`
  #[arg(long, value_name = "DIR", default_value = ".", global = true)]
  pub project_dir: PathBuf,

  /// Platform to bundle for (mac, windows, linux); defaults to the host
  #[arg(long, value_name = "NAME", global = true)]
  pub platform: Option<String>,

  /// Freezing tool to run instead of the configured one
  #[arg(long, value_name = "PROGRAM", global = true)]
  pub tool: Option<String>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Run the freezing tool, relocate its output and copy resources
  Freeze(FreezeArgs),
  /// Only regenerate resources inside an existing freeze directory
  Resources(ProfileArgs),
  /// Print the freezing tool's arguments without running it
  Args(FreezeArgs),
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
  /// Additional profile applied after `base` and the platform profile
  #[arg(long = "profile", value_name = "NAME")]
  pub profiles: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FreezeArgs {
  #[command(flatten)]
  pub profiles: ProfileArgs,

  /// Build a debug bundle with verbose tool output and a console window
  #[arg(long)]
  pub debug: bool,

  /// Extra arguments passed to the freezing tool verbatim
  #[arg(last = true, value_name = "TOOL_ARGS")]
  pub extra: Vec<OsString>,
}

impl Cli {
  /// Whether debug logging was requested by the command.
  pub fn debug(&self) -> bool {
    match &self.command {
      Command::Freeze(args) | Command::Args(args) => args.debug,
      Command::Resources(_) => false,
    }
  }

  fn platform(&self) -> Platform {
    match &self.platform {
      Some(name) => name.parse().unwrap_or(Platform::Other),
      None => Platform::current(),
    }
  }
}

/// Execute the parsed command.
pub fn run(cli: Cli) -> Result<()> {
  let platform = cli.platform();
  let config = ProjectConfig::discover(&cli.project_dir);
  let mut freezer = Freezer::from_config(&config, &cli.project_dir, platform);
  if let Some(tool) = &cli.tool {
    freezer = freezer.with_tool(tool);
  }

  let extra_profiles = match &cli.command {
    Command::Freeze(args) | Command::Args(args) => &args.profiles.profiles,
    Command::Resources(args) => &args.profiles,
  };
  let mut profiles = platform.default_profiles();
  profiles.extend(extra_profiles.iter().cloned());

  let layout = freezer.layout();
  let settings = Settings::load(&layout.source_roots(), &layout.settings_dir, &profiles)
    .context("failed to load settings")?;
  log::debug!("active profiles: {}", profiles.join(", "));

  match &cli.command {
    Command::Freeze(args) => {
      let outcome = freezer
        .freeze(&settings, &profiles, &args.extra, args.debug)
        .context("freeze failed")?;
      println!(
        "Frozen bundle: {} ({} resource files)",
        outcome.relocation.freeze_dir.display(),
        outcome.resources.written.len()
      );
    }
    Command::Resources(_) => {
      let report = freezer
        .generate_resources(&settings, &profiles)
        .context("failed to generate resources")?;
      println!("Wrote {} resource files ({} filtered)", report.written.len(), report.filtered);
    }
    Command::Args(args) => {
      let mut tool_args =
        freeze_bundler::freeze::platform_args(&settings, layout, platform, args.debug)?;
      tool_args.extend(args.extra.iter().cloned());
      for arg in freezer.tool_args(&settings, &tool_args, args.debug)? {
        println!("{}", arg.to_string_lossy());
      }
    }
  }
  Ok(())
}
