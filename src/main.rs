//! freeze_bundler - freeze an application and assemble its bundle directory.

mod cli;

use std::process;

use clap::Parser;

fn main() {
  let cli = cli::Cli::parse();

  let default_level = if cli.debug() { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
    .init();

  if let Err(err) = cli::run(cli) {
    eprintln!("Error: {err:#}");
    process::exit(1);
  }
}
