use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod engine;
mod generate;
mod gro;
mod mdp;
mod samples;
mod settings;
mod sweep;
mod tasks;
mod tree;
mod util;

use cli::{Command, RootArgs};
use settings::Settings;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.global.verbose);

    let settings = Settings::resolve(&args.global)?;
    tracing::debug!(?settings, "resolved settings");

    match &args.command {
        Command::Npt(npt) => generate::run_npt(&settings, npt),
        Command::PreElastic(pre) => generate::run_pre_elastic(&settings, pre),
        Command::Elastic(elastic) => generate::run_elastic(&settings, elastic),
    }
}

/// `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
