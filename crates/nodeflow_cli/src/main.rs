// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeflow` - headless checker for node graph documents
//!
//! Loads a node catalog and a graph document, re-creates the graph through
//! the canvas engine and reports whether it can be executed.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("nodeflow_canvas={level}").parse()?)
        .add_directive(format!("nodeflow={level}").parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("nodeflow v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Check(args) => cli::check(args),
        Commands::Order(args) => cli::order(args),
    }
}
