//! Branchtale CLI: the `branchtale` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            story,
            config,
            json,
            debug,
        } => commands::check::run(story, config, json, debug),

        Commands::Build {
            story,
            out,
            config,
            json,
            debug,
        } => commands::build::run(story, out, config, json, debug),

        Commands::Loops {
            story,
            config,
            json,
            debug,
        } => commands::loops::run(story, config, json, debug),
    }
}
