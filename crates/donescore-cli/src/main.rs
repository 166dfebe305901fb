//! Donescore CLI: the `donescore` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            docs_root,
            min_score,
            domain,
            config,
            registry,
            emit_intermediates,
            quiet,
            json,
        } => commands::score::run(commands::score::Args {
            docs_root,
            min_score,
            domain,
            config,
            registry,
            emit_intermediates,
            quiet,
            json,
        }),

        Commands::Profiles { config, json } => commands::profiles::run(config, json),
    }
}
