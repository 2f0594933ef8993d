mod change;
mod cli;
mod dedup;
mod diagnostics;
mod error;
mod export;
mod fmt;
mod key;
mod linker;
mod loader;
#[cfg(feature = "map")]
mod map;
mod models;
mod pipeline;
mod reference;
mod reports;
mod settings;

use clap::Parser;

use cli::run::RunArgs;
use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Run {
            baseline,
            current,
            reference,
            output,
            baseline_year,
            current_year,
            no_map,
        } => cli::run::run(RunArgs {
            baseline,
            current,
            reference,
            output,
            baseline_year,
            current_year,
            no_map,
        }),
        Commands::Dedup {
            files,
            role,
            year,
            output,
        } => cli::dedup::run(&files, role, year, &output),
        Commands::Demo { dir } => cli::demo::run(dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
