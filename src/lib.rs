pub mod cli;
pub mod config;
pub mod console;
pub mod correlation;
pub mod data;
pub mod error;
pub mod frequency;
pub mod inference;
pub mod io_utils;
pub mod profile;
pub mod stats;
pub mod summary;
pub mod table;
pub mod viz;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    config::ProfileConfig,
};

pub use crate::{
    config::BinRule,
    error::ProfilingError,
    profile::{ProfileResult, profile},
    table::{Column, Table},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("data_profiler", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => profile::execute(&args),
        Commands::Types(args) => handle_types(&args),
        Commands::Frequency(args) => frequency::execute(&args),
        Commands::Visualize(args) => viz::execute(&args),
    }
}

fn handle_types(args: &cli::TypesArgs) -> Result<()> {
    info!(
        "Inferring column types for '{}'",
        args.input.input.display()
    );
    let config = ProfileConfig {
        categorical_cardinality_threshold: args.categorical_threshold,
        ..ProfileConfig::default()
    };
    config.validate()?;

    let table = io_utils::load_table(&args.input.to_options())?;
    let row_count = table.row_count();
    debug!(
        "Categorical cardinality threshold: {}",
        config.cardinality_threshold(row_count)
    );

    let rows = table
        .columns()
        .iter()
        .map(|column| {
            // Degraded columns report as text, matching `profile`.
            let outcome = profile::profile_column(column, row_count, &config);
            vec![
                column.name().to_string(),
                outcome.profile.data_type.to_string(),
                outcome.profile.missing_count.to_string(),
                format!("{:.2}%", outcome.profile.missing_percentage),
                outcome.profile.unique_count.to_string(),
            ]
        })
        .collect::<Vec<_>>();

    let headers = ["column", "type", "missing", "missing %", "unique"]
        .map(String::from)
        .to_vec();
    console::print_table(&headers, &rows);
    info!("Inferred types for {} column(s)", table.column_count());
    Ok(())
}
