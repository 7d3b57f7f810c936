//! Sequences inference, statistics and chart selection for every column and
//! assembles the dataset profile.
//!
//! Each column is analysed in isolation. A column whose analysis fails is
//! logged and replaced with a degraded `text` profile, so the only errors
//! [`profile`] returns are request-level ones (bad configuration or a
//! worker pool that cannot start).

use std::fs;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    cli::ProfileArgs,
    config::ProfileConfig,
    correlation,
    error::{self, ProfilingError},
    inference::{SemanticType, infer_type},
    io_utils,
    stats::{self, ColumnProfile},
    summary::{self, SummaryInput},
    table::{Column, Table},
    viz::{self, ChartNamer, VizSpec},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub profile: IndexMap<String, ColumnProfile>,
    pub visualizations: IndexMap<String, VizSpec>,
    pub summary: String,
}

/// One column's profile plus the charts chosen for it (unsuffixed keys).
#[derive(Debug, Clone)]
pub struct ColumnOutcome {
    pub profile: ColumnProfile,
    pub charts: Vec<VizSpec>,
}

/// Profiles one column, degrading to a `text` profile without charts when
/// the typed analysis fails.
pub fn profile_column(column: &Column, row_count: usize, config: &ProfileConfig) -> ColumnOutcome {
    match analyze_column(column, row_count, config) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(
                "Column '{}' could not be profiled as typed data; falling back to text: {err:#}",
                column.name()
            );
            ColumnOutcome {
                profile: stats::degraded_profile(column, row_count, config.top_values_count),
                charts: Vec::new(),
            }
        }
    }
}

fn analyze_column(
    column: &Column,
    row_count: usize,
    config: &ProfileConfig,
) -> Result<ColumnOutcome> {
    let ty = infer_type(column.values(), config.cardinality_threshold(row_count));
    debug!("Column '{}' inferred as {ty}", column.name());
    let (profile, observations) =
        stats::describe_column(column, ty, row_count, config.top_values_count)
            .with_context(|| format!("Computing {ty} statistics for '{}'", column.name()))?;
    let charts = viz::column_charts(column.name(), &profile, &observations, config);
    Ok(ColumnOutcome { profile, charts })
}

/// Profiles every column of `table`.
pub fn profile(table: &Table, config: &ProfileConfig) -> error::Result<ProfileResult> {
    config.validate()?;
    let row_count = table.row_count();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|idx| format!("profiler-{idx}"))
        .build()
        .map_err(|err| ProfilingError::WorkerPool(err.to_string()))?;

    let mut outcomes = pool.install(|| {
        table
            .columns()
            .par_iter()
            .enumerate()
            .map(|(idx, column)| (idx, profile_column(column, row_count, config)))
            .collect::<Vec<_>>()
    });
    outcomes.sort_by_key(|(idx, _)| *idx);

    let mut namer = ChartNamer::default();
    let mut profiles = IndexMap::with_capacity(table.column_count());
    let mut visualizations = IndexMap::new();
    let mut numeric = Vec::new();
    for (idx, outcome) in outcomes {
        let column = &table.columns()[idx];
        if outcome.profile.data_type == SemanticType::Numeric {
            numeric.push(idx);
        }
        for mut chart in outcome.charts {
            let key = namer.claim(&chart.name);
            chart.name = key.clone();
            visualizations.insert(key, chart);
        }
        profiles.insert(column.name().to_string(), outcome.profile);
    }

    let strongest = if numeric.len() >= 2 && row_count >= 2 {
        let matrix = correlation::correlation_matrix(table, &numeric);
        let key = namer.claim(correlation::HEATMAP_KEY);
        let mut heatmap = correlation::heatmap(&matrix);
        heatmap.name = key.clone();
        visualizations.insert(key, heatmap);
        matrix.strongest_pair(config.correlation_threshold)
    } else {
        None
    };

    let summary = summary::summarize(&SummaryInput {
        profiles: &profiles,
        row_count,
        column_count: table.column_count(),
        strongest_correlation: strongest.as_ref(),
        missingness_threshold: config.high_missingness_threshold,
        has_special_characters: table.columns().iter().any(Column::has_non_ascii),
    });

    info!(
        "Profiled {} column(s) over {row_count} row(s); {} visualization(s)",
        profiles.len(),
        visualizations.len()
    );
    Ok(ProfileResult {
        profile: profiles,
        visualizations,
        summary,
    })
}

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ProfileConfig::load(path)?,
        None => ProfileConfig::default(),
    };
    if let Some(top) = args.top {
        config.top_values_count = top;
    }
    if let Some(threshold) = args.categorical_threshold {
        config.categorical_cardinality_threshold = Some(threshold);
    }
    if let Some(threshold) = args.missing_threshold {
        config.high_missingness_threshold = threshold;
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let table = io_utils::load_table(&args.input.to_options())?;
    let result = profile(&table, &config)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Serializing profile")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("Writing profile to {path:?}"))?;
            info!("Wrote profile to {path:?}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
