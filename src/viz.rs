//! Declarative chart specifications in plotly's figure layout.
//!
//! Nothing here renders; a [`VizSpec`] is a `{name, data, layout}` document a
//! front end can hand straight to a plotting library.

use std::{collections::HashSet, fmt, fs, str::FromStr};

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use heck::ToSnakeCase;
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    cli::VisualizeArgs,
    config::{BinRule, ProfileConfig},
    correlation,
    error::{self, ProfilingError},
    inference::SemanticType,
    io_utils, profile,
    stats::{self, ColumnProfile, Observations, quantile},
    table::{Column, Table},
};

const CHART_HEIGHT: u32 = 400;
const MAX_TIME_BUCKETS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizSpec {
    pub name: String,
    pub data: Vec<Series>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Series {
    Histogram {
        name: String,
        x: Vec<f64>,
        xbins: HistogramBins,
    },
    /// Precomputed box: one entry per quartile array.
    Box {
        name: String,
        q1: Vec<f64>,
        median: Vec<f64>,
        q3: Vec<f64>,
        mean: Vec<f64>,
        lowerfence: Vec<f64>,
        upperfence: Vec<f64>,
    },
    Bar {
        name: String,
        x: Vec<String>,
        y: Vec<usize>,
    },
    Scatter {
        name: String,
        mode: String,
        x: Vec<String>,
        y: Vec<usize>,
    },
    Heatmap {
        x: Vec<String>,
        y: Vec<String>,
        z: Vec<Vec<Option<f64>>>,
        zmin: f64,
        zmax: f64,
        colorscale: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBins {
    pub start: f64,
    pub end: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub height: u32,
}

impl Layout {
    pub fn new(title: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            title: Title::new(title),
            xaxis: Axis {
                title: Title::new(x),
            },
            yaxis: Axis {
                title: Title::new(y),
            },
            height: CHART_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Histogram,
    Box,
    Bar,
    Line,
    Correlation,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Histogram,
        ChartKind::Box,
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Correlation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Correlation => "correlation",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = ProfilingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ProfilingError::UnsupportedChart(value.to_string()))
    }
}

/// `<snake_case column>_<kind>`; columns whose name has no word characters
/// fall back to `column`.
pub fn chart_key(column: &str, kind: ChartKind) -> String {
    let base = column.to_snake_case();
    let base = if base.is_empty() { "column" } else { base.as_str() };
    match kind {
        ChartKind::Correlation => correlation::HEATMAP_KEY.to_string(),
        other => format!("{base}_{other}"),
    }
}

/// Hands out chart keys, suffixing repeats with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct ChartNamer {
    taken: HashSet<String>,
}

impl ChartNamer {
    pub fn claim(&mut self, key: &str) -> String {
        let mut candidate = key.to_string();
        let mut suffix = 2usize;
        while self.taken.contains(&candidate) {
            candidate = format!("{key}_{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Charts for one profiled column, keyed by their unsuffixed names.
pub fn column_charts(
    column: &str,
    profile: &ColumnProfile,
    observations: &Observations,
    config: &ProfileConfig,
) -> Vec<VizSpec> {
    match (profile.data_type, observations) {
        (SemanticType::Numeric, Observations::Numbers(numbers)) if !numbers.is_empty() => vec![
            histogram(column, numbers, config.histogram_bins),
            box_plot(column, numbers),
        ],
        (SemanticType::Categorical | SemanticType::Boolean, _) if !profile.top_values.is_empty() => {
            vec![bar(column, &profile.top_values)]
        }
        (SemanticType::Temporal, Observations::Instants(instants)) if !instants.is_empty() => {
            vec![line(column, instants)]
        }
        _ => Vec::new(),
    }
}

/// Raw values with explicit bucket edges over ascending-sorted `numbers`.
pub fn histogram(column: &str, numbers: &[f64], rule: BinRule) -> VizSpec {
    let buckets = rule.bucket_count(numbers.len()) as f64;
    let min = numbers.first().copied().unwrap_or_default();
    let max = numbers.last().copied().unwrap_or_default();
    let xbins = if max > min {
        HistogramBins {
            start: min,
            end: max,
            size: max / buckets - min / buckets,
        }
    } else {
        HistogramBins {
            start: min - 0.5,
            end: max + 0.5,
            size: 1.0 / buckets,
        }
    };
    VizSpec {
        name: chart_key(column, ChartKind::Histogram),
        data: vec![Series::Histogram {
            name: column.to_string(),
            x: numbers.to_vec(),
            xbins,
        }],
        layout: Layout::new(format!("Distribution of {column}"), column, "count"),
    }
}

pub fn box_plot(column: &str, numbers: &[f64]) -> VizSpec {
    VizSpec {
        name: chart_key(column, ChartKind::Box),
        data: vec![Series::Box {
            name: column.to_string(),
            q1: vec![quantile(numbers, 0.25)],
            median: vec![quantile(numbers, 0.5)],
            q3: vec![quantile(numbers, 0.75)],
            mean: vec![stats::mean(numbers)],
            lowerfence: vec![numbers.first().copied().unwrap_or_default()],
            upperfence: vec![numbers.last().copied().unwrap_or_default()],
        }],
        layout: Layout::new(format!("Spread of {column}"), "", column),
    }
}

pub fn bar(column: &str, top_values: &IndexMap<String, usize>) -> VizSpec {
    VizSpec {
        name: chart_key(column, ChartKind::Bar),
        data: vec![Series::Bar {
            name: column.to_string(),
            x: top_values.keys().cloned().collect(),
            y: top_values.values().copied().collect(),
        }],
        layout: Layout::new(format!("Most frequent values of {column}"), column, "count"),
    }
}

/// Observation counts per calendar bucket over ascending-sorted `instants`.
pub fn line(column: &str, instants: &[NaiveDateTime]) -> VizSpec {
    let buckets = time_buckets(instants);
    VizSpec {
        name: chart_key(column, ChartKind::Line),
        data: vec![Series::Scatter {
            name: column.to_string(),
            mode: "lines+markers".to_string(),
            x: buckets
                .keys()
                .map(|start| start.format("%Y-%m-%d").to_string())
                .collect(),
            y: buckets.values().copied().collect(),
        }],
        layout: Layout::new(format!("{column} over time"), column, "count"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    const FINEST_FIRST: [TimeUnit; 4] = [
        TimeUnit::Day,
        TimeUnit::Week,
        TimeUnit::Month,
        TimeUnit::Year,
    ];

    fn floor(self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeUnit::Day => date,
            TimeUnit::Week => date
                .checked_sub_days(Days::new(u64::from(
                    date.weekday().num_days_from_monday(),
                )))
                .unwrap_or(date),
            TimeUnit::Month => date.with_day(1).unwrap_or(date),
            TimeUnit::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    fn next(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeUnit::Day => start.checked_add_days(Days::new(1)),
            TimeUnit::Week => start.checked_add_days(Days::new(7)),
            TimeUnit::Month => start.checked_add_months(Months::new(1)),
            TimeUnit::Year => start.checked_add_months(Months::new(12)),
        }
    }

    fn span(self, first: NaiveDate, last: NaiveDate) -> i64 {
        let (first, last) = (self.floor(first), self.floor(last));
        match self {
            TimeUnit::Day => (last - first).num_days() + 1,
            TimeUnit::Week => (last - first).num_days() / 7 + 1,
            TimeUnit::Month => {
                let months = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
                months(last) - months(first) + 1
            }
            TimeUnit::Year => i64::from(last.year() - first.year()) + 1,
        }
    }
}

fn time_buckets(instants: &[NaiveDateTime]) -> IndexMap<NaiveDate, usize> {
    let mut buckets = IndexMap::new();
    let (Some(first), Some(last)) = (instants.first(), instants.last()) else {
        return buckets;
    };
    let (first, last) = (first.date(), last.date());
    let unit = TimeUnit::FINEST_FIRST
        .into_iter()
        .find(|unit| unit.span(first, last) <= MAX_TIME_BUCKETS)
        .unwrap_or(TimeUnit::Year);

    let end = unit.floor(last);
    let mut cursor = Some(unit.floor(first));
    while let Some(start) = cursor
        && start <= end
    {
        buckets.insert(start, 0usize);
        cursor = unit.next(start);
    }
    for instant in instants {
        if let Some(count) = buckets.get_mut(&unit.floor(instant.date())) {
            *count += 1;
        }
    }
    buckets
}

/// Builds a single chart on demand.
///
/// `column` is required for every kind except [`ChartKind::Correlation`].
pub fn visualize(
    table: &Table,
    config: &ProfileConfig,
    kind: ChartKind,
    column: Option<&str>,
) -> error::Result<VizSpec> {
    config.validate()?;
    if kind == ChartKind::Correlation {
        return correlation_chart(table, config);
    }

    let name = column.ok_or_else(|| ProfilingError::ColumnRequired(kind.to_string()))?;
    let column = table
        .column(name)
        .ok_or_else(|| ProfilingError::UnknownColumn(name.to_string()))?;

    match kind {
        ChartKind::Histogram => {
            let numbers = varied_numbers(column)?;
            Ok(histogram(name, &numbers, config.histogram_bins))
        }
        ChartKind::Box => {
            let numbers = varied_numbers(column)?;
            Ok(box_plot(name, &numbers))
        }
        ChartKind::Line => {
            let instants = varied_instants(column)?;
            Ok(line(name, &instants))
        }
        ChartKind::Bar => {
            let outcome = profile::profile_column(column, table.row_count(), config);
            if outcome.profile.top_values.is_empty() {
                return Err(ProfilingError::InsufficientData(format!(
                    "column '{name}' has no values"
                )));
            }
            Ok(bar(name, &outcome.profile.top_values))
        }
        ChartKind::Correlation => correlation_chart(table, config),
    }
}

fn correlation_chart(table: &Table, config: &ProfileConfig) -> error::Result<VizSpec> {
    let threshold = config.cardinality_threshold(table.row_count());
    let numeric = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| {
            crate::inference::infer_type(column.values(), threshold) == SemanticType::Numeric
        })
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    if numeric.len() < 2 {
        return Err(ProfilingError::InsufficientData(
            "correlation needs at least two numeric columns".to_string(),
        ));
    }
    if table.row_count() < 2 {
        return Err(ProfilingError::InsufficientData(
            "correlation needs at least two rows".to_string(),
        ));
    }
    Ok(correlation::heatmap(&correlation::correlation_matrix(
        table, &numeric,
    )))
}

fn varied_numbers(column: &Column) -> error::Result<Vec<f64>> {
    let mut numbers = column
        .non_missing()
        .map(|value| value.as_number())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            ProfilingError::InsufficientData(format!("column '{}' is not numeric", column.name()))
        })?;
    numbers.sort_by(f64::total_cmp);
    require_variation(column, numbers.first() != numbers.last())?;
    Ok(numbers)
}

fn varied_instants(column: &Column) -> error::Result<Vec<NaiveDateTime>> {
    let mut instants = column
        .non_missing()
        .map(|value| value.as_instant())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            ProfilingError::InsufficientData(format!(
                "column '{}' does not hold dates",
                column.name()
            ))
        })?;
    instants.sort();
    require_variation(column, instants.first() != instants.last())?;
    Ok(instants)
}

fn require_variation(column: &Column, varied: bool) -> error::Result<()> {
    if varied {
        Ok(())
    } else {
        Err(ProfilingError::InsufficientData(format!(
            "column '{}' needs at least two distinct values",
            column.name()
        )))
    }
}

pub fn execute(args: &VisualizeArgs) -> Result<()> {
    let kind = args.kind.parse::<ChartKind>()?;
    let table = io_utils::load_table(&args.input.to_options())?;
    let mut config = ProfileConfig::default();
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }

    let spec = visualize(&table, &config, kind, args.column.as_deref())?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&spec)
    } else {
        serde_json::to_string(&spec)
    }
    .context("Serializing visualization")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("Writing visualization to {path:?}"))?;
            info!("Wrote {} visualization to {path:?}", spec.name);
        }
        None => println!("{json}"),
    }
    Ok(())
}
