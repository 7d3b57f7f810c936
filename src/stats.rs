//! Per-column statistics: counts shared by every type plus the numeric and
//! temporal summaries.

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    data::is_midnight,
    frequency::{FrequencyTable, canonical_label},
    inference::SemanticType,
    table::Column,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub skewness: f64,
    /// Excess kurtosis; 0 for a normal distribution.
    pub kurtosis: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalStats {
    pub min_date: String,
    pub max_date: String,
    pub date_range_days: i64,
}

/// The type-specific block of a [`ColumnProfile`]; at most one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedStats {
    #[serde(rename = "numericStats")]
    Numeric(NumericStats),
    #[serde(rename = "temporalStats")]
    Temporal(TemporalStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub data_type: SemanticType,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub unique_count: usize,
    pub top_values: IndexMap<String, usize>,
    #[serde(flatten)]
    pub stats: Option<TypedStats>,
}

impl ColumnProfile {
    pub fn numeric_stats(&self) -> Option<&NumericStats> {
        match &self.stats {
            Some(TypedStats::Numeric(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn temporal_stats(&self) -> Option<&TemporalStats> {
        match &self.stats {
            Some(TypedStats::Temporal(stats)) => Some(stats),
            _ => None,
        }
    }
}

/// Coerced, ascending-sorted non-missing values kept for chart selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Observations {
    Numbers(Vec<f64>),
    Instants(Vec<NaiveDateTime>),
    #[default]
    Unordered,
}

pub fn missing_percentage(missing: usize, row_count: usize) -> f64 {
    if row_count == 0 {
        0.0
    } else {
        100.0 * missing as f64 / row_count as f64
    }
}

/// Computes the full profile of `column` read as `ty`.
///
/// Fails when a cell cannot be coerced to `ty` or a statistic is not finite;
/// callers substitute [`degraded_profile`].
pub fn describe_column(
    column: &Column,
    ty: SemanticType,
    row_count: usize,
    top_values: usize,
) -> Result<(ColumnProfile, Observations)> {
    let missing_count = column.missing_count();
    let mut frequencies = FrequencyTable::default();
    for value in column.non_missing() {
        let label = canonical_label(value, ty)
            .ok_or_else(|| anyhow!("Value '{value}' cannot be read as {ty}"))?;
        frequencies.record(label);
    }

    let (stats, observations) = match ty {
        SemanticType::Numeric => {
            let numbers = sorted_numbers(column)?;
            let stats = numeric_stats(&numbers)?;
            (
                Some(TypedStats::Numeric(stats)),
                Observations::Numbers(numbers),
            )
        }
        SemanticType::Temporal => {
            let instants = sorted_instants(column)?;
            let stats = temporal_stats(&instants)?;
            (
                Some(TypedStats::Temporal(stats)),
                Observations::Instants(instants),
            )
        }
        _ => (None, Observations::Unordered),
    };

    let profile = ColumnProfile {
        data_type: ty,
        missing_count,
        missing_percentage: missing_percentage(missing_count, row_count),
        unique_count: frequencies.distinct(),
        top_values: frequencies.top(top_values),
        stats,
    };
    Ok((profile, observations))
}

/// A minimal profile built from raw cell renderings; it cannot fail.
pub fn degraded_profile(column: &Column, row_count: usize, top_values: usize) -> ColumnProfile {
    let missing_count = column.missing_count();
    let frequencies = FrequencyTable::from_labels(column.non_missing().map(|v| v.as_display()));
    ColumnProfile {
        data_type: SemanticType::Text,
        missing_count,
        missing_percentage: missing_percentage(missing_count, row_count),
        unique_count: frequencies.distinct(),
        top_values: frequencies.top(top_values),
        stats: None,
    }
}

fn sorted_numbers(column: &Column) -> Result<Vec<f64>> {
    let mut numbers = column
        .non_missing()
        .map(|value| {
            value
                .as_number()
                .ok_or_else(|| anyhow!("Value '{value}' is not a finite number"))
        })
        .collect::<Result<Vec<_>>>()?;
    numbers.sort_by(f64::total_cmp);
    Ok(numbers)
}

fn sorted_instants(column: &Column) -> Result<Vec<NaiveDateTime>> {
    let mut instants = column
        .non_missing()
        .map(|value| {
            value
                .as_instant()
                .ok_or_else(|| anyhow!("Value '{value}' is not a recognised date or time"))
        })
        .collect::<Result<Vec<_>>>()?;
    instants.sort();
    Ok(instants)
}

/// Summary of ascending-sorted `values`. An empty slice yields all zeros.
pub fn numeric_stats(sorted: &[f64]) -> Result<NumericStats> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Ok(NumericStats::default());
    };
    let count = sorted.len() as f64;
    let median = quantile(sorted, 0.5);

    if min == max {
        return Ok(NumericStats {
            mean: min,
            std: 0.0,
            min,
            max,
            median,
            skewness: 0.0,
            kurtosis: 0.0,
        });
    }

    let mean = mean(sorted);
    // Deltas are taken in units of the largest magnitude so fourth powers
    // stay finite; shape moments are scale-free and std is rescaled.
    let scale = min.abs().max(max.abs());
    let centre = mean / scale;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for value in sorted {
        let delta = value / scale - centre;
        let squared = delta * delta;
        m2 += squared;
        m3 += squared * delta;
        m4 += squared * squared;
    }
    m2 /= count;
    m3 /= count;
    m4 /= count;

    let std = m2.sqrt() * scale;
    let (skewness, kurtosis) = if sorted.len() < 2 || m2 == 0.0 {
        (0.0, 0.0)
    } else {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    };

    let stats = NumericStats {
        mean,
        std,
        min,
        max,
        median,
        skewness,
        kurtosis,
    };
    if [mean, std, skewness, kurtosis]
        .iter()
        .any(|metric| !metric.is_finite())
    {
        bail!("Numeric statistics overflowed for values in [{min}, {max}]");
    }
    Ok(stats)
}

/// Date range of ascending-sorted `instants`; needs at least one value.
pub fn temporal_stats(sorted: &[NaiveDateTime]) -> Result<TemporalStats> {
    let (Some(min), Some(max)) = (sorted.first(), sorted.last()) else {
        bail!("Temporal statistics need at least one instant");
    };
    let layout = if sorted.iter().all(is_midnight) {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%dT%H:%M:%S%.f"
    };
    let render = |instant: &NaiveDateTime| instant.format(layout).to_string();
    let date_range_days = if sorted.len() < 2 {
        0
    } else {
        (*max - *min).num_days()
    };
    Ok(TemporalStats {
        min_date: render(min),
        max_date: render(max),
        date_range_days,
    })
}

/// Linear-interpolated quantile of ascending-sorted `values`, `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let position = q.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let weight = position - lower as f64;
            sorted[lower] * (1.0 - weight) + sorted[upper] * weight
        }
    }
}

/// Arithmetic mean of `values`, 0 when empty. Falls back to summing in units
/// of the largest magnitude when the plain sum overflows.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let count = values.len() as f64;
    let sum = compensated_sum(values.iter().copied());
    if sum.is_finite() {
        return sum / count;
    }
    let scale = values.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
    compensated_sum(values.iter().map(|value| value / scale)) / count * scale
}

fn compensated_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for value in values {
        let adjusted = value - compensation;
        let next = sum + adjusted;
        compensation = (next - sum) - adjusted;
        sum = next;
    }
    sum
}
