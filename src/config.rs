//! Profiling policy knobs and their YAML representation.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock policy. Keys are kebab-case:
//!
//! ```yaml
//! top-values-count: 10
//! categorical-cardinality-threshold: 25
//! high-missingness-threshold: 15.0
//! histogram-bins: sturges
//! workers: 4
//! ```

use std::{fmt, fs, path::Path, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProfilingError, Result};

pub const DEFAULT_TOP_VALUES: usize = 5;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const DEFAULT_MISSINGNESS_THRESHOLD: f64 = 20.0;
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.8;

const CARDINALITY_CEILING: usize = 50;
const CARDINALITY_FLOOR: usize = 10;
const CARDINALITY_ROW_PERCENT: usize = 5;

/// How many histogram buckets a numeric column gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinRule {
    Fixed(usize),
    /// `ceil(log2(n)) + 1` buckets for `n` values.
    Sturges,
}

impl Default for BinRule {
    fn default() -> Self {
        BinRule::Fixed(DEFAULT_HISTOGRAM_BINS)
    }
}

impl BinRule {
    pub fn bucket_count(&self, values: usize) -> usize {
        match self {
            BinRule::Fixed(count) => (*count).max(1),
            BinRule::Sturges => {
                if values <= 1 {
                    1
                } else {
                    (values as f64).log2().ceil() as usize + 1
                }
            }
        }
    }
}

impl fmt::Display for BinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinRule::Fixed(count) => write!(f, "{count}"),
            BinRule::Sturges => f.write_str("sturges"),
        }
    }
}

impl FromStr for BinRule {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("sturges") {
            return Ok(BinRule::Sturges);
        }
        trimmed
            .parse::<usize>()
            .map(BinRule::Fixed)
            .map_err(|_| format!("Histogram bins must be a positive count or 'sturges', got '{value}'"))
    }
}

impl Serialize for BinRule {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            BinRule::Fixed(count) => serializer.serialize_u64(*count as u64),
            BinRule::Sturges => serializer.serialize_str("sturges"),
        }
    }
}

impl<'de> Deserialize<'de> for BinRule {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(usize),
            Named(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Count(count) => Ok(BinRule::Fixed(count)),
            Repr::Named(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProfileConfig {
    pub top_values_count: usize,
    /// Fixed categorical/text cutoff; derived from the row count when unset.
    pub categorical_cardinality_threshold: Option<usize>,
    /// Percentage above which the summary calls a column out.
    pub high_missingness_threshold: f64,
    pub histogram_bins: BinRule,
    /// Minimum |r| for the summary to mention a correlated pair.
    pub correlation_threshold: f64,
    /// Worker threads for per-column profiling; 0 uses every logical CPU.
    pub workers: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            top_values_count: DEFAULT_TOP_VALUES,
            categorical_cardinality_threshold: None,
            high_missingness_threshold: DEFAULT_MISSINGNESS_THRESHOLD,
            histogram_bins: BinRule::default(),
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            workers: 0,
        }
    }
}

impl ProfileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            ProfilingError::InvalidConfig(format!("reading {}: {err}", path.display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|err| ProfilingError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_values_count == 0 {
            return Err(ProfilingError::InvalidConfig(
                "top-values-count must be at least 1".to_string(),
            ));
        }
        if self.categorical_cardinality_threshold == Some(0) {
            return Err(ProfilingError::InvalidConfig(
                "categorical-cardinality-threshold must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.high_missingness_threshold) {
            return Err(ProfilingError::InvalidConfig(format!(
                "high-missingness-threshold must be between 0 and 100, got {}",
                self.high_missingness_threshold
            )));
        }
        if self.histogram_bins == BinRule::Fixed(0) {
            return Err(ProfilingError::InvalidConfig(
                "histogram-bins must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(ProfilingError::InvalidConfig(format!(
                "correlation-threshold must be between 0 and 1, got {}",
                self.correlation_threshold
            )));
        }
        Ok(())
    }

    /// Maximum distinct values for a string column to count as categorical.
    pub fn cardinality_threshold(&self, row_count: usize) -> usize {
        self.categorical_cardinality_threshold.unwrap_or_else(|| {
            (row_count * CARDINALITY_ROW_PERCENT)
                .div_ceil(100)
                .clamp(CARDINALITY_FLOOR, CARDINALITY_CEILING)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ProfileConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.top_values_count, 5);
        assert_eq!(config.histogram_bins, BinRule::Fixed(20));
    }

    #[test]
    fn cardinality_threshold_scales_with_rows_within_bounds() {
        let config = ProfileConfig::default();
        assert_eq!(config.cardinality_threshold(0), 10);
        assert_eq!(config.cardinality_threshold(5), 10);
        assert_eq!(config.cardinality_threshold(400), 20);
        assert_eq!(config.cardinality_threshold(100_000), 50);

        let fixed = ProfileConfig {
            categorical_cardinality_threshold: Some(3),
            ..ProfileConfig::default()
        };
        assert_eq!(fixed.cardinality_threshold(100_000), 3);
    }

    #[test]
    fn sturges_rule_grows_logarithmically() {
        assert_eq!(BinRule::Sturges.bucket_count(0), 1);
        assert_eq!(BinRule::Sturges.bucket_count(1), 1);
        assert_eq!(BinRule::Sturges.bucket_count(8), 4);
        assert_eq!(BinRule::Sturges.bucket_count(1000), 11);
        assert_eq!(BinRule::Fixed(7).bucket_count(1000), 7);
    }

    #[test]
    fn yaml_accepts_named_and_numeric_bin_rules() {
        let config = ProfileConfig::from_yaml_str("histogram-bins: sturges\ntop-values-count: 3\n")
            .expect("parse config");
        assert_eq!(config.histogram_bins, BinRule::Sturges);
        assert_eq!(config.top_values_count, 3);

        let config = ProfileConfig::from_yaml_str("histogram-bins: 12").expect("parse config");
        assert_eq!(config.histogram_bins, BinRule::Fixed(12));
    }

    #[test]
    fn yaml_rejects_negative_top_values() {
        let err = ProfileConfig::from_yaml_str("top-values-count: -1").unwrap_err();
        assert!(matches!(err, ProfilingError::InvalidConfig(_)));
    }

    #[test]
    fn yaml_rejects_unknown_keys() {
        assert!(ProfileConfig::from_yaml_str("bogus: 1").is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_thresholds() {
        let config = ProfileConfig {
            high_missingness_threshold: 120.0,
            ..ProfileConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProfileConfig {
            histogram_bins: BinRule::Fixed(0),
            ..ProfileConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProfileConfig {
            top_values_count: 0,
            ..ProfileConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        assert_eq!(
            ProfileConfig::from_yaml_str("  \n").expect("empty config"),
            ProfileConfig::default()
        );
    }
}
