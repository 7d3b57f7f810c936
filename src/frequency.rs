use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use log::info;

use crate::{
    cli::FrequencyArgs,
    config::ProfileConfig,
    console,
    data::{Value, format_instant, format_number},
    inference::SemanticType,
    io_utils, profile,
};

/// Longest top-value label kept verbatim.
pub const MAX_LABEL_CHARS: usize = 100;

/// Value counts in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: IndexMap<String, usize>,
    total: usize,
}

impl FrequencyTable {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut table = Self::default();
        for label in labels {
            table.record(label);
        }
        table
    }

    pub fn record(&mut self, label: String) {
        self.total += 1;
        *self.counts.entry(label).or_insert(0) += 1;
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// The `limit` most frequent labels, count descending, ties in first-seen
    /// order. Long labels are truncated first; labels that collide after
    /// truncation share one entry at the earlier label's position.
    pub fn top(&self, limit: usize) -> IndexMap<String, usize> {
        let mut merged = IndexMap::<String, usize>::with_capacity(self.counts.len());
        for (label, count) in &self.counts {
            *merged.entry(truncate_label(label)).or_insert(0) += *count;
        }
        // Stable sort keeps first-seen order among equal counts.
        merged.sort_by(|_, left, _, right| right.cmp(left));
        merged.truncate(limit);
        merged
    }
}

pub fn truncate_label(label: &str) -> String {
    match label.char_indices().nth(MAX_LABEL_CHARS) {
        Some((cut, _)) => format!("{}...", &label[..cut]),
        None => label.to_string(),
    }
}

/// Renders a non-missing cell the way it is counted for a column of type `ty`.
///
/// Returns `None` when the cell cannot be read as `ty`.
pub fn canonical_label(value: &Value, ty: SemanticType) -> Option<String> {
    match ty {
        SemanticType::Numeric => value.as_number().map(format_number),
        SemanticType::Boolean => value.as_boolean().map(|b| b.to_string()),
        SemanticType::Temporal => value.as_instant().map(|dt| format_instant(&dt)),
        SemanticType::Categorical | SemanticType::Text => Some(value.as_display()),
    }
}

pub fn execute(args: &FrequencyArgs) -> Result<()> {
    let table = io_utils::load_table(&args.input.to_options())?;
    let config = ProfileConfig {
        top_values_count: args.top,
        ..ProfileConfig::default()
    };
    config.validate()?;

    let columns = if args.columns.is_empty() {
        (0..table.column_count()).collect::<Vec<_>>()
    } else {
        args.columns
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| anyhow!("Column '{name}' not found in input"))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let row_count = table.row_count();
    let mut rows = Vec::new();
    for idx in &columns {
        let column = &table.columns()[*idx];
        let outcome = profile::profile_column(column, row_count, &config);
        for (value, count) in &outcome.profile.top_values {
            let percent = if row_count == 0 {
                0.0
            } else {
                *count as f64 / row_count as f64 * 100.0
            };
            rows.push(vec![
                column.name().to_string(),
                value.clone(),
                count.to_string(),
                format!("{percent:.2}%"),
            ]);
        }
    }

    let headers = vec![
        "column".to_string(),
        "value".to_string(),
        "count".to_string(),
        "percent".to_string(),
    ];
    console::print_table(&headers, &rows);
    info!("Computed frequency counts for {} column(s)", columns.len());
    Ok(())
}
