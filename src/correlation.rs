//! Pairwise Pearson correlation between numeric columns.

use serde::Serialize;

use crate::{
    table::Table,
    viz::{Layout, Series, VizSpec},
};

pub const HEATMAP_KEY: &str = "correlation_heatmap";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `None` where a pair has fewer than two complete rows or no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedPair {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
}

impl CorrelationMatrix {
    /// The pair with the largest |r| strictly above `threshold`; the first
    /// such pair in column order wins a tie.
    pub fn strongest_pair(&self, threshold: f64) -> Option<CorrelatedPair> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (i, row) in self.values.iter().enumerate() {
            for (j, value) in row.iter().enumerate().skip(i + 1) {
                let Some(r) = *value else { continue };
                if r.abs() <= threshold {
                    continue;
                }
                if best.is_none_or(|(_, _, current)| r.abs() > current.abs()) {
                    best = Some((i, j, r));
                }
            }
        }
        best.map(|(i, j, coefficient)| CorrelatedPair {
            left: self.columns[i].clone(),
            right: self.columns[j].clone(),
            coefficient,
        })
    }
}

/// Correlation matrix over `columns` (indices into `table`), using only rows
/// where both cells of a pair are numbers.
pub fn correlation_matrix(table: &Table, columns: &[usize]) -> CorrelationMatrix {
    let series = columns
        .iter()
        .map(|idx| {
            table.columns()[*idx]
                .values()
                .iter()
                .map(|value| value.as_number())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut values = vec![vec![None; series.len()]; series.len()];
    for i in 0..series.len() {
        values[i][i] = Some(1.0);
        for j in (i + 1)..series.len() {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns
            .iter()
            .map(|idx| table.columns()[*idx].name().to_string())
            .collect(),
        values,
    }
}

pub fn pearson(left: &[Option<f64>], right: &[Option<f64>]) -> Option<f64> {
    let pairs = left
        .iter()
        .zip(right)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
    r.is_finite().then_some(r)
}

pub fn heatmap(matrix: &CorrelationMatrix) -> VizSpec {
    VizSpec {
        name: HEATMAP_KEY.to_string(),
        data: vec![Series::Heatmap {
            x: matrix.columns.clone(),
            y: matrix.columns.clone(),
            z: matrix.values.clone(),
            zmin: -1.0,
            zmax: 1.0,
            colorscale: "RdBu".to_string(),
        }],
        layout: Layout::new("Correlation matrix", "Features", "Features"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn numbers(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn pearson_detects_perfect_relationships() {
        let x = numbers(&[1.0, 2.0, 3.0, 4.0]);
        let up = numbers(&[2.0, 4.0, 6.0, 8.0]);
        let down = numbers(&[8.0, 6.0, 4.0, 2.0]);
        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_skips_incomplete_rows_and_flat_series() {
        let x = vec![Some(1.0), None, Some(3.0), Some(5.0)];
        let y = vec![Some(1.0), Some(100.0), Some(3.0), Some(5.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&numbers(&[1.0, 1.0]), &numbers(&[1.0, 2.0])), None);
        assert_eq!(pearson(&numbers(&[1.0]), &numbers(&[2.0])), None);
    }

    #[test]
    fn strongest_pair_prefers_magnitude() {
        let table = Table::new(vec![
            Column::from_raw("a", &["1", "2", "3", "4"]),
            Column::from_raw("b", &["1", "3", "2", "4"]),
            Column::from_raw("c", &["2", "4", "6", "8"]),
        ])
        .expect("table");
        let matrix = correlation_matrix(&table, &[0, 1, 2]);
        assert_eq!(matrix.values[0][0], Some(1.0));

        let pair = matrix.strongest_pair(0.8).expect("pair");
        assert_eq!((pair.left.as_str(), pair.right.as_str()), ("a", "c"));
        assert!((pair.coefficient - 1.0).abs() < 1e-9);
        assert!(matrix.strongest_pair(1.0).is_none());
    }

    #[test]
    fn strongest_pair_ties_resolve_by_column_order() {
        let raw = ["3", "1", "4", "1", "5"];
        let table = Table::new(vec![
            Column::from_raw("x", &raw),
            Column::from_raw("y", &raw),
            Column::from_raw("z", &raw),
        ])
        .expect("table");
        let pair = correlation_matrix(&table, &[0, 1, 2])
            .strongest_pair(0.5)
            .expect("pair");
        assert_eq!((pair.left.as_str(), pair.right.as_str()), ("x", "y"));
    }

    #[test]
    fn heatmap_lists_columns_on_both_axes() {
        let table = Table::new(vec![
            Column::from_raw("a", &["1", "2"]),
            Column::from_raw("b", &["2", "1"]),
        ])
        .expect("table");
        let spec = heatmap(&correlation_matrix(&table, &[0, 1]));
        let json = serde_json::to_value(&spec).expect("json");
        assert_eq!(json["name"], HEATMAP_KEY);
        assert_eq!(json["data"][0]["type"], "heatmap");
        assert_eq!(json["data"][0]["x"], serde_json::json!(["a", "b"]));
        let r = json["data"][0]["z"][0][1].as_f64().expect("coefficient");
        assert!(r < -0.99);
    }
}
