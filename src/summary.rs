use indexmap::IndexMap;
use itertools::Itertools;

use crate::{correlation::CorrelatedPair, inference::SemanticType, stats::ColumnProfile};

/// Dataset-level facts the summary is composed from.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub profiles: &'a IndexMap<String, ColumnProfile>,
    pub row_count: usize,
    pub column_count: usize,
    pub strongest_correlation: Option<&'a CorrelatedPair>,
    pub missingness_threshold: f64,
    /// Some text cell contains a non-ASCII character.
    pub has_special_characters: bool,
}

/// Composes the plain-language paragraph; identical input yields identical
/// text.
pub fn summarize(input: &SummaryInput<'_>) -> String {
    if input.row_count == 0 || input.column_count == 0 {
        return format!(
            "This dataset is empty: it has {} and {}.",
            counted(input.row_count, "row"),
            counted(input.column_count, "column")
        );
    }

    let mut sentences = vec![format!(
        "This dataset has {} and {}.",
        counted(input.row_count, "row"),
        counted(input.column_count, "column")
    )];

    let type_counts = SemanticType::ALL
        .iter()
        .filter_map(|ty| {
            let count = input
                .profiles
                .values()
                .filter(|profile| profile.data_type == *ty)
                .count();
            (count > 0).then(|| counted(count, &format!("{ty} column")))
        })
        .collect::<Vec<_>>();
    if !type_counts.is_empty() {
        sentences.push(format!("It contains {}.", join_phrases(&type_counts)));
    }

    if input.has_special_characters {
        sentences.push("Some values contain special (non-ASCII) characters.".to_string());
    }

    let total_missing = input
        .profiles
        .values()
        .map(|profile| profile.missing_count)
        .sum::<usize>();
    sentences.push(match total_missing {
        0 => "There are no missing values.".to_string(),
        1 => "There is 1 missing value across all columns.".to_string(),
        n => format!("There are {n} missing values across all columns."),
    });

    let sparse = input
        .profiles
        .iter()
        .filter(|(_, profile)| profile.missing_percentage > input.missingness_threshold)
        .map(|(name, profile)| format!("{name} ({:.1}%)", profile.missing_percentage))
        .collect::<Vec<_>>();
    if !sparse.is_empty() {
        sentences.push(format!(
            "High missingness (above {}%): {}.",
            input.missingness_threshold,
            sparse.iter().join(", ")
        ));
    }

    if let Some(pair) = input.strongest_correlation {
        sentences.push(format!(
            "There is a strong correlation ({:.2}) between {} and {}.",
            pair.coefficient, pair.left, pair.right
        ));
    }

    sentences.join(" ")
}

fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn join_phrases(phrases: &[String]) -> String {
    match phrases {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
