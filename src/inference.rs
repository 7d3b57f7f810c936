//! Semantic type inference over a column's non-missing cells.
//!
//! Rules are tried in a fixed order and each one is all-or-nothing: a single
//! cell that does not conform disqualifies the rule and the column falls
//! through to the next. Nothing is coerced on a majority vote.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::data::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numeric,
    Categorical,
    Temporal,
    Boolean,
    Text,
}

impl SemanticType {
    pub const ALL: [SemanticType; 5] = [
        SemanticType::Numeric,
        SemanticType::Categorical,
        SemanticType::Temporal,
        SemanticType::Boolean,
        SemanticType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Categorical => "categorical",
            SemanticType::Temporal => "temporal",
            SemanticType::Boolean => "boolean",
            SemanticType::Text => "text",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SemanticType::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown semantic type '{value}'"))
    }
}

/// Classifies `values`; missing cells are skipped.
pub fn infer_type<'a, I>(values: I, cardinality_threshold: usize) -> SemanticType
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut candidate = TypeCandidate::new(cardinality_threshold);
    for value in values {
        candidate.update(value);
    }
    candidate.decide()
}

struct TypeCandidate {
    non_missing: usize,
    boolean_matches: usize,
    numeric_matches: usize,
    temporal_matches: usize,
    distinct: HashSet<String>,
    cardinality_threshold: usize,
}

impl TypeCandidate {
    fn new(cardinality_threshold: usize) -> Self {
        Self {
            non_missing: 0,
            boolean_matches: 0,
            numeric_matches: 0,
            temporal_matches: 0,
            distinct: HashSet::new(),
            cardinality_threshold,
        }
    }

    fn update(&mut self, value: &Value) {
        if value.is_missing() {
            return;
        }
        self.non_missing += 1;
        if value.as_boolean().is_some() {
            self.boolean_matches += 1;
        }
        if value.as_number().is_some() {
            self.numeric_matches += 1;
        }
        if value.as_instant().is_some() {
            self.temporal_matches += 1;
        }
        // Past the threshold the exact count no longer changes the outcome.
        if self.distinct.len() <= self.cardinality_threshold {
            self.distinct.insert(value.as_display());
        }
    }

    fn all(&self, matches: usize) -> bool {
        matches == self.non_missing
    }

    fn decide(&self) -> SemanticType {
        if self.non_missing == 0 {
            SemanticType::Text
        } else if self.all(self.boolean_matches) {
            SemanticType::Boolean
        } else if self.all(self.numeric_matches) {
            SemanticType::Numeric
        } else if self.all(self.temporal_matches) {
            SemanticType::Temporal
        } else if self.distinct.len() <= self.cardinality_threshold {
            SemanticType::Categorical
        } else {
            SemanticType::Text
        }
    }
}
