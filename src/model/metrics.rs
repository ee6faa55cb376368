use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Bleu1,
    Bleu2,
    Bleu3,
    Bleu4,
    Meteor,
    RougeL,
    Cider,
    Spice,
}

pub const CANONICAL_ORDER: [Metric; 8] = [
    Metric::Bleu1,
    Metric::Bleu2,
    Metric::Bleu3,
    Metric::Bleu4,
    Metric::Meteor,
    Metric::RougeL,
    Metric::Cider,
    Metric::Spice,
];

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Bleu1 => "Bleu_1",
            Metric::Bleu2 => "Bleu_2",
            Metric::Bleu3 => "Bleu_3",
            Metric::Bleu4 => "Bleu_4",
            Metric::Meteor => "METEOR",
            Metric::RougeL => "ROUGE_L",
            Metric::Cider => "CIDEr",
            Metric::Spice => "SPICE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CANONICAL_ORDER.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spelling of NaN and the infinities wherever a score leaves the process
/// as text. JSON has no literal for them, so they travel as strings.
pub fn non_finite_token(score: f64) -> Option<&'static str> {
    if score.is_nan() {
        Some("NaN")
    } else if score == f64::INFINITY {
        Some("Infinity")
    } else if score == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

pub fn parse_non_finite_token(token: &str) -> Option<f64> {
    match token {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Metric name -> score for one run, in the order the scorer reported them.
/// Names outside the canonical set are kept; only the tabular view drops them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricScoreSet {
    scores: IndexMap<String, f64>,
}

impl MetricScoreSet {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Canonical columns present in the set; never inserts placeholders.
    pub fn canonical(&self) -> Vec<(Metric, f64)> {
        CANONICAL_ORDER
            .into_iter()
            .filter_map(|m| self.get(m.name()).map(|score| (m, score)))
            .collect()
    }

    /// Collected names with no canonical column.
    pub fn non_canonical(&self) -> Vec<&str> {
        self.scores
            .keys()
            .map(String::as_str)
            .filter(|name| Metric::from_name(name).is_none())
            .collect()
    }
}

impl Serialize for MetricScoreSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scores.len()))?;
        for (name, &score) in &self.scores {
            match non_finite_token(score) {
                Some(token) => map.serialize_entry(name, token)?,
                None => map.serialize_entry(name, &score)?,
            }
        }
        map.end()
    }
}

impl FromIterator<(String, f64)> for MetricScoreSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        MetricScoreSet {
            scores: iter.into_iter().collect(),
        }
    }
}

impl From<IndexMap<String, f64>> for MetricScoreSet {
    fn from(scores: IndexMap<String, f64>) -> Self {
        MetricScoreSet { scores }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/metrics.rs"]
mod tests;
