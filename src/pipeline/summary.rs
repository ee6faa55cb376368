use std::collections::BTreeSet;

use crate::input::ground_truth::GroundTruth;
use crate::input::predictions::PredictionMap;
use crate::model::keys::{KEY_SEPARATOR, image_prefix};

pub const SAMPLE_SIZE: usize = 5;
pub const SAMPLE_CAPTION_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSample {
    pub image: String,
    pub annotation: Option<String>,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundTruthCounts {
    pub images: usize,
    pub annotations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSummary {
    pub total: usize,
    pub unique_images: usize,
    pub avg_words: f64,
    pub min_words: usize,
    pub max_words: usize,
    pub samples: Vec<CaptionSample>,
    pub ground_truth: Option<GroundTruthCounts>,
}

impl CaptionSummary {
    /// Rows of the two-column summary table.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Predictions", self.total.to_string()),
            ("Unique Images", self.unique_images.to_string()),
            ("Avg Caption Length (words)", format!("{:.1}", self.avg_words)),
            ("Min Caption Length (words)", self.min_words.to_string()),
            ("Max Caption Length (words)", self.max_words.to_string()),
        ]
    }
}

pub fn summarize(predictions: &PredictionMap, ground_truth: Option<&GroundTruth>) -> CaptionSummary {
    let lengths: Vec<usize> = predictions
        .values()
        .map(|caption| caption.split_whitespace().count())
        .collect();

    let (avg_words, min_words, max_words) = if lengths.is_empty() {
        tracing::warn!("no predictions to summarize");
        (0.0, 0, 0)
    } else {
        let sum: usize = lengths.iter().sum();
        (
            sum as f64 / lengths.len() as f64,
            lengths.iter().copied().min().unwrap_or(0),
            lengths.iter().copied().max().unwrap_or(0),
        )
    };

    let unique_images = predictions
        .keys()
        .map(|k| image_prefix(k))
        .collect::<BTreeSet<_>>()
        .len();

    let samples = predictions
        .iter()
        .take(SAMPLE_SIZE)
        .map(|(key, caption)| sample(key, caption))
        .collect();

    CaptionSummary {
        total: predictions.len(),
        unique_images,
        avg_words,
        min_words,
        max_words,
        samples,
        ground_truth: ground_truth.map(|gt| GroundTruthCounts {
            images: gt.n_images(),
            annotations: gt.n_annotations(),
        }),
    }
}

fn sample(key: &str, caption: &str) -> CaptionSample {
    let (image, annotation) = match key.split_once(KEY_SEPARATOR) {
        Some((image, annotation)) => (image.to_string(), Some(annotation.to_string())),
        None => (key.to_string(), None),
    };
    let mut shown: String = caption.chars().take(SAMPLE_CAPTION_CHARS).collect();
    if caption.chars().count() > SAMPLE_CAPTION_CHARS {
        shown.push_str("...");
    }
    CaptionSample {
        image,
        annotation,
        caption: shown,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/summary.rs"]
mod tests;
