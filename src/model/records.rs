use serde::{Deserialize, Serialize};

/// One normalized prediction, in the shape COCO-style scorers ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub image_id: u64,
    pub caption: String,
}

/// A prediction after association with the ground truth. `id` follows the
/// 1-based numbering COCO assigns to loaded results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub caption: String,
}
