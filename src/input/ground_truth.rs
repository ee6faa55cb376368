use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::input::{InputError, read_json};

pub const PLACEHOLDER_INFO_DESCRIPTION: &str = "DLC-Bench";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub image_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<Value>>,
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read-only reference corpus for one run, indexed by image id.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    source: PathBuf,
    dataset: CocoDataset,
    image_ids: BTreeSet<u64>,
    captions_per_image: BTreeMap<u64, usize>,
    patched: Vec<&'static str>,
}

impl GroundTruth {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let malformed = |reason: String| InputError::MalformedGroundTruth {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value = read_json(path)?.map_err(malformed)?;
        let Value::Object(object) = &value else {
            return Err(malformed("top-level value is not an object".to_string()));
        };
        for field in ["images", "annotations"] {
            match object.get(field) {
                None => {
                    return Err(InputError::MissingField {
                        path: path.to_path_buf(),
                        field,
                    });
                }
                Some(Value::Array(_)) => {}
                Some(_) => return Err(malformed(format!("`{field}` is not an array"))),
            }
        }

        let dataset: CocoDataset =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        let gt = GroundTruth::from_dataset(path.to_path_buf(), dataset);

        tracing::info!(
            path = %path.display(),
            images = gt.n_images(),
            annotations = gt.n_annotations(),
            "loaded ground truth"
        );
        if gt.n_captions() == 0 {
            tracing::warn!("ground truth carries no reference captions; scores will be meaningless");
        }
        Ok(gt)
    }

    pub fn from_dataset(source: PathBuf, dataset: CocoDataset) -> Self {
        let image_ids = dataset.images.iter().map(|img| img.id).collect();
        let mut captions_per_image = BTreeMap::new();
        for ann in &dataset.annotations {
            if ann.caption.is_some() {
                *captions_per_image.entry(ann.image_id).or_insert(0) += 1;
            }
        }
        GroundTruth {
            source,
            dataset,
            image_ids,
            captions_per_image,
            patched: Vec::new(),
        }
    }

    /// Synthesizes the top-level fields the scoring toolkit insists on.
    /// Returns the names of the fields that had to be filled in.
    pub fn ensure_compat_fields(&mut self) -> &[&'static str] {
        if self.dataset.info.is_none() {
            self.dataset.info = Some(json!({ "description": PLACEHOLDER_INFO_DESCRIPTION }));
            self.patched.push("info");
        }
        if self.dataset.licenses.is_none() {
            self.dataset.licenses = Some(Vec::new());
            self.patched.push("licenses");
        }
        &self.patched
    }

    pub fn is_patched(&self) -> bool {
        !self.patched.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dataset(&self) -> &CocoDataset {
        &self.dataset
    }

    pub fn contains_image(&self, image_id: u64) -> bool {
        self.image_ids.contains(&image_id)
    }

    pub fn n_images(&self) -> usize {
        self.image_ids.len()
    }

    pub fn n_annotations(&self) -> usize {
        self.dataset.annotations.len()
    }

    pub fn n_captions(&self) -> usize {
        self.captions_per_image.values().sum()
    }

    pub fn captions_for(&self, image_id: u64) -> usize {
        self.captions_per_image.get(&image_id).copied().unwrap_or(0)
    }
}
