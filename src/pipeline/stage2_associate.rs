use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::input::ground_truth::GroundTruth;
use crate::model::records::{PredictionRecord, ResultAnnotation};

#[derive(Debug, Error)]
pub enum AssociationError {
    #[error("failed to write result artifact {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read result artifact {}: {reason}", path.display())]
    Reload { path: PathBuf, reason: String },
    #[error(
        "prediction references image id {image_id}, which is not in the ground truth \
         ({unknown} unknown image ids in total)"
    )]
    UnknownImageId { image_id: u64, unknown: usize },
}

/// Predictions registered against the ground truth, backed by the temporary
/// artifact the external scorer reads. The artifact is removed when the
/// set is dropped.
#[derive(Debug)]
pub struct ResultSet {
    artifact: NamedTempFile,
    annotations: Vec<ResultAnnotation>,
}

impl ResultSet {
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }

    pub fn annotations(&self) -> &[ResultAnnotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }
}

pub fn run_stage2(
    ground_truth: &GroundTruth,
    records: &[PredictionRecord],
) -> Result<ResultSet, AssociationError> {
    let artifact = write_artifact(records)?;
    let annotations = load_results(ground_truth, artifact.path())?;
    tracing::info!(
        results = annotations.len(),
        artifact = %artifact.path().display(),
        "registered predictions against ground truth"
    );
    Ok(ResultSet {
        artifact,
        annotations,
    })
}

fn write_artifact(records: &[PredictionRecord]) -> Result<NamedTempFile, AssociationError> {
    let mut file = tempfile::Builder::new()
        .prefix("capeval-res-")
        .suffix(".json")
        .tempfile()
        .map_err(|source| AssociationError::Artifact {
            path: std::env::temp_dir(),
            source,
        })?;
    let path = file.path().to_path_buf();
    let artifact_err = |source: std::io::Error| AssociationError::Artifact {
        path: path.clone(),
        source,
    };

    let mut w = BufWriter::new(file.as_file_mut());
    serde_json::to_writer(&mut w, records).map_err(|e| artifact_err(std::io::Error::other(e)))?;
    w.flush().map_err(artifact_err)?;
    drop(w);
    Ok(file)
}

/// Reads a results file back and ties each record to the ground truth:
/// every image id must be known, and results are numbered from 1.
pub fn load_results(
    ground_truth: &GroundTruth,
    path: &Path,
) -> Result<Vec<ResultAnnotation>, AssociationError> {
    let reload_err = |reason: String| AssociationError::Reload {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| reload_err(e.to_string()))?;
    let records: Vec<PredictionRecord> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| reload_err(e.to_string()))?;

    let unknown: Vec<u64> = records
        .iter()
        .map(|r| r.image_id)
        .filter(|&id| !ground_truth.contains_image(id))
        .collect();
    if let Some(&image_id) = unknown.first() {
        return Err(AssociationError::UnknownImageId {
            image_id,
            unknown: unknown.len(),
        });
    }

    let without_refs = records
        .iter()
        .filter(|r| ground_truth.captions_for(r.image_id) == 0)
        .count();
    if without_refs > 0 {
        tracing::warn!(
            count = without_refs,
            "predictions for images without reference captions"
        );
    }

    Ok(records
        .into_iter()
        .enumerate()
        .map(|(idx, r)| ResultAnnotation {
            id: idx as u64 + 1,
            image_id: r.image_id,
            caption: r.caption,
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_associate.rs"]
mod tests;
