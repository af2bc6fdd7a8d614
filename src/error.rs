// Typed failure results for the extraction pipeline.
//
// The original assertion-style checks (digest gate, row-count
// post-condition) surface as Err variants so a batch slide-processing
// driver can skip a bad slide instead of terminating the whole job.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Checkpoint content hash does not match the pinned digest.
    #[error("checkpoint digest mismatch for {}: expected {expected}, got {actual}", .path.display())]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// A required checkpoint or asset file is absent.
    #[error("missing model asset: {}", .0.display())]
    MissingAsset(PathBuf),

    /// The runtime rejected the checkpoint graph (strict-load failure).
    #[error("failed to load model from {}: {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// A forward pass failed.
    #[error("inference failed: {0}")]
    Inference(#[source] ort::Error),

    /// The encoder output does not divide evenly into one row per tile.
    #[error("encoder output of {values} values does not divide into {rows} rows")]
    BatchShape { rows: usize, values: usize },

    /// The encoder changed embedding width between batches.
    #[error("inconsistent embedding width across batches: {first} then {got}")]
    DimMismatch { first: usize, got: usize },

    /// Embedding rows and augmentation flags disagree after inference.
    #[error("embedding rows ({feats}) do not match augmentation flags ({flags})")]
    RowCountMismatch { feats: usize, flags: usize },

    /// Tile pixel data inconsistent with the declared stack shape.
    #[error("tile stack shape mismatch: {0}")]
    TileShape(String),

    #[error("tile decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("archive error: {0}")]
    Archive(#[from] hdf5::Error),

    #[error("metadata serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
