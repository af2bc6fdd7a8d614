// Encoder traits — the seam between the pipeline and the model runtime.
//
// The pipeline only sees these traits; the ONNX-backed implementations
// live in onnx.rs. Tests drive the pipeline with in-memory fakes.

use half::f16;
use ndarray::Array2;

use crate::error::ExtractError;
use crate::tiles::loader::PixelBatch;

/// One batch of embeddings, row-major, already cast to half precision.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    pub data: Vec<f16>,
    pub rows: usize,
    pub dim: usize,
}

/// Per-tile encoder: a fixed-size pixel batch in, one embedding row per
/// tile out.
pub trait TileEncoder: Send {
    fn encode(&mut self, batch: PixelBatch) -> Result<FeatureBatch, ExtractError>;
}

/// Slide-level aggregation encoder: many tile embeddings in, a single
/// slide embedding out.
pub trait SlideEncoder: Send {
    fn aggregate(&mut self, feats: &Array2<f16>) -> Result<FeatureBatch, ExtractError>;
}
