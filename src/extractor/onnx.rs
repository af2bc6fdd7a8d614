// ONNX-backed encoder implementations.
//
// Session construction is the strict-load analog: ONNX Runtime validates
// the whole graph and its initializers at build time, so a malformed or
// truncated checkpoint fails here rather than at first inference. Built
// sessions are inherently evaluation-only.

use std::path::Path;

use half::f16;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use super::traits::{FeatureBatch, SlideEncoder, TileEncoder};
use super::Device;
use crate::error::ExtractError;
use crate::tiles::loader::PixelBatch;

/// Build an evaluation-ready session from a checkpoint file.
pub fn build_session(path: &Path, device: Device) -> Result<Session, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::MissingAsset(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    build_session_from_bytes(&bytes, path, device)
}

/// Build a session from checkpoint bytes already in memory. `path` is
/// only used for diagnostics.
pub fn build_session_from_bytes(
    bytes: &[u8],
    path: &Path,
    device: Device,
) -> Result<Session, ExtractError> {
    let load = |e: ort::Error| ExtractError::ModelLoad {
        path: path.to_path_buf(),
        source: e,
    };

    let builder = Session::builder()
        .map_err(load)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(load)?;

    #[cfg(feature = "cuda")]
    let builder = if device == Device::Cuda {
        use ort::execution_providers::CUDAExecutionProvider;
        builder
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .map_err(load)?
    } else {
        builder
    };
    #[cfg(not(feature = "cuda"))]
    if device == Device::Cuda {
        tracing::warn!("cuda requested but this build has no CUDA support, running on CPU");
    }

    let session = builder.commit_from_memory(bytes).map_err(load)?;
    debug!(path = %path.display(), "ONNX session built");
    Ok(session)
}

/// Tile encoder backed by an ONNX session.
pub struct OnnxEncoder {
    session: Session,
}

impl OnnxEncoder {
    pub fn load(path: &Path, device: Device) -> Result<Self, ExtractError> {
        Ok(Self {
            session: build_session(path, device)?,
        })
    }

    pub fn from_bytes(bytes: &[u8], path: &Path, device: Device) -> Result<Self, ExtractError> {
        Ok(Self {
            session: build_session_from_bytes(bytes, path, device)?,
        })
    }
}

impl TileEncoder for OnnxEncoder {
    fn encode(&mut self, batch: PixelBatch) -> Result<FeatureBatch, ExtractError> {
        if batch.len == 0 {
            return Ok(FeatureBatch {
                data: Vec::new(),
                rows: 0,
                dim: 0,
            });
        }

        let rows = batch.len;
        let input = Tensor::from_array((batch.shape(), batch.data))
            .map_err(ExtractError::Inference)?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(ExtractError::Inference)?;
        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ExtractError::Inference)?;

        if data.len() % rows != 0 {
            return Err(ExtractError::BatchShape {
                rows,
                values: data.len(),
            });
        }
        Ok(FeatureBatch {
            data: data.iter().map(|&v| f16::from_f32(v)).collect(),
            rows,
            dim: data.len() / rows,
        })
    }
}

/// Slide-level aggregation encoder backed by an ONNX session.
///
/// Input: tile embeddings as `[1, N, D]` f32; output: one slide
/// embedding row.
pub struct OnnxSlideEncoder {
    session: Session,
}

impl OnnxSlideEncoder {
    pub fn from_bytes(bytes: &[u8], path: &Path, device: Device) -> Result<Self, ExtractError> {
        Ok(Self {
            session: build_session_from_bytes(bytes, path, device)?,
        })
    }
}

impl SlideEncoder for OnnxSlideEncoder {
    fn aggregate(&mut self, feats: &Array2<f16>) -> Result<FeatureBatch, ExtractError> {
        let (n, d) = feats.dim();
        let data: Vec<f32> = feats.iter().map(|v| v.to_f32()).collect();
        let input = Tensor::from_array(([1i64, n as i64, d as i64], data))
            .map_err(ExtractError::Inference)?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(ExtractError::Inference)?;
        let (_shape, out) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ExtractError::Inference)?;

        Ok(FeatureBatch {
            data: out.iter().map(|&v| f16::from_f32(v)).collect(),
            rows: 1,
            dim: out.len(),
        })
    }
}
