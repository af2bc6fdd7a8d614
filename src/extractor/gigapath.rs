// GigaPath encoders — the tile-level variant, plus the tile+slide dual
// variant whose aggregator turns N tile embeddings into one slide row.

use std::fs;
use std::path::Path;

use tracing::info;

use super::assets::{
    GIGAPATH_CHECKPOINT, GIGAPATH_DIR, GIGAPATH_SLIDE_CHECKPOINT, GIGAPATH_SLIDE_DIR,
    GIGAPATH_SLIDE_TILE_CHECKPOINT,
};
use super::onnx::{OnnxEncoder, OnnxSlideEncoder};
use super::{Device, Extractor};
use crate::error::ExtractError;
use crate::tiles::transform::TileTransform;

pub fn init_tile(resources_dir: &Path, device: Device) -> Result<Extractor, ExtractError> {
    fs::create_dir_all(resources_dir.join(GIGAPATH_DIR))?;

    let checkpoint = resources_dir.join(GIGAPATH_CHECKPOINT);
    if !checkpoint.exists() {
        return Err(ExtractError::MissingAsset(checkpoint));
    }
    let encoder = OnnxEncoder::load(&checkpoint, device)?;
    info!("GigaPath tile encoder initialised");

    Ok(Extractor {
        encoder: Box::new(encoder),
        slide_encoder: None,
        transform: TileTransform::imagenet_bicubic(),
        name: "prov-gigapath".to_string(),
    })
}

/// Load the tile encoder and the slide-level aggregator; both
/// checkpoints must be present under the variant's asset directory.
/// After a successful load, both files are rewritten from the loaded
/// bytes — an idempotent refresh of the checkpoint cache.
pub fn init_tile_and_slide(resources_dir: &Path, device: Device) -> Result<Extractor, ExtractError> {
    fs::create_dir_all(resources_dir.join(GIGAPATH_SLIDE_DIR))?;

    let tile_ckpt = resources_dir.join(GIGAPATH_SLIDE_TILE_CHECKPOINT);
    let slide_ckpt = resources_dir.join(GIGAPATH_SLIDE_CHECKPOINT);
    let tile_bytes = read_checkpoint(&tile_ckpt)?;
    let slide_bytes = read_checkpoint(&slide_ckpt)?;

    let encoder = OnnxEncoder::from_bytes(&tile_bytes, &tile_ckpt, device)?;
    let slide_encoder = OnnxSlideEncoder::from_bytes(&slide_bytes, &slide_ckpt, device)?;

    fs::write(&tile_ckpt, &tile_bytes)?;
    fs::write(&slide_ckpt, &slide_bytes)?;

    info!("GigaPath tile and slide encoders initialised");

    Ok(Extractor {
        encoder: Box::new(encoder),
        slide_encoder: Some(Box::new(slide_encoder)),
        transform: TileTransform::imagenet_bicubic(),
        name: "prov-gigapathslide".to_string(),
    })
}

fn read_checkpoint(path: &Path) -> Result<Vec<u8>, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::MissingAsset(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}
