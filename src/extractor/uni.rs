// UNI encoder — hub-distributed weights resolved from the resources root.
//
// Access to the weights requires accepting the authors' license upstream,
// so the checkpoint must be installed out of band (see `stamp
// fetch-asset`). The reported name embeds the weight file's digest so a
// run is traceable to the exact weights it used.

use std::path::Path;

use tracing::info;

use super::assets::UNI_CHECKPOINT;
use super::digest::file_digest;
use super::onnx::OnnxEncoder;
use super::{Device, Extractor};
use crate::error::ExtractError;
use crate::tiles::transform::TileTransform;

pub fn init(resources_dir: &Path, device: Device) -> Result<Extractor, ExtractError> {
    let checkpoint = resources_dir.join(UNI_CHECKPOINT);
    let digest = file_digest(&checkpoint)?;

    let encoder = OnnxEncoder::load(&checkpoint, device)?;
    let name = format!("mahmood-uni-{}", &digest[..8]);
    info!(model = %name, "UNI encoder initialised");

    Ok(Extractor {
        encoder: Box::new(encoder),
        slide_encoder: None,
        transform: TileTransform::imagenet(),
        name,
    })
}
