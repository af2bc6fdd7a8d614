// CTransPath encoder — the digest-gated variant.
//
// The checkpoint is only trusted after its streamed SHA-256 matches the
// pinned digest; an unintended or corrupted file fails initialization
// before any session is built.

use std::path::Path;

use tracing::info;

use super::assets::CTRANSPATH_CHECKPOINT;
use super::digest::verify_digest;
use super::onnx::OnnxEncoder;
use super::{Device, Extractor};
use crate::error::ExtractError;
use crate::tiles::transform::TileTransform;

/// Pinned SHA-256 of the published CTransPath checkpoint.
pub const CTRANSPATH_DIGEST: &str =
    "7c998680060c8743551a412583fac689db43cec07053b72dfec6dcd810113539";

pub fn init(resources_dir: &Path, device: Device) -> Result<Extractor, ExtractError> {
    let checkpoint = resources_dir.join(CTRANSPATH_CHECKPOINT);
    let digest = verify_digest(&checkpoint, CTRANSPATH_DIGEST)?;

    let encoder = OnnxEncoder::load(&checkpoint, device)?;
    let name = format!("xiyuewang-ctranspath-{}", &digest[..8]);
    info!(model = %name, "CTransPath encoder initialised");

    Ok(Extractor {
        encoder: Box::new(encoder),
        slide_encoder: None,
        transform: TileTransform::imagenet(),
        name,
    })
}
