// Extractor registry — a closed set of pretrained encoder variants.
//
// Each variant initializer produces the same capability bundle: an
// evaluation-ready encoder, its preprocessing transform, and a stable
// name that ends up in the provenance stamp. Unknown extractor names are
// rejected when the configuration is parsed, not at run time.

pub mod assets;
pub mod ctranspath;
pub mod digest;
pub mod download;
pub mod gigapath;
pub mod onnx;
pub mod traits;
pub mod uni;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ExtractError;
use crate::tiles::transform::TileTransform;
use traits::{SlideEncoder, TileEncoder};

/// Inference device for encoder sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            other => Err(format!("unknown device '{other}' (expected cpu or cuda)")),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// The supported pretrained encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Ctranspath,
    Uni,
    Gigapath,
    GigapathSlide,
}

impl ExtractorKind {
    pub fn all() -> [ExtractorKind; 4] {
        [
            ExtractorKind::Ctranspath,
            ExtractorKind::Uni,
            ExtractorKind::Gigapath,
            ExtractorKind::GigapathSlide,
        ]
    }

    /// Initialize the variant: verify checkpoint integrity, build the
    /// session(s) and transform, and resolve the reported model name.
    pub fn init(self, resources_dir: &Path, device: Device) -> Result<Extractor, ExtractError> {
        match self {
            ExtractorKind::Ctranspath => ctranspath::init(resources_dir, device),
            ExtractorKind::Uni => uni::init(resources_dir, device),
            ExtractorKind::Gigapath => gigapath::init_tile(resources_dir, device),
            ExtractorKind::GigapathSlide => gigapath::init_tile_and_slide(resources_dir, device),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ctranspath" => Ok(ExtractorKind::Ctranspath),
            "uni" => Ok(ExtractorKind::Uni),
            "gigapath" => Ok(ExtractorKind::Gigapath),
            "gigapath-slide" | "gigapathslide" => Ok(ExtractorKind::GigapathSlide),
            other => Err(format!(
                "unknown extractor '{other}' (expected ctranspath, uni, gigapath or gigapath-slide)"
            )),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorKind::Ctranspath => write!(f, "ctranspath"),
            ExtractorKind::Uni => write!(f, "uni"),
            ExtractorKind::Gigapath => write!(f, "gigapath"),
            ExtractorKind::GigapathSlide => write!(f, "gigapath-slide"),
        }
    }
}

/// An initialized extraction bundle: encoder, transform, name, and an
/// optional slide-level aggregator. Constructed once per run; the
/// pipeline only reads it.
pub struct Extractor {
    pub encoder: Box<dyn TileEncoder>,
    pub slide_encoder: Option<Box<dyn SlideEncoder>>,
    pub transform: TileTransform,
    pub name: String,
}
