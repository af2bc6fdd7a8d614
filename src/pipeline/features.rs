// Batch inference loop — tiles in, feature archive out.
//
// The run metadata sidecar is written before processing starts; the
// archive itself is only written after every batch has succeeded.

use std::fs::File;
use std::path::{Path, PathBuf};

use half::f16;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info};

use crate::archive::{self, FeatureArchive};
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::tiles::dataset::TileDataset;
use crate::tiles::loader::BatchLoader;
use crate::tiles::{TileCoord, TileStack};
use crate::EXTRACT_VERSION;

/// Knobs for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Additional augmented passes over the dataset. 0 means a single
    /// unaugmented pass. The augmentation transform is a pass-through;
    /// the value is recorded in the run metadata.
    pub augmented_repetitions: usize,
    /// Worker threads for tile preprocessing.
    pub cores: usize,
    /// Tiles per inference batch.
    pub batch_size: usize,
    /// Whether the tiles were stain-normalized upstream.
    pub normalized: bool,
    /// Microns covered by one patch edge.
    pub target_microns: u32,
    /// Patch edge length in pixels.
    pub patch_size: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            augmented_repetitions: 0,
            cores: 8,
            batch_size: 32,
            normalized: true,
            target_microns: 256,
            patch_size: 224,
        }
    }
}

/// Run metadata sidecar, shared by every slide of a batch job.
#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    extractor: &'a str,
    augmented_repetitions: usize,
    normalized: bool,
    microns: u32,
    patch_size: u32,
}

/// Extract features for one slide and write `<out_stem>.h5`.
///
/// `out_stem` is the per-slide output path without extension; the
/// `info.json` sidecar lands next to it. `coords` must be index-aligned
/// with the tile stack. Returns the archive path.
pub fn extract_features(
    extractor: &mut Extractor,
    tiles: TileStack,
    coords: Vec<TileCoord>,
    out_stem: &Path,
    opts: &ExtractOptions,
) -> Result<PathBuf, ExtractError> {
    let extractor_string = format!("STAMP-extract-{}_{}", EXTRACT_VERSION, extractor.name);

    let info_path = out_stem
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("info.json");
    let metadata = RunMetadata {
        extractor: &extractor_string,
        augmented_repetitions: opts.augmented_repetitions,
        normalized: opts.normalized,
        microns: opts.target_microns,
        patch_size: opts.patch_size,
    };
    serde_json::to_writer(File::create(&info_path)?, &metadata)?;

    // The stack is consumed here; tensors are produced on demand
    let dataset = TileDataset::new(tiles, extractor.transform.clone(), 1);
    let n_unaugmented = dataset.len();
    let n_augmented = 0usize;

    let loader = BatchLoader::new(dataset, opts.batch_size, opts.cores);
    let pb = ProgressBar::new(loader.num_batches() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Extracting [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let mut rows: Vec<f16> = Vec::new();
    let mut dim: Option<usize> = None;
    let mut total_rows = 0usize;
    for batch in loader {
        let out = extractor.encoder.encode(batch)?;
        match dim {
            None => dim = Some(out.dim),
            Some(first) if first != out.dim => {
                return Err(ExtractError::DimMismatch {
                    first,
                    got: out.dim,
                })
            }
            _ => {}
        }
        rows.extend_from_slice(&out.data);
        total_rows += out.rows;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let dim = dim.unwrap_or(0);
    let mut feats = Array2::from_shape_vec((total_rows, dim), rows)
        .expect("batch shapes validated during collection");

    if let Some(slide_encoder) = extractor.slide_encoder.as_mut() {
        debug!(rows = total_rows, "aggregating tile embeddings into a slide embedding");
        let out = slide_encoder.aggregate(&feats)?;
        feats = Array2::from_shape_vec((out.rows, out.dim), out.data)
            .expect("slide encoder output is a single row");
    }

    // Tile-level flags cover the unaugmented then augmented portions; a
    // slide-level matrix gets one flag per remaining row
    let augmented = if extractor.slide_encoder.is_some() {
        vec![false; feats.nrows()]
    } else {
        let mut flags = vec![false; n_unaugmented];
        flags.extend(std::iter::repeat(true).take(n_augmented));
        flags
    };

    let mut archive_path = out_stem.as_os_str().to_os_string();
    archive_path.push(".h5");
    let archive_path = PathBuf::from(archive_path);

    archive::write(
        &archive_path,
        &FeatureArchive {
            coords,
            feats,
            augmented,
            extractor: extractor_string,
        },
    )?;

    info!(
        path = %archive_path.display(),
        "feature archive written"
    );
    Ok(archive_path)
}
