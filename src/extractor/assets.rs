// Checkpoint layout under the resources root.
//
// Every supported checkpoint is license-gated by its publisher, so
// nothing is fetched implicitly; `stamp status` shows what is present
// and `stamp fetch-asset` installs a checkpoint from an explicit URL.

use std::path::{Path, PathBuf};

use super::ExtractorKind;

pub const CTRANSPATH_CHECKPOINT: &str = "ctranspath/ctranspath.onnx";
pub const UNI_CHECKPOINT: &str = "uni/vit_large_patch16_224.dinov2.uni_mass100k/model.onnx";
pub const GIGAPATH_DIR: &str = "prov-gigapath";
pub const GIGAPATH_CHECKPOINT: &str = "prov-gigapath/model.onnx";
pub const GIGAPATH_SLIDE_DIR: &str = "prov-gigapathslide";
pub const GIGAPATH_SLIDE_TILE_CHECKPOINT: &str = "prov-gigapathslide/model.onnx";
pub const GIGAPATH_SLIDE_CHECKPOINT: &str = "prov-gigapathslide/slide_model.onnx";

/// Checkpoint files a variant expects, relative to the resources root.
pub fn expected_assets(kind: ExtractorKind) -> &'static [&'static str] {
    match kind {
        ExtractorKind::Ctranspath => &[CTRANSPATH_CHECKPOINT],
        ExtractorKind::Uni => &[UNI_CHECKPOINT],
        ExtractorKind::Gigapath => &[GIGAPATH_CHECKPOINT],
        ExtractorKind::GigapathSlide => &[
            GIGAPATH_SLIDE_TILE_CHECKPOINT,
            GIGAPATH_SLIDE_CHECKPOINT,
        ],
    }
}

/// Absent checkpoint files for a variant.
pub fn missing_assets(kind: ExtractorKind, resources_dir: &Path) -> Vec<PathBuf> {
    expected_assets(kind)
        .iter()
        .map(|rel| resources_dir.join(rel))
        .filter(|p| !p.exists())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_assets() {
        for kind in ExtractorKind::all() {
            assert!(!expected_assets(kind).is_empty());
        }
    }

    #[test]
    fn test_missing_assets_lists_everything_for_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = missing_assets(ExtractorKind::GigapathSlide, dir.path());
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn test_missing_assets_shrinks_as_files_appear() {
        let dir = tempfile::tempdir().unwrap();
        let tile = dir.path().join(GIGAPATH_SLIDE_TILE_CHECKPOINT);
        std::fs::create_dir_all(tile.parent().unwrap()).unwrap();
        std::fs::write(&tile, b"weights").unwrap();

        let missing = missing_assets(ExtractorKind::GigapathSlide, dir.path());
        assert_eq!(missing.len(), 1);
        assert!(missing[0].ends_with("slide_model.onnx"));
    }
}
