// Feature archive — HDF5 container for per-slide embeddings.
//
// Layout: datasets `coords` (N×2 i32), `feats` (N×D f16), `augmented`
// (bool per row), attribute `extractor` (the provenance stamp). The
// archive is only written after inference has fully succeeded, and the
// row-count post-condition is checked before the file is created.

use std::path::Path;

use half::f16;
use hdf5::types::VarLenUnicode;
use ndarray::Array2;

use crate::error::ExtractError;
use crate::tiles::TileCoord;

pub struct FeatureArchive {
    pub coords: Vec<TileCoord>,
    pub feats: Array2<f16>,
    pub augmented: Vec<bool>,
    pub extractor: String,
}

pub fn write(path: &Path, archive: &FeatureArchive) -> Result<(), ExtractError> {
    if archive.feats.nrows() != archive.augmented.len() {
        return Err(ExtractError::RowCountMismatch {
            feats: archive.feats.nrows(),
            flags: archive.augmented.len(),
        });
    }

    let coords = Array2::from_shape_fn((archive.coords.len(), 2), |(i, j)| {
        if j == 0 {
            archive.coords[i].x
        } else {
            archive.coords[i].y
        }
    });

    let file = hdf5::File::create(path)?;
    file.new_dataset_builder()
        .with_data(&coords)
        .create("coords")?;
    file.new_dataset_builder()
        .with_data(&archive.feats)
        .create("feats")?;
    file.new_dataset_builder()
        .with_data(&archive.augmented[..])
        .create("augmented")?;

    let stamp: VarLenUnicode = archive
        .extractor
        .parse()
        .map_err(|e| hdf5::Error::from(format!("invalid extractor attribute: {e}")))?;
    file.new_attr::<VarLenUnicode>()
        .create("extractor")?
        .write_scalar(&stamp)?;

    Ok(())
}

pub fn read(path: &Path) -> Result<FeatureArchive, ExtractError> {
    let file = hdf5::File::open(path)?;
    let coords: Array2<i32> = file.dataset("coords")?.read_2d()?;
    let feats: Array2<f16> = file.dataset("feats")?.read_2d()?;
    let augmented: Vec<bool> = file.dataset("augmented")?.read_raw()?;
    let stamp: VarLenUnicode = file.attr("extractor")?.read_scalar()?;

    let coords = coords
        .rows()
        .into_iter()
        .map(|row| TileCoord {
            x: row[0],
            y: row[1],
        })
        .collect();

    Ok(FeatureArchive {
        coords,
        feats,
        augmented,
        extractor: stamp.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive(rows: usize, dim: usize) -> FeatureArchive {
        FeatureArchive {
            coords: (0..rows)
                .map(|i| TileCoord {
                    x: (i as i32) * 224,
                    y: (i as i32) * 448,
                })
                .collect(),
            feats: Array2::from_shape_fn((rows, dim), |(i, j)| {
                f16::from_f32(i as f32 + j as f32 / 16.0)
            }),
            augmented: vec![false; rows],
            extractor: "STAMP-extract-test_mock".to_string(),
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.h5");
        let archive = sample_archive(5, 8);

        write(&path, &archive).unwrap();
        let back = read(&path).unwrap();

        // Coordinates bit-exact, features f16-exact
        assert_eq!(back.coords, archive.coords);
        assert_eq!(back.feats, archive.feats);
        assert_eq!(back.augmented, archive.augmented);
        assert_eq!(back.extractor, archive.extractor);
    }

    #[test]
    fn test_row_count_mismatch_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.h5");
        let mut archive = sample_archive(5, 8);
        archive.augmented.pop();

        match write(&path, &archive) {
            Err(ExtractError::RowCountMismatch { feats, flags }) => {
                assert_eq!((feats, flags), (5, 4));
            }
            other => panic!("expected RowCountMismatch, got {other:?}"),
        }
        assert!(!path.exists(), "no partial archive may be left behind");
    }

    #[test]
    fn test_empty_archive_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.h5");
        write(&path, &sample_archive(0, 0)).unwrap();
        let back = read(&path).unwrap();
        assert!(back.coords.is_empty());
        assert_eq!(back.feats.nrows(), 0);
        assert!(back.augmented.is_empty());
    }

    #[test]
    fn test_half_precision_values_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("halves.h5");
        let mut archive = sample_archive(1, 4);
        archive.feats = Array2::from_shape_vec(
            (1, 4),
            vec![
                f16::from_f32(0.333),
                f16::from_f32(-1.5),
                f16::MAX,
                f16::MIN_POSITIVE,
            ],
        )
        .unwrap();
        archive.coords = vec![TileCoord { x: 0, y: 0 }];
        archive.augmented = vec![false];

        write(&path, &archive).unwrap();
        let back = read(&path).unwrap();
        assert_eq!(back.feats, archive.feats);
    }
}
