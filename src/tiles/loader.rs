// Batch loader — worker-parallel tile preprocessing with prefetch.
//
// A loader thread owns a rayon pool sized to the configured cores,
// transforms tiles batch by batch, and sends prepared batches through a
// bounded channel so preprocessing overlaps with inference on the
// consuming side. No shuffling; the final partial batch is kept.

use std::sync::mpsc;
use std::thread;

use rayon::prelude::*;
use tracing::warn;

use super::dataset::TileDataset;
use super::transform::CROP_SIZE;

/// Batches buffered ahead of the consumer.
const PREFETCH_DEPTH: usize = 2;

/// One batch of transformed tiles, flattened NCHW.
pub struct PixelBatch {
    pub data: Vec<f32>,
    pub len: usize,
    pub side: u32,
}

impl PixelBatch {
    pub fn shape(&self) -> [i64; 4] {
        [self.len as i64, 3, self.side as i64, self.side as i64]
    }
}

pub struct BatchLoader {
    rx: Option<mpsc::Receiver<PixelBatch>>,
    handle: Option<thread::JoinHandle<()>>,
    num_batches: usize,
}

impl BatchLoader {
    /// Spawn the loader over `dataset`, consuming it.
    pub fn new(dataset: TileDataset, batch_size: usize, cores: usize) -> Self {
        let batch_size = batch_size.max(1);
        let n = dataset.len();
        let num_batches = n.div_ceil(batch_size);

        let (tx, rx) = mpsc::sync_channel(PREFETCH_DEPTH);
        let handle = thread::spawn(move || {
            let pool = match rayon::ThreadPoolBuilder::new().num_threads(cores).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "worker pool unavailable, transforming on the loader thread");
                    None
                }
            };

            for start in (0..n).step_by(batch_size) {
                let end = (start + batch_size).min(n);
                let tensors: Vec<Vec<f32>> = match &pool {
                    Some(pool) => pool.install(|| {
                        (start..end)
                            .into_par_iter()
                            .map(|i| dataset.get(i))
                            .collect()
                    }),
                    None => (start..end).map(|i| dataset.get(i)).collect(),
                };

                let mut data = Vec::with_capacity((end - start) * dataset.item_len());
                for t in &tensors {
                    data.extend_from_slice(t);
                }
                let batch = PixelBatch {
                    data,
                    len: end - start,
                    side: CROP_SIZE,
                };
                if tx.send(batch).is_err() {
                    // Consumer hung up (error mid-run); stop preparing
                    break;
                }
            }
        });

        Self {
            rx: Some(rx),
            handle: Some(handle),
            num_batches,
        }
    }

    pub fn num_batches(&self) -> usize {
        self.num_batches
    }
}

impl Iterator for BatchLoader {
    type Item = PixelBatch;

    fn next(&mut self) -> Option<PixelBatch> {
        self.rx.as_ref()?.recv().ok()
    }
}

impl Drop for BatchLoader {
    fn drop(&mut self) {
        // Drop the receiver first so a blocked sender unblocks
        self.rx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::transform::{TileTransform, IMAGENET_MEAN, IMAGENET_STD};
    use crate::tiles::TileStack;
    use image::RgbImage;

    fn dataset_of(n: usize) -> TileDataset {
        let tiles: Vec<RgbImage> = (0..n)
            .map(|i| RgbImage::from_pixel(8, 8, image::Rgb([(i * 20) as u8, 0, 0])))
            .collect();
        TileDataset::new(
            TileStack::from_images(&tiles).unwrap(),
            TileTransform::imagenet(),
            1,
        )
    }

    #[test]
    fn test_partial_final_batch_is_kept() {
        let loader = BatchLoader::new(dataset_of(10), 4, 2);
        assert_eq!(loader.num_batches(), 3);
        let lens: Vec<usize> = loader.map(|b| b.len).collect();
        assert_eq!(lens, vec![4, 4, 2]);
    }

    #[test]
    fn test_single_batch_when_under_batch_size() {
        let loader = BatchLoader::new(dataset_of(10), 32, 2);
        assert_eq!(loader.num_batches(), 1);
        let batches: Vec<PixelBatch> = loader.collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len, 10);
        assert_eq!(batches[0].data.len(), 10 * 3 * 224 * 224);
    }

    #[test]
    fn test_empty_dataset_yields_no_batches() {
        let mut loader = BatchLoader::new(dataset_of(0), 32, 2);
        assert_eq!(loader.num_batches(), 0);
        assert!(loader.next().is_none());
    }

    #[test]
    fn test_tile_order_is_preserved() {
        // Red channel value increases with tile index; the first output
        // value of each tile slice must be strictly increasing.
        let loader = BatchLoader::new(dataset_of(6), 2, 2);
        let item_len = 3 * 224 * 224;
        let mut firsts = Vec::new();
        for batch in loader {
            for t in 0..batch.len {
                firsts.push(batch.data[t * item_len]);
            }
        }
        assert_eq!(firsts.len(), 6);
        for pair in firsts.windows(2) {
            assert!(pair[0] < pair[1], "tiles out of order: {firsts:?}");
        }
    }

    #[test]
    fn test_batch_values_match_direct_transform() {
        let ds = dataset_of(3);
        let expected = ds.get(2);
        let loader = BatchLoader::new(dataset_of(3), 2, 1);
        let batches: Vec<PixelBatch> = loader.collect();
        assert_eq!(batches[1].data, expected);

        // Sanity: the normalized value for channel 0 of tile 2 is
        // (40/255 - mean) / std
        let v = (40.0 / 255.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!((batches[1].data[0] - v).abs() < 1e-4);
    }
}
