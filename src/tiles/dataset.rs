// Tile dataset adapter — an indexable sequence of transformed tiles.

use super::transform::TileTransform;
use super::TileStack;

/// Wraps a tile stack as an indexable sequence of length
/// `tiles × repetitions`, applying the transform per access.
///
/// `repetitions == 1` is the single unaugmented pass. Higher values
/// repeat the tiles; the augmentation transform itself is a pass-through,
/// so repeats are only meaningful to the run metadata.
pub struct TileDataset {
    stack: TileStack,
    transform: TileTransform,
    repetitions: usize,
}

impl TileDataset {
    pub fn new(stack: TileStack, transform: TileTransform, repetitions: usize) -> Self {
        Self {
            stack,
            transform,
            repetitions,
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len() * self.repetitions
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of f32 values per transformed tile.
    pub fn item_len(&self) -> usize {
        self.transform.output_len()
    }

    /// Transform item `i` into a CHW float tensor. `i` must be below
    /// `len()`.
    pub fn get(&self, i: usize) -> Vec<f32> {
        let tile = self.stack.tile(i % self.stack.len());
        self.transform.apply(&tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn stack_of(n: usize) -> TileStack {
        let tiles: Vec<RgbImage> = (0..n)
            .map(|i| RgbImage::from_pixel(8, 8, image::Rgb([i as u8, 0, 0])))
            .collect();
        TileStack::from_images(&tiles).unwrap()
    }

    #[test]
    fn test_len_is_tile_count_for_single_pass() {
        let ds = TileDataset::new(stack_of(10), TileTransform::imagenet(), 1);
        assert_eq!(ds.len(), 10);
        assert!(!ds.is_empty());
    }

    #[test]
    fn test_len_scales_with_repetitions() {
        let ds = TileDataset::new(stack_of(3), TileTransform::imagenet(), 2);
        assert_eq!(ds.len(), 6);
    }

    #[test]
    fn test_repeated_indices_wrap_to_the_same_tile() {
        let ds = TileDataset::new(stack_of(3), TileTransform::imagenet(), 2);
        assert_eq!(ds.get(1), ds.get(4));
    }

    #[test]
    fn test_empty_stack_is_tolerated() {
        let ds = TileDataset::new(
            TileStack::from_images(&[]).unwrap(),
            TileTransform::imagenet(),
            1,
        );
        assert_eq!(ds.len(), 0);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_get_applies_the_transform() {
        let ds = TileDataset::new(stack_of(2), TileTransform::imagenet(), 1);
        assert_eq!(ds.get(0).len(), ds.item_len());
        assert_eq!(ds.item_len(), 3 * 224 * 224);
    }
}
