// Preprocessing transform: resize → center-crop → normalize.
//
// Mirrors the pipelines the pretrained encoders were published with:
// shorter-side resize, 224 center crop, ImageNet mean/std, CHW float
// output ready for batching.

use image::imageops::{self, FilterType};
use image::RgbImage;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Side length of the cropped encoder input.
pub const CROP_SIZE: u32 = 224;

#[derive(Debug, Clone)]
pub struct TileTransform {
    resize: u32,
    filter: FilterType,
    mean: [f32; 3],
    std: [f32; 3],
}

impl TileTransform {
    /// Shorter-side resize to 224, bilinear (CTransPath, UNI).
    pub fn imagenet() -> Self {
        Self {
            resize: CROP_SIZE,
            filter: FilterType::Triangle,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// Shorter-side resize to 256, bicubic (GigaPath).
    pub fn imagenet_bicubic() -> Self {
        Self {
            resize: 256,
            filter: FilterType::CatmullRom,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// Number of f32 values produced per tile (3 × 224 × 224).
    pub fn output_len(&self) -> usize {
        3 * (CROP_SIZE * CROP_SIZE) as usize
    }

    /// Resize, center-crop and normalize one tile into CHW floats.
    pub fn apply(&self, tile: &RgbImage) -> Vec<f32> {
        let resized = resize_shorter_side(tile, self.resize, self.filter);
        let cropped = center_crop(&resized, CROP_SIZE);

        let mut out = Vec::with_capacity(self.output_len());
        for c in 0..3 {
            for y in 0..CROP_SIZE {
                for x in 0..CROP_SIZE {
                    let v = cropped.get_pixel(x, y).0[c] as f32 / 255.0;
                    out.push((v - self.mean[c]) / self.std[c]);
                }
            }
        }
        out
    }
}

/// Scale so the shorter side equals `target`, preserving aspect ratio.
fn resize_shorter_side(img: &RgbImage, target: u32, filter: FilterType) -> RgbImage {
    let (w, h) = img.dimensions();
    if w.min(h) == target {
        return img.clone();
    }
    let (nw, nh) = if w <= h {
        (target, (h as u64 * target as u64 / w as u64).max(1) as u32)
    } else {
        ((w as u64 * target as u64 / h as u64).max(1) as u32, target)
    };
    imageops::resize(img, nw, nh, filter)
}

fn center_crop(img: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if (w, h) == (size, size) {
        return img.clone();
    }
    let x = w.saturating_sub(size) / 2;
    let y = h.saturating_sub(size) / 2;
    imageops::crop_imm(img, x, y, size, size).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_len() {
        assert_eq!(TileTransform::imagenet().output_len(), 3 * 224 * 224);
        assert_eq!(TileTransform::imagenet_bicubic().output_len(), 3 * 224 * 224);
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let img = RgbImage::new(300, 400);
        let resized = resize_shorter_side(&img, 224, FilterType::Triangle);
        // 400 * 224 / 300 = 298
        assert_eq!(resized.dimensions(), (224, 298));

        let img = RgbImage::new(400, 300);
        let resized = resize_shorter_side(&img, 224, FilterType::Triangle);
        assert_eq!(resized.dimensions(), (298, 224));
    }

    #[test]
    fn test_resize_noop_when_already_at_target() {
        let img = RgbImage::new(224, 512);
        let resized = resize_shorter_side(&img, 224, FilterType::Triangle);
        assert_eq!(resized.dimensions(), (224, 512));
    }

    #[test]
    fn test_center_crop_takes_the_middle() {
        let mut img = RgbImage::new(4, 4);
        img.put_pixel(1, 1, image::Rgb([9, 9, 9]));
        let cropped = center_crop(&img, 2);
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.get_pixel(0, 0).0, [9, 9, 9]);
    }

    #[test]
    fn test_uniform_tile_normalizes_per_channel() {
        // A uniform zero tile maps each channel to (0 - mean) / std
        let img = RgbImage::new(224, 224);
        let out = TileTransform::imagenet().apply(&img);
        assert_eq!(out.len(), 3 * 224 * 224);

        let plane = (224 * 224) as usize;
        for c in 0..3 {
            let expected = (0.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            assert!((out[c * plane] - expected).abs() < 1e-6);
            assert!((out[c * plane + plane - 1] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_apply_upscales_small_tiles() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let out = TileTransform::imagenet().apply(&img);
        assert_eq!(out.len(), 3 * 224 * 224);
        // White stays white through interpolation
        let expected = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!((out[0] - expected).abs() < 1e-4);
    }
}
