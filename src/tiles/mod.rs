// Tile pixel data — the hand-off format from the upstream
// tiling/normalization stage.

pub mod dataset;
pub mod dir;
pub mod loader;
pub mod transform;

use image::RgbImage;

use crate::error::ExtractError;

/// (x, y) position of a tile on the slide, in slide pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

/// In-memory stack of RGB tiles in NHWC layout, one per coordinate.
///
/// Ownership is transient: the stack is moved into the dataset and
/// dropped once the run's tensors have been produced.
pub struct TileStack {
    data: Vec<u8>,
    count: usize,
    height: u32,
    width: u32,
}

impl TileStack {
    /// Wrap a flat NHWC u8 buffer. The buffer length must equal
    /// `count * height * width * 3`.
    pub fn new(data: Vec<u8>, count: usize, height: u32, width: u32) -> Result<Self, ExtractError> {
        let expected = count * height as usize * width as usize * 3;
        if data.len() != expected {
            return Err(ExtractError::TileShape(format!(
                "{} bytes for {count} tiles of {width}x{height}x3 (expected {expected})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            count,
            height,
            width,
        })
    }

    /// Build a stack from decoded tile images, which must all share the
    /// same dimensions. An empty slice yields an empty stack.
    pub fn from_images(images: &[RgbImage]) -> Result<Self, ExtractError> {
        let Some(first) = images.first() else {
            return Self::new(Vec::new(), 0, 0, 0);
        };
        let (width, height) = first.dimensions();
        let tile_len = width as usize * height as usize * 3;
        let mut data = Vec::with_capacity(images.len() * tile_len);
        for img in images {
            if img.dimensions() != (width, height) {
                return Err(ExtractError::TileShape(format!(
                    "tile of {}x{} in a stack of {width}x{height}",
                    img.width(),
                    img.height()
                )));
            }
            data.extend_from_slice(img.as_raw());
        }
        Self::new(data, images.len(), height, width)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copy tile `i` out of the stack as an image object.
    pub fn tile(&self, i: usize) -> RgbImage {
        let tile_len = self.height as usize * self.width as usize * 3;
        let slice = &self.data[i * tile_len..(i + 1) * tile_len];
        RgbImage::from_raw(self.width, self.height, slice.to_vec())
            .expect("stack dimensions validated at construction")
    }
}
