// Tile-directory input for the CLI.
//
// Tiling is a separate upstream tool; the CLI consumes its output: a
// directory of equally-sized tile images whose file names carry the tile
// coordinates, e.g. `tumor_001_x12544_y8960.png` or `12544_8960.jpg`.

use std::path::{Path, PathBuf};

use image::RgbImage;
use regex_lite::Regex;
use tracing::warn;

use super::{TileCoord, TileStack};
use crate::error::ExtractError;

const TILE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Load every tile image under `dir`, row-major by coordinate.
///
/// Files without parseable coordinates are skipped with a warning. An
/// empty directory yields an empty stack.
pub fn load_tile_dir(dir: &Path) -> Result<(TileStack, Vec<TileCoord>), ExtractError> {
    let tagged = Regex::new(r"x(\d+)[_-]y(\d+)").expect("valid pattern");
    let bare = Regex::new(r"^(\d+)[_-](\d+)$").expect("valid pattern");

    let mut entries: Vec<(TileCoord, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !has_tile_extension(&path) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match parse_coords(stem, &tagged, &bare) {
            Some(coord) => entries.push((coord, path)),
            None => warn!(file = %path.display(), "no tile coordinates in file name, skipping"),
        }
    }
    entries.sort_by_key(|(c, _)| (c.y, c.x));

    let mut images: Vec<RgbImage> = Vec::with_capacity(entries.len());
    for (_, path) in &entries {
        images.push(image::open(path)?.to_rgb8());
    }
    let stack = TileStack::from_images(&images)?;
    let coords = entries.into_iter().map(|(c, _)| c).collect();
    Ok((stack, coords))
}

fn has_tile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn parse_coords(stem: &str, tagged: &Regex, bare: &Regex) -> Option<TileCoord> {
    let caps = tagged.captures(stem).or_else(|| bare.captures(stem))?;
    let x = caps.get(1)?.as_str().parse().ok()?;
    let y = caps.get(2)?.as_str().parse().ok()?;
    Some(TileCoord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regexes() -> (Regex, Regex) {
        (
            Regex::new(r"x(\d+)[_-]y(\d+)").unwrap(),
            Regex::new(r"^(\d+)[_-](\d+)$").unwrap(),
        )
    }

    #[test]
    fn test_parse_tagged_stem() {
        let (tagged, bare) = regexes();
        assert_eq!(
            parse_coords("tumor_001_x12544_y8960", &tagged, &bare),
            Some(TileCoord { x: 12544, y: 8960 })
        );
    }

    #[test]
    fn test_parse_bare_stem() {
        let (tagged, bare) = regexes();
        assert_eq!(
            parse_coords("12544_8960", &tagged, &bare),
            Some(TileCoord { x: 12544, y: 8960 })
        );
    }

    #[test]
    fn test_parse_rejects_unrelated_names() {
        let (tagged, bare) = regexes();
        assert_eq!(parse_coords("thumbnail", &tagged, &bare), None);
        assert_eq!(parse_coords("macro_image_2", &tagged, &bare), None);
    }

    #[test]
    fn test_load_dir_sorts_row_major() {
        let dir = tempfile::tempdir().unwrap();
        for (x, y, v) in [(512u32, 0u32, 10u8), (0, 0, 20), (0, 512, 30)] {
            let img = RgbImage::from_pixel(4, 4, image::Rgb([v, v, v]));
            img.save(dir.path().join(format!("x{x}_y{y}.png"))).unwrap();
        }

        let (stack, coords) = load_tile_dir(dir.path()).unwrap();
        assert_eq!(stack.len(), 3);
        assert_eq!(
            coords,
            vec![
                TileCoord { x: 0, y: 0 },
                TileCoord { x: 512, y: 0 },
                TileCoord { x: 0, y: 512 },
            ]
        );
        // Pixel data follows the sorted coordinate order
        assert_eq!(stack.tile(0).get_pixel(0, 0).0[0], 20);
        assert_eq!(stack.tile(1).get_pixel(0, 0).0[0], 10);
        assert_eq!(stack.tile(2).get_pixel(0, 0).0[0], 30);
    }

    #[test]
    fn test_load_dir_skips_files_without_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(4, 4);
        img.save(dir.path().join("x0_y0.png")).unwrap();
        img.save(dir.path().join("overview.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a tile").unwrap();

        let (stack, coords) = load_tile_dir(dir.path()).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(coords.len(), 1);
    }

    #[test]
    fn test_load_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (stack, coords) = load_tile_dir(dir.path()).unwrap();
        assert!(stack.is_empty());
        assert!(coords.is_empty());
    }
}
