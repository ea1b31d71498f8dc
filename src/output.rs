//! PNG output, bundle naming and small raster helpers

use image::imageops::FilterType;
use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::spritesheet::{blank, crop, paste};

/// Extension of RSI bundle directories
pub const BUNDLE_EXTENSION: &str = "rsi";

/// Save an RGBA image to a PNG file.
///
/// # Arguments
///
/// * `image` - The image to save
/// * `path` - The output file path
///
/// # Returns
///
/// * `Ok(())` on success
/// * `Err(ConvertError)` on failure
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Load a PNG as RGBA.
pub fn load_png(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Normalize a group key into a bundle name.
///
/// Lower-cases the key and turns `_` and whitespace into `-`.
///
/// ```
/// use rsikit::output::bundle_name;
///
/// assert_eq!(bundle_name("Riot_Helmet"), "riot-helmet");
/// assert_eq!(bundle_name("wall"), "wall");
/// ```
pub fn bundle_name(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c.to_ascii_lowercase() })
        .collect()
}

/// `dir/<name>.rsi`
pub fn bundle_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, BUNDLE_EXTENSION))
}

/// Whether `path` ends in `.rsi`.
pub fn is_bundle_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(BUNDLE_EXTENSION)
}

/// Bounding box `(x, y, w, h)` of pixels with non-zero alpha, or `None` if fully transparent.
pub fn opaque_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0, 0);
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] != 0 {
            found = true;
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
    }

    found.then(|| (min.0, min.1, max.0 - min.0 + 1, max.1 - min.1 + 1))
}

/// Crop to the opaque bounding box.
pub fn trim_transparent(image: &RgbaImage) -> Result<Option<RgbaImage>> {
    match opaque_bounds(image) {
        Some((x, y, w, h)) => crop(image, x, y, w, h).map(Some),
        None => Ok(None),
    }
}

/// Nearest-neighbor resize so `image` fits inside `max_w x max_h`, keeping its aspect ratio.
///
/// Images that already fit, and any image given an empty box, are returned unscaled.
pub fn fit_within(image: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if (w <= max_w && h <= max_h) || max_w == 0 || max_h == 0 {
        return image.clone();
    }
    let scale = f64::min(max_w as f64 / w as f64, max_h as f64 / h as f64);
    let new_w = ((w as f64 * scale).floor() as u32).clamp(1, max_w);
    let new_h = ((h as f64 * scale).floor() as u32).clamp(1, max_h);
    image::imageops::resize(image, new_w, new_h, FilterType::Nearest)
}

/// Paste `image` centered on a transparent `width x height` canvas, shrinking it first if needed.
pub fn center_on_canvas(image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let fitted = fit_within(image, width, height);
    let mut canvas = blank(width, height);
    let x = width.saturating_sub(fitted.width()) / 2;
    let y = height.saturating_sub(fitted.height()) / 2;
    paste(&mut canvas, &fitted, x, y)?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn test_save_png_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/box.png");
        let image = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));

        save_png(&image, &path).unwrap();
        assert_eq!(load_png(&path).unwrap(), image);
    }

    #[test]
    fn test_bundle_name() {
        assert_eq!(bundle_name("Hard Hat"), "hard-hat");
        assert_eq!(bundle_name("riot_SHIELD"), "riot-shield");
        assert_eq!(bundle_name("rifle-ammo"), "rifle-ammo");
    }

    #[test]
    fn test_bundle_path() {
        let path = bundle_path(Path::new("out"), "wall");
        assert_eq!(path, PathBuf::from("out/wall.rsi"));
        assert!(is_bundle_path(&path));
        assert!(!is_bundle_path(Path::new("out/wall")));
    }

    #[test]
    fn test_opaque_bounds() {
        let mut image = blank(8, 8);
        assert_eq!(opaque_bounds(&image), None);
        image.put_pixel(2, 3, Rgba([255, 0, 0, 255]));
        image.put_pixel(5, 6, Rgba([255, 0, 0, 10]));
        assert_eq!(opaque_bounds(&image), Some((2, 3, 4, 4)));
        assert_eq!(trim_transparent(&image).unwrap().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let image = RgbaImage::from_pixel(32, 16, Rgba([9, 9, 9, 255]));
        assert_eq!(fit_within(&image, 16, 16).dimensions(), (16, 8));
        assert_eq!(fit_within(&image, 64, 64).dimensions(), (32, 16));
    }

    #[test]
    fn test_fit_within_empty_box() {
        let image = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 255]));
        assert_eq!(fit_within(&image, 0, 4).dimensions(), (2, 1));
        assert_eq!(fit_within(&image, 4, 0).dimensions(), (2, 1));
        assert!(center_on_canvas(&image, 0, 4).is_err());
    }

    #[test]
    fn test_center_on_canvas() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        let canvas = center_on_canvas(&image, 6, 4).unwrap();
        assert_eq!(canvas.dimensions(), (6, 4));
        assert_eq!(canvas.get_pixel(2, 1)[3], 255);
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
    }
}
