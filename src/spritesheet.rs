//! Frame grid slicing and packing
//!
//! Sheets are row-major grids of equally sized cells. Slicing and packing use
//! the same addressing (`col = i % columns`, `row = i / columns`), so frames
//! sliced from a state and packed again land at the same cells.

use image::{imageops, Rgba, RgbaImage};

use crate::error::{ConvertError, Result};

/// Transparent color used for blank canvases
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pixel size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CellSize {
    pub x: u32,
    pub y: u32,
}

impl CellSize {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self { x: 32, y: 32 }
    }
}

/// Create a fully transparent canvas.
pub fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, TRANSPARENT)
}

/// Copy a region out of `image`, failing if it reaches past the edges.
pub fn crop(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> Result<RgbaImage> {
    let fits_x = x.checked_add(width).is_some_and(|r| r <= image.width());
    let fits_y = y.checked_add(height).is_some_and(|b| b <= image.height());
    if !fits_x || !fits_y {
        return Err(ConvertError::BoundsError(format!(
            "crop {}x{} at ({}, {}) exceeds {}x{} image",
            width,
            height,
            x,
            y,
            image.width(),
            image.height()
        )));
    }
    Ok(imageops::crop_imm(image, x, y, width, height).to_image())
}

/// Replace the pixels of `canvas` at `(x, y)` with `tile`, failing if `tile` does not fit.
pub fn paste(canvas: &mut RgbaImage, tile: &RgbaImage, x: u32, y: u32) -> Result<()> {
    let fits_x = x.checked_add(tile.width()).is_some_and(|r| r <= canvas.width());
    let fits_y = y.checked_add(tile.height()).is_some_and(|b| b <= canvas.height());
    if !fits_x || !fits_y {
        return Err(ConvertError::BoundsError(format!(
            "paste {}x{} at ({}, {}) exceeds {}x{} canvas",
            tile.width(),
            tile.height(),
            x,
            y,
            canvas.width(),
            canvas.height()
        )));
    }
    imageops::replace(canvas, tile, x as i64, y as i64);
    Ok(())
}

/// Slice `frames * dirs` cells starting at cell `start` out of a packed sheet.
///
/// Frames come back in increasing cell order. Callers decide whether that
/// order is frame-major or direction-major.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use rsikit::spritesheet::{slice_frames, CellSize};
///
/// // 4x2 pixel sheet of two 2x2 cells
/// let mut sheet = RgbaImage::new(4, 2);
/// sheet.put_pixel(2, 0, Rgba([255, 0, 0, 255]));
///
/// let frames = slice_frames(&sheet, 1, 1, 1, CellSize::new(2, 2)).unwrap();
/// assert_eq!(frames.len(), 1);
/// assert_eq!(*frames[0].get_pixel(0, 0), Rgba([255, 0, 0, 255]));
/// ```
pub fn slice_frames(
    sheet: &RgbaImage,
    start: u32,
    frames: u32,
    dirs: u32,
    cell: CellSize,
) -> Result<Vec<RgbaImage>> {
    if cell.x == 0 || cell.y == 0 {
        return Err(ConvertError::BoundsError("cell size must be non-zero".to_string()));
    }
    let columns = sheet.width() / cell.x;
    if columns == 0 {
        return Err(ConvertError::BoundsError(format!(
            "sheet width {} is narrower than one {} px cell",
            sheet.width(),
            cell.x
        )));
    }

    let capacity = u64::from(columns) * u64::from(sheet.height() / cell.y);
    let end = u64::from(start) + u64::from(frames) * u64::from(dirs);
    if end > capacity {
        return Err(ConvertError::BoundsError(format!(
            "cells {}..{} exceed the {} cells of a {}x{} sheet",
            start,
            end,
            capacity,
            sheet.width(),
            sheet.height()
        )));
    }

    let end = u32::try_from(end)
        .map_err(|_| ConvertError::BoundsError(format!("cell index {} is too large", end)))?;
    (start..end)
        .map(|i| {
            let col = i % columns;
            let row = i / columns;
            crop(sheet, col * cell.x, row * cell.y, cell.x, cell.y)
        })
        .collect()
}

/// Grid dimensions `(columns, rows)` used to pack `count` frames.
pub fn grid_for(count: u32) -> (u32, u32) {
    let mut columns = (count as f64).sqrt().ceil() as u32;
    // Guard against float rounding on perfect squares.
    while columns > 1 && (columns - 1) * (columns - 1) >= count {
        columns -= 1;
    }
    while columns * columns < count {
        columns += 1;
    }
    let columns = columns.max(1);
    (columns, count.div_ceil(columns))
}

/// Pack frames row-major into a near-square sheet.
///
/// Uses `ceil(sqrt(n))` columns and as many rows as needed; unused trailing
/// cells stay transparent.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use rsikit::spritesheet::{pack_frames, CellSize};
///
/// let frame = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
/// let sheet = pack_frames(&vec![frame; 3], CellSize::new(2, 2)).unwrap();
/// assert_eq!(sheet.dimensions(), (4, 4)); // 2 columns, 2 rows
/// ```
pub fn pack_frames(frames: &[RgbaImage], cell: CellSize) -> Result<RgbaImage> {
    if frames.is_empty() {
        return Err(ConvertError::BoundsError("no frames to pack".to_string()));
    }

    let (columns, rows) = grid_for(frames.len() as u32);
    let mut sheet = blank(columns * cell.x, rows * cell.y);

    for (i, frame) in frames.iter().enumerate() {
        if frame.dimensions() != (cell.x, cell.y) {
            return Err(ConvertError::BoundsError(format!(
                "frame {} is {}x{}, expected {}x{}",
                i,
                frame.width(),
                frame.height(),
                cell.x,
                cell.y
            )));
        }
        let col = (i as u32) % columns;
        let row = (i as u32) / columns;
        paste(&mut sheet, frame, col * cell.x, row * cell.y)?;
    }

    Ok(sheet)
}

/// Sequential reader over a packed sheet.
///
/// Each state starts where the previous one ended, so states must be read in
/// declaration order.
#[derive(Debug)]
pub struct SheetCursor<'a> {
    sheet: &'a RgbaImage,
    cell: CellSize,
    next: u32,
}

impl<'a> SheetCursor<'a> {
    pub fn new(sheet: &'a RgbaImage, cell: CellSize) -> Self {
        Self { sheet, cell, next: 0 }
    }

    /// Slice the next state's frames and advance past them.
    pub fn take(&mut self, frames: u32, dirs: u32) -> Result<Vec<RgbaImage>> {
        let sliced = slice_frames(self.sheet, self.next, frames, dirs, self.cell)?;
        self.next += sliced.len() as u32;
        Ok(sliced)
    }

    /// Index of the next unread cell.
    pub fn position(&self) -> u32 {
        self.next
    }
}
