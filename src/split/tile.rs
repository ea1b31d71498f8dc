//! Smoothing tile sets rebuilt from corner quadrants
//!
//! Legacy wall sheets store sixteen connection variants (`wall0` .. `wall15`).
//! The engine's smoothing system instead wants eight four-direction states
//! whose directions are the four corners of the tile. Each output state is
//! assembled from quadrants of a few legacy variants and then "cornerized":
//! the four quadrants of one cell are spread over the four direction cells.

use image::RgbaImage;
use log::warn;

use crate::dmi::DmiState;
use crate::error::Result;
use crate::rsi::RsiState;
use crate::spritesheet::{blank, crop, paste, CellSize};

/// One quarter of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// Top-left corner of this quadrant inside a cell.
    pub fn origin(self, cell: CellSize) -> (u32, u32) {
        let (hw, hh) = (cell.x / 2, cell.y / 2);
        match self {
            Quadrant::NorthWest => (0, 0),
            Quadrant::NorthEast => (hw, 0),
            Quadrant::SouthWest => (0, hh),
            Quadrant::SouthEast => (hw, hh),
        }
    }
}

fn take_quadrant(source: &RgbaImage, quadrant: Quadrant, cell: CellSize) -> Result<RgbaImage> {
    let (x, y) = quadrant.origin(cell);
    crop(source, x, y, cell.x / 2, cell.y / 2)
}

/// Spread the quadrants of `source`'s first cell over a 2x2 grid of direction cells.
///
/// South-east stays in the first cell, north-west moves to the second,
/// north-east to the third and south-west to the fourth, each keeping its
/// position inside its new cell.
pub fn cornerize(source: &RgbaImage, cell: CellSize) -> Result<RgbaImage> {
    let (hw, hh) = (cell.x / 2, cell.y / 2);
    let mut canvas = blank(cell.x * 2, cell.y * 2);

    paste(&mut canvas, &take_quadrant(source, Quadrant::SouthEast, cell)?, hw, hh)?;
    paste(&mut canvas, &take_quadrant(source, Quadrant::NorthWest, cell)?, cell.x, 0)?;
    paste(&mut canvas, &take_quadrant(source, Quadrant::NorthEast, cell)?, hw, cell.y)?;
    paste(&mut canvas, &take_quadrant(source, Quadrant::SouthWest, cell)?, cell.x, cell.y + hh)?;

    Ok(canvas)
}

/// Build a 2x2-cell canvas whose first cell takes each quadrant from a different source.
fn composite(pieces: [(&RgbaImage, Quadrant); 4], cell: CellSize) -> Result<RgbaImage> {
    let mut canvas = blank(cell.x * 2, cell.y * 2);
    for (source, quadrant) in pieces {
        let (x, y) = quadrant.origin(cell);
        paste(&mut canvas, &take_quadrant(source, quadrant, cell)?, x, y)?;
    }
    Ok(canvas)
}

/// Variants every tile set needs besides `<key>0`.
const REQUIRED_VARIANTS: [u32; 5] = [7, 11, 13, 14, 15];

/// Rebuild a wall group. `None` when `<key>0` or another required variant is missing.
pub(super) fn synthesize(
    key: &str,
    members: &[&DmiState],
    cell: CellSize,
) -> Result<Option<Vec<RsiState>>> {
    let variant = |n: u32| {
        let name = format!("{}{}", key, n);
        members.iter().find(|s| s.name == name).map(|s| &s.image)
    };

    let Some(base) = variant(0) else {
        return Ok(None);
    };
    let (v7, v11, v13, v14, v15) = match (variant(7), variant(11), variant(13), variant(14), variant(15)) {
        (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
        _ => {
            let missing: Vec<u32> =
                REQUIRED_VARIANTS.into_iter().filter(|n| variant(*n).is_none()).collect();
            warn!("Tile group '{}' is missing variants {:?}", key, missing);
            return Ok(None);
        }
    };

    let four = |name: String, image: RgbaImage| RsiState::new(name, image).with_directions(4);
    let name = |n: u32| format!("{}{}", key, n);

    // top, bottom, right, left
    let vertical = cornerize(
        &composite(
            [
                (v14, Quadrant::NorthWest),
                (v13, Quadrant::SouthEast),
                (v11, Quadrant::NorthEast),
                (v7, Quadrant::SouthWest),
            ],
            cell,
        )?,
        cell,
    )?;
    // left, right, top, bottom
    let horizontal = cornerize(
        &composite(
            [
                (v7, Quadrant::NorthWest),
                (v11, Quadrant::SouthEast),
                (v14, Quadrant::NorthEast),
                (v13, Quadrant::SouthWest),
            ],
            cell,
        )?,
        cell,
    )?;
    let isolated = cornerize(base, cell)?;
    let surrounded = cornerize(v15, cell)?;

    let mut states = vec![
        RsiState::new("full", base.clone()),
        four(name(0), isolated.clone()),
        four(name(2), isolated),
        four(name(1), vertical.clone()),
        four(name(3), vertical),
        four(name(4), horizontal.clone()),
        four(name(6), horizontal),
        four(name(5), surrounded.clone()),
        four(name(7), surrounded),
    ];
    states.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Some(states))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::test_support::dmi_with;
    use crate::split::{split, GroupingMode, SplitOptions};
    use image::Rgba;

    /// Cell whose four quadrants are filled with red values 1..=4 (NW, NE, SW, SE).
    fn quartered(cell: CellSize) -> RgbaImage {
        RgbaImage::from_fn(cell.x, cell.y, |x, y| {
            let east = x >= cell.x / 2;
            let south = y >= cell.y / 2;
            let id = match (south, east) {
                (false, false) => 1,
                (false, true) => 2,
                (true, false) => 3,
                (true, true) => 4,
            };
            Rgba([id, 0, 0, 255])
        })
    }

    #[test]
    fn test_cornerize_layout() {
        let cell = CellSize::new(32, 32);
        let out = cornerize(&quartered(cell), cell).unwrap();
        assert_eq!(out.dimensions(), (64, 64));

        // SE stays at (16,16) of the first cell
        assert_eq!(out.get_pixel(16, 16)[0], 4);
        assert_eq!(out.get_pixel(31, 31)[0], 4);
        // NW moves to (32,0)
        assert_eq!(out.get_pixel(32, 0)[0], 1);
        assert_eq!(out.get_pixel(47, 15)[0], 1);
        // NE moves to (16,32)
        assert_eq!(out.get_pixel(16, 32)[0], 2);
        // SW moves to (32,48)
        assert_eq!(out.get_pixel(32, 48)[0], 3);
        assert_eq!(out.get_pixel(47, 63)[0], 3);
        // Everything else is transparent
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(48, 0)[3], 0);
        assert_eq!(out.get_pixel(0, 32)[3], 0);
        assert_eq!(out.get_pixel(63, 63)[3], 0);
    }

    #[test]
    fn test_quadrant_origin() {
        let cell = CellSize::new(32, 16);
        assert_eq!(Quadrant::NorthWest.origin(cell), (0, 0));
        assert_eq!(Quadrant::NorthEast.origin(cell), (16, 0));
        assert_eq!(Quadrant::SouthWest.origin(cell), (0, 8));
        assert_eq!(Quadrant::SouthEast.origin(cell), (16, 8));
    }

    fn wall_dmi(extra: &[(&str, u32, u32)]) -> crate::dmi::Dmi {
        let mut states = vec![
            ("wall0", 1, 1),
            ("wall7", 1, 1),
            ("wall11", 1, 1),
            ("wall13", 1, 1),
            ("wall14", 1, 1),
            ("wall15", 1, 1),
        ];
        states.extend_from_slice(extra);
        dmi_with(CellSize::new(32, 32), &states)
    }

    #[test]
    fn test_wall_mode_emits_sorted_tile_set() {
        let dmi = wall_dmi(&[]);
        let bundles = split(&dmi, GroupingMode::Wall, &SplitOptions::default()).unwrap();

        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].name, "wall");
        assert_eq!(
            bundles[0].rsi.state_names(),
            ["full", "wall0", "wall1", "wall2", "wall3", "wall4", "wall5", "wall6", "wall7"]
        );
        let rsi = &bundles[0].rsi;
        assert_eq!(rsi.state("full").unwrap().directions, 1);
        assert_eq!(rsi.state("full").unwrap().image.dimensions(), (32, 32));
        assert_eq!(rsi.state("wall1").unwrap().directions, 4);
        assert_eq!(rsi.state("wall1").unwrap().image.dimensions(), (64, 64));
        rsi.validate().unwrap();
    }

    #[test]
    fn test_wall_quadrant_sources() {
        // Cell index is stored in the red channel: wall0=0, wall7=1, wall11=2,
        // wall13=3, wall14=4, wall15=5.
        let dmi = wall_dmi(&[]);
        let bundles = split(&dmi, GroupingMode::Wall, &SplitOptions::default()).unwrap();
        let rsi = &bundles[0].rsi;
        let source_at = |state: &str, x: u32, y: u32| rsi.state(state).unwrap().image.get_pixel(x, y)[0];

        // wall1: SE from wall13 stays in place, NW from wall14 moves to cell 2,
        // NE from wall11 to cell 3, SW from wall7 to cell 4
        assert_eq!(source_at("wall1", 16, 16), 3);
        assert_eq!(source_at("wall1", 32, 0), 4);
        assert_eq!(source_at("wall1", 16, 32), 2);
        assert_eq!(source_at("wall1", 32, 48), 1);
        assert_eq!(rsi.state("wall3").unwrap().image, rsi.state("wall1").unwrap().image);

        // wall4: SE from wall11, NW from wall7, NE from wall14, SW from wall13
        assert_eq!(source_at("wall4", 16, 16), 2);
        assert_eq!(source_at("wall4", 32, 0), 1);
        assert_eq!(source_at("wall4", 16, 32), 4);
        assert_eq!(source_at("wall4", 32, 48), 3);
        assert_eq!(rsi.state("wall6").unwrap().image, rsi.state("wall4").unwrap().image);

        assert_eq!(source_at("wall0", 16, 16), 0);
        assert_eq!(source_at("wall5", 32, 0), 5);
        assert_eq!(source_at("full", 0, 0), 0);
    }

    #[test]
    fn test_wall_group_without_base_is_omitted() {
        let dmi = dmi_with(
            CellSize::new(32, 32),
            &[("wall7", 1, 1), ("wall11", 1, 1), ("wall13", 1, 1), ("wall14", 1, 1), ("wall15", 1, 1)],
        );
        let bundles = split(&dmi, GroupingMode::Wall, &SplitOptions::default()).unwrap();
        assert!(bundles.is_empty());
    }

    #[test]
    fn test_wall_group_missing_variant_is_omitted() {
        let dmi = dmi_with(CellSize::new(32, 32), &[("wall0", 1, 1), ("wall7", 1, 1)]);
        let bundles = split(&dmi, GroupingMode::Wall, &SplitOptions::default()).unwrap();
        assert!(bundles.is_empty());
    }

    #[test]
    fn test_wall_mode_keeps_other_groups_apart() {
        let dmi = wall_dmi(&[("window0", 1, 1)]);
        let bundles = split(&dmi, GroupingMode::Wall, &SplitOptions::default()).unwrap();
        let names: Vec<_> = bundles.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["wall"]);
    }
}
