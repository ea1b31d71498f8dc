//! Worn-item bundles: equipped sprite, inventory icon and held sprites
//!
//! A worn item's representative state holds four views (south, north, east,
//! west). From those the engine builds the slot sprite, an inventory icon and
//! the left/right held sprites, which show the item shrunk to a quarter cell.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::{debug, warn};

use crate::dmi::{Dmi, DmiState};
use crate::error::Result;
use crate::output::{center_on_canvas, fit_within, trim_transparent};
use crate::rsi::RsiState;
use crate::spritesheet::{blank, pack_frames, paste, CellSize};

/// Fixed state names of a worn-item bundle, besides `equipped-<SLOT>`.
pub const EQUIP_STATES: [&str; 3] = ["icon", "inhand-left", "inhand-right"];

const EQUIPPED_PREFIX: &str = "equipped-";

/// Worn item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipKind {
    Helmet,
    Gloves,
    Shoes,
    Suit,
}

impl EquipKind {
    /// Inventory slot the item is worn in.
    pub fn slot(self) -> &'static str {
        match self {
            EquipKind::Helmet => "HELMET",
            EquipKind::Gloves => "HAND",
            EquipKind::Shoes => "FEET",
            EquipKind::Suit => "OUTERCLOTHING",
        }
    }

    /// Vertical shift of held sprites, in pixels of a 32 px cell.
    pub fn hand_offset(self) -> i64 {
        match self {
            EquipKind::Helmet => -4,
            EquipKind::Gloves => 4,
            EquipKind::Shoes => 8,
            EquipKind::Suit => 0,
        }
    }

    pub fn equipped_state(self) -> String {
        format!("{}{}", EQUIPPED_PREFIX, self.slot())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hand {
    Left,
    Right,
}

impl Hand {
    fn state_name(self) -> &'static str {
        match self {
            Hand::Left => EQUIP_STATES[1],
            Hand::Right => EQUIP_STATES[2],
        }
    }

    /// Horizontal position of the view for each direction (S, N, E, W).
    fn x_offsets(self, width: u32) -> [u32; 4] {
        let (half, quarter) = (width / 2, width / 4);
        match self {
            Hand::Left => [half, 0, quarter, quarter],
            Hand::Right => [0, half, quarter, quarter],
        }
    }
}

/// The four views of the representative state.
struct Views {
    south: RgbaImage,
    north: RgbaImage,
    east: RgbaImage,
    west: RgbaImage,
}

impl Views {
    fn from_state(state: &DmiState, cell: CellSize) -> Result<Option<Self>> {
        if state.dirs < 4 {
            return Ok(None);
        }
        let mut cells = state.cells(cell)?.into_iter();
        match (cells.next(), cells.next(), cells.next(), cells.next()) {
            (Some(south), Some(north), Some(east), Some(west)) => {
                Ok(Some(Self { south, north, east, west }))
            }
            _ => Ok(None),
        }
    }

    fn in_order(&self) -> [&RgbaImage; 4] {
        [&self.south, &self.north, &self.east, &self.west]
    }
}

/// Scale a trimmed sprite up by a whole factor, or down, to fit the box.
fn scale_to_fit(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let factor = (width / w).min(height / h);
    if factor >= 2 {
        imageops::resize(image, w * factor, h * factor, FilterType::Nearest)
    } else {
        fit_within(image, width, height)
    }
}

fn icon_from_view(south: &RgbaImage, cell: CellSize) -> Result<Option<RgbaImage>> {
    match trim_transparent(south)? {
        Some(trimmed) => Ok(Some(center_on_canvas(&scale_to_fit(&trimmed, cell.x, cell.y), cell.x, cell.y)?)),
        None => Ok(None),
    }
}

fn icon_from_sheet(icons: &Dmi, key: &str, cell: CellSize) -> Result<Option<RgbaImage>> {
    let Some(state) = icons.state(key) else {
        return Ok(None);
    };
    let frame = state.first_frame(icons.cell_size())?;
    if frame.dimensions() == (cell.x, cell.y) {
        return Ok(Some(frame));
    }
    Ok(Some(imageops::resize(&frame, cell.x, cell.y, FilterType::Nearest)))
}

/// Held sprite: each view shrunk into a quarter of its direction cell.
fn inhand(views: &Views, kind: EquipKind, hand: Hand, cell: CellSize) -> Result<Option<RgbaImage>> {
    let (w, h) = (cell.x, cell.y);
    if w < 2 || h < 2 {
        debug!("No {} for a {}x{} cell", hand.state_name(), w, h);
        return Ok(None);
    }
    let mirrored = imageops::flip_horizontal(&views.east);
    let sources = [&views.south, &views.north, &views.east, &mirrored];
    let origins = [(0, 0), (w, 0), (0, h), (w, h)];
    let base_y = i64::from(h / 2 - h / 8) + kind.hand_offset() * i64::from(h) / 32;

    let mut canvas = blank(w * 2, h * 2);
    let mut placed = 0;
    for ((source, (ox, oy)), x) in sources.into_iter().zip(origins).zip(hand.x_offsets(w)) {
        let Some(trimmed) = trim_transparent(source)? else {
            continue;
        };
        let view = fit_within(&trimmed, w / 2, h / 2);
        let x = x.min(w - view.width());
        let y = base_y.clamp(0, i64::from(h - view.height())) as u32;
        paste(&mut canvas, &view, ox + x, oy + y)?;
        placed += 1;
    }

    Ok((placed > 0).then_some(canvas))
}

/// Build a worn-item group. `None` when no representative state has four views.
pub(super) fn synthesize(
    kind: EquipKind,
    key: &str,
    members: &[&DmiState],
    cell: CellSize,
    icons: Option<&Dmi>,
) -> Result<Option<Vec<RsiState>>> {
    let Some(representative) = members.iter().find(|s| s.name == key).or_else(|| members.first()) else {
        return Ok(None);
    };
    let Some(views) = Views::from_state(representative, cell)? else {
        warn!(
            "Skipping {} group '{}': '{}' has {} directions, 4 needed",
            kind.slot(),
            key,
            representative.name,
            representative.dirs
        );
        return Ok(None);
    };

    let mut states = Vec::new();
    let equipped: Vec<RgbaImage> = views.in_order().into_iter().cloned().collect();
    states.push(RsiState::new(kind.equipped_state(), pack_frames(&equipped, cell)?).with_directions(4));

    let icon = match icons {
        Some(sheet) => icon_from_sheet(sheet, key, cell)?,
        None => icon_from_view(&views.south, cell)?,
    };
    match icon {
        Some(icon) => states.push(RsiState::new(EQUIP_STATES[0], icon)),
        None => debug!("No icon for '{}'", key),
    }

    for hand in [Hand::Left, Hand::Right] {
        if let Some(image) = inhand(&views, kind, hand, cell)? {
            states.push(RsiState::new(hand.state_name(), image).with_directions(4));
        }
    }

    states.retain(|s| {
        s.name
            .as_deref()
            .is_some_and(|n| n.starts_with(EQUIPPED_PREFIX) || EQUIP_STATES.contains(&n))
    });
    Ok((!states.is_empty()).then_some(states))
}
