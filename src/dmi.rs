//! DMI sheets: a packed PNG whose `Description` text chunk holds the state table

use std::io::Cursor;
use std::path::Path;

use image::RgbaImage;
use log::debug;

use crate::descriptor::{parse_descriptor, render_descriptor, Descriptor, StateDescriptor};
use crate::error::{ConvertError, Result};
use crate::spritesheet::{pack_frames, CellSize, SheetCursor};

/// PNG text keyword carrying the descriptor
pub const DESCRIPTION_KEYWORD: &str = "Description";

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Check the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_SIGNATURE)
}

/// One state of a DMI, owning its frames repacked into their own sheet.
#[derive(Debug, Clone)]
pub struct DmiState {
    pub name: String,
    pub dirs: u32,
    pub frames: u32,
    pub delay: Option<Vec<f64>>,
    /// Frames of this state packed row-major, in sheet order
    pub image: RgbaImage,
}

impl DmiState {
    /// First cell of the packed image.
    pub fn first_frame(&self, cell: CellSize) -> Result<RgbaImage> {
        crate::spritesheet::crop(&self.image, 0, 0, cell.x, cell.y)
    }

    /// Cells of the packed image in order.
    pub fn cells(&self, cell: CellSize) -> Result<Vec<RgbaImage>> {
        crate::spritesheet::slice_frames(&self.image, 0, self.frames, self.dirs, cell)
    }
}

/// A parsed DMI. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dmi {
    pub version: String,
    pub width: u32,
    pub height: u32,
    pub states: Vec<DmiState>,
}

impl Dmi {
    /// Decode a DMI from raw PNG bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if !is_png(bytes) {
            return Err(ConvertError::UnsupportedInput("data is not a PNG image".to_string()));
        }
        let text = read_description(bytes)?;
        let descriptor = parse_descriptor(&text)?;
        let sheet = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
        Self::from_parts(descriptor, &sheet)
    }

    /// Load a DMI from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConvertError::UnsupportedInput(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Slice every state out of `sheet` in declaration order.
    ///
    /// The sheet is only borrowed here; each state gets its own repacked image.
    pub fn from_parts(descriptor: Descriptor, sheet: &RgbaImage) -> Result<Self> {
        let cell = CellSize::new(descriptor.width, descriptor.height);
        let mut cursor = SheetCursor::new(sheet, cell);
        let mut states = Vec::with_capacity(descriptor.states.len());

        for state in descriptor.states {
            let start = cursor.position();
            let frames = cursor.take(state.frames, state.dirs)?;
            debug!(
                "Sliced state '{}' ({} dirs x {} frames) from cell {}",
                state.name, state.dirs, state.frames, start
            );
            states.push(DmiState {
                image: pack_frames(&frames, cell)?,
                name: state.name,
                dirs: state.dirs,
                frames: state.frames,
                delay: state.delay,
            });
        }

        Ok(Self { version: descriptor.version, width: descriptor.width, height: descriptor.height, states })
    }

    pub fn cell_size(&self) -> CellSize {
        CellSize::new(self.width, self.height)
    }

    /// Look up a state by exact name.
    pub fn state(&self, name: &str) -> Option<&DmiState> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Rebuild the descriptor for this sheet.
    ///
    /// Attributes the converter does not interpret are not retained on
    /// [`DmiState`] and are dropped.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            version: self.version.clone(),
            width: self.width,
            height: self.height,
            states: self
                .states
                .iter()
                .map(|s| StateDescriptor {
                    name: s.name.clone(),
                    dirs: s.dirs,
                    frames: s.frames,
                    delay: s.delay.clone(),
                    extra: Vec::new(),
                })
                .collect(),
        }
    }
}

/// Read the DMI descriptor text out of a PNG's text chunks.
pub fn read_description(bytes: &[u8]) -> Result<String> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_ignore_text_chunk(false);
    let reader = decoder.read_info()?;
    let info = reader.info();

    for chunk in &info.compressed_latin1_text {
        if chunk.keyword == DESCRIPTION_KEYWORD {
            return Ok(chunk.get_text()?);
        }
    }
    for chunk in &info.uncompressed_latin1_text {
        if chunk.keyword == DESCRIPTION_KEYWORD {
            return Ok(chunk.text.clone());
        }
    }
    for chunk in &info.utf8_text {
        if chunk.keyword == DESCRIPTION_KEYWORD {
            return Ok(chunk.get_text()?);
        }
    }

    Err(ConvertError::parse(0, "PNG has no Description text chunk"))
}

/// Encode a packed sheet and descriptor as DMI bytes.
///
/// The descriptor is stored in a compressed `Description` chunk ahead of the
/// image data, the way BYOND writes it.
pub fn encode_dmi(descriptor: &Descriptor, sheet: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, sheet.width(), sheet.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.add_ztxt_chunk(DESCRIPTION_KEYWORD.to_string(), render_descriptor(descriptor))?;
        let mut writer = encoder.write_header()?;
        writer.write_image_data(sheet.as_raw())?;
        writer.finish()?;
    }
    Ok(bytes)
}
