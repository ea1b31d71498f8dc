//! End-to-end tests for DMI to RSI conversion through the library API.
//!
//! Every test builds its DMI in a temporary directory, converts it, and reads
//! the written bundle back from disk.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use rsikit::descriptor::{Descriptor, StateDescriptor};
use rsikit::dmi::{encode_dmi, DESCRIPTION_KEYWORD};
use rsikit::spritesheet::{pack_frames, CellSize};
use rsikit::{convert_many, convert_one, ConvertError, ConvertOptions, GroupingMode, Rsi, SheetSource};
use serde_json::Value;
use tempfile::TempDir;

/// Cell `index` of a test sheet: a gradient keyed by the index.
fn cell_image(cell: CellSize, index: u32) -> RgbaImage {
    RgbaImage::from_fn(cell.x, cell.y, |x, y| Rgba([index as u8 * 10, x as u8, y as u8, 255]))
}

fn descriptor(cell: CellSize, states: &[(&str, u32, u32)]) -> Descriptor {
    Descriptor {
        version: "4.0".to_string(),
        width: cell.x,
        height: cell.y,
        states: states
            .iter()
            .map(|(name, dirs, frames)| StateDescriptor { dirs: *dirs, frames: *frames, ..StateDescriptor::new(*name) })
            .collect(),
    }
}

/// Write a DMI with the given states to `dir/name` and return its path and sheet.
fn write_dmi(dir: &Path, name: &str, cell: CellSize, states: &[(&str, u32, u32)]) -> (PathBuf, RgbaImage) {
    let descriptor = descriptor(cell, states);
    let cells: Vec<RgbaImage> = (0..descriptor.total_cells()).map(|i| cell_image(cell, i)).collect();
    let sheet = pack_frames(&cells, cell).expect("should pack sheet");
    let path = dir.join(name);
    fs::write(&path, encode_dmi(&descriptor, &sheet).expect("should encode dmi")).expect("should write dmi");
    (path, sheet)
}

/// Encode a sheet with a hand-written descriptor in an uncompressed tEXt chunk.
fn raw_dmi(text: &str, sheet: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, sheet.width(), sheet.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.add_text_chunk(DESCRIPTION_KEYWORD.to_string(), text.to_string()).unwrap();
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(sheet.as_raw()).unwrap();
        writer.finish().unwrap();
    }
    bytes
}

fn read_meta(bundle: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(bundle.join("meta.json")).expect("should read meta"))
        .expect("meta should be JSON")
}

// ============================================================================
// convert-one
// ============================================================================

#[test]
fn test_single_box_state() {
    let temp = TempDir::new().unwrap();
    let cell = CellSize::new(32, 32);
    let (dmi_path, sheet) = write_dmi(temp.path(), "box.dmi", cell, &[("box", 1, 1)]);
    let dest = temp.path().join("box.rsi");

    convert_one(&SheetSource::Path(dmi_path), &dest, &ConvertOptions::default()).unwrap();

    let meta = read_meta(&dest);
    let states = meta["states"].as_array().unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0]["name"], "box");
    assert_eq!(states[0]["directions"], 1);
    assert!(states[0].get("delays").is_none(), "no delays key for a still state");
    assert_eq!(meta["size"]["x"], 32);
    assert_eq!(meta["size"]["y"], 32);
    assert_eq!(meta["license"], "CC-BY-SA-3.0");
    assert!(meta.get("copyright").is_none());

    let written = image::open(dest.join("box.png")).unwrap().to_rgba8();
    let original = image::imageops::crop_imm(&sheet, 0, 0, 32, 32).to_image();
    assert_eq!(written, original);
}

#[test]
fn test_animated_directional_state() {
    let temp = TempDir::new().unwrap();
    let cell = CellSize::new(8, 8);
    let descriptor = descriptor(cell, &[("spin", 4, 3)]);
    let text = rsikit::descriptor::render_descriptor(&Descriptor {
        states: vec![StateDescriptor { delay: Some(vec![0.1, 0.2, 0.3]), ..descriptor.states[0].clone() }],
        ..descriptor.clone()
    });
    let cells: Vec<RgbaImage> = (0..12).map(|i| cell_image(cell, i)).collect();
    let sheet = pack_frames(&cells, cell).unwrap();
    let dest = temp.path().join("spin.rsi");

    convert_one(&SheetSource::Bytes(raw_dmi(&text, &sheet)), &dest, &ConvertOptions::default()).unwrap();

    let meta = read_meta(&dest);
    assert_eq!(meta["states"][0]["directions"], 4);
    let delays = meta["states"][0]["delays"].as_array().unwrap();
    assert_eq!(delays.len(), 4);
    assert_eq!(delays[0], serde_json::json!([0.1, 0.2, 0.3]));

    let rsi = Rsi::open(&dest).unwrap();
    assert_eq!(rsi.states[0].image.dimensions(), (32, 24));
    assert_eq!(rsi.states[0].delays, Some(vec![0.1, 0.2, 0.3]));
}

#[test]
fn test_unnamed_state_is_not_written() {
    let temp = TempDir::new().unwrap();
    let (dmi_path, sheet) = write_dmi(temp.path(), "box.dmi", CellSize::new(32, 32), &[("", 1, 1), ("box", 1, 1)]);
    let dest = temp.path().join("box.rsi");

    let rsi = convert_one(&SheetSource::Path(dmi_path), &dest, &ConvertOptions::default()).unwrap();
    assert_eq!(rsi.states.len(), 2);
    assert_eq!(rsi.state_names(), ["box"]);

    let meta = read_meta(&dest);
    let states = meta["states"].as_array().unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0]["name"], "box");

    let mut files: Vec<String> =
        fs::read_dir(&dest).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect();
    files.sort();
    assert_eq!(files, ["box.png", "meta.json"]);
    let written = image::open(dest.join("box.png")).unwrap().to_rgba8();
    assert_eq!(written, image::imageops::crop_imm(&sheet, 32, 0, 32, 32).to_image());
}

#[test]
fn test_state_name_cannot_leave_bundle() {
    let temp = TempDir::new().unwrap();
    let (dmi_path, _) = write_dmi(temp.path(), "x.dmi", CellSize::new(32, 32), &[("box", 1, 1), ("../escaped", 1, 1)]);
    let dest = temp.path().join("x.rsi");

    let result = convert_one(&SheetSource::Path(dmi_path), &dest, &ConvertOptions::default());
    assert!(matches!(result, Err(ConvertError::InvalidStateName(ref name)) if name == "../escaped"), "got {:?}", result);
    assert!(!dest.exists());
    assert!(!temp.path().join("escaped.png").exists());
}

#[test]
fn test_metadata_error_leaves_nothing() {
    let temp = TempDir::new().unwrap();
    let text = "# BEGIN DMI\nversion = 4.0\n\twidth = 4\n\theight = 4\nstate = \"a\"\n\tdirs = 1\n\tframes = 1\n\tdelay = 1,a\n# END DMI\n";
    let dest = temp.path().join("bad.rsi");

    let result = convert_one(
        &SheetSource::Bytes(raw_dmi(text, &RgbaImage::new(4, 4))),
        &dest,
        &ConvertOptions::default(),
    );
    assert!(matches!(result, Err(ConvertError::MetadataParseError { .. })), "got {:?}", result);
    assert!(!dest.exists());
}

#[test]
fn test_sheet_too_small_is_bounds_error() {
    let temp = TempDir::new().unwrap();
    let text = "# BEGIN DMI\nversion = 4.0\n\twidth = 4\n\theight = 4\nstate = \"a\"\n\tdirs = 4\n\tframes = 1\n# END DMI\n";
    let dest = temp.path().join("small.rsi");

    let result = convert_one(
        &SheetSource::Bytes(raw_dmi(text, &RgbaImage::new(8, 4))),
        &dest,
        &ConvertOptions::default(),
    );
    assert!(matches!(result, Err(ConvertError::BoundsError(_))), "got {:?}", result);
    assert!(!dest.exists());
}

#[test]
fn test_missing_source_is_unsupported() {
    let temp = TempDir::new().unwrap();
    let result = convert_one(
        &SheetSource::Path(temp.path().join("nope.dmi")),
        &temp.path().join("nope.rsi"),
        &ConvertOptions::default(),
    );
    assert!(matches!(result, Err(ConvertError::UnsupportedInput(_))));
}

// ============================================================================
// convert-many
// ============================================================================

#[test]
fn test_wall_split_on_disk() {
    let temp = TempDir::new().unwrap();
    let cell = CellSize::new(32, 32);
    let (dmi_path, _) = write_dmi(
        temp.path(),
        "walls.dmi",
        cell,
        &[("wall0", 1, 1), ("wall7", 1, 1), ("wall11", 1, 1), ("wall13", 1, 1), ("wall14", 1, 1), ("wall15", 1, 1)],
    );
    let out = temp.path().join("out");

    let written = convert_many(&SheetSource::Path(dmi_path), &out, GroupingMode::Wall, &ConvertOptions::default()).unwrap();
    assert_eq!(written, [out.join("wall.rsi")]);

    let meta = read_meta(&written[0]);
    let names: Vec<&str> = meta["states"].as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["full", "wall0", "wall1", "wall2", "wall3", "wall4", "wall5", "wall6", "wall7"]);
    assert_eq!(meta["states"][0]["directions"], 1);
    assert_eq!(meta["states"][1]["directions"], 4);
    for name in names {
        assert!(written[0].join(format!("{}.png", name)).is_file(), "{}.png missing", name);
    }
}

#[test]
fn test_wall_split_without_base_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let (dmi_path, _) = write_dmi(temp.path(), "walls.dmi", CellSize::new(32, 32), &[("wall7", 1, 1)]);
    let out = temp.path().join("out");

    let written = convert_many(&SheetSource::Path(dmi_path), &out, GroupingMode::Wall, &ConvertOptions::default()).unwrap();
    assert!(written.is_empty());
}

#[test]
fn test_firearm_split_with_reference_assets() {
    let temp = TempDir::new().unwrap();
    let cell = CellSize::new(32, 32);
    let (dmi_path, _) = write_dmi(temp.path(), "guns.dmi", cell, &[("rifle-20", 1, 1), ("rifle", 1, 1), ("rifle-10", 1, 1)]);

    let assets = temp.path().join("reference");
    fs::create_dir(&assets).unwrap();
    for name in ["inhand-left", "inhand-right"] {
        rsikit::output::save_png(&RgbaImage::from_pixel(64, 64, Rgba([1, 2, 3, 255])), &assets.join(format!("{}.png", name)))
            .unwrap();
    }

    let out = temp.path().join("out");
    let options = ConvertOptions { assets: Some(assets), copyright: Some("test".to_string()), ..ConvertOptions::default() };
    let written = convert_many(&SheetSource::Path(dmi_path), &out, GroupingMode::Firearm, &options).unwrap();

    let rsi = Rsi::open(&written[0]).unwrap();
    assert_eq!(rsi.state_names(), ["rifle", "rifle-0", "rifle-1", "inhand-left", "inhand-right"]);
    assert_eq!(rsi.copyright.as_deref(), Some("test"));
    // rifle-10 (sheet cell 2) is the first numbered state
    assert_eq!(rsi.state("rifle-0").unwrap().image.get_pixel(0, 0)[0], 20);
    assert_eq!(rsi.state("rifle-1").unwrap().image.get_pixel(0, 0)[0], 0);
    assert_eq!(rsi.state("inhand-right").unwrap().directions, 4);
}

#[test]
fn test_helmet_split_with_companion_icons() {
    let temp = TempDir::new().unwrap();
    let (dmi_path, _) = write_dmi(temp.path(), "hats.dmi", CellSize::new(32, 32), &[("beret", 4, 1), ("beret-red", 4, 1)]);
    let (icons_path, _) = write_dmi(temp.path(), "icons.dmi", CellSize::new(32, 32), &[("beret", 1, 1)]);

    let out = temp.path().join("out");
    let options = ConvertOptions { icons: Some(SheetSource::Path(icons_path)), ..ConvertOptions::default() };
    let written = convert_many(&SheetSource::Path(dmi_path), &out, GroupingMode::Helmet, &options).unwrap();

    let rsi = Rsi::open(&written[0]).unwrap();
    assert_eq!(rsi.state_names(), ["equipped-HELMET", "icon", "inhand-left", "inhand-right"]);
    assert_eq!(rsi.state("icon").unwrap().image, cell_image(CellSize::new(32, 32), 0));
}
