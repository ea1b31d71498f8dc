//! RSI bundles: a `<name>.rsi` directory with `meta.json` and one PNG per state
//!
//! ```text
//! wall.rsi/
//!   meta.json
//!   full.png
//!   wall0.png
//!   ...
//! ```

use std::fs;
use std::path::{Component, Path};

use image::RgbaImage;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConvertError, Result};
use crate::output::{is_bundle_path, load_png, save_png};
use crate::spritesheet::CellSize;

/// Name of the metadata document inside a bundle
pub const META_FILE: &str = "meta.json";
/// Current RSI format version
pub const RSI_VERSION: u32 = 1;
/// License applied when none is given
pub const DEFAULT_LICENSE: &str = "CC-BY-SA-3.0";

const UNNAMED: &str = "<unnamed>";

fn default_version() -> u32 {
    RSI_VERSION
}

fn default_license() -> String {
    DEFAULT_LICENSE.to_string()
}

fn default_directions() -> u32 {
    1
}

/// One state entry of `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMeta {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(default = "default_directions")]
    pub directions: u32,
    /// One delay list per direction
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delays: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub select: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub flags: Option<Map<String, Value>>,
}

/// The `meta.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiMeta {
    #[serde(default = "default_version")]
    pub version: u32,
    pub size: CellSize,
    #[serde(default = "default_license")]
    pub license: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub states: Vec<StateMeta>,
}

/// A state with its packed image.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiState {
    /// Unnamed states stay in memory but are never written
    pub name: Option<String>,
    pub directions: u32,
    /// One animation cycle, repeated for every direction when written
    pub delays: Option<Vec<f64>>,
    pub select: Option<Vec<Value>>,
    pub flags: Option<Map<String, Value>>,
    pub image: RgbaImage,
}

/// Whether `name` can be stored as `<name>.png` directly inside the bundle.
fn is_plain_name(name: &str) -> bool {
    if name.contains(|c: char| c == '/' || c == '\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

impl RsiState {
    /// A named state. DMI sheets use `""` for unnamed states, so an empty
    /// name gives an unnamed one.
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        let name = name.into();
        Self { name: (!name.is_empty()).then_some(name), ..Self::unnamed(image) }
    }

    pub fn unnamed(image: RgbaImage) -> Self {
        Self { name: None, directions: 1, delays: None, select: None, flags: None, image }
    }

    pub fn with_directions(mut self, directions: u32) -> Self {
        self.directions = directions;
        self
    }

    pub fn with_delays(mut self, delays: Option<Vec<f64>>) -> Self {
        self.delays = delays;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    /// Metadata entry, or `None` for unnamed states.
    pub fn meta(&self) -> Option<StateMeta> {
        let name = self.name.clone()?;
        let delays = self
            .delays
            .as_ref()
            .filter(|d| !d.is_empty())
            .map(|cycle| vec![cycle.clone(); self.directions as usize]);
        Some(StateMeta {
            name: Some(name),
            directions: self.directions,
            delays,
            select: self.select.clone(),
            flags: self.flags.clone(),
        })
    }
}

/// An RSI bundle held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    pub version: u32,
    pub size: CellSize,
    pub license: String,
    pub copyright: Option<String>,
    /// Insertion order is emission order
    pub states: Vec<RsiState>,
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(CellSize::default())
    }
}

impl Rsi {
    /// Empty bundle with the default version and license.
    pub fn new(size: CellSize) -> Self {
        Self {
            version: RSI_VERSION,
            size,
            license: DEFAULT_LICENSE.to_string(),
            copyright: None,
            states: Vec::new(),
        }
    }

    pub fn with_copyright(mut self, copyright: Option<String>) -> Self {
        self.copyright = copyright;
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn push_state(&mut self, state: RsiState) {
        self.states.push(state);
    }

    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<&RsiState> {
        self.states.iter().find(|s| s.name.as_deref() == Some(name))
    }

    /// Names of named states, in order.
    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().filter_map(|s| s.name.as_deref()).collect()
    }

    /// Read a bundle from disk.
    ///
    /// Each state's image is `<name>.png` next to `meta.json`. Per-direction
    /// delay lists are collapsed to the first direction's cycle.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let dir = path.as_ref();
        let meta_path = dir.join(META_FILE);
        if !meta_path.is_file() {
            return Err(ConvertError::UnsupportedInput(format!(
                "{} has no {}",
                dir.display(),
                META_FILE
            )));
        }
        let meta: RsiMeta = serde_json::from_slice(&fs::read(&meta_path)?)?;

        let mut states = Vec::with_capacity(meta.states.len());
        for entry in meta.states {
            let name = entry.name.ok_or_else(|| ConvertError::MissingStateAsset {
                state: UNNAMED.to_string(),
                path: dir.to_path_buf(),
            })?;
            if !is_plain_name(&name) {
                return Err(ConvertError::InvalidStateName(name));
            }
            let image_path = dir.join(format!("{}.png", name));
            if !image_path.is_file() {
                return Err(ConvertError::MissingStateAsset { state: name, path: image_path });
            }
            states.push(RsiState {
                image: load_png(&image_path)?,
                name: Some(name),
                directions: entry.directions,
                delays: entry.delays.and_then(|d| d.into_iter().next()),
                select: entry.select,
                flags: entry.flags,
            });
        }

        Ok(Self {
            version: meta.version,
            size: meta.size,
            license: meta.license,
            copyright: meta.copyright,
            states,
        })
    }

    /// Check that every state image is a whole number of cells and that
    /// every state name is a plain file name.
    pub fn validate(&self) -> Result<()> {
        let CellSize { x, y } = self.size;
        if x == 0 || y == 0 {
            return Err(ConvertError::BoundsError(format!("cell size {}x{} is empty", x, y)));
        }
        for state in &self.states {
            if let Some(name) = state.name.as_deref().filter(|n| !is_plain_name(n)) {
                return Err(ConvertError::InvalidStateName(name.to_string()));
            }
            let (width, height) = state.image.dimensions();
            if width % x != 0 || height % y != 0 {
                return Err(ConvertError::InvalidStateDimensions {
                    state: state.display_name().to_string(),
                    width,
                    height,
                    cell_x: x,
                    cell_y: y,
                });
            }
        }
        Ok(())
    }

    /// The `meta.json` document. Unnamed states are left out.
    pub fn meta(&self) -> RsiMeta {
        RsiMeta {
            version: self.version,
            size: self.size,
            license: self.license.clone(),
            copyright: self.copyright.clone(),
            states: self.states.iter().filter_map(RsiState::meta).collect(),
        }
    }

    pub fn serialize_metadata(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.meta())?)
    }

    /// Write the bundle to `path`, which must end in `.rsi`.
    ///
    /// A missing or empty directory is filled; a non-empty one is refused.
    /// If writing fails part-way, a directory created by this call is removed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !is_bundle_path(path) {
            return Err(ConvertError::InvalidBundlePath(path.to_path_buf()));
        }
        self.validate()?;

        let created = if path.exists() {
            if !path.is_dir() || fs::read_dir(path)?.next().is_some() {
                return Err(ConvertError::BundleExists(path.to_path_buf()));
            }
            false
        } else {
            fs::create_dir_all(path)?;
            true
        };

        let result = self.write_contents(path);
        if result.is_err() && created {
            if let Err(e) = fs::remove_dir_all(path) {
                warn!("Failed to clean up {}: {}", path.display(), e);
            }
        }
        result
    }

    fn write_contents(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(META_FILE), self.serialize_metadata()?)?;

        for state in &self.states {
            match &state.name {
                Some(name) => save_png(&state.image, &dir.join(format!("{}.png", name)))?,
                None => warn!("Skipping unnamed state in {}", dir.display()),
            }
        }
        info!("Wrote {} ({} states)", dir.display(), self.state_names().len());
        Ok(())
    }
}
