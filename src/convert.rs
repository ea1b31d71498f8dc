//! Conversion entry points: one DMI into one bundle, or into many
//!
//! Everything is assembled and validated in memory before the first file is
//! written, so a failed conversion leaves nothing behind.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::assets::{AssetProvider, DirAssetProvider, NoAssets};
use crate::dmi::Dmi;
use crate::error::{ConvertError, Result};
use crate::fetch::{fetch_bytes, is_url};
use crate::output::bundle_path;
use crate::rsi::{Rsi, RsiState, DEFAULT_LICENSE, RSI_VERSION};
use crate::split::{split, GroupingMode, SplitOptions};

/// Where a DMI comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Url(String),
}

impl SheetSource {
    /// Interpret a command-line argument: http(s) URLs are fetched, anything else is a path.
    pub fn parse(source: &str) -> Self {
        if is_url(source) {
            SheetSource::Url(source.to_string())
        } else {
            SheetSource::Path(PathBuf::from(source))
        }
    }

    /// The URL, for sources that have one.
    pub fn url(&self) -> Option<&str> {
        match self {
            SheetSource::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SheetSource::Path(path) => path.display().to_string(),
            SheetSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            SheetSource::Url(url) => url.clone(),
        }
    }
}

impl From<&Path> for SheetSource {
    fn from(path: &Path) -> Self {
        SheetSource::Path(path.to_path_buf())
    }
}

/// Load and slice a DMI from any source.
pub fn load_sheet(source: &SheetSource) -> Result<Dmi> {
    match source {
        SheetSource::Path(path) => Dmi::open(path),
        SheetSource::Bytes(bytes) => Dmi::from_bytes(bytes),
        SheetSource::Url(url) => Dmi::from_bytes(&fetch_bytes(url)?),
    }
}

/// Raw bytes of a source, without decoding.
pub fn read_source(source: &SheetSource) -> Result<Vec<u8>> {
    match source {
        SheetSource::Path(path) => {
            if !path.is_file() {
                return Err(ConvertError::UnsupportedInput(format!("{} is not a file", path.display())));
            }
            Ok(fs::read(path)?)
        }
        SheetSource::Bytes(bytes) => Ok(bytes.clone()),
        SheetSource::Url(url) => fetch_bytes(url),
    }
}

/// Settings shared by both conversions.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Falls back to the source URL for remote sheets
    pub copyright: Option<String>,
    pub license: String,
    /// RSI format version written into `meta.json`
    pub version: u32,
    /// Companion sheet with inventory icons (split only)
    pub icons: Option<SheetSource>,
    /// Directory of reference images such as `inhand-left.png` (split only)
    pub assets: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            copyright: None,
            license: DEFAULT_LICENSE.to_string(),
            version: RSI_VERSION,
            icons: None,
            assets: None,
        }
    }
}

impl ConvertOptions {
    fn copyright_for(&self, source: &SheetSource) -> Option<String> {
        self.copyright.clone().or_else(|| source.url().map(String::from))
    }
}

/// Copy every state of `dmi` into one bundle, in declaration order.
pub fn dmi_to_rsi(dmi: &Dmi, license: &str, copyright: Option<String>) -> Rsi {
    let mut rsi = Rsi::new(dmi.cell_size()).with_license(license).with_copyright(copyright);
    for state in &dmi.states {
        rsi.push_state(
            RsiState::new(state.name.clone(), state.image.clone())
                .with_directions(state.dirs)
                .with_delays(state.delay.clone()),
        );
    }
    rsi
}

/// Convert one DMI into one bundle at `dest`, which must end in `.rsi`.
pub fn convert_one(source: &SheetSource, dest: &Path, options: &ConvertOptions) -> Result<Rsi> {
    let dmi = load_sheet(source)?;
    let mut rsi = dmi_to_rsi(&dmi, &options.license, options.copyright_for(source));
    rsi.version = options.version;
    rsi.write(dest)?;
    info!("Converted {} -> {}", source.describe(), dest.display());
    Ok(rsi)
}

/// Split one DMI into bundles under `dest_dir`. Returns the written bundle paths.
///
/// Any failure aborts the whole batch before the first bundle is written.
pub fn convert_many(
    source: &SheetSource,
    dest_dir: &Path,
    mode: GroupingMode,
    options: &ConvertOptions,
) -> Result<Vec<PathBuf>> {
    let dmi = load_sheet(source)?;
    let icons = options.icons.as_ref().map(load_sheet).transpose()?;
    let dir_assets = options.assets.as_ref().map(DirAssetProvider::new);
    let assets: &dyn AssetProvider = match &dir_assets {
        Some(provider) => provider,
        None => &NoAssets,
    };

    let split_options = SplitOptions {
        copyright: options.copyright_for(source),
        license: options.license.clone(),
        icons: icons.as_ref(),
        assets,
    };
    let mut bundles = split(&dmi, mode, &split_options)?;

    let mut planned = Vec::with_capacity(bundles.len());
    for bundle in &mut bundles {
        bundle.rsi.version = options.version;
        bundle.rsi.validate()?;
        let path = bundle_path(dest_dir, &bundle.name);
        if path.exists() && (!path.is_dir() || fs::read_dir(&path)?.next().is_some()) {
            return Err(ConvertError::BundleExists(path));
        }
        planned.push(path);
    }

    fs::create_dir_all(dest_dir)?;
    for (bundle, path) in bundles.iter().zip(&planned) {
        bundle.rsi.write(path)?;
    }
    info!(
        "Split {} into {} bundles under {} ({} mode)",
        source.describe(),
        planned.len(),
        dest_dir.display(),
        mode
    );
    Ok(planned)
}
