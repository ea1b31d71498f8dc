//! Error types shared by every conversion stage

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Error raised while reading, slicing, synthesizing or writing sprite containers.
///
/// None of these are downgraded to warnings: any of them aborts the enclosing
/// conversion. Recoverable shortfalls (a group without enough source states)
/// exclude the group instead and never surface here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// Malformed legacy descriptor
    #[error("DMI metadata line {line}: {message}")]
    MetadataParseError { line: usize, message: String },

    /// A crop or paste rectangle falls outside an image
    #[error("Out of bounds: {0}")]
    BoundsError(String),

    /// A state bitmap is not a whole number of cells
    #[error("State '{state}' is {width}x{height}, not a multiple of the {cell_x}x{cell_y} cell size")]
    InvalidStateDimensions { state: String, width: u32, height: u32, cell_x: u32, cell_y: u32 },

    /// A state name that cannot be used as a file name inside the bundle
    #[error("State name '{0}' is not a plain file name")]
    InvalidStateName(String),

    /// `meta.json` names a state without a matching PNG
    #[error("State '{state}' has no image at {}", path.display())]
    MissingStateAsset { state: String, path: PathBuf },

    /// Source is neither an existing path nor a decodable image
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Remote source could not be fetched
    #[error("Failed to fetch {url}: {message}")]
    RemoteFetchError { url: String, message: String },

    /// Bundle path does not end in `.rsi`
    #[error("Bundle path must end with .rsi: {}", .0.display())]
    InvalidBundlePath(PathBuf),

    /// Refusing to overwrite a non-empty bundle
    #[error("Refusing to overwrite non-empty bundle at {}", .0.display())]
    BundleExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ConvertError::MetadataParseError { line, message: message.into() }
    }
}
