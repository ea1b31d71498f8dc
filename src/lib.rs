//! rsikit - Library for converting BYOND DMI sprite sheets into RSI bundles
//!
//! This library provides functionality to:
//! - Parse the `Description` text chunk of a DMI and slice its sheet into states
//! - Write and read RSI bundles (`meta.json` plus one PNG per state)
//! - Split one sheet into many bundles by grouping state names, rebuilding
//!   smoothing tiles, worn items and numbered sequences on the way

pub mod assets;
pub mod cli;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod dmi;
pub mod error;
pub mod fetch;
pub mod output;
pub mod rsi;
pub mod split;
pub mod spritesheet;

pub use convert::{convert_many, convert_one, ConvertOptions, SheetSource};
pub use dmi::Dmi;
pub use error::{ConvertError, Result};
pub use rsi::Rsi;
pub use split::GroupingMode;
