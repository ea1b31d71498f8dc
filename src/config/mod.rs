//! Configuration for the rsikit command line
//!
//! Provides types and parsing for `rsikit.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
