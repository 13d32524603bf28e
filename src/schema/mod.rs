//! Schema module - Scene configuration and built-in presets.

mod config;
mod preset;

pub use config::*;
pub use preset::*;
