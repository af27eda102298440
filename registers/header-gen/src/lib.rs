// Licensed under the Apache-2.0 license

//! Register map to C header generator.
//!
//! Walks a validated [`regmap_description::Top`] and emits the enums and
//! bit manipulation macros a C driver needs to build register accesses.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use regmap_header_gen::{generate_header_from_file, HeaderConfig};
//!
//! let path = Path::new("lmk05318.yaml");
//! let header = generate_header_from_file(path, &HeaderConfig::from_path(path)).unwrap();
//! print!("{header}");
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Header identity ([`HeaderConfig`])
//! - [`names`]: Canonical identifiers and label normalization ([`NameResolver`])
//! - [`emit`]: Declaration emission ([`HeaderEmitter`])

pub mod config;
pub mod emit;
pub mod names;


use regmap_description::{Result, Top};
use std::path::Path;

pub use config::HeaderConfig;
pub use emit::HeaderEmitter;
pub use names::{normalize, NameResolver};

/// Emits the complete header body for `top`.
pub fn generate_header(top: &Top, config: &HeaderConfig) -> Result<String> {
    HeaderEmitter::new(top, config).emit()
}

/// Reads, validates and emits a header for the description at `path`.
pub fn generate_header_from_file(path: &Path, config: &HeaderConfig) -> Result<String> {
    let top = Top::from_file(path)?;
    generate_header(&top, config)
}
