// Licensed under the Apache-2.0 license

//! Register map description model.
//!
//! This crate turns a hierarchical YAML register map into an immutable,
//! validated model that code generators and live register tooling share.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use regmap_description::Top;
//!
//! let top = Top::from_file(Path::new("lmk05318.yaml")).unwrap();
//! let reg = top.page("Main").unwrap().register("CTRL").unwrap();
//! println!("{} words at 0x{:x}", reg.word_count(), reg.addr_lo());
//! ```
//!
//! ## Module Organization
//!
//! - [`codec`]: Bit packing between dense field values and register bit positions
//! - [`model`]: The immutable Top → Page → Register → Field tree
//! - [`access`]: Helpers for reading and writing live registers through the model
//! - [`error`]: The error type shared by every stage of the pipeline

pub mod access;
pub mod codec;
pub mod error;
pub mod model;

mod parse;

pub use access::{dump_page, read_register, write_register, RegisterAccess};
pub use codec::{BitMask, BitSpec};
pub use error::{Error, Result};
pub use model::{
    canonical_register_name, Bus, BusMask, Field, FieldPrefix, FlatRegister, GlobalEnum, Options,
    Page, Register, Top, MAX_WORD_COUNT,
};
