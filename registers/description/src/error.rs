// Licensed under the Apache-2.0 license

use thiserror::Error;

/// Errors raised while building a register description or emitting from it.
///
/// All of them are fatal: once one is returned nothing is produced.
#[derive(Error, Debug)]
pub enum Error {
    /// A required key is missing or a value is malformed.
    #[error("schema error: {0}")]
    Schema(String),

    /// A field reaches past the last bit of its register.
    #[error("maximum bit {bit} in description is more than {max} bit in \"{register}::{field}\" register")]
    Overflow {
        register: String,
        field: String,
        bit: u32,
        max: u32,
    },

    /// Duplicate flattened register names or mutually exclusive settings.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A combined register spans too many words.
    #[error("combined register `{register}` is {words} words wide, at most {max} are supported")]
    Width {
        register: String,
        words: u64,
        max: u64,
    },

    /// Name based lookup of a page, register or field failed.
    #[error("{kind} `{name}` not found")]
    Lookup { kind: &'static str, name: String },

    /// The requested output cannot be expressed for this description.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Schema(err.to_string())
    }
}

/// Result type for description and emission operations.
pub type Result<T> = std::result::Result<T, Error>;
