// Licensed under the Apache-2.0 license

//! Configuration of the emitted header.

use std::path::Path;

/// Identity of the generated header.
///
/// The name shapes every header-wide identifier: the register enum
/// (`<name>_regs_t`), the bus macros (`MAKE_<NAME>_REG_WR`) and every
/// per-register macro (`MAKE_<NAME>_<REG>`).
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use regmap_header_gen::HeaderConfig;
///
/// let config = HeaderConfig::from_path(Path::new("hw/lmk05318.yaml"));
/// assert_eq!(config.upper(), "LMK05318");
/// assert_eq!(config.lower(), "lmk05318");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderConfig {
    pub name: String,
}

impl HeaderConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Uses the file stem of the description as the header name.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name }
    }

    pub fn upper(&self) -> String {
        self.name.to_uppercase()
    }

    pub fn lower(&self) -> String {
        self.name.to_lowercase()
    }
}
