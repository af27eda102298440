// Licensed under the Apache-2.0 license

//! Canonical identifiers for registers and fields.

use regmap_description::{Field, FieldPrefix, Page, Register, Top};

/// Replacements applied, in order, by [`normalize`].
const REPLACEMENTS: &[(&str, &str)] = &[
    ("-", "_"),
    ("<=", "LE"),
    (">=", "GE"),
    (">", "GT"),
    ("<", "LT"),
    ("=", "EQ"),
    ("+", "PL"),
    ("'", "MARK"),
    (".", "_"),
    (",", "_"),
    (" ", "_"),
    ("(", ""),
    ("|", "OR"),
    (")", ""),
    ("/", "DIV"),
];

/// Maps label text onto identifier-safe tokens.
///
/// # Examples
/// ```
/// use regmap_header_gen::normalize;
/// assert_eq!(normalize("VCO/2"), "VCODIV2");
/// assert_eq!(normalize("F>=100M"), "FGE100M");
/// assert_eq!(normalize("IN(A|B)"), "INAORB");
/// ```
pub fn normalize(label: &str) -> String {
    REPLACEMENTS
        .iter()
        .fold(label.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Computes register and field identifiers from the description's
/// prefixing rules.
pub struct NameResolver<'a> {
    top: &'a Top,
}

impl<'a> NameResolver<'a> {
    pub fn new(top: &'a Top) -> Self {
        Self { top }
    }

    /// `PAGE_REGNAME` with page prefixing, else `REGNAME`.
    pub fn register_name(&self, page: &Page, reg: &Register) -> String {
        self.top.register_name(page, reg)
    }

    /// Upper-cased `reg_prefix` plus `_`, or nothing.
    pub fn reg_prefix(&self) -> String {
        if self.top.reg_prefix().is_empty() {
            String::new()
        } else {
            format!("{}_", self.top.reg_prefix().to_uppercase())
        }
    }

    /// Identifier of a flattened register name inside the register enum.
    pub fn register_ident(&self, flat_name: &str) -> String {
        format!("{}{}", self.reg_prefix(), flat_name)
    }

    /// Field identifier: the configured prefix components joined with `_`,
    /// followed by the field name.
    pub fn field_name(&self, page: &Page, reg: &Register, field: &Field) -> String {
        let mut parts = self
            .top
            .field_prefix()
            .iter()
            .map(|p| match p {
                FieldPrefix::Page => page.name().to_uppercase(),
                FieldPrefix::RegName => reg.name().to_uppercase(),
                FieldPrefix::RegAddr => format!("{:02x}", reg.addr_lo()),
            })
            .collect::<Vec<_>>();
        parts.push(field.name().to_string());
        parts.join("_")
    }
}
