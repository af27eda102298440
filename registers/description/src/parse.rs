// Licensed under the Apache-2.0 license

//! Building the model from a YAML document.
//!
//! The document is first decoded into loosely typed `Raw*` structs with
//! serde, then every entity is validated and converted top-down. Any failure
//! aborts the whole build.

use crate::codec::BitSpec;
use crate::error::{Error, Result};
use crate::model::{
    canonical_register_name, Bus, BusMask, Field, FieldPrefix, FlatRegister, GlobalEnum, Options,
    Page, Register, Top, MAX_WORD_COUNT,
};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;

const ENUM_KEY_PREFIX: &str = "x-";

/// An integer written either as a YAML number or as text.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
enum RawScalar {
    Int(u64),
    Str(String),
}

impl RawScalar {
    fn text(&self) -> String {
        match self {
            RawScalar::Int(v) => v.to_string(),
            RawScalar::Str(s) => s.clone(),
        }
    }

    fn to_u64(&self, what: &str) -> Result<u64> {
        match self {
            RawScalar::Int(v) => Ok(*v),
            RawScalar::Str(s) => parse_int(s)
                .ok_or_else(|| Error::Schema(format!("{what}: `{s}` is not an integer"))),
        }
    }
}

#[derive(Deserialize)]
struct RawTop {
    name: String,
    desc: Option<String>,
    #[serde(default)]
    reg_prefix: String,
    #[serde(default)]
    page_prefix: bool,
    #[serde(default)]
    field_prefix: Vec<String>,
    #[serde(default)]
    field_macros: bool,
    addr_width: RawScalar,
    data_width: RawScalar,
    bus: Option<RawBus>,
    pages: Vec<RawPage>,
    #[serde(flatten)]
    extra: Mapping,
}

#[derive(Deserialize)]
struct RawBus {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(alias = "usdr_path")]
    path: Option<String>,
    wr_mask: Option<RawScalar>,
    rd_mask: Option<RawScalar>,
}

#[derive(Deserialize)]
struct RawPage {
    name: String,
    regs: Vec<RawReg>,
}

#[derive(Deserialize)]
struct RawReg {
    name: String,
    addr: RawScalar,
    fields: Option<Vec<RawField>>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    desc: Option<String>,
    bits: RawScalar,
    opts: Option<Mapping>,
}

/// Parses decimal, `0x`, `0o` and `0b` integers; `_` separators are allowed.
fn parse_int(s: &str) -> Option<u64> {
    let s = s.trim().replace('_', "");
    let lower = s.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

fn value_to_u64(value: &Value, what: &str) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| Error::Schema(format!("{what}: `{n}` is not a non-negative integer"))),
        Value::String(s) => {
            parse_int(s).ok_or_else(|| Error::Schema(format!("{what}: `{s}` is not an integer")))
        }
        other => Err(Error::Schema(format!("{what}: expected an integer, got {other:?}"))),
    }
}

fn value_to_label(value: &Value, what: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::Schema(format!("{what}: expected a label, got {other:?}"))),
    }
}

/// Page, register and field names end up verbatim in C identifiers.
fn check_identifier(what: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Schema(format!(
            "{what} name `{name}` is not a valid identifier"
        )))
    }
}

impl Top {
    /// Builds and validates a description from YAML text.
    ///
    /// Only the first document of a multi-document stream is used.
    pub fn from_yaml(text: &str) -> Result<Top> {
        let raw = match serde_yaml::Deserializer::from_str(text).next() {
            Some(doc) => RawTop::deserialize(doc)?,
            None => return Err(Error::Schema("empty document".to_string())),
        };
        Top::from_raw(raw)
    }

    /// Reads and builds a description from a YAML file.
    pub fn from_file(path: &Path) -> Result<Top> {
        let text = std::fs::read_to_string(path)?;
        Top::from_yaml(&text)
    }

    fn from_raw(raw: RawTop) -> Result<Top> {
        let addr_width = raw.addr_width.to_u64("addr_width")?;
        let data_width = raw.data_width.to_u64("data_width")?;
        for (what, width) in [("addr_width", addr_width), ("data_width", data_width)] {
            if !(1..=64).contains(&width) {
                return Err(Error::Schema(format!(
                    "{what} must be between 1 and 64, got {width}"
                )));
            }
        }

        let field_prefix = raw
            .field_prefix
            .iter()
            .map(|p| FieldPrefix::parse(p))
            .collect::<Result<Vec<_>>>()?;

        let bus = match raw.bus {
            Some(bus) => {
                let wr_mask = bus.wr_mask.map(|m| m.to_u64("bus.wr_mask")).transpose()?;
                let rd_mask = bus.rd_mask.map(|m| m.to_u64("bus.rd_mask")).transpose()?;
                let mask = match (wr_mask, rd_mask) {
                    (Some(_), Some(_)) => {
                        return Err(Error::Conflict(
                            "specify rd_mask or wr_mask, but not both".to_string(),
                        ))
                    }
                    (Some(m), None) => Some(BusMask::Write(m)),
                    (None, Some(m)) => Some(BusMask::Read(m)),
                    (None, None) => None,
                };
                Bus {
                    kind: bus.kind,
                    path: bus.path,
                    mask,
                }
            }
            None => Bus::default(),
        };

        let data_width = data_width as u32;
        let mut pages = Vec::with_capacity(raw.pages.len());
        let mut page_index = HashMap::new();
        for raw_page in raw.pages {
            let page = build_page(raw_page, data_width)?;
            page_index.entry(page.name.clone()).or_insert(pages.len());
            pages.push(page);
        }

        let (flat, flat_index) = flatten(&pages, raw.page_prefix)?;
        let enums = build_enums(&raw.extra)?;

        Ok(Top {
            desc: raw.desc.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            reg_prefix: raw.reg_prefix,
            page_prefix: raw.page_prefix,
            field_prefix,
            field_macros: raw.field_macros,
            addr_width: addr_width as u32,
            data_width,
            bus,
            pages,
            enums,
            flat,
            page_index,
            flat_index,
        })
    }
}

fn build_page(raw: RawPage, data_width: u32) -> Result<Page> {
    check_identifier("page", &raw.name)?;
    let mut regs = Vec::with_capacity(raw.regs.len());
    let mut reg_index = HashMap::new();
    for raw_reg in raw.regs {
        let reg = build_register(raw_reg, data_width)?;
        reg_index.entry(reg.name.clone()).or_insert(regs.len());
        regs.push(reg);
    }
    Ok(Page {
        name: raw.name,
        regs,
        reg_index,
    })
}

/// Resolves `addr`, which is either one address or `"first:second"`.
///
/// `0x11:0x10` puts the most significant word at the higher address;
/// `0x10:0x11` puts it at the lower one and sets `big_order`.
fn parse_address(name: &str, addr: &RawScalar) -> Result<(u64, u64, bool)> {
    let text = addr.text();
    let parts = text.split(':').collect::<Vec<_>>();
    let parse = |s: &str| {
        parse_int(s).ok_or_else(|| {
            Error::Schema(format!("register `{name}`: bad address `{text}`"))
        })
    };
    let (mut hi, mut lo, mut big_order) = match parts.as_slice() {
        [single] => {
            let a = parse(single)?;
            (a, a, false)
        }
        [first, second] => (parse(first)?, parse(second)?, false),
        _ => {
            return Err(Error::Schema(format!(
                "register `{name}`: bad address `{text}`"
            )))
        }
    };
    if hi < lo {
        std::mem::swap(&mut hi, &mut lo);
        big_order = true;
    }
    let words = hi - lo + 1;
    if words > MAX_WORD_COUNT {
        return Err(Error::Width {
            register: name.to_string(),
            words,
            max: MAX_WORD_COUNT,
        });
    }
    Ok((hi, lo, big_order))
}

fn build_register(raw: RawReg, data_width: u32) -> Result<Register> {
    check_identifier("register", &raw.name)?;
    let (addr_hi, addr_lo, big_order) = parse_address(&raw.name, &raw.addr)?;
    let word_count = (addr_hi - addr_lo + 1) as u32;
    let bit_max = data_width * word_count - 1;

    let raw_fields = match raw.fields {
        Some(fields) if !fields.is_empty() => fields,
        _ => vec![RawField {
            name: "VALUE".to_string(),
            desc: Some(raw.name.clone()),
            bits: RawScalar::Str(format!("{bit_max}:0")),
            opts: None,
        }],
    };

    let mut fields = raw_fields
        .into_iter()
        .map(|f| build_field(f, &raw.name, addr_hi, bit_max))
        .collect::<Result<Vec<_>>>()?;
    fields.sort_by(|a, b| b.bits_lo().cmp(&a.bits_lo()));

    let mut field_index = HashMap::new();
    for (idx, field) in fields.iter().enumerate() {
        field_index.entry(field.name.clone()).or_insert(idx);
    }

    Ok(Register {
        name: raw.name,
        addr_hi,
        addr_lo,
        big_order,
        fields,
        field_index,
    })
}

fn build_field(raw: RawField, reg_name: &str, reg_addr: u64, bit_max: u32) -> Result<Field> {
    check_identifier(&format!("{reg_name} field"), &raw.name)?;
    let bits = BitSpec::parse(&raw.bits.text()).map_err(|e| match e {
        Error::Schema(msg) => Error::Schema(format!("{reg_name}::{}: {msg}", raw.name)),
        other => other,
    })?;

    if bits.hi() > bit_max {
        return Err(Error::Overflow {
            register: reg_name.to_string(),
            field: raw.name,
            bit: bits.hi(),
            max: bit_max,
        });
    }

    let mask = bits.mask();
    let max_value = bits.max_value();

    let mut options = Options::default();
    if let Some(opts) = &raw.opts {
        let what = format!("{reg_name}::{} opts", raw.name);
        for (key, label) in opts {
            let value = value_to_u64(key, &what)?;
            if value > max_value.window(0, 64) {
                return Err(Error::Schema(format!(
                    "{what}: value {value} does not fit in {} bits",
                    bits.width()
                )));
            }
            options
                .entries
                .push((value as u128, value_to_label(label, &what)?));
        }
    }

    log::debug!(
        "{:08x} {:<32} BITS [{}] MSK {:0>8}",
        reg_addr,
        format!("{}::{}", reg_name, raw.name),
        bits,
        format!("{mask:x}")
    );

    Ok(Field {
        desc: raw.desc.unwrap_or_else(|| raw.name.clone()),
        name: raw.name,
        bits,
        mask,
        max_value,
        options,
    })
}

type FlatMap = (Vec<FlatRegister>, HashMap<String, usize>);

fn flatten(pages: &[Page], page_prefix: bool) -> Result<FlatMap> {
    let mut flat = Vec::new();
    let mut index = HashMap::new();
    for (page_idx, page) in pages.iter().enumerate() {
        for (reg_idx, reg) in page.regs.iter().enumerate() {
            let base = canonical_register_name(page_prefix, page, reg);
            let words = if reg.word_count() == 1 {
                vec![(base, reg.addr_lo, None)]
            } else {
                (reg.addr_lo..=reg.addr_hi)
                    .filter_map(|addr| {
                        reg.significance_of(addr)
                            .map(|u| (format!("{base}_BY{u}"), addr, Some(u)))
                    })
                    .collect()
            };
            for (name, addr, word) in words {
                if index.contains_key(&name) {
                    return Err(Error::Conflict(format!(
                        "register `{name}` is already in the flat map, rename it"
                    )));
                }
                log::trace!("flat register {name} = 0x{addr:x}");
                index.insert(name.clone(), flat.len());
                flat.push(FlatRegister {
                    name,
                    addr,
                    word,
                    page: page_idx,
                    reg: reg_idx,
                });
            }
        }
    }
    Ok((flat, index))
}

fn build_enums(extra: &Mapping) -> Result<Vec<GlobalEnum>> {
    let mut enums = Vec::new();
    for (key, table) in extra {
        let Some(name) = key.as_str().and_then(|k| k.strip_prefix(ENUM_KEY_PREFIX)) else {
            continue;
        };
        let table = table.as_mapping().ok_or_else(|| {
            Error::Schema(format!("enum `{name}` must map values to labels"))
        })?;
        let what = format!("enum `{name}`");
        let mut entries: Vec<(String, u64)> = Vec::with_capacity(table.len());
        for (value, label) in table {
            let value = value_to_u64(value, &what)?;
            let label = value_to_label(label, &what)?;
            // A repeated label keeps its first position and takes the last value.
            match entries.iter_mut().find(|(l, _)| *l == label) {
                Some(entry) => entry.1 = value,
                None => entries.push((label, value)),
            }
        }
        enums.push(GlobalEnum {
            name: name.to_string(),
            entries,
        });
    }
    Ok(enums)
}
