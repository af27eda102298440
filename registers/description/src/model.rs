// Licensed under the Apache-2.0 license

//! The immutable register map tree.
//!
//! ```text
//! Top
//! ├── pages: Vec<Page>
//! │   └── regs: Vec<Register>
//! │       └── fields: Vec<Field>     # sorted by descending low bit
//! ├── enums: Vec<GlobalEnum>         # `x-` prefixed tables
//! └── flat: Vec<FlatRegister>        # one entry per addressable word
//! ```
//!
//! Everything here is built once by [`Top::from_yaml`] and never mutated.
//! Name lookups go through maps built during construction and report
//! [`Error::Lookup`] on a miss.

use crate::codec::{BitMask, BitSpec};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Most words a combined register may span.
pub const MAX_WORD_COUNT: u64 = 9;

/// One component of a field identifier prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldPrefix {
    /// Upper-cased page name.
    Page,
    /// Upper-cased register name.
    RegName,
    /// Register low address as two hex digits.
    RegAddr,
}

impl FieldPrefix {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "page" => Ok(FieldPrefix::Page),
            "regname" => Ok(FieldPrefix::RegName),
            "regaddr" => Ok(FieldPrefix::RegAddr),
            _ => Err(Error::Schema(format!("unknown prefix type `{s}`"))),
        }
    }
}

/// Fixed bits OR'd into every bus frame of one direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMask {
    Write(u64),
    Read(u64),
}

/// Bus binding of the device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bus {
    pub kind: Option<String>,
    pub path: Option<String>,
    pub mask: Option<BusMask>,
}

/// Sparse value → label table of a field, in declaration order.
///
/// A value without an entry is simply absent; it is never an empty label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub(crate) entries: Vec<(u128, String)>,
}

impl Options {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Label for `value`, if one was declared.
    pub fn label(&self, value: u128) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, label)| label.as_str())
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (u128, &str)> {
        self.entries.iter().map(|(v, l)| (*v, l.as_str()))
    }
}

/// A bit field of a register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) desc: String,
    pub(crate) bits: BitSpec,
    pub(crate) mask: BitMask,
    pub(crate) max_value: BitMask,
    pub(crate) options: Options,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn bits(&self) -> &BitSpec {
        &self.bits
    }

    pub fn bits_lo(&self) -> u32 {
        self.bits.lo()
    }

    pub fn bits_hi(&self) -> u32 {
        self.bits.hi()
    }

    /// Scattered bit positions, most significant first.
    pub fn bit_positions(&self) -> Option<&[u32]> {
        self.bits.positions()
    }

    pub fn mask(&self) -> &BitMask {
        &self.mask
    }

    pub fn max_value(&self) -> &BitMask {
        &self.max_value
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The field's contribution to a full register value.
    pub fn encode(&self, dense: u128) -> u128 {
        self.bits.encode(dense)
    }

    /// The field's dense value within a full register value.
    pub fn decode(&self, raw: u128) -> u128 {
        self.bits.decode(raw)
    }
}

/// One or more consecutive words treated as a single value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub(crate) name: String,
    pub(crate) addr_hi: u64,
    pub(crate) addr_lo: u64,
    pub(crate) big_order: bool,
    pub(crate) fields: Vec<Field>,
    pub(crate) field_index: HashMap<String, usize>,
}

impl Register {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr_hi(&self) -> u64 {
        self.addr_hi
    }

    pub fn addr_lo(&self) -> u64 {
        self.addr_lo
    }

    /// `true` when the lowest address holds the most significant word.
    pub fn big_order(&self) -> bool {
        self.big_order
    }

    pub fn word_count(&self) -> u32 {
        (self.addr_hi - self.addr_lo + 1) as u32
    }

    /// Fields sorted by descending low bit.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        self.field_index
            .get(name)
            .map(|idx| &self.fields[*idx])
            .ok_or_else(|| Error::Lookup {
                kind: "field",
                name: format!("{}::{}", self.name, name),
            })
    }

    /// Address of the word with significance index `u` (0 = most significant).
    pub fn word_address(&self, u: u32) -> u64 {
        if self.big_order {
            self.addr_lo + u as u64
        } else {
            self.addr_hi - u as u64
        }
    }

    /// Significance index of the word at `addr` (0 = most significant).
    pub fn significance_of(&self, addr: u64) -> Option<u32> {
        if addr < self.addr_lo || addr > self.addr_hi {
            return None;
        }
        Some(if self.big_order {
            (addr - self.addr_lo) as u32
        } else {
            (self.addr_hi - addr) as u32
        })
    }

    /// `true` when the only field is `VALUE`, declared or synthesized.
    pub fn is_value_only(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].name.eq_ignore_ascii_case("value")
    }

    /// `true` for a single word register whose only field is `VALUE`.
    pub fn is_single_value(&self) -> bool {
        self.word_count() == 1 && self.is_value_only()
    }

    /// Union of every field mask.
    pub fn value_mask(&self) -> BitMask {
        self.fields.iter().fold(BitMask::default(), |mut m, f| {
            m |= &f.mask;
            m
        })
    }

    /// Lowest bit used by any field.
    pub fn value_offset(&self) -> u32 {
        self.fields.iter().map(Field::bits_lo).min().unwrap_or(0)
    }

    /// Dense value of every field in a full register value, in field order.
    pub fn decode_fields(&self, value: u128) -> Vec<(&str, u128)> {
        self.fields
            .iter()
            .map(|f| (f.name(), f.decode(value)))
            .collect()
    }
}

/// A named group of registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub(crate) name: String,
    pub(crate) regs: Vec<Register>,
    pub(crate) reg_index: HashMap<String, usize>,
}

impl Page {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regs(&self) -> &[Register] {
        &self.regs
    }

    pub fn register(&self, name: &str) -> Result<&Register> {
        self.reg_index
            .get(name)
            .map(|idx| &self.regs[*idx])
            .ok_or_else(|| Error::Lookup {
                kind: "register",
                name: format!("{}::{}", self.name, name),
            })
    }
}

/// A device-wide value table declared with an `x-` key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalEnum {
    pub(crate) name: String,
    pub(crate) entries: Vec<(String, u64)>,
}

impl GlobalEnum {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(label, value)` pairs in declaration order.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }
}

/// One entry of the flattened register namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatRegister {
    /// Canonical name, `_BY<k>` suffixed for multi word registers.
    pub name: String,
    pub addr: u64,
    /// Significance index of the word; `None` for single word registers.
    pub word: Option<u32>,
    pub page: usize,
    pub reg: usize,
}

/// The root of a register description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Top {
    pub(crate) name: String,
    pub(crate) desc: String,
    pub(crate) reg_prefix: String,
    pub(crate) page_prefix: bool,
    pub(crate) field_prefix: Vec<FieldPrefix>,
    pub(crate) field_macros: bool,
    pub(crate) addr_width: u32,
    pub(crate) data_width: u32,
    pub(crate) bus: Bus,
    pub(crate) pages: Vec<Page>,
    pub(crate) enums: Vec<GlobalEnum>,
    pub(crate) flat: Vec<FlatRegister>,
    pub(crate) page_index: HashMap<String, usize>,
    pub(crate) flat_index: HashMap<String, usize>,
}

/// Canonical register name: `PAGE_REGNAME` with page prefixing, else `REGNAME`.
pub fn canonical_register_name(page_prefix: bool, page: &Page, reg: &Register) -> String {
    if page_prefix {
        format!("{}_{}", page.name.to_uppercase(), reg.name)
    } else {
        reg.name.clone()
    }
}

fn width_mask(width: u32) -> u128 {
    1u128.checked_shl(width).unwrap_or(0).wrapping_sub(1)
}

impl Top {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn reg_prefix(&self) -> &str {
        &self.reg_prefix
    }

    pub fn page_prefix(&self) -> bool {
        self.page_prefix
    }

    pub fn field_prefix(&self) -> &[FieldPrefix] {
        &self.field_prefix
    }

    pub fn field_macros(&self) -> bool {
        self.field_macros
    }

    pub fn addr_width(&self) -> u32 {
        self.addr_width
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Mask of one data word.
    pub fn data_mask(&self) -> u64 {
        width_mask(self.data_width) as u64
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn wr_mask(&self) -> Option<u64> {
        match self.bus.mask {
            Some(BusMask::Write(m)) => Some(m),
            _ => None,
        }
    }

    pub fn rd_mask(&self) -> Option<u64> {
        match self.bus.mask {
            Some(BusMask::Read(m)) => Some(m),
            _ => None,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn enums(&self) -> &[GlobalEnum] {
        &self.enums
    }

    pub fn page(&self, name: &str) -> Result<&Page> {
        self.page_index
            .get(name)
            .map(|idx| &self.pages[*idx])
            .ok_or_else(|| Error::Lookup {
                kind: "page",
                name: name.to_string(),
            })
    }

    /// The flattened register namespace in emission order.
    pub fn flat_registers(&self) -> &[FlatRegister] {
        &self.flat
    }

    /// Looks up a flattened name, e.g. `FREQ_BY1`.
    pub fn register(&self, flat_name: &str) -> Result<&FlatRegister> {
        self.flat_index
            .get(flat_name)
            .map(|idx| &self.flat[*idx])
            .ok_or_else(|| Error::Lookup {
                kind: "register",
                name: flat_name.to_string(),
            })
    }

    /// Canonical name of `reg` on `page`.
    pub fn register_name(&self, page: &Page, reg: &Register) -> String {
        canonical_register_name(self.page_prefix, page, reg)
    }

    /// Bus frame writing `value` to `addr`, as the generated write macro builds it.
    pub fn write_frame(&self, addr: u64, value: u64) -> u128 {
        let addr = addr as u128 & width_mask(self.addr_width);
        let mut frame = (addr << self.data_width) | (value & self.data_mask()) as u128;
        if let Some(mask) = self.wr_mask() {
            frame |= mask as u128;
        }
        frame
    }

    /// Bus frame reading `addr`, as the generated read macro builds it.
    pub fn read_frame(&self, addr: u64) -> u128 {
        let addr = addr as u128 & width_mask(self.addr_width);
        let mut frame = addr << self.data_width;
        if let Some(mask) = self.rd_mask() {
            frame |= mask as u128;
        }
        frame
    }
}
