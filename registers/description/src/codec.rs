// Licensed under the Apache-2.0 license

//! Bit packing between dense field values and their physical bit positions.
//!
//! A field occupies either a contiguous range of register bits or an ordered
//! list of scattered bits. Either way the field has a *dense* value, with its
//! bits packed from bit 0, and a *scattered* value, with those bits placed at
//! their real positions.
//!
//! ```text
//! bits "5,3,1"   dense 0b101  ──encode──►  raw 0b10_0010
//!                 ▲                          │
//!                 └──────────decode──────────┘
//! ```
//!
//! For a scattered list the first listed position carries the most
//! significant bit of the dense value and the last listed position carries
//! bit 0.

use crate::error::{Error, Result};
use std::fmt;
use std::ops::BitOrAssign;

/// A set of bit positions of any width.
///
/// A register may span nine 64-bit words, so masks are kept as
/// little-endian 64-bit words instead of a primitive integer.
#[derive(Clone, Debug, Default)]
pub struct BitMask {
    words: Vec<u64>,
}

impl BitMask {
    pub fn from_bits(bits: impl IntoIterator<Item = u32>) -> Self {
        let mut mask = BitMask::default();
        for b in bits {
            mask.set(b);
        }
        mask
    }

    /// Bits `0..width`.
    pub fn ones(width: u32) -> Self {
        Self::from_bits(0..width)
    }

    pub fn set(&mut self, bit: u32) {
        let idx = (bit / 64) as usize;
        if self.words.len() <= idx {
            self.words.resize(idx + 1, 0);
        }
        self.words[idx] |= 1 << (bit % 64);
    }

    pub fn contains(&self, bit: u32) -> bool {
        self.words
            .get((bit / 64) as usize)
            .is_some_and(|w| (w >> (bit % 64)) & 1 != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.significant().is_empty()
    }

    /// `width` bits (at most 64) starting at bit `shift`, packed into a word.
    pub fn window(&self, shift: u32, width: u32) -> u64 {
        (0..width.min(64))
            .filter(|i| self.contains(shift.saturating_add(*i)))
            .fold(0, |acc, i| acc | (1 << i))
    }

    /// The low 128 bits; anything above is dropped.
    pub fn low_u128(&self) -> u128 {
        self.words
            .iter()
            .take(2)
            .enumerate()
            .fold(0, |acc, (i, w)| acc | ((*w as u128) << (64 * i)))
    }

    /// The mask as a `u128`, or `None` when it reaches bit 128 or above.
    pub fn to_u128(&self) -> Option<u128> {
        (self.significant().len() <= 2).then(|| self.low_u128())
    }

    fn significant(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|w| *w != 0)
            .map_or(0, |top| top + 1);
        &self.words[..len]
    }
}

impl PartialEq for BitMask {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for BitMask {}

impl PartialEq<u128> for BitMask {
    fn eq(&self, other: &u128) -> bool {
        self.to_u128() == Some(*other)
    }
}

impl BitOrAssign<&BitMask> for BitMask {
    fn bitor_assign(&mut self, rhs: &BitMask) {
        if self.words.len() < rhs.words.len() {
            self.words.resize(rhs.words.len(), 0);
        }
        for (word, r) in self.words.iter_mut().zip(&rhs.words) {
            *word |= r;
        }
    }
}

impl fmt::LowerHex for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.significant().split_last() {
            None => write!(f, "0"),
            Some((top, rest)) => {
                write!(f, "{top:x}")?;
                for word in rest.iter().rev() {
                    write!(f, "{word:016x}")?;
                }
                Ok(())
            }
        }
    }
}

/// The bit specification of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitSpec {
    /// Inclusive contiguous range `hi:lo`.
    Range { hi: u32, lo: u32 },
    /// Individual bit positions, most significant first.
    List(Vec<u32>),
}

fn bit(pos: u32) -> u128 {
    1u128.checked_shl(pos).unwrap_or(0)
}

fn low_ones(width: u32) -> u128 {
    bit(width).wrapping_sub(1)
}

fn parse_bit(raw: &str, text: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| Error::Schema(format!("bad bit index `{raw}` in bits `{text}`")))
}

impl BitSpec {
    /// Parses `"N"`, `"H:L"`, `"H-L"` or a comma separated list `"A,B,C"`.
    ///
    /// # Examples
    /// ```
    /// use regmap_description::BitSpec;
    /// assert_eq!(BitSpec::parse("7:4").unwrap(), BitSpec::Range { hi: 7, lo: 4 });
    /// assert_eq!(BitSpec::parse("3").unwrap(), BitSpec::Range { hi: 3, lo: 3 });
    /// assert_eq!(BitSpec::parse("5,3,1").unwrap(), BitSpec::List(vec![5, 3, 1]));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.contains(',') {
            let positions = text
                .split(',')
                .map(|b| parse_bit(b, text))
                .collect::<Result<Vec<_>>>()?;
            for (i, pos) in positions.iter().enumerate() {
                if positions[..i].contains(pos) {
                    return Err(Error::Schema(format!(
                        "bit {pos} is listed twice in bits `{text}`"
                    )));
                }
            }
            if positions.len() == 1 {
                return Ok(BitSpec::Range {
                    hi: positions[0],
                    lo: positions[0],
                });
            }
            return Ok(BitSpec::List(positions));
        }

        let mut parts = text.split(':').collect::<Vec<_>>();
        if parts.len() == 1 {
            parts = text.split('-').collect();
        }
        match parts.as_slice() {
            [single] => {
                let b = parse_bit(single, text)?;
                Ok(BitSpec::Range { hi: b, lo: b })
            }
            [hi, lo] => {
                let hi = parse_bit(hi, text)?;
                let lo = parse_bit(lo, text)?;
                if hi < lo {
                    return Err(Error::Schema(format!(
                        "bits `{text}` must be written high to low"
                    )));
                }
                Ok(BitSpec::Range { hi, lo })
            }
            _ => Err(Error::Schema(format!("cannot parse bits `{text}`"))),
        }
    }

    /// Lowest bit occupied by the field.
    pub fn lo(&self) -> u32 {
        match self {
            BitSpec::Range { lo, .. } => *lo,
            BitSpec::List(list) => list.iter().copied().min().unwrap_or(0),
        }
    }

    /// Highest bit occupied by the field.
    pub fn hi(&self) -> u32 {
        match self {
            BitSpec::Range { hi, .. } => *hi,
            BitSpec::List(list) => list.iter().copied().max().unwrap_or(0),
        }
    }

    /// Number of bits in the field.
    pub fn width(&self) -> u32 {
        match self {
            BitSpec::Range { hi, lo } => hi - lo + 1,
            BitSpec::List(list) => list.len() as u32,
        }
    }

    /// The scattered positions, or `None` for a contiguous field.
    pub fn positions(&self) -> Option<&[u32]> {
        match self {
            BitSpec::Range { .. } => None,
            BitSpec::List(list) => Some(list),
        }
    }

    pub fn is_scattered(&self) -> bool {
        matches!(self, BitSpec::List(_))
    }

    /// Union of all bits the field occupies within its register.
    pub fn mask(&self) -> BitMask {
        match self {
            BitSpec::Range { hi, lo } => BitMask::from_bits(*lo..=*hi),
            BitSpec::List(list) => BitMask::from_bits(list.iter().copied()),
        }
    }

    /// Largest dense value the field can hold.
    pub fn max_value(&self) -> BitMask {
        BitMask::ones(self.width())
    }

    /// Places a dense value at the field's positions, relative to [`Self::lo`].
    pub fn scatter(&self, dense: u128) -> u128 {
        match self {
            BitSpec::Range { .. } => dense & low_ones(self.width()),
            BitSpec::List(list) => {
                let lo = self.lo();
                let n = list.len() as u32;
                list.iter()
                    .enumerate()
                    .filter(|(i, _)| (dense >> (n - 1 - *i as u32)) & 1 != 0)
                    .fold(0, |acc, (_, pos)| acc | bit(pos - lo))
            }
        }
    }

    /// Packs a value relative to [`Self::lo`] back into a dense value.
    pub fn gather(&self, scattered: u128) -> u128 {
        match self {
            BitSpec::Range { .. } => scattered & low_ones(self.width()),
            BitSpec::List(list) => {
                let lo = self.lo();
                let n = list.len() as u32;
                list.iter()
                    .enumerate()
                    .filter(|(_, pos)| (scattered >> (**pos - lo)) & 1 != 0)
                    .fold(0, |acc, (i, _)| acc | bit(n - 1 - i as u32))
            }
        }
    }

    /// The field's contribution to a full register value.
    ///
    /// Register values are carried in a `u128`; bits at 128 and above are
    /// dropped.
    pub fn encode(&self, dense: u128) -> u128 {
        self.scatter(dense).checked_shl(self.lo()).unwrap_or(0) & self.mask().low_u128()
    }

    /// Extracts the field's dense value from a full register value.
    pub fn decode(&self, raw: u128) -> u128 {
        let raw = raw & self.mask().low_u128();
        self.gather(raw.checked_shr(self.lo()).unwrap_or(0))
    }
}

impl fmt::Display for BitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitSpec::Range { hi, lo } if hi == lo => write!(f, "{hi}"),
            BitSpec::Range { hi, lo } => write!(f, "{hi}:{lo}"),
            BitSpec::List(list) => {
                let items = list.iter().map(u32::to_string).collect::<Vec<_>>();
                write!(f, "{}", items.join(","))
            }
        }
    }
}
