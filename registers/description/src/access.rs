// Licensed under the Apache-2.0 license

//! Reading and writing live registers through the model.
//!
//! The compiler never touches hardware. These helpers serve tools that hold a
//! [`RegisterAccess`] implementation (a debug pipe, a simulator, a test
//! double) and want whole-register values instead of individual words.
//!
//! Word order follows [`Register::big_order`]: significance index 0 is always
//! the most significant word, wherever it lives.

use crate::model::{Page, Register, Top};

/// Word-level access to a device's register bus.
pub trait RegisterAccess {
    type Error;

    fn read(&mut self, addr: u64) -> Result<u64, Self::Error>;

    fn write(&mut self, addr: u64, value: u64) -> Result<(), Self::Error>;
}

/// Bit shift of the word with significance index `u`.
fn word_shift(top: &Top, reg: &Register, u: u32) -> u32 {
    top.data_width() * (reg.word_count() - 1 - u)
}

/// Reads every word of `reg` and combines them into one value.
///
/// Words are read in ascending address order. Bits above 127 carry no field
/// and are dropped.
pub fn read_register<A: RegisterAccess>(
    top: &Top,
    reg: &Register,
    access: &mut A,
) -> Result<u128, A::Error> {
    let mut value = 0u128;
    for addr in reg.addr_lo()..=reg.addr_hi() {
        let Some(u) = reg.significance_of(addr) else {
            continue;
        };
        let word = (access.read(addr)? & top.data_mask()) as u128;
        value |= word.checked_shl(word_shift(top, reg, u)).unwrap_or(0);
    }
    Ok(value)
}

/// Splits `value` into words and writes them in ascending address order.
pub fn write_register<A: RegisterAccess>(
    top: &Top,
    reg: &Register,
    value: u128,
    access: &mut A,
) -> Result<(), A::Error> {
    for addr in reg.addr_lo()..=reg.addr_hi() {
        let Some(u) = reg.significance_of(addr) else {
            continue;
        };
        let word = value.checked_shr(word_shift(top, reg, u)).unwrap_or(0) as u64;
        access.write(addr, word & top.data_mask())?;
    }
    Ok(())
}

/// Snapshot of every word on `page` as `(address, word)` pairs.
pub fn dump_page<A: RegisterAccess>(
    top: &Top,
    page: &Page,
    access: &mut A,
) -> Result<Vec<(u64, u64)>, A::Error> {
    let mut dump = Vec::new();
    for reg in page.regs() {
        for addr in reg.addr_lo()..=reg.addr_hi() {
            dump.push((addr, access.read(addr)? & top.data_mask()));
        }
    }
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MockBus {
        words: BTreeMap<u64, u64>,
        writes: Vec<(u64, u64)>,
    }

    impl RegisterAccess for MockBus {
        type Error = String;

        fn read(&mut self, addr: u64) -> Result<u64, String> {
            self.words
                .get(&addr)
                .copied()
                .ok_or_else(|| format!("no word at 0x{addr:x}"))
        }

        fn write(&mut self, addr: u64, value: u64) -> Result<(), String> {
            self.writes.push((addr, value));
            self.words.insert(addr, value);
            Ok(())
        }
    }

    const DOC: &str = r#"
name: T
addr_width: 8
data_width: 8
pages:
  - name: Main
    regs:
      - name: LITTLE
        addr: "0x21:0x20"
        fields:
          - name: HI
            bits: "15:8"
          - name: LO
            bits: "7:0"
      - name: BIG
        addr: "0x30:0x32"
      - name: CTRL
        addr: 0x40
        fields:
          - name: EN
            bits: 0
          - name: STEP
            bits: "5,3,1"
"#;

    #[test]
    fn test_read_little_order() {
        let top = Top::from_yaml(DOC).unwrap();
        let reg = top.page("Main").unwrap().register("LITTLE").unwrap();
        let mut bus = MockBus::default();
        bus.words.insert(0x20, 0x34);
        bus.words.insert(0x21, 0x12);
        let value = read_register(&top, reg, &mut bus).unwrap();
        assert_eq!(value, 0x1234);
        let fields = reg.decode_fields(value);
        assert_eq!(fields, vec![("HI", 0x12), ("LO", 0x34)]);
    }

    #[test]
    fn test_read_big_order() {
        let top = Top::from_yaml(DOC).unwrap();
        let reg = top.page("Main").unwrap().register("BIG").unwrap();
        let mut bus = MockBus::default();
        bus.words.insert(0x30, 0x01);
        bus.words.insert(0x31, 0x02);
        bus.words.insert(0x32, 0x03);
        assert_eq!(read_register(&top, reg, &mut bus).unwrap(), 0x01_0203);
    }

    #[test]
    fn test_write_splits_words() {
        let top = Top::from_yaml(DOC).unwrap();
        let page = top.page("Main").unwrap();
        let mut bus = MockBus::default();

        write_register(&top, page.register("BIG").unwrap(), 0xaa_bbcc, &mut bus).unwrap();
        assert_eq!(bus.writes, vec![(0x30, 0xaa), (0x31, 0xbb), (0x32, 0xcc)]);

        bus.writes.clear();
        write_register(&top, page.register("LITTLE").unwrap(), 0x1234, &mut bus).unwrap();
        assert_eq!(bus.writes, vec![(0x20, 0x34), (0x21, 0x12)]);
    }

    #[test]
    fn test_scattered_field_through_bus() {
        let top = Top::from_yaml(DOC).unwrap();
        let reg = top.page("Main").unwrap().register("CTRL").unwrap();
        let step = reg.field("STEP").unwrap();
        let en = reg.field("EN").unwrap();
        let mut bus = MockBus::default();
        write_register(&top, reg, step.encode(5) | en.encode(1), &mut bus).unwrap();
        assert_eq!(bus.writes, vec![(0x40, 0x23)]);
        let value = read_register(&top, reg, &mut bus).unwrap();
        assert_eq!(step.decode(value), 5);
        assert_eq!(en.decode(value), 1);
    }

    #[test]
    fn test_dump_page() {
        let top = Top::from_yaml(DOC).unwrap();
        let page = top.page("Main").unwrap();
        let mut bus = MockBus::default();
        for addr in [0x20, 0x21, 0x30, 0x31, 0x32, 0x40] {
            bus.words.insert(addr, addr + 0x100);
        }
        let dump = dump_page(&top, page, &mut bus).unwrap();
        assert_eq!(
            dump,
            vec![
                (0x20, 0x20),
                (0x21, 0x21),
                (0x30, 0x30),
                (0x31, 0x31),
                (0x32, 0x32),
                (0x40, 0x40),
            ]
        );
    }

    #[test]
    fn test_access_error_propagates() {
        let top = Top::from_yaml(DOC).unwrap();
        let reg = top.page("Main").unwrap().register("BIG").unwrap();
        let mut bus = MockBus::default();
        bus.words.insert(0x30, 0);
        assert_eq!(
            read_register(&top, reg, &mut bus),
            Err("no word at 0x31".to_string())
        );
    }
}
