// Licensed under the Apache-2.0 license

//! C header emission.
//!
//! ## Emission Order
//!
//! ```text
//! enum <name>_regs_t { ... }              # every flattened register address
//! #define MAKE_<NAME>_REG_WR(a, v)        # bus frame macros
//! #define MAKE_<NAME>_REG_RD(a)
//! enum <name>_<table>_t { ... }           # one per `x-` table
//! // Register R<addr> [0x<addr>] -- <REG>  # per register, declaration order
//! enum <field>_options { ... }            #   fields with options
//! enum <reg>_fields_t { ... }             #   _OFF / _MSK per field
//! #define GET_/SET_<NAME>_<FIELD>         #   with field_macros
//!                                         #   (none of these for a lone VALUE)
//! #define MAKE_<NAME>_<REG>(...)          #   register construction
//! ```
//!
//! The header is built in memory and only returned once every register has
//! been emitted, so a failure never yields a partial header.

use crate::config::HeaderConfig;
use crate::names::{normalize, NameResolver};
use regmap_description::{Error, Field, Page, Register, Result, Top};
use std::fmt::Write;

const TAB: &str = "    ";

/// Walks a validated description and produces header text.
pub struct HeaderEmitter<'a> {
    top: &'a Top,
    names: NameResolver<'a>,
    upper: String,
    lower: String,
}

impl<'a> HeaderEmitter<'a> {
    pub fn new(top: &'a Top, config: &HeaderConfig) -> Self {
        Self {
            top,
            names: NameResolver::new(top),
            upper: config.upper(),
            lower: config.lower(),
        }
    }

    /// Emits the complete header body.
    pub fn emit(&self) -> Result<String> {
        let mut output = String::new();

        self.emit_register_enum(&mut output);
        self.emit_bus_macros(&mut output);
        self.emit_global_enums(&mut output);

        let mut count = 0;
        for page in self.top.pages() {
            for reg in page.regs() {
                self.emit_register(&mut output, page, reg)?;
                count += 1;
            }
        }

        log::info!(
            "{}: emitted {} registers ({} addressable words)",
            self.lower,
            count,
            self.top.flat_registers().len()
        );
        Ok(output)
    }

    fn write_macro(&self) -> String {
        format!("MAKE_{}_REG_WR", self.upper)
    }

    fn emit_enum(
        &self,
        output: &mut String,
        name: &str,
        prefix: &str,
        entries: impl Iterator<Item = (String, u64)>,
    ) {
        writeln!(output, "enum {name}_t {{").unwrap();
        for (ident, value) in entries {
            writeln!(output, "{TAB}{prefix}{ident} = 0x{value:x},").unwrap();
        }
        writeln!(output, "}};").unwrap();
    }

    /// One enumerator per flattened register name.
    fn emit_register_enum(&self, output: &mut String) {
        let flat = self.top.flat_registers();
        self.emit_enum(
            output,
            &format!("{}_regs", self.lower),
            &self.names.reg_prefix(),
            flat.iter().map(|r| (r.name.clone(), r.addr)),
        );
    }

    fn emit_bus_macros(&self, output: &mut String) {
        let data_width = self.top.data_width();
        let wr_mask = self
            .top
            .wr_mask()
            .map(|m| format!("0x{m:x} | "))
            .unwrap_or_default();
        let rd_mask = self
            .top
            .rd_mask()
            .map(|m| format!("0x{m:x} | "))
            .unwrap_or_default();

        writeln!(
            output,
            "#define {}(a, v) ({wr_mask}((a) << {data_width}) | ((v) & 0x{:x}))",
            self.write_macro(),
            self.top.data_mask()
        )
        .unwrap();
        writeln!(
            output,
            "#define MAKE_{}_REG_RD(a) ({rd_mask}((a) << {data_width}))",
            self.upper
        )
        .unwrap();
    }

    fn emit_global_enums(&self, output: &mut String) {
        for table in self.top.enums() {
            let name = table.name().replace('-', "_");
            self.emit_enum(
                output,
                &format!("{}_{}", self.lower, name),
                &format!("{}_", name.to_uppercase()),
                table.entries().iter().map(|(l, v)| (normalize(l), *v)),
            );
        }
    }

    fn emit_register(&self, output: &mut String, page: &Page, reg: &Register) -> Result<()> {
        let name = self.names.register_name(page, reg);
        writeln!(
            output,
            "// Register R{} [0x{:x}] -- {name}",
            reg.addr_lo(),
            reg.addr_lo()
        )
        .unwrap();

        // A lone VALUE field gets no per-field declarations; they would
        // repeat across every such register. Single word ones need nothing
        // beyond their address.
        let value_only = reg.is_value_only();
        if !value_only {
            self.emit_options(output, page, reg);
        }
        writeln!(output).unwrap();
        if reg.is_single_value() {
            return Ok(());
        }

        if !value_only {
            self.emit_field_enum(output, page, reg, &name);
            if self.top.field_macros() {
                self.emit_field_macros(output, page, reg);
            }
        }

        if reg.word_count() == 1 {
            self.emit_single_word_macro(output, page, reg, &name);
            Ok(())
        } else {
            self.emit_multi_word_macros(output, page, reg, &name)
        }
    }

    fn emit_options(&self, output: &mut String, page: &Page, reg: &Register) {
        for field in reg.fields() {
            if field.options().is_empty() {
                continue;
            }
            let fname = self.names.field_name(page, reg, field);
            writeln!(output, "enum {}_options {{", fname.to_lowercase()).unwrap();
            for (value, label) in field.options().iter() {
                writeln!(
                    output,
                    "{TAB}{fname}_{} = {value},",
                    normalize(&label.to_uppercase())
                )
                .unwrap();
            }
            writeln!(output, "}};").unwrap();
        }
    }

    fn emit_field_enum(&self, output: &mut String, page: &Page, reg: &Register, name: &str) {
        writeln!(output, "enum {}_fields_t {{", name.to_lowercase()).unwrap();
        for field in reg.fields() {
            let fname = self.names.field_name(page, reg, field);
            writeln!(output, "{TAB}{fname}_OFF = 0x{:x},", field.bits_lo()).unwrap();
            writeln!(output, "{TAB}{fname}_MSK = 0x{:x},", field.mask()).unwrap();
        }
        writeln!(output, "}};").unwrap();
    }

    fn emit_field_macros(&self, output: &mut String, page: &Page, reg: &Register) {
        for field in reg.fields() {
            let fname = self.names.field_name(page, reg, field);
            writeln!(
                output,
                "#define GET_{}_{fname}(x) {}",
                self.upper,
                getter_expression(field, &fname, "x")
            )
            .unwrap();
        }
        for field in reg.fields() {
            let fname = self.names.field_name(page, reg, field);
            writeln!(
                output,
                "#define SET_{}_{fname}(p, f) (p) = ((p) & ~{fname}_MSK) | {}",
                self.upper,
                setter_expression(field, &fname, "f")
            )
            .unwrap();
        }
        writeln!(output).unwrap();
    }

    /// Parameter list and OR'd setter terms over every field of `reg`.
    fn combine_fields(&self, page: &Page, reg: &Register) -> (String, String) {
        let params = reg
            .fields()
            .iter()
            .map(|f| f.name().to_lowercase())
            .collect::<Vec<_>>()
            .join(", ");
        let terms = reg
            .fields()
            .iter()
            .map(|f| {
                let fname = self.names.field_name(page, reg, f);
                format!(
                    " \\\n{TAB}{}",
                    setter_expression(f, &fname, &f.name().to_lowercase())
                )
            })
            .collect::<Vec<_>>()
            .join(" | ");
        (params, terms)
    }

    fn emit_single_word_macro(&self, output: &mut String, page: &Page, reg: &Register, name: &str) {
        let (params, terms) = self.combine_fields(page, reg);
        writeln!(
            output,
            "#define MAKE_{}_{name}({params}) {}({},{terms})",
            self.upper,
            self.write_macro(),
            self.names.register_ident(name)
        )
        .unwrap();
    }

    fn emit_multi_word_macros(
        &self,
        output: &mut String,
        page: &Page,
        reg: &Register,
        name: &str,
    ) -> Result<()> {
        if let Some(field) = reg.fields().iter().find(|f| f.bits().is_scattered()) {
            return Err(Error::Unsupported(format!(
                "bulk register operations on `{name}` are not supported for the bit-list field `{}`",
                field.name()
            )));
        }

        if reg.fields().len() > 1 {
            let (params, terms) = self.combine_fields(page, reg);
            writeln!(
                output,
                "#define MAKE_{}_{name}_LONG({params}) ({terms})",
                self.upper
            )
            .unwrap();
        }

        let data_width = self.top.data_width();
        let value_mask = reg.value_mask();
        let value_off = reg.value_offset() as i64;
        let word_count = reg.word_count();
        for u in 0..word_count {
            // Word u counts from the most significant word.
            let shift = data_width * (word_count - 1 - u);
            let by_off = shift as i64 - value_off;
            let by_msk = value_mask.window(shift, data_width);
            let slice = if by_off > 0 {
                format!("(((value) >> {by_off}) & 0x{by_msk:x})")
            } else {
                format!("(((value) << {}) & 0x{by_msk:x})", -by_off)
            };
            writeln!(
                output,
                "#define MAKE_{}_{name}_BY{u}(value) {}({}_BY{u}, {slice})",
                self.upper,
                self.write_macro(),
                self.names.register_ident(name)
            )
            .unwrap();
        }
        Ok(())
    }
}

/// C expression extracting the dense value of `field` from register value `x`.
pub fn getter_expression(field: &Field, fname: &str, x: &str) -> String {
    match field.bit_positions() {
        Some(positions) => {
            let n = positions.len();
            let terms = (0..n)
                .map(|i| {
                    let pos = positions[n - 1 - i];
                    format!("((((({x}) & {fname}_MSK) >> {pos}) & 0x1) << {i})")
                })
                .collect::<Vec<_>>();
            format!("({})", terms.join(" | "))
        }
        None => format!("((({x}) & {fname}_MSK) >> {fname}_OFF)"),
    }
}

/// C expression placing dense value `v` at the bits of `field`.
pub fn setter_expression(field: &Field, fname: &str, v: &str) -> String {
    match field.bit_positions() {
        Some(positions) => {
            let n = positions.len();
            let terms = positions
                .iter()
                .enumerate()
                .map(|(i, pos)| format!("(((({v}) >> {}) & 0x1) << {pos})", n - 1 - i))
                .collect::<Vec<_>>();
            format!("(({}) & {fname}_MSK)", terms.join(" | "))
        }
        None => format!("((({v}) << {fname}_OFF) & {fname}_MSK)"),
    }
}
