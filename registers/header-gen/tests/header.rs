// Licensed under the Apache-2.0 license

use regmap_description::{Error, Top};
use regmap_header_gen::{generate_header, generate_header_from_file, HeaderConfig};
use std::path::PathBuf;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[test]
fn test_clkgen_header_matches_reference() {
    let path = data("clkgen.yaml");
    let header = generate_header_from_file(&path, &HeaderConfig::from_path(&path)).unwrap();
    let expected = std::fs::read_to_string(data("clkgen.h")).unwrap();
    assert_eq!(header, expected);
}

#[test]
fn test_header_name_override() {
    let path = data("clkgen.yaml");
    let header = generate_header_from_file(&path, &HeaderConfig::new("Board")).unwrap();
    assert!(header.starts_with("enum board_regs_t {\n"));
    assert!(header.contains("#define MAKE_BOARD_REG_WR(a, v)"));
    assert!(header.contains("MAKE_BOARD_CTRL(reset, out_sel, pd) MAKE_BOARD_REG_WR(CG_CTRL,"));
}

#[test]
fn test_header_lists_every_flat_register() {
    let path = data("clkgen.yaml");
    let top = Top::from_file(&path).unwrap();
    let header = generate_header(&top, &HeaderConfig::from_path(&path)).unwrap();
    for reg in top.flat_registers() {
        let line = format!("    CG_{} = 0x{:x},\n", reg.name, reg.addr);
        assert!(header.contains(&line), "missing {line:?}");
    }
}

#[test]
fn test_missing_description() {
    let path = data("missing.yaml");
    let result = generate_header_from_file(&path, &HeaderConfig::from_path(&path));
    assert!(matches!(result, Err(Error::Io(_))));
}
