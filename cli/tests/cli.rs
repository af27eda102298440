// Licensed under the Apache-2.0 license

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const DEVICE: &str = r#"
name: DEV
addr_width: 8
data_width: 8
pages:
  - name: Main
    regs:
      - name: CTRL
        addr: 0x10
        fields:
          - name: EN
            bits: 0
          - name: MODE
            bits: "2:1"
"#;

fn regmap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_regmap"))
        .args(args)
        .output()
        .unwrap()
}

fn write_yaml(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_header_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write_yaml(dir.path(), "lmk05318.yaml", DEVICE);
    let out = dir.path().join("lmk05318.h");

    let output = regmap(&["header", "--yaml", &yaml, "--output", out.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");

    let header = fs::read_to_string(&out).unwrap();
    assert!(header.starts_with("enum lmk05318_regs_t {\n    CTRL = 0x10,\n};\n"));
    assert!(header.contains("#define MAKE_LMK05318_CTRL(mode, en) MAKE_LMK05318_REG_WR(CTRL, \\\n"));
}

#[test]
fn test_header_to_stdout_with_name() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write_yaml(dir.path(), "dev.yaml", DEVICE);

    let output = regmap(&["header", "-y", &yaml, "-n", "board"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("enum board_regs_t {\n"));
    assert!(stdout.contains("#define MAKE_BOARD_REG_RD(a) (((a) << 8))\n"));
}

#[test]
fn test_invalid_description_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write_yaml(dir.path(), "bad.yaml", &DEVICE.replace("\"2:1\"", "\"9:1\""));
    let out = dir.path().join("bad.h");

    let output = regmap(&["header", "--yaml", &yaml, "--output", out.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!out.exists());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to load"), "{stderr}");
}

#[test]
fn test_check() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write_yaml(dir.path(), "dev.yaml", DEVICE);

    let output = regmap(&["check", "--yaml", &yaml]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "DEV: 1 pages, 1 registers, 1 addressable words\n");
}

#[test]
fn test_check_missing_file() {
    let output = regmap(&["check", "--yaml", "/nonexistent/regs.yaml"]);
    assert!(!output.status.success());
}
