use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SQUARE: &str = r#"
units = "mm"

[[paths]]
closed = true
segments = [{ type = "polyline", points = [[0, 0], [20, 0], [20, 20], [0, 20]] }]

[[groups]]
name = "curve"

[[groups.paths]]
segments = [{ type = "bezier", points = [[30, 0], [30, 10], [40, 10], [40, 0]] }]
"#;

fn tangentcam(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tangentcam"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        // Keep a per-user config file out of the test.
        .env("XDG_CONFIG_HOME", dir)
        .env("HOME", dir)
        .output()
        .unwrap()
}

#[test]
fn test_generate_to_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("square.toml"), SQUARE).unwrap();

    let out = tangentcam(
        dir.path(),
        &["generate", "square.toml", "-o", "square.ngc", "--depth", "1", "--tool-width", "2"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let gcode = fs::read_to_string(dir.path().join("square.ngc")).unwrap();
    assert!(gcode.starts_with("%\n"));
    assert!(gcode.contains("G21"));
    assert!(gcode.contains("Z-1.000000"));
    assert!(gcode.trim_end().ends_with('%'));
}

#[test]
fn test_generate_to_stdout() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("square.toml"), SQUARE).unwrap();

    let out = tangentcam(dir.path(), &["generate", "square.toml", "-o", "-", "--line-numbers"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.lines().any(|l| l.starts_with("N10 ")), "{stdout}");
    assert!(stdout.contains("M2"));
}

#[test]
fn test_split_groups_with_suffix() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("square.toml"), SQUARE).unwrap();

    let out = tangentcam(
        dir.path(),
        &["generate", "square.toml", "-o", "job", "--split-groups", "--auto-suffix"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("job_0001.ngc").is_file());
    assert!(dir.path().join("job_curve_0001.ngc").is_file());
}

#[test]
fn test_write_config_then_check_it() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("square.toml"), SQUARE).unwrap();

    let out = tangentcam(
        dir.path(),
        &["generate", "square.toml", "-o", "-", "--feed-xy", "900", "--write-config", "saved.toml"],
    );
    assert!(out.status.success());
    let saved = fs::read_to_string(dir.path().join("saved.toml")).unwrap();
    assert!(saved.contains("xy = 900.0"));

    let out = tangentcam(dir.path(), &["check-config", "saved.toml"]);
    assert!(out.status.success());
}

#[test]
fn test_invalid_configuration_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.toml"), "[tool]\nwidth = -3.0\n").unwrap();

    let out = tangentcam(dir.path(), &["check-config", "bad.toml"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("tool.width"), "{stderr}");

    fs::write(dir.path().join("square.toml"), SQUARE).unwrap();
    let out = tangentcam(dir.path(), &["generate", "square.toml", "-o", "-", "--feed-xy", "0"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn test_strict_mode_fails_on_bad_path() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("bad.json"),
        r#"{ "paths": [ { "segments": [ { "type": "spiral" } ] } ] }"#,
    )
    .unwrap();

    let out = tangentcam(dir.path(), &["generate", "bad.json", "-o", "-"]);
    assert!(out.status.success());

    let out = tangentcam(dir.path(), &["generate", "bad.json", "-o", "-", "--strict"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unsupported input"));
}

#[test]
fn test_print_config() {
    let dir = TempDir::new().unwrap();
    let out = tangentcam(dir.path(), &["print-config", "--format", "json", "--order", "flip"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("\"order\": \"flip\""));
}
