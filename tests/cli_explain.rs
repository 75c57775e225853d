use std::fs;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_livesass")
}

fn explain(dir: &std::path::Path, file: &std::path::Path) -> Value {
    let output = Command::new(bin())
        .arg("--json")
        .arg("explain")
        .arg(file)
        .arg("--root")
        .arg(dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|line| line.contains("\"event\":\"explain\""))
        .expect("expected an explain event in stdout");
    serde_json::from_str(line).unwrap()
}

#[test]
fn explain_classifies_a_partial() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("_variables.scss");
    fs::write(&file, "").unwrap();

    let value = explain(dir.path(), &file);
    assert_eq!(value["type"], "partial");
    assert!(value["included"].is_null());
}

#[test]
fn explain_marks_excluded_full_files() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    let file = dir.path().join("node_modules/lib.scss");
    fs::write(&file, "").unwrap();

    let value = explain(dir.path(), &file);
    assert_eq!(value["type"], "full");
    assert_eq!(value["included"], Value::Bool(false));
}

#[test]
fn explain_marks_compilable_files() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("styles.sass");
    fs::write(&file, "").unwrap();

    let value = explain(dir.path(), &file);
    assert_eq!(value["type"], "full");
    assert_eq!(value["included"], Value::Bool(true));
}

#[test]
fn explain_ignores_non_sass_files() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("readme.md");
    fs::write(&file, "").unwrap();

    let value = explain(dir.path(), &file);
    assert_eq!(value["type"], "irrelevant");
    assert!(value["included"].is_null());
}
