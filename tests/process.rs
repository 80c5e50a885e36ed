//! Loads that write through to the real process environment.
//!
//! Every test here mutates process-global state and runs under `#[serial]`.

use std::path::Path;

use easyenv::{Error, LoadOptions, RowErrorKind, Value};
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn load_sets_process_environment() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let file = dir.path().join(".env1");
    write_file(&file, "EASYENV_PROC_TEST1=Answer1\nEASYENV_PROC_TEST2=Answer2\n");
    clear(&["EASYENV_PROC_TEST1", "EASYENV_PROC_TEST2"]);

    let store = unsafe { easyenv::load([&file], LoadOptions::default()) }
        .expect("load should succeed");

    assert_eq!(store.get_string("EASYENV_PROC_TEST1"), "Answer1");
    assert_eq!(store.get_string("EASYENV_PROC_TEST2"), "Answer2");
    assert_eq!(
        std::env::var("EASYENV_PROC_TEST1").as_deref(),
        Ok("Answer1")
    );
    assert_eq!(
        std::env::var("EASYENV_PROC_TEST2").as_deref(),
        Ok("Answer2")
    );
    clear(&["EASYENV_PROC_TEST1", "EASYENV_PROC_TEST2"]);
}

#[test]
#[serial]
fn append_keeps_preset_process_value() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let file = dir.path().join(".env1");
    write_file(&file, "EASYENV_PROC_APPEND1=Answer1\nEASYENV_PROC_APPEND2=Answer2\n");
    clear(&["EASYENV_PROC_APPEND2"]);
    unsafe { std::env::set_var("EASYENV_PROC_APPEND1", "Test Value") };

    let options = LoadOptions {
        append: true,
        ..LoadOptions::default()
    };
    let store = unsafe { easyenv::load([&file], options) }.expect("load should succeed");

    assert_eq!(
        std::env::var("EASYENV_PROC_APPEND1").as_deref(),
        Ok("Test Value")
    );
    assert_eq!(
        std::env::var("EASYENV_PROC_APPEND2").as_deref(),
        Ok("Answer2")
    );
    assert!(!store.contains_key("EASYENV_PROC_APPEND1"));
    clear(&["EASYENV_PROC_APPEND1", "EASYENV_PROC_APPEND2"]);
}

#[test]
#[serial]
fn system_false_leaves_process_environment_alone() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let file = dir.path().join(".env");
    write_file(&file, "EASYENV_PROC_LOCAL=yes\n");
    clear(&["EASYENV_PROC_LOCAL"]);

    let options = LoadOptions {
        system: false,
        ..LoadOptions::default()
    };
    let store = unsafe { easyenv::load([&file], options) }.expect("load should succeed");

    assert_eq!(store.get("EASYENV_PROC_LOCAL"), Some(&Value::Str("yes".into())));
    assert!(std::env::var_os("EASYENV_PROC_LOCAL").is_none());
}

#[test]
#[serial]
fn from_path_propagates_typed_values_as_strings() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let file = dir.path().join(".env");
    write_file(&file, "EASYENV_PROC_FLAG=True\nEASYENV_PROC_PORT=\"8080\"\n");

    let store = unsafe { easyenv::from_path(&file) }.expect("load should succeed");

    assert!(store.get_bool("EASYENV_PROC_FLAG"));
    assert_eq!(store.get_int("EASYENV_PROC_PORT"), Some(8080));
    assert_eq!(std::env::var("EASYENV_PROC_FLAG").as_deref(), Ok("1"));
    assert_eq!(std::env::var("EASYENV_PROC_PORT").as_deref(), Ok("8080"));
    clear(&["EASYENV_PROC_FLAG", "EASYENV_PROC_PORT"]);
}

#[test]
#[serial]
fn from_paths_reports_missing_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let missing = dir.path().join("missing.env");

    let err = unsafe { easyenv::from_paths([&missing]) }.expect_err("expected file read error");

    assert!(matches!(err, Error::FileRead { .. }));
}

#[test]
#[serial]
fn silent_load_of_missing_file_is_a_no_op() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let missing = dir.path().join("missing.env");

    let options = LoadOptions {
        silent: true,
        ..LoadOptions::default()
    };
    let store = unsafe { easyenv::load([&missing], options) }.expect("silent load should succeed");

    assert!(store.is_empty());
}

#[test]
#[serial]
fn nul_byte_is_rejected_before_touching_process_environment() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let file = dir.path().join(".env");
    write_file(&file, "EASYENV_PROC_NUL=a\0b\n");
    clear(&["EASYENV_PROC_NUL"]);

    let err = unsafe { easyenv::load([&file], LoadOptions::default()) }
        .expect_err("expected row error");
    match err {
        Error::InvalidRow(row) => assert_eq!(row.kind, RowErrorKind::NulByte),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(std::env::var_os("EASYENV_PROC_NUL").is_none());

    let options = LoadOptions {
        silent: true,
        ..LoadOptions::default()
    };
    let store = unsafe { easyenv::load([&file], options) }.expect("silent load should succeed");
    assert!(store.is_empty());
    assert!(std::env::var_os("EASYENV_PROC_NUL").is_none());
}

fn clear(keys: &[&str]) {
    for key in keys {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).expect("failed to write test file");
}
