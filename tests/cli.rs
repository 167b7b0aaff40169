// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end CLI scenarios (§8 "Concrete end-to-end scenarios").

use std::io::Write;

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn write_input(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp input");
    file.write_all(contents.as_bytes()).expect("write temp input");
    file
}

fn lpi() -> Command {
    Command::cargo_bin("lpi").expect("find lpi binary")
}

#[test]
fn tiny_ipv4_serial() {
    let input = write_input("a 10.0.0.1 b\nc 10.0.0.1 d\n");
    let assert = lpi()
        .arg("-s")
        .arg(input.path())
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(out, "10.0.0.1,2,1:2,2:2\n");
}

#[test]
fn mixed_types_ordering() {
    let input = write_input(
        "u 192.168.1.1 v aa:bb:cc:dd:ee:ff w ::1 x\ny 192.168.1.1 z\n",
    );
    let assert = lpi().arg("-s").arg(input.path()).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "192.168.1.1,2,1:2,2:2",
            "::1,1,1:6",
            "aa:bb:cc:dd:ee:ff,1,1:4",
        ]
    );
}

#[test]
fn frequency_tie_orders_by_address_ascending() {
    let input = write_input("z ffff::1 y\nx 10.0.0.1 w\n");
    let assert = lpi().arg("-s").arg(input.path()).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, vec!["10.0.0.1,1,1:2", "ffff::1,1,1:2"]);
}

#[test]
fn no_newline_tail() {
    let input = write_input("10.0.0.1");
    let assert = lpi().arg("-s").arg(input.path()).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(out, "10.0.0.1,1,1:1\n");
}

#[test]
fn empty_input_produces_empty_output_and_exit_zero() {
    let input = write_input("");
    let assert = lpi().arg("-s").arg(input.path()).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn no_addresses_in_input() {
    let input = write_input("hello world\nnothing to see here\n");
    let assert = lpi().arg("-s").arg(input.path()).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn write_flag_creates_dot_lpi_file() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("log.txt");
    std::fs::write(&input_path, "a 10.0.0.1 b\n").unwrap();

    lpi().arg("-s").arg("-w").arg(&input_path).assert().success();

    let index_path = dir.path().join("log.txt.lpi");
    let contents = std::fs::read_to_string(&index_path).unwrap();
    assert_eq!(contents, "10.0.0.1,1,1:2\n");
}

#[test]
fn write_flag_with_stdin_is_rejected() {
    lpi()
        .arg("-w")
        .arg("-")
        .write_stdin("a 10.0.0.1 b\n")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn debug_level_out_of_range_exits_one() {
    let input = write_input("a 10.0.0.1 b\n");
    lpi()
        .arg("-d")
        .arg("42")
        .arg(input.path())
        .assert()
        .failure()
        .code(1);
}

#[test]
fn missing_input_file_is_reported_but_exits_nonzero_when_all_fail() {
    lpi()
        .arg("-s")
        .arg("/nonexistent/path/does-not-exist")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn one_good_one_missing_input_exits_zero() {
    let input = write_input("a 10.0.0.1 b\n");
    lpi()
        .arg("-s")
        .arg("/nonexistent/path/does-not-exist")
        .arg(input.path())
        .assert()
        .success();
}

#[test]
fn stdin_input_via_dash() {
    lpi()
        .arg("-s")
        .arg("-")
        .write_stdin("a 10.0.0.1 b\n")
        .assert()
        .success()
        .stdout("10.0.0.1,1,1:2\n");
}

#[test]
fn greedy_mode_keeps_quoted_address_unparsed() {
    let input = write_input("a \"10.0.0.1\" b\n");
    let assert = lpi().arg("-s").arg("-g").arg(input.path()).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.is_empty());
}
