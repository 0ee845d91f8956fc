use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("attrscope"))
}

/// LLRP KEEPALIVE, version 1, id 7, no parameters.
const KEEPALIVE: [u8; 10] = [0x04, 0x3e, 0, 0, 0, 10, 0, 0, 0, 7];

/// LLRP RO_ACCESS_REPORT whose only parameter claims 12 bytes but has 6.
const TRUNCATED_REPORT: [u8; 16] = [
    0x04, 0x3d, 0, 0, 0, 16, 0, 0, 0, 9, // header
    0x00, 0xc8, 0x00, 0x0c, 0xaa, 0xbb, // parameter 200, declared 12
];

fn write_input(temp: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = temp.path().join(name);
    std::fs::write(&path, bytes).expect("write input");
    path
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_supports_decode_and_alias() {
    cmd().arg("decode").arg("--help").assert().success();
    cmd().arg("dissect").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(missing)
        .arg("--protocol")
        .arg("llrp")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_outputs_json_report() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);
    let assert = cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .assert()
        .success();
    let value = stdout_json(&assert);
    assert_eq!(value["protocol"], "llrp");
    assert_eq!(value["message"]["format"], "llrp");
    assert_eq!(value["message"]["header"]["message_id"], 7);
    assert_eq!(value["attributes"].as_array().map(Vec::len), Some(0));
}

#[test]
fn hex_input_decodes_netlink_attributes() {
    let temp = TempDir::new().expect("tempdir");
    // nlmsghdr (RTM_NEWLINK, 40 bytes) + ifinfomsg + IFLA_MTU 1500
    let dump = "\
        # nlmsghdr\n\
        28 00 00 00 10 00 00 00 01 00 00 00 00 00 00 00\n\
        # ifinfomsg\n\
        00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00\n\
        # IFLA_MTU\n\
        08 00 04 00 dc 05 00 00\n";
    let input = write_input(&temp, "link.hex", dump.as_bytes());
    let assert = cmd()
        .arg("decode")
        .arg(input)
        .arg("--hex")
        .arg("--protocol")
        .arg("netlink")
        .arg("--little-endian")
        .arg("--stdout")
        .assert()
        .success();
    let value = stdout_json(&assert);
    assert_eq!(value["message"]["family"], "rtnl-link");
    assert_eq!(value["attributes"][0]["type_code"], 4);
    assert_eq!(value["attributes"][0]["value"]["data"], 1500);
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("-o")
        .arg(&report)
        .assert()
        .success()
        .stderr(contains("OK: report written"));
    let text = std::fs::read_to_string(&report).expect("report written");
    let value: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["report_version"], 1);
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);
    let report = temp.path().join("report.json");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn report_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--protocol")
        .arg("llrp")
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}

#[test]
fn list_diagnostics_outputs_kinds() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "report.bin", &TRUNCATED_REPORT);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .arg("--list-diagnostics")
        .assert()
        .success()
        .stderr(contains("Diagnostics:").and(contains("length_mismatch")));
}

#[test]
fn strict_fails_when_diagnostics_present() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "report.bin", &TRUNCATED_REPORT);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("diagnostic(s) reported"));
}

#[test]
fn strict_passes_on_clean_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "keepalive.bin", &KEEPALIVE);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn framing_error_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_input(&temp, "short.bin", &[0x00, 0x09, 0x00]);

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--protocol")
        .arg("netflow")
        .arg("--stdout")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("netflow decoding failed"));
}

#[test]
fn glob_with_multiple_matches_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    write_input(&temp, "a.bin", &KEEPALIVE);
    write_input(&temp, "b.bin", &KEEPALIVE);
    let pattern = temp.path().join("*.bin");

    cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("multiple files match pattern").and(contains("hint:")));
}

#[test]
fn glob_with_single_match_is_decoded() {
    let temp = TempDir::new().expect("tempdir");
    write_input(&temp, "only.bin", &KEEPALIVE);
    let pattern = temp.path().join("*.bin");

    let assert = cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--protocol")
        .arg("llrp")
        .arg("--stdout")
        .assert()
        .success();
    let value = stdout_json(&assert);
    assert!(value["input"]["path"].as_str().expect("path").ends_with("only.bin"));
}
