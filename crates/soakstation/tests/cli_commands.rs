#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn soakstation(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_soakstation"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .env_remove("SOAKSTATION_CLIENT_ID")
        .env_remove("SOAKSTATION_CLIENT_SLOT")
        .output()
        .expect("soakstation should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn decode_single_chunk_device_state() {
    let output = soakstation(&["decode", "41070a010181017264000258 04"]);

    assert!(output.status.success());
    let line: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be json");
    assert_eq!(line["type"], "device_state");
    assert_eq!(line["client_slot"], 1);
    assert_eq!(line["opcode"], "0x07");
    assert_eq!(line["outlet1"], true);
    assert_eq!(line["outlet2"], false);
    assert_eq!(line["target_temperature"], 38.5);
    assert_eq!(line["remaining_seconds"], 600);
}

#[test]
fn decode_reassembles_two_chunks() {
    let output = soakstation(&["decode", "4107 0a 0101 8101", "72 6400 0258 04"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 1);
    assert!(text.contains("\"type\":\"device_state\""));
}

#[test]
fn decode_incomplete_input_returns_60() {
    let output = soakstation(&["decode", "41070a0101"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stdout(&output).is_empty());
}

#[test]
fn decode_invalid_hex_returns_60() {
    let output = soakstation(&["decode", "41zz"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn encode_device_state() {
    let output = soakstation(&[
        "encode",
        "device-state",
        "--client-id",
        "12345",
        "--client-slot",
        "1",
    ]);

    assert!(output.status.success());
    let record: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be json");
    assert_eq!(record["frame"], "0107002301");
    assert_eq!(record["crc"], "2301");
    assert_eq!(record["chunks"], serde_json::json!(["0107002301"]));
}

#[test]
fn encode_reads_identity_from_env() {
    let output = Command::new(env!("CARGO_BIN_EXE_soakstation"))
        .args(["--log-level", "error", "--format", "json", "encode", "device-state"])
        .env("SOAKSTATION_CLIENT_ID", "12345")
        .env("SOAKSTATION_CLIENT_SLOT", "1")
        .output()
        .expect("soakstation should run");

    assert!(output.status.success());
    assert!(stdout(&output).contains("\"frame\":\"0107002301\""));
}

#[test]
fn encode_without_identity_returns_64() {
    let output = soakstation(&["encode", "nickname"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn encode_pair_generates_id_and_chunks() {
    let output = soakstation(&["encode", "pair", "--name", "homeassistant"]);

    assert!(output.status.success());
    let record: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be json");
    let client_id = record["client_id"].as_u64().expect("client id");
    assert!((10_000..=65_535).contains(&client_id));
    assert_eq!(record["client_slot"], 0);
    assert_eq!(record["crc_salt"], "0x54d2ee63");
    let chunks = record["chunks"].as_array().expect("chunks");
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].as_str().expect("hex").starts_with("00eb18"));
}

#[test]
fn encode_pair_rejects_long_name() {
    let output = soakstation(&[
        "encode",
        "pair",
        "--name",
        "this name is too long to fit",
    ]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn crc_matches_reference_value() {
    let output = soakstation(&["crc", "01070a", "--client-id", "12345"]);

    assert!(output.status.success());
    let record: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be json");
    assert_eq!(record["crc"], "65af");
    assert_eq!(record["framed"], "01070a65af");
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_soakstation"))
        .arg("version")
        .output()
        .expect("soakstation should run");
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}
