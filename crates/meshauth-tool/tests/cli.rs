//! End-to-end tests of the `meshauth` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PAYLOAD: &str = r#"{"hosts":{},"services":{"dns":["10.0.0.1"]}}"#;

fn meshauth() -> Command {
    Command::cargo_bin("meshauth").unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Generates a signing key into `dir/name` and returns its path.
fn signing_key(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    meshauth()
        .args(["-q", "-G", "-o", path_str(&path)])
        .assert()
        .success();
    path
}

/// Writes the public key of `secret` to `dir/name`.
fn public_key(dir: &TempDir, secret: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    meshauth()
        .args(["-q", "-P", "-K", path_str(secret), "-o", path_str(&path)])
        .assert()
        .success();
    path
}

/// Signs `PAYLOAD` with `secret` into `dir/net.bin`.
fn signed_container(dir: &TempDir, secret: &Path) -> std::path::PathBuf {
    let payload = dir.path().join("net.json");
    fs::write(&payload, PAYLOAD).unwrap();
    let out = dir.path().join("net.bin");
    meshauth()
        .args([
            "-q",
            "-S",
            path_str(&payload),
            "-K",
            path_str(secret),
            "-o",
            path_str(&out),
        ])
        .assert()
        .success();
    out
}

#[test]
fn test_generate_prints_key_line() {
    meshauth()
        .args(["-q", "-G"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[A-Za-z0-9+/]{43}=\n$").unwrap());

    meshauth()
        .args(["-q", "-g"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[A-Za-z0-9+/]{43}=\n$").unwrap());
}

#[test]
fn test_pubkey_is_stable() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");

    let first = public_key(&dir, &secret, "a.pub");
    let second = public_key(&dir, &secret, "b.pub");
    let text = fs::read_to_string(&first).unwrap();

    assert_eq!(text, fs::read_to_string(second).unwrap());
    assert_ne!(text, fs::read_to_string(&secret).unwrap());
    assert_eq!(text.trim_end().len(), 44);
}

#[test]
fn test_sign_then_verify() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let public = public_key(&dir, &secret, "net.pub");
    let container = signed_container(&dir, &secret);

    meshauth()
        .args(["-q", "-V", path_str(&container), "-k", path_str(&public)])
        .assert()
        .success();
}

#[test]
fn test_sign_rejects_non_utf8_payload() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let payload = dir.path().join("net.json");
    fs::write(&payload, [0x7b, 0xff, 0xfe, 0x7d]).unwrap();
    let out = dir.path().join("net.bin");

    meshauth()
        .args([
            "-S",
            path_str(&payload),
            "-K",
            path_str(&secret),
            "-o",
            path_str(&out),
        ])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is not valid UTF-8"))
        .stderr(predicate::str::contains("Input file not found").not());

    assert!(!out.exists());
}

#[test]
fn test_verify_with_wrong_key() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let other = signing_key(&dir, "other.key");
    let other_public = public_key(&dir, &other, "other.pub");
    let container = signed_container(&dir, &secret);

    meshauth()
        .args(["-V", path_str(&container), "-k", path_str(&other_public)])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Public key does not match"));
}

#[test]
fn test_verify_tampered_container() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let public = public_key(&dir, &secret, "net.pub");
    let container = signed_container(&dir, &secret);

    let mut bytes = fs::read(&container).unwrap();
    let last_payload_byte = bytes.len() - 2;
    bytes[last_payload_byte] ^= 0x01;
    fs::write(&container, bytes).unwrap();

    meshauth()
        .args(["-V", path_str(&container), "-k", path_str(&public)])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Signature verification failed"));
}

#[test]
fn test_show_payload() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let container = signed_container(&dir, &secret);

    meshauth()
        .args(["-q", "-T", "-b", path_str(&container)])
        .assert()
        .success()
        .stdout(PAYLOAD);
}

#[test]
fn test_two_commands_rejected() {
    meshauth()
        .args(["-P", "-G"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_missing_secret_key() {
    meshauth()
        .args(["-H"])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Missing -K <key> argument"));
}

#[test]
fn test_xor_round_trip() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let pad = signing_key(&dir, "pad.key");

    // share = secret ^ pad, printed by -G because the combined key is loaded
    let share = dir.path().join("share.key");
    meshauth()
        .args([
            "-q",
            "-G",
            "-K",
            path_str(&secret),
            "-x",
            path_str(&pad),
            "-o",
            path_str(&share),
        ])
        .assert()
        .success();
    assert_ne!(fs::read(&share).unwrap(), fs::read(&secret).unwrap());

    // share ^ pad gives back the original public key
    let expected = fs::read_to_string(public_key(&dir, &secret, "net.pub")).unwrap();
    meshauth()
        .args(["-q", "-P", "-K", path_str(&share), "-x", path_str(&pad)])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_seed_is_deterministic() {
    let derive = |salt: &str| {
        let output = meshauth()
            .args(["-q", "-G", "-s", &format!("16,{salt}")])
            .write_stdin("correct horse battery staple")
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(derive("mesh"), derive("mesh"));
    assert_ne!(derive("mesh"), derive("other"));
}

#[test]
fn test_seed_rejects_zero_rounds() {
    meshauth()
        .args(["-G", "-s", "0,mesh"])
        .write_stdin("correct horse battery staple")
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid number of rounds"));
}

#[test]
fn test_download_timeout_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let secret = signing_key(&dir, "net.key");
    let public = public_key(&dir, &secret, "net.pub");
    let host = dir.path().join("host.key");
    meshauth()
        .args(["-q", "-g", "-o", path_str(&host)])
        .assert()
        .success();

    let config = dir.path().join("meshauth.toml");
    fs::write(&config, "[sync]\ntimeout_ms = 300\n").unwrap();

    // Bound but never read, so nothing answers.
    let silent = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let endpoint = silent.local_addr().unwrap().to_string();

    let out = dir.path().join("downloaded.bin");
    meshauth()
        .args([
            "--config",
            path_str(&config),
            "-D",
            &endpoint,
            "-k",
            path_str(&public),
            "-h",
            path_str(&host),
            "-o",
            path_str(&out),
        ])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No response from peer"));

    assert!(!out.exists());
    drop(silent);
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("meshauth.toml");
    fs::write(&config, "[sync]\ntimeout_ms = 0\n").unwrap();

    meshauth()
        .args(["--config", path_str(&config), "-G"])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}
