//! End-to-end tests for the `gatekeeper` binary.
//!
//! Tests cover:
//! - Policy validation (first error and `--all`)
//! - JWT and API-key authorization checks
//! - Role hierarchy checks and listing
//! - Preset listing and export
//! - Settings-driven policy resolution

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const POLICY: &str = r#"
permissions = ["read", "write"]
resources = ["document", "report"]
actions = ["read", "write", "manage"]

[[roles]]
name = "admin"
level = 2

[[roles]]
name = "viewer"
level = 1

[capabilities.admin]
document = ["read", "write", "manage"]
report = ["read"]

[capabilities.viewer]
document = ["read"]

[[permission_to_action]]
permission = "read"
action = "read"

[[permission_to_action]]
permission = "write"
action = "write"

[api_key_scope]
allowed_resources = ["document"]
"#;

fn policy_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn gatekeeper() -> Command {
    let mut cmd = Command::cargo_bin("gatekeeper").unwrap();
    cmd.arg("--no-color")
        .env_remove("GATEKEEPER_CONFIG")
        .env_remove("GATEKEEPER__POLICY_FILE")
        .env_remove("GATEKEEPER__PRESET");
    cmd
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_valid_policy() {
    let file = policy_file(POLICY, ".toml");

    gatekeeper()
        .arg("validate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy is valid"));
}

#[test]
fn test_validate_reports_first_error() {
    let broken = POLICY.replace("level = 1", "level = 2");
    let file = policy_file(&broken, ".toml");

    gatekeeper()
        .args(["validate", "--output", "json"])
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("duplicate role level 2"));
}

#[test]
fn test_validate_all_reports_every_error() {
    let broken = POLICY
        .replace("level = 1", "level = 2")
        .replace(r#"["document"]"#, r#"["vault"]"#);
    let file = policy_file(&broken, ".toml");

    gatekeeper()
        .args(["validate", "--all"])
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("integrity"))
        .stdout(predicate::str::contains("unknown resource: vault"))
        .stderr(predicate::str::contains("2 error(s)"));
}

#[test]
fn test_validate_json_policy() {
    let json = r#"{
        "roles": [{"name": "owner", "level": 1}],
        "permissions": ["read"],
        "resources": ["repo"],
        "actions": ["clone"],
        "capabilities": {"owner": {"repo": ["clone"]}}
    }"#;
    let file = policy_file(json, ".json");

    gatekeeper()
        .arg("validate")
        .arg(file.path())
        .assert()
        .success();
}

#[test]
fn test_validate_unsupported_extension() {
    let file = policy_file(POLICY, ".ini");

    gatekeeper()
        .arg("validate")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported policy file extension"));
}

// ============================================================================
// Check Tests
// ============================================================================

#[test]
fn test_check_jwt_allow_and_deny() {
    let file = policy_file(POLICY, ".toml");

    gatekeeper()
        .arg("check")
        .arg(file.path())
        .args(["--role", "viewer"])
        .args(["--resource", "document", "--action", "read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"));

    gatekeeper()
        .arg("check")
        .arg(file.path())
        .args(["--role", "viewer"])
        .args(["--resource", "document", "--action", "write"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DENY"))
        .stdout(predicate::str::contains("role viewer may not write document"));
}

#[test]
fn test_check_api_key_json() {
    let file = policy_file(POLICY, ".toml");

    gatekeeper()
        .args(["--output", "json", "check"])
        .arg(file.path())
        .args(["--permission", "read", "-r", "document", "-a", "read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"allowed\": true"))
        .stdout(predicate::str::contains("\"auth_type\": \"api_key\""));

    gatekeeper()
        .args(["--output", "json", "check"])
        .arg(file.path())
        .args(["--permission", "read,write", "-r", "report", "-a", "read"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"allowed\": false"))
        .stdout(predicate::str::contains("outside the API-key scope"));
}

#[test]
fn test_check_warns_on_undeclared_permission() {
    let file = policy_file(POLICY, ".toml");

    gatekeeper()
        .arg("check")
        .arg(file.path())
        .args(["--permission", "superuser"])
        .args(["-r", "document", "-a", "read"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid permission: superuser"));
}

#[test]
fn test_check_requires_a_subject() {
    let file = policy_file(POLICY, ".toml");

    gatekeeper()
        .arg("check")
        .arg(file.path())
        .args(["-r", "document", "-a", "read"])
        .assert()
        .failure();
}

#[test]
fn test_check_rejects_invalid_policy() {
    let file = policy_file(&POLICY.replace("level = 1", "level = 2"), ".toml");

    gatekeeper()
        .arg("check")
        .arg(file.path())
        .args(["--role", "admin", "-r", "document", "-a", "read"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Policy is invalid"));
}

// ============================================================================
// Role Tests
// ============================================================================

#[test]
fn test_require_role() {
    let file = policy_file(POLICY, ".toml");

    gatekeeper()
        .arg("require-role")
        .arg(file.path())
        .args(["--role", "admin", "--min-role", "viewer"])
        .assert()
        .success();

    gatekeeper()
        .arg("require-role")
        .arg(file.path())
        .args(["--role", "viewer", "--min-role", "admin"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("below required role admin"));

    gatekeeper()
        .arg("require-role")
        .arg(file.path())
        .args(["--role", "ghost", "--min-role", "viewer"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid role"));
}

#[test]
fn test_roles_ordered_by_level() {
    let file = policy_file(POLICY, ".toml");

    let output = gatekeeper()
        .args(["--output", "json", "roles"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["role"], "admin");
    assert_eq!(rows[0]["level"], 2);
    assert_eq!(rows[1]["role"], "viewer");
    assert_eq!(rows[1]["capabilities"], "document: read");
}

// ============================================================================
// Preset Tests
// ============================================================================

#[test]
fn test_preset_list() {
    gatekeeper()
        .args(["preset", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file-management"))
        .stdout(predicate::str::contains("cms"))
        .stdout(predicate::str::contains("ecommerce"));
}

#[test]
fn test_preset_show_round_trips_through_validate() {
    let output = gatekeeper()
        .args(["preset", "show", "ecommerce", "--format", "yaml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let file = policy_file(&String::from_utf8(output.stdout).unwrap(), ".yaml");
    gatekeeper()
        .arg("validate")
        .arg(file.path())
        .assert()
        .success();
}

#[test]
fn test_preset_show_unknown() {
    gatekeeper()
        .args(["preset", "show", "banking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset: banking"));
}

// ============================================================================
// Settings Tests
// ============================================================================

#[test]
fn test_policy_from_settings_file() {
    let settings = policy_file("preset = \"cms\"\n", ".toml");

    gatekeeper()
        .arg("--config")
        .arg(settings.path())
        .args(["check", "--role", "editor"])
        .args(["-r", "article", "-a", "publish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"));
}

#[test]
fn test_policy_from_environment() {
    gatekeeper()
        .env("GATEKEEPER__PRESET", "file-management")
        .args(["require-role", "--role", "editor", "--min-role", "viewer"])
        .assert()
        .success();
}

#[test]
fn test_missing_policy_source() {
    gatekeeper()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No policy file given"));
}
