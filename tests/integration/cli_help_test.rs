use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn firemigrate() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("firemigrate"))
}

#[test]
fn test_help_lists_migration_commands() {
    let output = firemigrate()
        .arg("--help")
        .output()
        .expect("should run successfully");

    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(output.status.success());
    assert!(stdout.contains("MIGRATION COMMANDS"));
    for command in ["run", "rollup", "slugs", "plan"] {
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("ENVIRONMENT:"));
    assert!(stdout.contains("MONGO_PORT - Source database port (default: 27017"));
    assert!(stdout.contains("FIREBASE_CERT"));
}

#[test]
fn test_run_help_contains_examples() {
    let output = firemigrate()
        .arg("run")
        .arg("--help")
        .output()
        .expect("should run successfully");

    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("Examples:"));
    assert!(stdout.contains("--skip-post-processing"));
    assert!(stdout.contains("--only"));
}

#[test]
fn test_version_flag() {
    let output = firemigrate()
        .arg("--version")
        .output()
        .expect("should run successfully");

    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.starts_with("firemigrate "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_and_top_level_flags_conflict() {
    let output = firemigrate()
        .arg("--dry-run")
        .arg("plan")
        .output()
        .expect("should run successfully");

    assert!(!output.status.success());
}

#[test]
fn test_plan_prints_placements_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("firemigrate.toml"),
        r#"
[mongo]
database = "improv"

[migration]
collection_order = ["users", "games", "names", "namevotes"]
blacklist = ["contacts"]
post_process = false

[logging]
console_output = "none"
"#,
    )
    .unwrap();

    let output = firemigrate()
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .arg("plan")
        .output()
        .expect("should run successfully");

    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    let stderr = std::str::from_utf8(&output.stderr).unwrap();
    assert!(output.status.success(), "stderr:\n{stderr}");
    assert!(stdout.contains(" 1. users -> users/{id}"), "{stdout}");
    assert!(stdout.contains(" 3. names -> games/{game}/names/{id} (drops game)"));
    assert!(stdout.contains(" 4. namevotes -> <parent of names {name}>/namevotes/{id}"));
    assert!(stdout.contains("Skipped: contacts"));
    assert!(stdout.contains("Post-processing: disabled"));
}

#[test]
fn test_plan_rejects_conflicting_lists_and_reports_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("firemigrate.toml"),
        r#"
[mongo]
database = "improv"

[migration]
collection_order = ["users"]
blacklist = ["users"]
"#,
    )
    .unwrap();

    firemigrate()
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .arg("plan")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[ERROR] CONFIG-003").count(1))
        .stderr(predicate::str::contains("Error:").not());
}
