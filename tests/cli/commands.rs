//! CLI error handling and help output

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn command(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rsmeta").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("REDSHIFT_DATABASE_URL")
        .env_remove("DATABASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() -> Result<()> {
    let dir = TempDir::new()?;
    command(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("collect").and(predicate::str::contains("dependencies")));

    Ok(())
}

#[test]
fn test_collect_help_lists_filters() -> Result<()> {
    let dir = TempDir::new()?;
    command(&dir)
        .args(["collect", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--database-url")
                .and(predicate::str::contains("--extended-metadata"))
                .and(predicate::str::contains("--exclude-tables")),
        );

    Ok(())
}

#[test]
fn test_collect_without_database_url_fails() -> Result<()> {
    let dir = TempDir::new()?;
    command(&dir)
        .arg("collect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database URL configured"));

    Ok(())
}

#[test]
fn test_invalid_config_yaml_error() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("rsmeta.yaml"), "output: [unbalanced")?;

    command(&dir)
        .arg("dependencies")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));

    Ok(())
}

#[test]
fn test_invalid_database_url_error() -> Result<()> {
    let dir = TempDir::new()?;
    command(&dir)
        .args(["collect", "--database-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid database URL"));

    Ok(())
}

#[test]
fn test_unknown_format_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    command(&dir)
        .args(["collect", "--format", "xml"])
        .assert()
        .failure();

    Ok(())
}
