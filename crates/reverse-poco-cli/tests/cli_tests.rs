//! CLI integration tests for reverse-poco.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes for error conditions, and an end-to-end run against SQLite.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;

/// Get a command for the reverse-poco binary.
fn cmd() -> Command {
    Command::cargo_bin("reverse-poco").unwrap()
}

fn write_config(dir: &Path, connection: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    let yaml = format!(
        "connection:\n{}\ngeneration:\n  namespace: Shop.Data\n  context_name: ShopContext\n  output_dir: {}\n",
        connection,
        dir.join("generated").display()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Create a SQLite database file with a small shop schema.
fn shop_database(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("shop.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect(&url)
            .await
            .unwrap();
        for ddl in [
            "CREATE TABLE customer (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL)",
            "CREATE TABLE purchase (
                id INTEGER PRIMARY KEY,
                customer_id INTEGER NOT NULL REFERENCES customer(id),
                amount DECIMAL(10, 2)
            )",
        ] {
            sqlx::query(ddl).execute(&pool).await.unwrap();
        }
        pool.close().await;
    });
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_generate_subcommand_help() {
    cmd()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--namespace"))
        .stdout(predicate::str::contains("--context-name"))
        .stdout(predicate::str::contains("--naming"))
        .stdout(predicate::str::contains("--style"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reverse-poco"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flag_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("[default: config.yaml]"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_short_config_flag() {
    cmd()
        .args(["-c", "some_config.yaml", "--help"])
        .assert()
        .success();
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error, not a config error
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_unsupported_dialect_exits_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "  type: oracle\n  host: localhost\n  database: shop\n  user: app",
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unsupported database dialect"));
}

#[test]
fn test_invalid_style_override_exits_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    let db = shop_database(dir.path());
    let config = write_config(
        dir.path(),
        &format!("  type: sqlite\n  database: {}", db.display()),
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate", "--style", "xml"])
        .assert()
        .code(1);
}

#[test]
fn test_unreachable_server_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "  type: postgres\n  host: 127.0.0.1\n  port: 1\n  database: shop\n  user: app",
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("FAILED"));
}

// =============================================================================
// SQLite End-to-End Tests
// =============================================================================

#[test]
fn test_generate_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let db = shop_database(dir.path());
    let config = write_config(
        dir.path(),
        &format!("  type: sqlite\n  database: {}", db.display()),
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "generate", "--style", "builder-based"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generation completed!"))
        .stdout(predicate::str::contains("Tables: 2"));

    let out = dir.path().join("generated");
    let purchase = std::fs::read_to_string(out.join("Purchase.cs")).unwrap();
    assert!(purchase.contains("public decimal? Amount { get; set; }"));
    assert!(purchase.contains("public virtual Customer Customer { get; set; }"));

    let context = std::fs::read_to_string(out.join("ShopContext.cs")).unwrap();
    assert!(context.contains("public virtual DbSet<Customer> Customers { get; set; }"));
    assert!(context.contains("entity.ToTable(\"purchase\");"));
    assert!(!out.join("ShopContextStoredProcedures.cs").exists());
}

#[test]
fn test_generate_dry_run_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let db = shop_database(dir.path());
    let config = write_config(
        dir.path(),
        &format!("  type: sqlite\n  database: {}", db.display()),
    );

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "--output-json",
            "generate",
            "--dry-run",
            "--context-name",
            "StoreContext",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dry_run\": true"))
        .stdout(predicate::str::contains("StoreContext.cs"));

    assert!(!dir.path().join("generated").exists());
}

#[test]
fn test_inspect_prints_schema_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = shop_database(dir.path());
    let config = write_config(
        dir.path(),
        &format!("  type: sqlite\n  database: {}", db.display()),
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "inspect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"customer_id\""))
        .stdout(predicate::str::contains("\"ref_table\": \"customer\""));
}

#[test]
fn test_health_check_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = shop_database(dir.path());
    let config = write_config(
        dir.path(),
        &format!("  type: sqlite\n  database: {}", db.display()),
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("Tables: 2"));
}
