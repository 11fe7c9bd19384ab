//! Integration tests for the snowball CLI
//!
//! These drive the binary end to end. Build tests use a small shell script
//! standing in for dbt, so they only run on unix.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper function to create a snowball command
fn snowball() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(cargo::cargo_bin!("snowball"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A project directory with compiled models and a config pointing at it
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: TempDir::new().unwrap(),
        };
        ws.write("dbt/models/10_core/orders.sql", "select 1");
        ws.write("dbt/models/10_core/revenue.sql", "select 1");
        ws.write(
            "dbt/target/compiled/snowball_dbt/models/10_core/orders.sql",
            "SELECT id FROM raw.orders",
        );
        ws.write(
            "dbt/target/compiled/snowball_dbt/models/10_core/revenue.sql",
            "SELECT * FROM finance.snowball_revenue",
        );
        ws
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).unwrap()
    }

    /// Write the config file and return its path
    fn config(&self, executable: &Path) -> PathBuf {
        let root = self.path();
        self.write(
            "config.toml",
            &format!(
                "[project]\nproject_dir = {:?}\noutput_dir = {:?}\n\n\
                 [build]\nexecutable = {:?}\npoll_interval_ms = 5\n\n\
                 [vars]\ndatabase = \"analytics\"\nschema = \"finance\"\ntable = \"arr_2024\"\n",
                root.join("dbt").display().to_string(),
                root.join("out").display().to_string(),
                executable.display().to_string(),
            ),
        )
    }
}

#[test]
fn test_version() {
    snowball()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("snowball"));
}

#[test]
fn test_help() {
    snowball()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rewrites compiled models into stored procedures"));
}

#[test]
fn test_no_args_shows_info() {
    snowball().assert().success().stdout(predicate::str::contains("snowball v"));
}

#[test]
fn test_invalid_operation_rejected() {
    snowball().args(["build", "explode"]).assert().failure();
}

// =============================================================================
// POST-PROCESSING ONLY
// =============================================================================

#[test]
fn test_rewrite_command() {
    let ws = Workspace::new();
    let config = ws.config(Path::new("dbt"));
    ws.write("dbt/target/compiled/snowball_dbt/analyses/adhoc.sql", "SELECT 1 FROM t");

    snowball()
        .arg("--config")
        .arg(&config)
        .arg("rewrite")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 3 succeeded"));

    let orders = ws.read("dbt/target/compiled/snowball_dbt/models/10_core/orders.sql");
    assert!(orders.starts_with("CREATE OR ALTER PROCEDURE core.sp_orders"));
    assert!(orders.contains("SELECT id INTO core.orders\nFROM raw.orders"));
    assert_eq!(ws.read("dbt/target/compiled/snowball_dbt/analyses/adhoc.sql"), "SELECT 1 FROM t");
}

#[test]
fn test_assemble_command_json() {
    let ws = Workspace::new();
    let config = ws.config(Path::new("dbt"));
    let out = ws.path().join("nb");

    snowball()
        .arg("--json")
        .arg("--config")
        .arg(&config)
        .arg("assemble")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"succeeded\": 1"));

    let notebook = fs::read_to_string(out.join("10_core_nb.ipynb")).unwrap();
    assert!(notebook.contains("CREATE TABLE core.revenue AS\\nSELECT * FROM finance.arr_2024"));
}

#[test]
fn test_rewrite_missing_root_fails() {
    let ws = Workspace::new();
    let config = ws.config(Path::new("dbt"));

    snowball()
        .arg("--config")
        .arg(&config)
        .args(["rewrite", "--root"])
        .arg(ws.path().join("nowhere"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("root path does not exist"));
}

// =============================================================================
// BUILDS AGAINST A FAKE DBT
// =============================================================================

#[cfg(unix)]
mod fake_dbt {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    /// Shell script that answers like dbt for the operations the pipelines use
    fn install(ws: &Workspace, exit_code_for_run: i32) -> PathBuf {
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log}"
case "$1" in
  run-operation) echo "Running macro $2" ;;
  run)
    echo "1 of 2 START sql table model snowball_dbt.core.orders ... [RUN]"
    echo "1 of 2 OK created sql table model snowball_dbt.core.orders ... [OK in 0.1s]"
    echo "2 of 2 OK created sql table model snowball_dbt.core.revenue ... [OK in 0.1s]"
    exit {exit_code_for_run}
    ;;
  compile)
    echo "Found 2 models"
    echo "Compiled model snowball_dbt.core.orders"
    echo "Compiled model snowball_dbt.core.revenue"
    ;;
  debug) echo "All checks passed!" ;;
esac
exit 0
"#,
            log = ws.path().join("calls.log").display(),
        );
        let path = ws.write("bin/dbt", &script);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_build_compile_json() {
        let ws = Workspace::new();
        let config = ws.config(&install(&ws, 0));

        snowball()
            .arg("--json")
            .arg("--config")
            .arg(&config)
            .args(["build", "compile"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"completed\": 2"))
            .stdout(predicate::str::contains("All 2 models compiled successfully"));

        let calls = ws.read("calls.log");
        assert!(calls.starts_with("compile --project-dir"));
        assert!(calls.contains(r#"{"my_database":"analytics","my_schema":"finance","my_table":"arr_2024"}"#));
    }

    #[test]
    fn test_sql_pipeline() {
        let ws = Workspace::new();
        let config = ws.config(&install(&ws, 0));

        snowball()
            .arg("--config")
            .arg(&config)
            .arg("sql")
            .assert()
            .success()
            .stdout(predicate::str::contains("procedures: 2 of 2 succeeded"));

        let calls: Vec<String> = ws
            .read("calls.log")
            .lines()
            .map(|l| l.split_whitespace().next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(calls, vec!["run-operation", "run", "compile"]);

        let revenue = ws.read("dbt/target/compiled/snowball_dbt/models/10_core/revenue.sql");
        assert!(revenue.contains("INTO core.revenue\nFROM finance.arr_2024"));
    }

    #[test]
    fn test_notebooks_pipeline() {
        let ws = Workspace::new();
        let config = ws.config(&install(&ws, 0));

        snowball()
            .arg("--config")
            .arg(&config)
            .arg("notebooks")
            .assert()
            .success();

        assert!(ws.path().join("out/notebooks/10_core_nb.ipynb").exists());
    }

    #[test]
    fn test_failed_run_stops_pipeline() {
        let ws = Workspace::new();
        let config = ws.config(&install(&ws, 1));

        snowball()
            .arg("--config")
            .arg(&config)
            .arg("sql")
            .assert()
            .failure()
            .stderr(predicate::str::contains("run failed: Execution failed (2/2 models completed)"));

        let orders = ws.read("dbt/target/compiled/snowball_dbt/models/10_core/orders.sql");
        assert_eq!(orders, "SELECT id FROM raw.orders");
    }

    #[test]
    fn test_missing_executable() {
        let ws = Workspace::new();
        let config = ws.config(&ws.path().join("bin/missing-dbt"));

        snowball()
            .arg("--config")
            .arg(&config)
            .args(["build", "debug"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to start"));
    }
}
