//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const QUOTA_XML: &str = r#"<application>
  <component name="AIAssistantQuotaManager2">
    <option name="quotaInfo" value="{&#10;  &quot;type&quot;: &quot;Available&quot;,&#10;  &quot;current&quot;: &quot;250.0&quot;,&#10;  &quot;maximum&quot;: &quot;1000.0&quot;,&#10;  &quot;until&quot;: &quot;2025-01-01T00:00:00Z&quot;&#10;}" />
    <option name="nextRefill" value="{&quot;type&quot;:&quot;Known&quot;,&quot;next&quot;:&quot;2024-06-01T00:00:00Z&quot;,&quot;amount&quot;:&quot;1000&quot;,&quot;duration&quot;:&quot;PT720H&quot;}" />
  </component>
</application>
"#;

struct Sandbox {
    data: TempDir,
    work: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            data: TempDir::new().expect("temp data dir"),
            work: TempDir::new().expect("temp work dir"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("quota-analyzer"));
        cmd.current_dir(self.work.path())
            .env_remove("RUST_LOG")
            .env_remove("QUOTA_ANALYZER_DATA_DIR")
            .arg("--data-dir")
            .arg(self.data.path());
        cmd
    }

    /// Writes `<work>/<ide>/options/AIAssistantQuotaManager2.xml`.
    fn quota_file(&self, ide: &str) -> PathBuf {
        let options = self.work.path().join(ide).join("options");
        fs::create_dir_all(&options).expect("create options dir");
        let file = options.join("AIAssistantQuotaManager2.xml");
        fs::write(&file, QUOTA_XML).expect("write quota file");
        file
    }

    fn db(&self) -> Connection {
        Connection::open(self.data.path().join("database.db")).expect("open database")
    }
}

fn history_paths(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("SELECT file_path FROM history ORDER BY id").expect("prepare");
    stmt.query_map([], |row| row.get::<_, String>(0))
        .expect("query")
        .collect::<rusqlite::Result<Vec<_>>>()
        .expect("rows")
}

fn recent_paths(conn: &Connection) -> Vec<String> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM config WHERE key = 'recent_paths'", [], |row| row.get(0))
        .ok();
    raw.map(|value| serde_json::from_str(&value).expect("recent path json")).unwrap_or_default()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("quota-analyzer"));
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("quota-analyzer"));
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("quota-analyzer"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("JetBrains AI Assistant"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("recommend"))
        .stdout(predicate::str::contains("clear"));
}

#[test]
fn test_help_paths_lists_locations() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("help-paths")
        .assert()
        .success()
        .stdout(predicate::str::contains("AIAssistantQuotaManager2.xml"))
        .stdout(predicate::str::contains("Linux"));
}

#[test]
fn test_analyze_file_records_history() {
    let sandbox = Sandbox::new();
    let file = sandbox.quota_file("PyCharm2024.1");

    sandbox
        .cmd()
        .args(["analyze", path_str(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Available"))
        .stdout(predicate::str::contains("25.00%"))
        .stdout(predicate::str::contains("PT720H"));

    let conn = sandbox.db();
    assert_eq!(history_paths(&conn), vec![path_str(&file).to_string()]);
    let (current, percentage): (f64, f64) = conn
        .query_row("SELECT current, percentage FROM history", [], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("history row");
    assert_eq!(current, 250.0);
    assert!((percentage - 25.0).abs() < 1e-9);
}

#[test]
fn test_analyze_directory_resolves_options_file() {
    let sandbox = Sandbox::new();
    let file = sandbox.quota_file("WebStorm2024.1");
    let ide_dir = sandbox.work.path().join("WebStorm2024.1");

    sandbox.cmd().args(["analyze", path_str(&ide_dir)]).assert().success();

    assert_eq!(history_paths(&sandbox.db()), vec![path_str(&file).to_string()]);
}

#[test]
fn test_analyze_missing_path_fails() {
    let sandbox = Sandbox::new();
    let missing = sandbox.work.path().join("nope.xml");

    sandbox
        .cmd()
        .args(["analyze", path_str(&missing)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path does not exist"));
}

#[test]
fn test_analyze_directory_without_quota_file_fails() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["analyze", path_str(sandbox.work.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No AIAssistantQuotaManager2.xml found"));
}

#[test]
fn test_history_and_paths_show_analyzed_files() {
    let sandbox = Sandbox::new();
    let first = sandbox.quota_file("PyCharm2024.1");
    let second = sandbox.quota_file("CLion2024.1");

    sandbox.cmd().args(["analyze", path_str(&first)]).assert().success();
    sandbox.cmd().args(["analyze", path_str(&second)]).assert().success();

    sandbox
        .cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 record(s)"))
        .stdout(predicate::str::contains(path_str(&first)));

    let pycharm_dir = sandbox.work.path().join("PyCharm2024.1");
    sandbox
        .cmd()
        .args(["history", "--filter", path_str(&pycharm_dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"));

    sandbox
        .cmd()
        .arg("paths")
        .assert()
        .success()
        .stdout(predicate::str::contains(path_str(&first)))
        .stdout(predicate::str::contains(path_str(&second)));
}

#[test]
fn test_history_empty_store() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No history records"));
}

#[test]
fn test_recommend_prefers_frequent_paths() {
    let sandbox = Sandbox::new();
    let frequent = sandbox.quota_file("IntelliJIdea2024.1");
    let rare = sandbox.quota_file("GoLand2024.1");

    sandbox.cmd().args(["analyze", path_str(&rare)]).assert().success();
    for _ in 0..3 {
        sandbox.cmd().args(["analyze", path_str(&frequent)]).assert().success();
    }

    let output = sandbox.cmd().arg("recommend").output().expect("run recommend");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let frequent_at = stdout.find(path_str(&frequent)).expect("frequent path listed");
    let rare_at = stdout.find(path_str(&rare)).expect("rare path listed");
    assert!(frequent_at < rare_at);
}

#[test]
fn test_clear_requires_confirmation_when_not_a_terminal() {
    let sandbox = Sandbox::new();
    let file = sandbox.quota_file("PyCharm2024.1");
    sandbox.cmd().args(["analyze", path_str(&file)]).assert().success();

    sandbox
        .cmd()
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("without --yes"));
    assert_eq!(history_paths(&sandbox.db()).len(), 1);
}

#[test]
fn test_clear_yes_empties_history() {
    let sandbox = Sandbox::new();
    let first = sandbox.quota_file("PyCharm2024.1");
    let second = sandbox.quota_file("CLion2024.1");
    sandbox.cmd().args(["analyze", path_str(&first)]).assert().success();
    sandbox.cmd().args(["analyze", path_str(&second)]).assert().success();

    sandbox
        .cmd()
        .args(["clear", "--yes", "--path", path_str(&first)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 history record(s)"));
    assert_eq!(history_paths(&sandbox.db()), vec![path_str(&second).to_string()]);

    sandbox
        .cmd()
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 history record(s)"));
    assert!(history_paths(&sandbox.db()).is_empty());

    sandbox
        .cmd()
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No history records to delete"));
}

#[test]
fn test_legacy_history_is_migrated_once() {
    let sandbox = Sandbox::new();
    let legacy = serde_json::json!([
        {"type": "Available", "current": 10, "maximum": 100, "file_path": "/legacy/a.xml",
         "timestamp": "2024-01-01T00:00:00"},
        {"type": "Available", "current": "20", "maximum": "100", "file_path": "/legacy/b.xml",
         "timestamp": "2024-01-02T00:00:00"},
        {"type": "Available", "current": 30, "maximum": 100}
    ]);
    fs::write(sandbox.data.path().join("history.json"), legacy.to_string()).expect("write legacy");

    sandbox
        .cmd()
        .arg("paths")
        .assert()
        .success()
        .stdout(predicate::str::contains("/legacy/a.xml"))
        .stdout(predicate::str::contains("/legacy/b.xml"));
    sandbox.cmd().arg("paths").assert().success();

    assert_eq!(history_paths(&sandbox.db()).len(), 2);
}

#[test]
fn test_config_file_sets_history_limit() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.work.path().join("quota-analyzer.toml"), "history_limit = 1\n")
        .expect("write config");
    let first = sandbox.quota_file("PyCharm2024.1");
    let second = sandbox.quota_file("CLion2024.1");
    sandbox.cmd().args(["analyze", path_str(&first)]).assert().success();
    sandbox.cmd().args(["analyze", path_str(&second)]).assert().success();

    sandbox
        .cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"));
}

#[test]
fn test_explicit_invalid_config_fails() {
    let sandbox = Sandbox::new();
    let config = sandbox.work.path().join("broken.toml");
    fs::write(&config, "history_limit = \"many\"\n").expect("write config");

    sandbox.cmd().args(["--config", path_str(&config), "paths"]).assert().failure();
}

#[test]
fn test_explicit_analyze_remembers_recent_path() {
    let sandbox = Sandbox::new();
    let file = sandbox.quota_file("PyCharm2024.1");

    sandbox.cmd().args(["analyze", path_str(&file)]).assert().success();

    assert_eq!(recent_paths(&sandbox.db()), vec![path_str(&file).to_string()]);
}

#[test]
fn test_bulk_find_all_leaves_recent_paths_alone() {
    let sandbox = Sandbox::new();
    let chosen = sandbox.quota_file("PyCharm2024.1");
    sandbox.quota_file("CLion2024.1");
    sandbox.cmd().args(["analyze", path_str(&chosen)]).assert().success();

    sandbox
        .cmd()
        .args(["find", "--all", "--root", path_str(sandbox.work.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 2 quota file(s)"));

    let conn = sandbox.db();
    assert_eq!(history_paths(&conn).len(), 3);
    assert_eq!(recent_paths(&conn), vec![path_str(&chosen).to_string()]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_analyze_without_path_leaves_recent_paths_alone() {
    let sandbox = Sandbox::new();
    let home = TempDir::new().expect("temp home");
    let product = home.path().join(".config").join("JetBrains").join("GoLand2024.1").join("options");
    fs::create_dir_all(&product).expect("create product dir");
    fs::write(product.join("AIAssistantQuotaManager2.xml"), QUOTA_XML).expect("write quota file");

    sandbox
        .cmd()
        .env("HOME", home.path())
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 1 quota file(s)"));

    let conn = sandbox.db();
    assert_eq!(history_paths(&conn).len(), 1);
    assert!(recent_paths(&conn).is_empty());
}
