use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn lvl(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lvl").expect("lvl binary");
    cmd.current_dir(dir)
        .env_remove("LVL_DATABASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("base.yaml"), "survey:\n  require_benchmark: false\n").expect("write");
    std::fs::write(dir.path().join("site.yaml"), "survey:\n  require_benchmark: true\n").expect("write");

    lvl(dir.path())
        .args(["config-hash", "base.yaml", "site.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("config_hash=[0-9a-f]{64}").expect("regex"))
        .stdout(predicate::str::contains(r#"{"survey":{"require_benchmark":true}}"#));
}

#[test]
fn strict_config_rejects_misspelled_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("typo.yaml"), "survey:\n  record_silent_reading: false\n").expect("write");

    lvl(dir.path())
        .args(["--config", "typo.yaml", "--strict-config", "project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));

    // Default policy only warns.
    lvl(dir.path())
        .args(["--config", "typo.yaml", "project", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("unused=/survey/record_silent_reading"));
}

#[test]
fn db_url_and_survey_policy_come_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("from-config.db");
    std::fs::write(
        dir.path().join("lvl.yaml"),
        format!(
            "db:\n  url: \"sqlite://{}\"\nsurvey:\n  record_silent_readings: false\n  require_benchmark: true\n",
            db.display()
        ),
    )
    .expect("write");

    let out = lvl(dir.path())
        .args(["--config", "lvl.yaml", "project", "create", "--date", "2024-03-02"])
        .output()
        .expect("run project create");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(db.exists());
    let pid = String::from_utf8_lossy(&out.stdout)
        .lines()
        .find_map(|l| l.strip_prefix("project_id="))
        .expect("project_id line")
        .to_string();

    lvl(dir.path())
        .args(["--config", "lvl.yaml", "reading", "add", "--project-id", pid.as_str(), "--bs", "1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("benchmark"));

    lvl(dir.path())
        .args(["--config", "lvl.yaml", "reading", "add", "--project-id", pid.as_str(), "--bs", "1.2", "--rl", "10"])
        .assert()
        .success();

    lvl(dir.path())
        .args(["--config", "lvl.yaml", "reading", "add", "--project-id", pid.as_str(), "--distance", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seq=none"))
        .stdout(predicate::str::contains("observed=false"));

    lvl(dir.path())
        .args(["--config", "lvl.yaml", "project", "show", "--project-id", pid.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("readings=1"));
}
