use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn seed() -> Value {
    json!({
        "app_db_v2": {
            "monthNames": ["أغسطس 26", "يوليو 26"],
            "contractors": {
                "c1": {"name": "Alpha Services"},
                "c2": {"name": "Beta Supplies"}
            },
            "contracts": {
                "k1": {
                    "hospital": "North General",
                    "type": "medical",
                    "contractorId": "c1",
                    "months": [{"financeStatus": "sent"}, {"financeStatus": "late"}]
                },
                "k2": {
                    "hospital": "South Clinic",
                    "type": "non_medical",
                    "contractorId": "c1",
                    "months": [{"financeStatus": "late"}]
                }
            }
        }
    })
}

fn seeded_dir() -> TempDir {
    let tmp = TempDir::new().expect("tmpdir");
    fs::write(tmp.path().join("db.json"), seed().to_string()).unwrap();
    tmp
}

fn kpi(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kpi"));
    cmd.current_dir(dir)
        .env_remove("KPI_PASSWORD")
        .env_remove("KPI_DB")
        .env_remove("KPI_ROLLOVER_POLICY")
        .env_remove("KPI_MONTH_NAMING")
        .env_remove("KPI_MAX_PERIODS")
        .env("KPI_TODAY", "2026-10-17")
        .args(["--db", "db.json"]);
    cmd
}

fn stored(dir: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join("db.json")).unwrap()).unwrap()
}

fn json_output(assert: &assert_cmd::assert::Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("json stdout")
}

#[test]
fn help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    kpi(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rollover").and(predicate::str::contains("contractor")));
}

#[test]
fn summary_reports_visible_window() {
    let tmp = seeded_dir();
    let assert = kpi(tmp.path()).args(["summary", "--json"]).assert().success();
    let out = json_output(&assert);
    assert_eq!(out["data"]["contracts"], 2);
    assert_eq!(out["data"]["late"], 3);
    assert_eq!(out["data"]["sent"], 1);
    assert_eq!(out["data"]["compliance_rate"], 25);
    assert_eq!(out["data"]["periods"], 2);
}

#[test]
fn summary_filters_by_category() {
    let tmp = seeded_dir();
    let assert = kpi(tmp.path())
        .args(["summary", "--category", "medical", "--json"])
        .assert()
        .success();
    let out = json_output(&assert);
    assert_eq!(out["data"]["contracts"], 1);
    assert_eq!(out["data"]["compliance_rate"], 50);
}

#[test]
fn matrix_marks_rows_the_role_cannot_edit() {
    let tmp = seeded_dir();
    kpi(tmp.path())
        .args(["--password", "1111", "matrix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hospital | category"))
        .stdout(predicate::str::contains("South Clinic").and(predicate::str::contains("(read-only)")));
}

#[test]
fn rollover_without_super_is_denied() {
    let tmp = seeded_dir();
    let before = stored(tmp.path());
    kpi(tmp.path())
        .args(["--password", "2222", "--yes", "rollover"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("permission denied"));
    assert_eq!(stored(tmp.path()), before);
}

#[test]
fn rollover_prepends_previous_month() {
    let tmp = seeded_dir();
    let assert = kpi(tmp.path())
        .args(["--password", "1234", "--yes", "rollover", "--json"])
        .assert()
        .success();
    let out = json_output(&assert);
    assert_eq!(out["data"]["added"], json!(["سبتمبر 26"]));

    let db = stored(tmp.path());
    assert_eq!(db["app_db_v2"]["monthNames"], json!(["سبتمبر 26", "أغسطس 26", "يوليو 26"]));
    assert_eq!(db["app_db_v2"]["contracts"]["k1"]["months"][1]["financeStatus"], "sent");
    assert_eq!(db["app_db_v2"]["contracts"]["k2"]["months"].as_array().unwrap().len(), 3);
}

#[test]
fn rollover_recompute_with_english_labels() {
    let tmp = seeded_dir();
    kpi(tmp.path())
        .args([
            "--password",
            "1234",
            "--yes",
            "rollover",
            "--policy",
            "recompute-from-epoch",
            "--naming",
            "english",
        ])
        .assert()
        .success();
    let names = stored(tmp.path())["app_db_v2"]["monthNames"].clone();
    assert_eq!(names.as_array().unwrap().len(), 9);
    assert_eq!(names[0], "September 2026");
    assert_eq!(names[8], "January 2026");
}

#[test]
fn declined_prompt_leaves_document_untouched() {
    let tmp = seeded_dir();
    let before = stored(tmp.path());
    let mut cmd = kpi(tmp.path());
    cmd.args(["--password", "1234", "reset"]);
    assert_cmd::Command::from_std(cmd)
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("reset cancelled"));
    assert_eq!(stored(tmp.path()), before);
}

#[test]
fn referenced_contractor_cannot_be_deleted() {
    let tmp = seeded_dir();
    kpi(tmp.path())
        .args(["--password", "1234", "contractor", "delete", "c1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still referenced by 2 contract(s)"));
    assert!(stored(tmp.path())["app_db_v2"]["contractors"]["c1"].is_object());

    kpi(tmp.path())
        .args(["--password", "1234", "contractor", "delete", "c2"])
        .assert()
        .success();
    assert!(stored(tmp.path())["app_db_v2"]["contractors"].get("c2").is_none());
}

#[test]
fn cell_update_respects_category() {
    let tmp = seeded_dir();
    kpi(tmp.path())
        .args(["--password", "1111", "cell", "k2", "0", "--status", "sent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("permission denied"));

    kpi(tmp.path())
        .args(["--password", "2222", "cell", "k2", "0", "--status", "sent", "--claim", "CL-9"])
        .assert()
        .success();
    let cell = stored(tmp.path())["app_db_v2"]["contracts"]["k2"]["months"][0].clone();
    assert_eq!(cell["financeStatus"], "sent");
    assert_eq!(cell["claimNum"], "CL-9");
}

#[test]
fn untyped_contract_is_denied_and_unchanged() {
    let tmp = TempDir::new().unwrap();
    let mut doc = seed();
    doc["app_db_v2"]["contracts"]["k9"] =
        json!({"hospital": "West Annex", "contractorId": "c1", "months": [{}]});
    fs::write(tmp.path().join("db.json"), doc.to_string()).unwrap();

    kpi(tmp.path())
        .args(["--password", "2222", "cell", "k9", "0", "--status", "sent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("permission denied"));
    assert_eq!(stored(tmp.path()), doc);
}

#[test]
fn contract_add_then_edit() {
    let tmp = seeded_dir();
    let assert = kpi(tmp.path())
        .args([
            "--password",
            "1234",
            "contract",
            "add",
            "--hospital",
            "East Wing",
            "--category",
            "medical",
            "--contractor",
            "c2",
            "--json",
        ])
        .assert()
        .success();
    let id = json_output(&assert)["data"]["id"].as_str().unwrap().to_string();
    let created = stored(tmp.path())["app_db_v2"]["contracts"][&id].clone();
    assert_eq!(created["months"].as_array().unwrap().len(), 2);

    kpi(tmp.path())
        .args(["--password", "1234", "contract", "edit", &id, "--value", "9000"])
        .assert()
        .success();
    let edited = stored(tmp.path())["app_db_v2"]["contracts"][&id].clone();
    assert_eq!(edited["value"], "9000");
    assert_eq!(edited["hospital"], "East Wing");
}

#[test]
fn wrong_password_fails() {
    let tmp = seeded_dir();
    kpi(tmp.path())
        .args(["--password", "0000", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incorrect password"));
}

#[test]
fn missing_document_reads_as_uninitialised() {
    let tmp = TempDir::new().unwrap();
    let assert = kpi(tmp.path()).args(["summary", "--json"]).assert().success();
    let out = json_output(&assert);
    assert_eq!(out["data"]["initialized"], false);
    assert_eq!(out["data"]["contracts"], 0);
    assert!(!out["notices"].as_array().unwrap().is_empty());
    assert!(!tmp.path().join("db.json").exists());
}
