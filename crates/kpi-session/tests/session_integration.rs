//! Session controller against the in-memory store: gating, referential
//! integrity, rollover atomicity and failure reporting.

use kpi_model::{ContractCategory, FinanceStatus, MonthRecord, Passwords};
use kpi_session::{ContractDraft, NoticeLevel, Outcome, Role, SessionError};
use kpi_store::{MemStore, OpKind, StoreError, StoreOp};
use serde_json::json;

#[path = "helpers.rs"]
mod helpers;

use helpers::{ROOT, loaded_session, p, seed};

#[tokio::test]
async fn referenced_contractor_is_never_deleted() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    assert_eq!(session.login("1234"), Some(Role::Super));
    store.clear_ops().await;

    let err = session.delete_contractor("c1").await.unwrap_err();
    assert!(matches!(err, SessionError::ContractorInUse { count: 2, .. }));
    assert!(store.ops().await.is_empty());
    assert!(store.get(&p("app_db_v2/contractors/c1")).await.is_some());

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
}

#[tokio::test]
async fn unreferenced_contractor_is_deleted() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");
    store.clear_ops().await;

    let outcome = session.delete_contractor("c2").await.unwrap();
    assert_eq!(outcome, Outcome::Applied(()));
    assert_eq!(
        store.ops().await,
        vec![StoreOp {
            kind: OpKind::Delete,
            path: p("app_db_v2/contractors/c2"),
        }]
    );
    assert!(store.get(&p("app_db_v2/contractors/c2")).await.is_none());
    assert!(!session.state().db.contractors.contains_key("c2"));
}

#[tokio::test]
async fn denied_operations_are_silent_and_write_nothing() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.take_notices();
    assert_eq!(session.login("1111"), Some(Role::Medical));
    store.clear_ops().await;

    let cell = session
        .update_cell("k2", 0, MonthRecord::sent("C", "L", "2026-10-01"))
        .await
        .unwrap();
    assert_eq!(cell, Outcome::Denied);
    assert_eq!(session.rollover().await.unwrap(), Outcome::Denied);
    assert_eq!(session.add_contractor("Gamma").await.unwrap(), Outcome::Denied);
    assert_eq!(session.reset_system().await.unwrap(), Outcome::Denied);

    assert!(store.ops().await.is_empty());
    assert!(session.take_notices().is_empty());
}

#[tokio::test]
async fn untyped_contracts_are_editable_by_super_only() {
    let mut doc = seed();
    let contracts = &mut doc["app_db_v2"]["contracts"];
    contracts["k9"] = json!({"hospital": "West Annex", "contractorId": "c1", "months": [{}]});
    contracts["k8"] = json!({"hospital": "West Annex", "type": "surgical", "contractorId": "c1"});
    let store = MemStore::with_root(doc);
    let mut session = loaded_session(&store, true).await;
    assert_eq!(session.state().db.contracts["k9"].category, ContractCategory::Unknown);

    for password in ["2222", "1111"] {
        session.login(password);
        store.clear_ops().await;
        let cell = session
            .update_cell("k9", 0, MonthRecord::with_status(FinanceStatus::Sent))
            .await
            .unwrap();
        assert_eq!(cell, Outcome::Denied);
        assert_eq!(session.edit_note("k8", "moved").await.unwrap(), Outcome::Denied);
        assert_eq!(session.delete_contract("k8").await.unwrap(), Outcome::Denied);
        assert!(store.ops().await.is_empty());
    }

    let non_medical = kpi_model::Filter {
        category: Some(ContractCategory::NonMedical),
        ..Default::default()
    };
    let ids: Vec<_> = session.rows(&non_medical).into_iter().map(|row| row.id).collect();
    assert_eq!(ids, vec!["k2".to_string()]);

    session.login("1234");
    assert_eq!(session.edit_note("k8", "moved").await.unwrap(), Outcome::Applied(()));
}

#[tokio::test]
async fn unauthenticated_session_cannot_edit() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    store.clear_ops().await;

    let outcome = session.edit_note("k1", "changed").await.unwrap();
    assert_eq!(outcome, Outcome::Denied);
    assert!(store.ops().await.is_empty());
    assert!(session.rows(&Default::default()).iter().all(|row| !row.editable));
}

#[tokio::test]
async fn cell_edit_patches_one_record() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1111");
    store.clear_ops().await;

    let record = MonthRecord::returned("missing stamp");
    let outcome = session.update_cell("k1", 1, record.clone()).await.unwrap();
    assert_eq!(outcome, Outcome::Applied(()));

    let ops = store.ops().await;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OpKind::Patch);
    assert_eq!(ops[0].path, p("app_db_v2/contracts/k1/months/1"));

    let stored = store.get(&p("app_db_v2/contracts/k1")).await.unwrap();
    assert_eq!(stored["months"][1]["financeStatus"], "returned");
    assert_eq!(stored["months"][1]["returnNotes"], "missing stamp");
    assert_eq!(stored["months"][0]["claimNum"], "CL-1");
    assert_eq!(stored["notes"], "priority");
    assert_eq!(session.state().db.contracts["k1"].months[1], record);
}

#[tokio::test]
async fn cell_edit_requires_existing_record() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");
    store.clear_ops().await;

    let err = session
        .update_cell("k2", 1, MonthRecord::with_status(FinanceStatus::Sent))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::PeriodMissing { index: 1, .. }));
    assert!(store.ops().await.is_empty());
}

#[tokio::test]
async fn rollover_commits_labels_and_months_in_one_patch() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");
    store.clear_ops().await;

    let plan = session.rollover().await.unwrap().applied().unwrap();
    assert_eq!(plan.added_labels(), vec!["سبتمبر 26"]);

    let ops = store.ops().await;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OpKind::Patch);
    assert_eq!(ops[0].path, p(ROOT));

    let root = store.get(&p(ROOT)).await.unwrap();
    assert_eq!(root["monthNames"], json!(["سبتمبر 26", "أغسطس 26", "يوليو 26"]));
    let k1 = root["contracts"]["k1"]["months"].as_array().unwrap();
    assert_eq!(k1.len(), 3);
    assert_eq!(k1[0]["financeStatus"], "late");
    assert_eq!(k1[1]["claimNum"], "CL-1");
    let k2 = root["contracts"]["k2"]["months"].as_array().unwrap();
    assert_eq!(k2.len(), 3);
    assert_eq!(root["contracts"]["k1"]["hospital"], "North General");

    let db = &session.state().db;
    assert_eq!(db.period_count(), 3);
    assert!(db.contracts.values().all(|c| c.months.len() == 3));
}

#[tokio::test]
async fn failed_rollover_leaves_state_unchanged() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");
    session.take_notices();
    let before = session.state().db.clone();
    store.set_offline(Some("network down")).await;

    let err = session.rollover().await.unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Unavailable(_))));
    assert_eq!(session.state().db, before);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);

    store.set_offline(None).await;
    let names = store.get(&p("app_db_v2/monthNames")).await.unwrap();
    assert_eq!(names.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn declined_rollover_writes_nothing() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, false).await;
    session.login("1234");
    store.clear_ops().await;

    assert_eq!(session.rollover().await.unwrap(), Outcome::Cancelled);
    assert_eq!(session.reset_system().await.unwrap(), Outcome::Cancelled);
    assert!(store.ops().await.is_empty());
}

#[tokio::test]
async fn created_contract_starts_late_for_every_period() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1111");

    let draft = ContractDraft {
        hospital: "  East Wing ".into(),
        category: ContractCategory::Medical,
        contractor_id: "c2".into(),
        value: "1200.5".into(),
        ..ContractDraft::default()
    };
    let id = session.create_contract(draft).await.unwrap().applied().unwrap();

    let stored = store.get(&p(&format!("app_db_v2/contracts/{id}"))).await.unwrap();
    assert_eq!(stored["hospital"], "East Wing");
    assert_eq!(stored["type"], "medical");
    let late = json!({
        "financeStatus": "late",
        "claimNum": "",
        "letterNum": "",
        "submissionDate": "",
        "returnNotes": ""
    });
    assert_eq!(stored["months"], json!([late.clone(), late]));
    assert_eq!(session.state().db.contracts[&id].months.len(), 2);
}

#[tokio::test]
async fn contract_creation_validates_input() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");
    store.clear_ops().await;

    let missing_hospital = ContractDraft {
        contractor_id: "c1".into(),
        ..ContractDraft::default()
    };
    let err = session.create_contract(missing_hospital).await.unwrap_err();
    assert!(matches!(err, SessionError::Invalid(_)));

    let missing_category = ContractDraft {
        hospital: "North General".into(),
        contractor_id: "c1".into(),
        ..ContractDraft::default()
    };
    let err = session.create_contract(missing_category).await.unwrap_err();
    assert!(matches!(err, SessionError::Invalid(_)));

    let unknown_contractor = ContractDraft {
        hospital: "North General".into(),
        category: ContractCategory::Medical,
        contractor_id: "nobody".into(),
        ..ContractDraft::default()
    };
    let err = session.create_contract(unknown_contractor).await.unwrap_err();
    assert!(matches!(err, SessionError::ContractorNotFound(_)));
    assert!(store.ops().await.is_empty());
}

#[tokio::test]
async fn moving_contract_across_categories_needs_both() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1111");

    let draft = ContractDraft {
        hospital: "North General".into(),
        category: ContractCategory::NonMedical,
        contractor_id: "c1".into(),
        ..ContractDraft::default()
    };
    assert_eq!(session.update_contract("k1", draft.clone()).await.unwrap(), Outcome::Denied);

    session.logout();
    session.login("1234");
    assert_eq!(session.update_contract("k1", draft).await.unwrap(), Outcome::Applied(()));
    let stored = store.get(&p("app_db_v2/contracts/k1")).await.unwrap();
    assert_eq!(stored["type"], "non_medical");
    assert_eq!(stored["notes"], "priority");
    assert_eq!(stored["months"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn system_reset_empties_document_and_ends_session() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");

    assert_eq!(session.reset_system().await.unwrap(), Outcome::Applied(()));
    assert_eq!(
        store.get(&p(ROOT)).await.unwrap(),
        json!({"monthNames": [], "contractors": {}, "contracts": {}})
    );
    assert_eq!(session.role(), Role::None);
    assert!(session.state().db.contracts.is_empty());
}

#[tokio::test]
async fn empty_store_is_reported_uninitialised() {
    let store = MemStore::new();
    let mut session = loaded_session(&store, true).await;
    assert!(!session.state().initialized);
    assert_eq!(session.state().db.period_count(), 0);
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
}

#[tokio::test]
async fn pushed_passwords_replace_defaults() {
    let mut root = seed();
    root["app_settings"] = json!({
        "passwords": {"super": "s3cret", "medical": "m", "non_medical": "n", "viewer": "v"}
    });
    let store = MemStore::with_root(root);
    let mut session = loaded_session(&store, true).await;

    assert_eq!(session.login("1234"), None);
    assert_eq!(session.take_notices()[0].level, NoticeLevel::Warning);
    assert_eq!(session.login("v"), Some(Role::Viewer));
    assert!(session.rows(&Default::default()).iter().all(|row| !row.editable));
    assert_eq!(session.login("s3cret"), Some(Role::Super));
}

#[tokio::test]
async fn password_change_writes_whole_set() {
    let store = MemStore::with_root(seed());
    let mut session = loaded_session(&store, true).await;
    session.login("1234");

    let passwords = Passwords {
        super_admin: "root".into(),
        ..Passwords::default()
    };
    assert!(session.change_passwords(passwords).await.unwrap().is_applied());
    let stored = store.get(&p("app_settings/passwords")).await.unwrap();
    assert_eq!(stored, json!({"super": "root", "medical": "1111", "non_medical": "2222"}));

    let blank = Passwords {
        medical: String::new(),
        ..Passwords::default()
    };
    assert!(matches!(
        session.change_passwords(blank).await.unwrap_err(),
        SessionError::Invalid(_)
    ));
}

#[tokio::test]
async fn summary_counts_visible_window() {
    let store = MemStore::with_root(seed());
    let session = loaded_session(&store, true).await;
    let summary = session.summary(&Default::default());
    assert_eq!(summary.hospitals, 2);
    assert_eq!(summary.contracts, 2);
    assert_eq!(summary.late, 3);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.compliance_rate, 25);
}
