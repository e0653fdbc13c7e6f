//! The session daemon end-to-end: store pushes from other clients and control
//! commands interleaved through one loop.

use kpi_model::{Filter, MonthRecord};
use kpi_session::{Outcome, Role, SessionDaemon};
use kpi_store::{MemStore, StoreGateway};
use serde_json::json;

#[path = "helpers.rs"]
mod helpers;

use helpers::{p, seed, session_over};

#[tokio::test]
async fn daemon_applies_initial_snapshot_and_commands() {
    let store = MemStore::with_root(seed());
    let (daemon, handle) = SessionDaemon::start(session_over(&store, true), 8)
        .await
        .unwrap();
    assert_eq!(daemon.session().state().db.contracts.len(), 2);
    let join = tokio::spawn(daemon.run());

    assert_eq!(handle.login("1111").await.unwrap(), Some(Role::Medical));
    let outcome = handle
        .update_cell("k1", 1, MonthRecord::sent("CL-2", "L-2", "2026-10-05"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Applied(()));

    let rows = handle.rows(Filter::default()).await.unwrap();
    let k1 = rows.iter().find(|row| row.id == "k1").unwrap();
    assert_eq!(k1.late, 0);
    assert!(k1.editable);

    handle.shutdown().await.unwrap();
    let session = join.await.unwrap();
    assert_eq!(session.role(), Role::Medical);
}

#[tokio::test]
async fn writes_from_other_clients_replace_local_model() {
    let store = MemStore::with_root(seed());
    let (daemon, handle) = SessionDaemon::start(session_over(&store, true), 8)
        .await
        .unwrap();
    let join = tokio::spawn(daemon.run());

    store
        .write(
            &p("app_db_v2/contracts/k3"),
            json!({
                "hospital": "West Annex",
                "type": "طبي",
                "contractorId": "c2",
                "months": {"0": {"financeStatus": "sent"}}
            }),
        )
        .await
        .unwrap();

    let options = handle.filter_options().await.unwrap();
    assert!(options.hospitals.contains("West Annex"));
    let summary = handle.summary(Filter::default()).await.unwrap();
    assert_eq!(summary.contracts, 3);
    assert_eq!(summary.sent, 2);

    drop(handle);
    let session = join.await.unwrap();
    assert_eq!(session.state().db.contracts.len(), 3);
}

#[tokio::test]
async fn passwords_pushed_while_running_take_effect() {
    let store = MemStore::with_root(seed());
    let (daemon, handle) = SessionDaemon::start(session_over(&store, true), 8)
        .await
        .unwrap();
    let join = tokio::spawn(daemon.run());

    store
        .write(
            &p("app_settings/passwords"),
            json!({"super": "new-super", "medical": "1111", "non_medical": "2222"}),
        )
        .await
        .unwrap();

    assert_eq!(handle.login("1234").await.unwrap(), None);
    assert_eq!(handle.login("new-super").await.unwrap(), Some(Role::Super));
    let notices = handle.take_notices().await.unwrap();
    assert_eq!(notices.len(), 1);

    handle.shutdown().await.unwrap();
    join.await.unwrap();
}

#[tokio::test]
async fn broken_connection_is_reported() {
    let store = MemStore::with_root(seed());
    let (daemon, handle) = SessionDaemon::start(session_over(&store, true), 8)
        .await
        .unwrap();
    let join = tokio::spawn(daemon.run());

    store.break_subscriptions("socket reset").await;
    let notices = handle.take_notices().await.unwrap();
    assert!(notices.iter().any(|n| n.message.contains("socket reset")));

    let state = handle.state().await.unwrap();
    assert_eq!(state.db.contracts.len(), 2);

    handle.shutdown().await.unwrap();
    join.await.unwrap();
}

#[tokio::test]
async fn stopped_daemon_rejects_requests() {
    let store = MemStore::with_root(seed());
    let (daemon, handle) = SessionDaemon::start(session_over(&store, true), 8)
        .await
        .unwrap();
    let join = tokio::spawn(daemon.run());
    handle.shutdown().await.unwrap();
    join.await.unwrap();

    assert!(handle.login("1234").await.is_err());
}
