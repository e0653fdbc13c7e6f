//! Shared fixtures for session integration tests.
//!
//! Each integration test compiles this module separately, so some helpers may
//! look unused in one file but are used by another.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use kpi_session::{FixedAnswer, FixedClock, Session, SessionConfig};
use kpi_store::{MemStore, StoreGateway, StorePath};
use serde_json::{Value, json};

pub const ROOT: &str = "app_db_v2";

pub fn p(raw: &str) -> StorePath {
    StorePath::parse(raw).unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

/// Two tracked periods, two contractors (one unreferenced), a medical contract
/// with a full month array and a non-medical one with a short array.
pub fn seed() -> Value {
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
                    "value": "250000",
                    "notes": "priority",
                    "months": [
                        {"financeStatus": "sent", "claimNum": "CL-1", "letterNum": "L-1", "submissionDate": "2026-09-02"},
                        {"financeStatus": "late"}
                    ]
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

pub fn session_over(store: &MemStore, answer: bool) -> Session {
    Session::new(
        Arc::new(store.clone()),
        SessionConfig::default(),
        Arc::new(FixedAnswer(answer)),
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock(today())))
}

/// Session with the current store contents applied, as the first push would.
pub async fn loaded_session(store: &MemStore, answer: bool) -> Session {
    let mut session = session_over(store, answer);
    let mut data = store.subscribe(session.root_path()).await.unwrap();
    session.apply_snapshot(data.next().await.unwrap());
    let mut passwords = store.subscribe(session.passwords_path()).await.unwrap();
    session.apply_passwords(passwords.next().await.unwrap());
    session
}
