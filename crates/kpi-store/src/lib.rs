//! Key-path addressable document store gateway plus an in-memory backend.
//!
//! The gateway mirrors what a hosted real-time database offers: push
//! subscriptions that deliver the whole value under a path on every change,
//! and partial-path writes. Nothing here enforces schema or references.

mod mem_store;
mod path;
mod tree;

pub use mem_store::{MemStore, OpKind, StoreOp};
pub use path::StorePath;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

pub type StoreResult<T> = Result<T, StoreError>;
pub type DynGateway = Arc<dyn StoreGateway>;

/// One push from a subscription: the full value at the path (`None` when
/// nothing is stored there), or the error that ended delivery.
pub type SnapshotEvent = StoreResult<Option<Value>>;

/// Trait implemented by every remote store backend.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Deliver the current value at `path` and again after every change at or below it.
    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription>;

    /// Replace the value at `path`. Writing `null` removes it.
    async fn write(&self, path: &StorePath, value: Value) -> StoreResult<()>;

    /// Merge `fields` into `path`. Keys may be nested relative paths
    /// (`contracts/k1/months`); all of them commit as one change.
    async fn patch(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()>;

    /// Create a child under `path` with a store-generated key and return the key.
    async fn append(&self, path: &StorePath, value: Value) -> StoreResult<String>;

    /// Remove the value at `path` and everything below it.
    async fn delete(&self, path: &StorePath) -> StoreResult<()>;
}

/// Receiving half of a push subscription.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    rx: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl Subscription {
    pub fn new(path: StorePath, rx: mpsc::UnboundedReceiver<SnapshotEvent>) -> Self {
        Self { path, rx }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Wait for the next push. `None` once the store drops the subscription.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }

    /// Take an already-delivered push without waiting.
    pub fn try_next(&mut self) -> Option<SnapshotEvent> {
        self.rx.try_recv().ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("cannot append under non-collection at '{0}'")]
    NotACollection(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
