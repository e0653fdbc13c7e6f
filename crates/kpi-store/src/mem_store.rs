use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::{SnapshotEvent, StoreError, StoreGateway, StorePath, StoreResult, Subscription, tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Write,
    Patch,
    Append,
    Delete,
}

/// A mutation the gateway was asked to perform, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOp {
    pub kind: OpKind,
    pub path: StorePath,
}

struct Subscriber {
    path: StorePath,
    tx: mpsc::UnboundedSender<SnapshotEvent>,
}

#[derive(Default)]
struct Inner {
    root: Value,
    subscribers: Vec<Subscriber>,
    ops: Vec<StoreOp>,
    offline: Option<String>,
}

impl Inner {
    fn check_online(&self) -> StoreResult<()> {
        match &self.offline {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    /// Push the current value to every subscriber whose path overlaps a changed path.
    fn notify(&mut self, changed: &[StorePath]) {
        let root = &self.root;
        self.subscribers.retain(|sub| {
            if !changed.iter().any(|path| path.overlaps(&sub.path)) {
                return !sub.tx.is_closed();
            }
            let value = tree::get(root, &sub.path).cloned();
            sub.tx.send(Ok(value)).is_ok()
        });
    }
}

/// In-memory document tree with push subscriptions.
///
/// Clones share the same tree. Every mutation is recorded in an operation log
/// so callers can assert which writes were issued, and the store can be put
/// offline to exercise connectivity failures.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore").finish_non_exhaustive()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root,
                ..Inner::default()
            })),
        }
    }

    /// Copy of the whole tree.
    pub async fn dump(&self) -> Value {
        self.inner.lock().await.root.clone()
    }

    pub async fn get(&self, path: &StorePath) -> Option<Value> {
        tree::get(&self.inner.lock().await.root, path).cloned()
    }

    pub async fn ops(&self) -> Vec<StoreOp> {
        self.inner.lock().await.ops.clone()
    }

    pub async fn clear_ops(&self) {
        self.inner.lock().await.ops.clear();
    }

    /// Fail every subsequent mutation with `Unavailable` until brought back online.
    pub async fn set_offline(&self, reason: Option<&str>) {
        self.inner.lock().await.offline = reason.map(str::to_owned);
    }

    /// Deliver an error to every open subscription, as a dropped connection would.
    pub async fn break_subscriptions(&self, reason: &str) {
        let inner = self.inner.lock().await;
        for sub in &inner.subscribers {
            let _ = sub.tx.send(Err(StoreError::Unavailable(reason.to_owned())));
        }
    }

    async fn mutate<F, T>(&self, kind: OpKind, path: &StorePath, apply: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Value) -> StoreResult<(T, Vec<StorePath>)>,
    {
        let mut inner = self.inner.lock().await;
        inner.ops.push(StoreOp {
            kind,
            path: path.clone(),
        });
        if let Err(err) = inner.check_online() {
            tracing::debug!(?kind, %path, %err, "rejecting mutation");
            return Err(err);
        }
        let (out, changed) = apply(&mut inner.root)?;
        inner.notify(&changed);
        Ok(out)
    }
}

#[async_trait]
impl StoreGateway for MemStore {
    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        let mut inner = self.inner.lock().await;
        inner.check_online()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let current = tree::get(&inner.root, path).cloned();
        // The receiver is alive, so the initial push cannot fail.
        let _ = tx.send(Ok(current));
        inner.subscribers.push(Subscriber {
            path: path.clone(),
            tx,
        });
        Ok(Subscription::new(path.clone(), rx))
    }

    async fn write(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        self.mutate(OpKind::Write, path, |root| {
            tree::set(root, path, value);
            Ok(((), vec![path.clone()]))
        })
        .await
    }

    async fn patch(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()> {
        let targets = fields
            .into_iter()
            .map(|(key, value)| Ok((path.join(&key)?, value)))
            .collect::<StoreResult<Vec<_>>>()?;
        self.mutate(OpKind::Patch, path, |root| {
            let mut changed = Vec::with_capacity(targets.len());
            for (target, value) in targets {
                tree::set(root, &target, value);
                changed.push(target);
            }
            Ok(((), changed))
        })
        .await
    }

    async fn append(&self, path: &StorePath, value: Value) -> StoreResult<String> {
        let key = format!("-{}", Uuid::new_v4().simple());
        let child = path.child(&key)?;
        self.mutate(OpKind::Append, path, |root| {
            if let Some(existing) = tree::get(root, path) {
                if !existing.is_object() {
                    return Err(StoreError::NotACollection(path.to_string()));
                }
            }
            tree::set(root, &child, value);
            Ok((key, vec![child]))
        })
        .await
    }

    async fn delete(&self, path: &StorePath) -> StoreResult<()> {
        self.mutate(OpKind::Delete, path, |root| {
            tree::remove(root, path);
            Ok(((), vec![path.clone()]))
        })
        .await
    }
}
