//! Session bootstrap over a JSON document file, plus small shared helpers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use kpi_session::{
    Confirm, FixedAnswer, FixedClock, Outcome, Prompt, Session, SessionConfig, SessionDaemon,
    SessionHandle,
};
use kpi_store::MemStore;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::opts::KpiOpts;

pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// A running session daemon over the document loaded from `--db`.
pub struct SessionCtx {
    pub handle: SessionHandle,
    daemon: JoinHandle<Session>,
    store: MemStore,
    db_path: PathBuf,
}

impl SessionCtx {
    pub async fn open(opts: &KpiOpts) -> Result<Self> {
        Self::open_with(opts, SessionConfig::from_env()).await
    }

    pub async fn open_with(opts: &KpiOpts, config: SessionConfig) -> Result<Self> {
        let store = MemStore::with_root(load_document(&opts.db)?);
        let confirm: Arc<dyn Confirm> = if opts.yes {
            Arc::new(FixedAnswer(true))
        } else {
            Arc::new(TerminalConfirm)
        };
        let mut session = Session::new(Arc::new(store.clone()), config, confirm)?;
        if let Some(today) = opts.today {
            session = session.with_clock(Arc::new(FixedClock(today)));
        }
        let (daemon, handle) = SessionDaemon::start(session, 16).await?;
        let ctx = Self {
            handle,
            daemon: tokio::spawn(daemon.run()),
            store,
            db_path: opts.db.clone(),
        };
        if let Some(password) = &opts.password {
            if ctx.handle.login(password.clone()).await?.is_none() {
                bail!("incorrect password");
            }
        }
        Ok(ctx)
    }

    /// Stop the session, write the document back if anything was mutated, and
    /// return the notices the session raised.
    pub async fn close(self) -> Result<Vec<String>> {
        let notices = self.handle.take_notices().await?;
        self.handle.shutdown().await?;
        self.daemon.await.context("join session daemon")?;
        if !self.store.ops().await.is_empty() {
            save_document(&self.db_path, &self.store.dump().await)?;
        }
        Ok(notices.into_iter().map(|notice| notice.message).collect())
    }
}

/// Unwrap an outcome, turning a permission denial into a CLI error.
/// `None` means the operator declined the confirmation.
pub fn applied<T>(outcome: Outcome<T>, action: &str) -> Result<Option<T>> {
    match outcome {
        Outcome::Applied(value) => Ok(Some(value)),
        Outcome::Denied => bail!("permission denied: {action} (log in with --password)"),
        Outcome::Cancelled => Ok(None),
    }
}

pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "document not found; starting empty");
        return Ok(Value::Null);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read document {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&raw).with_context(|| format!("parse document {}", path.display()))
}

/// Replace the document atomically.
pub fn save_document(path: &Path, value: &Value) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, value).context("encode document")?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)
        .with_context(|| format!("write document {}", path.display()))?;
    Ok(())
}

/// Asks on the terminal. Anything other than `y`/`yes` declines.
struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &Prompt) -> bool {
        let title = prompt.title();
        tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{title}. Continue? [y/N] ");
            let _ = stderr.flush();
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}
