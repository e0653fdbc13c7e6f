//! Long-lived session loop.
//!
//! The daemon owns a [`Session`] and runs a select loop that:
//! 1. Applies pushes from the data subscription
//! 2. Applies pushes from the passwords subscription
//! 3. Processes control messages from [`SessionHandle`]s
//!
//! Pushes that queued up while a mutation was in flight are drained before the
//! next control message so every command sees the latest snapshot.

use kpi_model::{ContractId, ContractorId, DashboardSummary, Filter, FilterOptions, MatrixRow};
use kpi_model::{MonthRecord, Passwords};
use kpi_store::{SnapshotEvent, Subscription};
use tokio::sync::{mpsc, oneshot};

use crate::error::{SessionError, SessionResult};
use crate::role::Role;
use crate::rollover::RolloverPlan;
use crate::session::{ContractDraft, Outcome, Session};
use crate::state::{AppState, Notice};

type Reply<T> = oneshot::Sender<SessionResult<T>>;

/// Control message for the daemon.
#[derive(Debug)]
pub enum SessionMsg {
    Login {
        password: String,
        resp: oneshot::Sender<Option<Role>>,
    },
    Logout {
        resp: oneshot::Sender<()>,
    },
    UpdateCell {
        contract: ContractId,
        index: usize,
        record: MonthRecord,
        resp: Reply<Outcome>,
    },
    EditNote {
        contract: ContractId,
        notes: String,
        resp: Reply<Outcome>,
    },
    CreateContract {
        draft: ContractDraft,
        resp: Reply<Outcome<ContractId>>,
    },
    UpdateContract {
        contract: ContractId,
        draft: ContractDraft,
        resp: Reply<Outcome>,
    },
    DeleteContract {
        contract: ContractId,
        resp: Reply<Outcome>,
    },
    AddContractor {
        name: String,
        resp: Reply<Outcome<ContractorId>>,
    },
    RenameContractor {
        id: ContractorId,
        name: String,
        resp: Reply<Outcome>,
    },
    DeleteContractor {
        id: ContractorId,
        resp: Reply<Outcome>,
    },
    ChangePasswords {
        passwords: Passwords,
        resp: Reply<Outcome>,
    },
    Rollover {
        resp: Reply<Outcome<RolloverPlan>>,
    },
    ResetSystem {
        resp: Reply<Outcome>,
    },
    Rows {
        filter: Filter,
        resp: oneshot::Sender<Vec<MatrixRow>>,
    },
    Summary {
        filter: Filter,
        resp: oneshot::Sender<DashboardSummary>,
    },
    FilterOptions {
        resp: oneshot::Sender<FilterOptions>,
    },
    State {
        resp: oneshot::Sender<AppState>,
    },
    TakeNotices {
        resp: oneshot::Sender<Vec<Notice>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

pub struct SessionDaemon {
    session: Session,
    data: Option<Subscription>,
    passwords: Option<Subscription>,
    control_rx: mpsc::Receiver<SessionMsg>,
}

impl SessionDaemon {
    /// Subscribe to the application root and the passwords path, apply whatever
    /// the store has already delivered, and hand back a control handle.
    pub async fn start(
        session: Session,
        capacity: usize,
    ) -> SessionResult<(Self, SessionHandle)> {
        let data = session.gateway().subscribe(session.root_path()).await?;
        let passwords = session
            .gateway()
            .subscribe(session.passwords_path())
            .await?;
        let (control_tx, control_rx) = mpsc::channel(capacity.max(1));
        let mut daemon = Self {
            session,
            data: Some(data),
            passwords: Some(passwords),
            control_rx,
        };
        daemon.drain_pushes();
        Ok((daemon, SessionHandle { tx: control_tx }))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until a shutdown message arrives or every handle is dropped, then
    /// return the session.
    pub async fn run(mut self) -> Session {
        tracing::info!(root = %self.session.root_path(), "session daemon started");
        loop {
            self.drain_pushes();
            tokio::select! {
                push = next_push(&mut self.data) => match push {
                    Some(event) => self.session.apply_snapshot(event),
                    None => {
                        self.data = None;
                        self.session.notify(Notice::error("database subscription closed"));
                    }
                },
                push = next_push(&mut self.passwords) => match push {
                    Some(event) => self.session.apply_passwords(event),
                    None => {
                        tracing::debug!("passwords subscription closed");
                        self.passwords = None;
                    }
                },
                msg = self.control_rx.recv() => match msg {
                    Some(SessionMsg::Shutdown { resp }) => {
                        tracing::info!("shutdown requested via control channel");
                        let _ = resp.send(());
                        break;
                    }
                    Some(msg) => {
                        self.drain_pushes();
                        self.apply_control(msg).await;
                    }
                    None => {
                        tracing::debug!("control channel closed");
                        break;
                    }
                },
            }
        }
        self.drain_pushes();
        tracing::info!("session daemon stopped");
        self.session
    }

    fn drain_pushes(&mut self) {
        if let Some(sub) = self.data.as_mut() {
            while let Some(event) = sub.try_next() {
                self.session.apply_snapshot(event);
            }
        }
        if let Some(sub) = self.passwords.as_mut() {
            while let Some(event) = sub.try_next() {
                self.session.apply_passwords(event);
            }
        }
    }

    async fn apply_control(&mut self, msg: SessionMsg) {
        let session = &mut self.session;
        match msg {
            SessionMsg::Login { password, resp } => {
                let _ = resp.send(session.login(&password));
            }
            SessionMsg::Logout { resp } => {
                session.logout();
                let _ = resp.send(());
            }
            SessionMsg::UpdateCell {
                contract,
                index,
                record,
                resp,
            } => {
                let _ = resp.send(session.update_cell(&contract, index, record).await);
            }
            SessionMsg::EditNote {
                contract,
                notes,
                resp,
            } => {
                let _ = resp.send(session.edit_note(&contract, &notes).await);
            }
            SessionMsg::CreateContract { draft, resp } => {
                let _ = resp.send(session.create_contract(draft).await);
            }
            SessionMsg::UpdateContract {
                contract,
                draft,
                resp,
            } => {
                let _ = resp.send(session.update_contract(&contract, draft).await);
            }
            SessionMsg::DeleteContract { contract, resp } => {
                let _ = resp.send(session.delete_contract(&contract).await);
            }
            SessionMsg::AddContractor { name, resp } => {
                let _ = resp.send(session.add_contractor(&name).await);
            }
            SessionMsg::RenameContractor { id, name, resp } => {
                let _ = resp.send(session.rename_contractor(&id, &name).await);
            }
            SessionMsg::DeleteContractor { id, resp } => {
                let _ = resp.send(session.delete_contractor(&id).await);
            }
            SessionMsg::ChangePasswords { passwords, resp } => {
                let _ = resp.send(session.change_passwords(passwords).await);
            }
            SessionMsg::Rollover { resp } => {
                let _ = resp.send(session.rollover().await);
            }
            SessionMsg::ResetSystem { resp } => {
                let _ = resp.send(session.reset_system().await);
            }
            SessionMsg::Rows { filter, resp } => {
                let _ = resp.send(session.rows(&filter));
            }
            SessionMsg::Summary { filter, resp } => {
                let _ = resp.send(session.summary(&filter));
            }
            SessionMsg::FilterOptions { resp } => {
                let _ = resp.send(session.filter_options());
            }
            SessionMsg::State { resp } => {
                let _ = resp.send(session.state().clone());
            }
            SessionMsg::TakeNotices { resp } => {
                let _ = resp.send(session.take_notices());
            }
            SessionMsg::Shutdown { resp } => {
                let _ = resp.send(());
            }
        }
    }
}

/// Pending forever once the subscription has gone away so the other select
/// branches keep running.
async fn next_push(sub: &mut Option<Subscription>) -> Option<SnapshotEvent> {
    match sub {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

/// Cloneable sender side of a running [`SessionDaemon`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionMsg,
    ) -> SessionResult<T> {
        let (resp, rx) = oneshot::channel();
        self.tx
            .send(make(resp))
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn login(&self, password: impl Into<String>) -> SessionResult<Option<Role>> {
        let password = password.into();
        self.request(|resp| SessionMsg::Login { password, resp })
            .await
    }

    pub async fn logout(&self) -> SessionResult<()> {
        self.request(|resp| SessionMsg::Logout { resp }).await
    }

    pub async fn update_cell(
        &self,
        contract: impl Into<ContractId>,
        index: usize,
        record: MonthRecord,
    ) -> SessionResult<Outcome> {
        let contract = contract.into();
        self.request(|resp| SessionMsg::UpdateCell {
            contract,
            index,
            record,
            resp,
        })
        .await?
    }

    pub async fn edit_note(
        &self,
        contract: impl Into<ContractId>,
        notes: impl Into<String>,
    ) -> SessionResult<Outcome> {
        let (contract, notes) = (contract.into(), notes.into());
        self.request(|resp| SessionMsg::EditNote {
            contract,
            notes,
            resp,
        })
        .await?
    }

    pub async fn create_contract(&self, draft: ContractDraft) -> SessionResult<Outcome<ContractId>> {
        self.request(|resp| SessionMsg::CreateContract { draft, resp })
            .await?
    }

    pub async fn update_contract(
        &self,
        contract: impl Into<ContractId>,
        draft: ContractDraft,
    ) -> SessionResult<Outcome> {
        let contract = contract.into();
        self.request(|resp| SessionMsg::UpdateContract {
            contract,
            draft,
            resp,
        })
        .await?
    }

    pub async fn delete_contract(&self, contract: impl Into<ContractId>) -> SessionResult<Outcome> {
        let contract = contract.into();
        self.request(|resp| SessionMsg::DeleteContract { contract, resp })
            .await?
    }

    pub async fn add_contractor(
        &self,
        name: impl Into<String>,
    ) -> SessionResult<Outcome<ContractorId>> {
        let name = name.into();
        self.request(|resp| SessionMsg::AddContractor { name, resp })
            .await?
    }

    pub async fn rename_contractor(
        &self,
        id: impl Into<ContractorId>,
        name: impl Into<String>,
    ) -> SessionResult<Outcome> {
        let (id, name) = (id.into(), name.into());
        self.request(|resp| SessionMsg::RenameContractor { id, name, resp })
            .await?
    }

    pub async fn delete_contractor(&self, id: impl Into<ContractorId>) -> SessionResult<Outcome> {
        let id = id.into();
        self.request(|resp| SessionMsg::DeleteContractor { id, resp })
            .await?
    }

    pub async fn change_passwords(&self, passwords: Passwords) -> SessionResult<Outcome> {
        self.request(|resp| SessionMsg::ChangePasswords { passwords, resp })
            .await?
    }

    pub async fn rollover(&self) -> SessionResult<Outcome<RolloverPlan>> {
        self.request(|resp| SessionMsg::Rollover { resp }).await?
    }

    pub async fn reset_system(&self) -> SessionResult<Outcome> {
        self.request(|resp| SessionMsg::ResetSystem { resp }).await?
    }

    pub async fn rows(&self, filter: Filter) -> SessionResult<Vec<MatrixRow>> {
        self.request(|resp| SessionMsg::Rows { filter, resp }).await
    }

    pub async fn summary(&self, filter: Filter) -> SessionResult<DashboardSummary> {
        self.request(|resp| SessionMsg::Summary { filter, resp })
            .await
    }

    pub async fn filter_options(&self) -> SessionResult<FilterOptions> {
        self.request(|resp| SessionMsg::FilterOptions { resp }).await
    }

    pub async fn state(&self) -> SessionResult<AppState> {
        self.request(|resp| SessionMsg::State { resp }).await
    }

    pub async fn take_notices(&self) -> SessionResult<Vec<Notice>> {
        self.request(|resp| SessionMsg::TakeNotices { resp }).await
    }

    pub async fn shutdown(&self) -> SessionResult<()> {
        self.request(|resp| SessionMsg::Shutdown { resp }).await
    }
}
