//! Session controller: owns the application state, applies store pushes and
//! routes every mutation through the permission gate before it reaches the store.

use std::sync::Arc;

use kpi_model::{
    AppDb, Contract, ContractCategory, ContractId, Contractor, ContractorId, DashboardSummary,
    Filter, FilterOptions, MatrixRow, MonthRecord, Passwords, StatusMatrix,
};
use kpi_store::{DynGateway, SnapshotEvent, StorePath};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::gate::{PermissionGate, RoleTableGate, Scope};
use crate::prompt::{Confirm, Prompt};
use crate::role::Role;
use crate::rollover::RolloverPlan;
use crate::state::{AppState, Notice, NoticeLevel};

const CONTRACTS: &str = "contracts";
const CONTRACTORS: &str = "contractors";

/// Result of an operation that reached the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Applied(T),
    /// The role may not perform this operation. Nothing was written and nothing is reported.
    Denied,
    /// The operator declined the confirmation prompt.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Denied | Outcome::Cancelled => None,
        }
    }
}

/// Editable contract fields. Months and notes are managed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractDraft {
    pub hospital: String,
    pub category: ContractCategory,
    pub contractor_id: ContractorId,
    pub start_date: String,
    pub end_date: String,
    pub value: String,
    pub contract_number: String,
}

impl ContractDraft {
    fn validate(&self) -> SessionResult<()> {
        if self.hospital.trim().is_empty() {
            return Err(SessionError::Invalid("hospital is required".into()));
        }
        if self.category == ContractCategory::Unknown {
            return Err(SessionError::Invalid("category is required".into()));
        }
        if self.contractor_id.trim().is_empty() {
            return Err(SessionError::Invalid("contractor is required".into()));
        }
        Ok(())
    }

    fn into_contract(self, period_count: usize) -> Contract {
        Contract {
            hospital: self.hospital.trim().to_owned(),
            category: self.category,
            contractor_id: self.contractor_id,
            start_date: self.start_date,
            end_date: self.end_date,
            value: self.value,
            contract_number: self.contract_number,
            notes: String::new(),
            months: vec![MonthRecord::late(); period_count],
        }
    }

    fn apply_to(&self, contract: &mut Contract) {
        contract.hospital = self.hospital.trim().to_owned();
        contract.category = self.category;
        contract.contractor_id = self.contractor_id.clone();
        contract.start_date = self.start_date.clone();
        contract.end_date = self.end_date.clone();
        contract.value = self.value.clone();
        contract.contract_number = self.contract_number.clone();
    }

    fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("hospital".into(), self.hospital.trim().into());
        fields.insert("type".into(), self.category.as_str().into());
        fields.insert("contractorId".into(), self.contractor_id.clone().into());
        fields.insert("startDate".into(), self.start_date.clone().into());
        fields.insert("endDate".into(), self.end_date.clone().into());
        fields.insert("value".into(), self.value.clone().into());
        fields.insert("contractNumber".into(), self.contract_number.clone().into());
        fields
    }
}

pub struct Session {
    gateway: DynGateway,
    config: SessionConfig,
    root: StorePath,
    passwords_path: StorePath,
    gate: Arc<dyn PermissionGate>,
    clock: Arc<dyn Clock>,
    confirm: Arc<dyn Confirm>,
    state: AppState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("role", &self.state.role)
            .field("contracts", &self.state.db.contracts.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        gateway: DynGateway,
        config: SessionConfig,
        confirm: Arc<dyn Confirm>,
    ) -> SessionResult<Self> {
        let root = StorePath::parse(&config.root_path)?;
        let passwords_path = StorePath::parse(&config.passwords_path)?;
        Ok(Self {
            gateway,
            config,
            root,
            passwords_path,
            gate: Arc::new(RoleTableGate),
            clock: Arc::new(SystemClock),
            confirm,
            state: AppState::default(),
        })
    }

    pub fn with_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn gateway(&self) -> &DynGateway {
        &self.gateway
    }

    pub fn root_path(&self) -> &StorePath {
        &self.root
    }

    pub fn passwords_path(&self) -> &StorePath {
        &self.passwords_path
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn role(&self) -> Role {
        self.state.role
    }

    pub fn matrix(&self) -> StatusMatrix<'_> {
        self.state.matrix()
    }

    pub fn notify(&mut self, notice: Notice) {
        self.state.notify(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    // ---------------------------------------------------------------------
    // Store pushes
    // ---------------------------------------------------------------------

    /// Replace the cached model with a pushed snapshot of the application root.
    pub fn apply_snapshot(&mut self, event: SnapshotEvent) {
        match event {
            Ok(Some(value)) => match AppDb::from_snapshot(&value) {
                Ok(db) => {
                    let dangling = StatusMatrix::new(&db).dangling_contractor_refs().len();
                    if dangling > 0 {
                        tracing::debug!(dangling, "contracts reference missing contractors");
                    }
                    tracing::info!(
                        periods = db.period_count(),
                        contracts = db.contracts.len(),
                        contractors = db.contractors.len(),
                        "snapshot applied"
                    );
                    self.state.db = db;
                    self.state.initialized = true;
                }
                Err(err) => self
                    .state
                    .notify(Notice::warning(format!("ignored malformed snapshot: {err}"))),
            },
            Ok(None) => {
                self.state.db = AppDb::default();
                self.state.initialized = false;
                self.state
                    .notify(Notice::info("the database is empty; initialise the system"));
            }
            Err(err) => self
                .state
                .notify(Notice::error(format!("database connection failed: {err}"))),
        }
    }

    /// Replace the role passwords with a pushed value. An empty path keeps the current set.
    pub fn apply_passwords(&mut self, event: SnapshotEvent) {
        match event {
            Ok(Some(value)) => match serde_json::from_value::<Passwords>(value) {
                Ok(passwords) => self.state.passwords = passwords,
                Err(err) => self
                    .state
                    .notify(Notice::warning(format!("ignored malformed passwords: {err}"))),
            },
            Ok(None) => {}
            Err(err) => self
                .state
                .notify(Notice::warning(format!("password settings unavailable: {err}"))),
        }
    }

    // ---------------------------------------------------------------------
    // Authentication
    // ---------------------------------------------------------------------

    pub fn login(&mut self, password: &str) -> Option<Role> {
        match Role::for_password(&self.state.passwords, password) {
            Some(role) => {
                tracing::info!(%role, "logged in");
                self.state.role = role;
                Some(role)
            }
            None => {
                self.state.notify(Notice::warning("incorrect password"));
                None
            }
        }
    }

    pub fn logout(&mut self) {
        self.state.role = Role::None;
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn can_edit(&self, category: ContractCategory) -> bool {
        self.gate
            .decide(self.state.role, Scope::Contract(category))
            .is_allowed()
    }

    pub fn is_admin(&self) -> bool {
        self.gate.decide(self.state.role, Scope::Admin).is_allowed()
    }

    pub fn rows(&self, filter: &Filter) -> Vec<MatrixRow> {
        MatrixRow::build(&self.state.db, filter, |c| self.can_edit(c.category))
    }

    pub fn summary(&self, filter: &Filter) -> DashboardSummary {
        DashboardSummary::of_rows(&self.rows(filter), self.state.db.period_count())
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::collect(&self.state.db)
    }

    // ---------------------------------------------------------------------
    // Contract-scoped mutations
    // ---------------------------------------------------------------------

    pub async fn update_cell(
        &mut self,
        contract_id: &str,
        index: usize,
        record: MonthRecord,
    ) -> SessionResult<Outcome> {
        let result = async {
            let contract = self.contract(contract_id)?;
            if !self.permits(Scope::Contract(contract.category)) {
                return Ok(Outcome::Denied);
            }
            if index >= contract.months.len() {
                return Err(SessionError::PeriodMissing {
                    contract: contract_id.into(),
                    index,
                });
            }
            let path = self.contract_path(contract_id)?.join(&format!("months/{index}"))?;
            self.gateway.patch(&path, object_fields(&record)?).await?;
            if let Some(slot) = self
                .state
                .db
                .contracts
                .get_mut(contract_id)
                .and_then(|c| c.months.get_mut(index))
            {
                *slot = record;
            }
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("cell update", "updated", result)
    }

    pub async fn edit_note(&mut self, contract_id: &str, notes: &str) -> SessionResult<Outcome> {
        let result = async {
            let contract = self.contract(contract_id)?;
            if !self.permits(Scope::Contract(contract.category)) {
                return Ok(Outcome::Denied);
            }
            let mut fields = Map::new();
            fields.insert("notes".into(), notes.into());
            self.gateway
                .patch(&self.contract_path(contract_id)?, fields)
                .await?;
            if let Some(contract) = self.state.db.contracts.get_mut(contract_id) {
                contract.notes = notes.to_owned();
            }
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("note update", "saved", result)
    }

    /// Create a contract with one late record per tracked period.
    pub async fn create_contract(
        &mut self,
        draft: ContractDraft,
    ) -> SessionResult<Outcome<ContractId>> {
        let result = async {
            if !self.permits(Scope::Contract(draft.category)) {
                return Ok(Outcome::Denied);
            }
            draft.validate()?;
            self.contractor(&draft.contractor_id)?;
            let contract = draft.into_contract(self.state.db.period_count());
            let id = self
                .gateway
                .append(&self.root.child(CONTRACTS)?, serde_json::to_value(&contract)?)
                .await?;
            self.state.db.contracts.insert(id.clone(), contract);
            Ok(Outcome::Applied(id))
        }
        .await;
        self.finish("contract creation", "contract saved", result)
    }

    /// Edit contract fields. Moving a contract between categories needs
    /// permission on both.
    pub async fn update_contract(
        &mut self,
        contract_id: &str,
        draft: ContractDraft,
    ) -> SessionResult<Outcome> {
        let result = async {
            let current = self.contract(contract_id)?.category;
            let moved = draft.category;
            if !self.permits(Scope::Contract(current)) || !self.permits(Scope::Contract(moved)) {
                return Ok(Outcome::Denied);
            }
            draft.validate()?;
            self.contractor(&draft.contractor_id)?;
            self.gateway
                .patch(&self.contract_path(contract_id)?, draft.fields())
                .await?;
            if let Some(contract) = self.state.db.contracts.get_mut(contract_id) {
                draft.apply_to(contract);
            }
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("contract update", "contract saved", result)
    }

    pub async fn delete_contract(&mut self, contract_id: &str) -> SessionResult<Outcome> {
        let result = async {
            let contract = self.contract(contract_id)?;
            if !self.permits(Scope::Contract(contract.category)) {
                return Ok(Outcome::Denied);
            }
            self.gateway.delete(&self.contract_path(contract_id)?).await?;
            self.state.db.contracts.remove(contract_id);
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("contract deletion", "contract deleted", result)
    }

    // ---------------------------------------------------------------------
    // Admin mutations
    // ---------------------------------------------------------------------

    pub async fn add_contractor(&mut self, name: &str) -> SessionResult<Outcome<ContractorId>> {
        let result = async {
            if !self.permits(Scope::Admin) {
                return Ok(Outcome::Denied);
            }
            let contractor = Contractor {
                name: required_name(name)?,
            };
            let id = self
                .gateway
                .append(&self.root.child(CONTRACTORS)?, serde_json::to_value(&contractor)?)
                .await?;
            self.state.db.contractors.insert(id.clone(), contractor);
            Ok(Outcome::Applied(id))
        }
        .await;
        self.finish("contractor creation", "contractor added", result)
    }

    pub async fn rename_contractor(&mut self, id: &str, name: &str) -> SessionResult<Outcome> {
        let result = async {
            if !self.permits(Scope::Admin) {
                return Ok(Outcome::Denied);
            }
            self.contractor(id)?;
            let name = required_name(name)?;
            let mut fields = Map::new();
            fields.insert("name".into(), name.clone().into());
            let path = self.root.child(CONTRACTORS)?.child(id)?;
            self.gateway.patch(&path, fields).await?;
            if let Some(contractor) = self.state.db.contractors.get_mut(id) {
                contractor.name = name;
            }
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("contractor update", "contractor saved", result)
    }

    /// Remove a contractor that no contract references. The store has no foreign
    /// keys, so the check happens here and a referenced contractor is never deleted.
    pub async fn delete_contractor(&mut self, id: &str) -> SessionResult<Outcome> {
        let result = async {
            if !self.permits(Scope::Admin) {
                return Ok(Outcome::Denied);
            }
            self.contractor(id)?;
            let count = self.state.db.contracts_referencing(id).count();
            if count > 0 {
                return Err(SessionError::ContractorInUse {
                    id: id.into(),
                    count,
                });
            }
            self.gateway
                .delete(&self.root.child(CONTRACTORS)?.child(id)?)
                .await?;
            self.state.db.contractors.remove(id);
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("contractor deletion", "contractor deleted", result)
    }

    pub async fn change_passwords(&mut self, passwords: Passwords) -> SessionResult<Outcome> {
        let result = async {
            if !self.permits(Scope::Admin) {
                return Ok(Outcome::Denied);
            }
            if [&passwords.super_admin, &passwords.medical, &passwords.non_medical]
                .iter()
                .any(|p| p.is_empty())
            {
                return Err(SessionError::Invalid("role passwords cannot be empty".into()));
            }
            self.gateway
                .write(&self.passwords_path, serde_json::to_value(&passwords)?)
                .await?;
            self.state.passwords = passwords;
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("password change", "passwords saved", result)
    }

    /// Close a month (or rebuild the table) according to the configured policy.
    ///
    /// Every call is a new mutation; the operator confirms each one. The period
    /// list and all month arrays go out as one patch and local state is only
    /// touched once it has been accepted.
    pub async fn rollover(&mut self) -> SessionResult<Outcome<RolloverPlan>> {
        let result = async {
            if !self.permits(Scope::Admin) {
                return Ok(Outcome::Denied);
            }
            let plan =
                RolloverPlan::compute(&self.state.db, self.clock.today(), &self.config.rollover);
            let prompt = Prompt::Rollover {
                policy: plan.policy,
                added: plan.added_labels().into_iter().map(str::to_owned).collect(),
                dropped: plan.dropped_labels().into_iter().map(str::to_owned).collect(),
                period_count: plan.month_names.len(),
                contracts: plan.months.len(),
            };
            if !self.confirm.confirm(&prompt).await {
                return Ok(Outcome::Cancelled);
            }
            self.gateway.patch(&self.root, plan.to_fields()?).await?;
            plan.apply(&mut self.state.db);
            tracing::info!(
                policy = %plan.policy,
                periods = plan.month_names.len(),
                contracts = plan.months.len(),
                "rollover committed"
            );
            Ok(Outcome::Applied(plan))
        }
        .await;
        self.finish("month rollover", "months updated", result)
    }

    /// Erase every contract, contractor and period, then end the session.
    pub async fn reset_system(&mut self) -> SessionResult<Outcome> {
        let result = async {
            if !self.permits(Scope::Admin) {
                return Ok(Outcome::Denied);
            }
            let prompt = Prompt::SystemReset {
                contracts: self.state.db.contracts.len(),
                contractors: self.state.db.contractors.len(),
            };
            if !self.confirm.confirm(&prompt).await {
                return Ok(Outcome::Cancelled);
            }
            self.gateway
                .write(&self.root, serde_json::to_value(AppDb::default())?)
                .await?;
            self.state.db = AppDb::default();
            self.state.role = Role::None;
            Ok(Outcome::Applied(()))
        }
        .await;
        self.finish("system reset", "system reset", result)
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn permits(&self, scope: Scope) -> bool {
        let allowed = self.gate.decide(self.state.role, scope).is_allowed();
        if !allowed {
            tracing::debug!(role = %self.state.role, ?scope, "operation denied");
        }
        allowed
    }

    fn contract(&self, id: &str) -> SessionResult<&Contract> {
        self.state
            .db
            .contracts
            .get(id)
            .ok_or_else(|| SessionError::ContractNotFound(id.into()))
    }

    fn contractor(&self, id: &str) -> SessionResult<&Contractor> {
        self.state
            .db
            .contractors
            .get(id)
            .ok_or_else(|| SessionError::ContractorNotFound(id.into()))
    }

    fn contract_path(&self, id: &str) -> SessionResult<StorePath> {
        Ok(self.root.child(CONTRACTS)?.child(id)?)
    }

    /// Turn the outcome of a mutation into operator notices. Denials stay silent.
    fn finish<T>(
        &mut self,
        action: &str,
        done: &str,
        result: SessionResult<Outcome<T>>,
    ) -> SessionResult<Outcome<T>> {
        match &result {
            Ok(Outcome::Applied(_)) => self.state.notify(Notice::info(done)),
            Ok(Outcome::Denied | Outcome::Cancelled) => {}
            Err(err) => {
                let level = match err {
                    SessionError::Store(_) | SessionError::Encode(_) | SessionError::Model(_) => {
                        NoticeLevel::Error
                    }
                    _ => NoticeLevel::Warning,
                };
                self.state.notify(Notice {
                    level,
                    message: format!("{action} failed: {err}"),
                });
            }
        }
        result
    }
}

fn required_name(name: &str) -> SessionResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::Invalid("name is required".into()));
    }
    Ok(trimmed.to_owned())
}

fn object_fields<T: Serialize>(value: &T) -> SessionResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(SessionError::Invalid("expected a record".into())),
    }
}
