use kpi_model::{ContractId, ContractorId, ModelError};
use kpi_store::StoreError;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("contract '{0}' not found")]
    ContractNotFound(ContractId),
    #[error("contractor '{0}' not found")]
    ContractorNotFound(ContractorId),
    #[error("contractor '{id}' is still referenced by {count} contract(s)")]
    ContractorInUse { id: ContractorId, count: usize },
    #[error("contract '{contract}' has no record for period {index}; refresh the months first")]
    PeriodMissing { contract: ContractId, index: usize },
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("session stopped")]
    Stopped,
}
