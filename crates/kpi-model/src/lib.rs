//! Contract/month entity shapes and the status matrix derived from the remote document tree.

mod decode;
pub mod dashboard;
pub mod error;
pub mod matrix;
pub mod types;

pub use dashboard::{ContractDetails, DashboardSummary, Filter, FilterOptions, MatrixRow};
pub use error::ModelError;
pub use matrix::{
    StatusMatrix, UNKNOWN_CONTRACTOR, compliance_rate, contractor_name, display_value, get_month,
    late_count, sent_count,
};
pub use types::{
    AppDb, Contract, ContractCategory, ContractId, Contractor, ContractorId, FinanceStatus,
    MonthRecord, Passwords,
};
