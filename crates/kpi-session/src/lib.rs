//! Session layer for the contract KPI tracker: roles and the permission gate,
//! the month rollover, and the controller that keeps a local model in sync
//! with the remote store.

pub mod clock;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gate;
pub mod period;
pub mod prompt;
pub mod role;
pub mod rollover;
pub mod session;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{RecomputeAlignment, RolloverConfig, RolloverPolicy, SessionConfig};
pub use daemon::{SessionDaemon, SessionHandle, SessionMsg};
pub use error::{SessionError, SessionResult};
pub use gate::{Decision, PermissionGate, RoleTableGate, Scope};
pub use period::{MonthNaming, YearMonth};
pub use prompt::{Confirm, FixedAnswer, Prompt};
pub use role::Role;
pub use rollover::RolloverPlan;
pub use session::{ContractDraft, Outcome, Session};
pub use state::{AppState, Notice, NoticeLevel};
