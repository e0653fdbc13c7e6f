use kpi_model::{AppDb, Passwords, StatusMatrix};

use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Message for the operator. Failures of remote writes end up here instead of
/// being left unhandled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything the session knows, owned by the session controller.
///
/// `db` is a cache of the last snapshot the store pushed; the store stays the
/// source of truth and each push replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub db: AppDb,
    pub passwords: Passwords,
    pub role: Role,
    /// False until a non-empty snapshot has arrived.
    pub initialized: bool,
    pub notices: Vec<Notice>,
}

impl AppState {
    pub fn matrix(&self) -> StatusMatrix<'_> {
        StatusMatrix::new(&self.db)
    }

    pub fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
            NoticeLevel::Warning => tracing::warn!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::error!(message = %notice.message, "notice"),
        }
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
