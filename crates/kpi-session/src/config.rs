use std::fmt;
use std::str::FromStr;

use crate::period::MonthNaming;

pub const ENV_ROOT_PATH: &str = "KPI_ROOT_PATH";
pub const ENV_PASSWORDS_PATH: &str = "KPI_PASSWORDS_PATH";
pub const ENV_ROLLOVER_POLICY: &str = "KPI_ROLLOVER_POLICY";
pub const ENV_RECOMPUTE_ALIGNMENT: &str = "KPI_RECOMPUTE_ALIGNMENT";
pub const ENV_MAX_PERIODS: &str = "KPI_MAX_PERIODS";
pub const ENV_MONTH_NAMING: &str = "KPI_MONTH_NAMING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Store path holding `monthNames`, `contractors` and `contracts`.
    pub root_path: String,
    /// Store path holding the role passwords.
    pub passwords_path: String,
    pub rollover: RolloverConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root_path: "app_db_v2".into(),
            passwords_path: "app_settings/passwords".into(),
            rollover: RolloverConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `KPI_*` environment variables. Unparseable values are
    /// reported and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ENV_ROOT_PATH) {
            config.root_path = path;
        }
        if let Ok(path) = std::env::var(ENV_PASSWORDS_PATH) {
            config.passwords_path = path;
        }
        config.rollover.policy = env_or(ENV_ROLLOVER_POLICY, config.rollover.policy);
        config.rollover.alignment = env_or(ENV_RECOMPUTE_ALIGNMENT, config.rollover.alignment);
        config.rollover.naming = env_or(ENV_MONTH_NAMING, config.rollover.naming);
        config.rollover.max_periods = env_or(ENV_MAX_PERIODS, config.rollover.max_periods).max(1);
        config
    }
}

fn env_or<T>(key: &str, fallback: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%key, %raw, %err, "ignoring invalid configuration value");
                fallback
            }
        },
        Err(_) => fallback,
    }
}

/// How the period list and month arrays are rebuilt when the operator rolls months over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverConfig {
    pub policy: RolloverPolicy,
    /// Only consulted by [`RolloverPolicy::RecomputeFromEpoch`].
    pub alignment: RecomputeAlignment,
    /// Window length for [`RolloverPolicy::PrependOne`].
    pub max_periods: usize,
    pub naming: MonthNaming,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            policy: RolloverPolicy::PrependOne,
            alignment: RecomputeAlignment::Positional,
            max_periods: 12,
            naming: MonthNaming::Arabic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverPolicy {
    /// Rebuild the list as every month of the current year before the current one.
    RecomputeFromEpoch,
    /// Close the previous month: prepend one period and drop the oldest past the cap.
    PrependOne,
}

impl RolloverPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RolloverPolicy::RecomputeFromEpoch => "recompute-from-epoch",
            RolloverPolicy::PrependOne => "prepend-one",
        }
    }
}

impl FromStr for RolloverPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "recompute-from-epoch" | "recompute" => Ok(RolloverPolicy::RecomputeFromEpoch),
            "prepend-one" | "prepend" => Ok(RolloverPolicy::PrependOne),
            other => Err(format!("unknown rollover policy '{other}'")),
        }
    }
}

impl fmt::Display for RolloverPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How recompute-from-epoch carries existing cells into the rebuilt list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeAlignment {
    /// Index `i` of the new list takes index `i` of the old array, whatever its period was.
    Positional,
    /// Each new period takes the cell previously stored under the same label.
    ByLabel,
}

impl FromStr for RecomputeAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "positional" => Ok(RecomputeAlignment::Positional),
            "by-label" | "label" => Ok(RecomputeAlignment::ByLabel),
            other => Err(format!("unknown recompute alignment '{other}'")),
        }
    }
}

impl fmt::Display for RecomputeAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecomputeAlignment::Positional => "positional",
            RecomputeAlignment::ByLabel => "by-label",
        })
    }
}
