//! Global CLI options and argument parsers shared by commands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use kpi_model::{ContractCategory, FinanceStatus};

/// Global options for CLI commands.
///
/// These options apply to all commands and can be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct KpiOpts {
    /// JSON document holding the whole store tree (env: KPI_DB)
    #[arg(long, global = true, env = "KPI_DB", default_value = "kpi-db.json")]
    pub db: PathBuf,

    /// Role password used to log in before the command runs (env: KPI_PASSWORD)
    #[arg(short = 'p', long, global = true, env = "KPI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Calendar date used as "today" for rollovers (YYYY-MM-DD) (env: KPI_TODAY)
    #[arg(long, global = true, env = "KPI_TODAY", value_parser = parse_date, hide = true)]
    pub today: Option<NaiveDate>,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress notices
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Filters for matrix and summary views. Omitted filters match everything.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only contracts at this hospital
    #[arg(long)]
    pub hospital: Option<String>,

    /// Only contracts with this contractor name
    #[arg(long)]
    pub contractor: Option<String>,

    /// Only contracts in this category (medical, non_medical)
    #[arg(long, value_parser = parse_category)]
    pub category: Option<ContractCategory>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> kpi_model::Filter {
        kpi_model::Filter {
            hospital: self.hospital.clone(),
            contractor: self.contractor.clone(),
            category: self.category,
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

pub fn parse_category(raw: &str) -> Result<ContractCategory, String> {
    match raw.trim() {
        "medical" | "طبي" => Ok(ContractCategory::Medical),
        "non_medical" | "non-medical" | "غير طبي" => Ok(ContractCategory::NonMedical),
        other => Err(format!("unknown category '{other}' (expected medical or non_medical)")),
    }
}

pub fn parse_status(raw: &str) -> Result<FinanceStatus, String> {
    match raw.trim() {
        "late" => Ok(FinanceStatus::Late),
        "sent" => Ok(FinanceStatus::Sent),
        "returned" => Ok(FinanceStatus::Returned),
        other => Err(format!("unknown status '{other}' (expected late, sent or returned)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_accepts_stored_and_legacy_labels() {
        assert_eq!(parse_category("medical"), Ok(ContractCategory::Medical));
        assert_eq!(parse_category("غير طبي"), Ok(ContractCategory::NonMedical));
        assert!(parse_category("surgical").is_err());
    }

    #[test]
    fn status_is_strict() {
        assert_eq!(parse_status("returned"), Ok(FinanceStatus::Returned));
        assert!(parse_status("pending").is_err());
    }

    #[test]
    fn date_format() {
        assert_eq!(parse_date("2026-10-17"), Ok(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
        assert!(parse_date("17/10/2026").is_err());
    }
}
