//! Filtered rows and headline figures for the dashboard.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::matrix::{
    contractor_name, display_value, get_month, late_count, rounded_percent, sent_count,
};
use crate::types::{AppDb, Contract, ContractCategory, ContractId, MonthRecord};

const MISSING: &str = "-";

/// Row filter; `None` on a field means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub hospital: Option<String>,
    pub contractor: Option<String>,
    pub category: Option<ContractCategory>,
}

impl Filter {
    pub fn matches(&self, db: &AppDb, contract: &Contract) -> bool {
        if let Some(hospital) = &self.hospital {
            if contract.hospital != *hospital {
                return false;
            }
        }
        if let Some(name) = &self.contractor {
            // Unresolved references never match a named contractor.
            let resolved = db
                .contractors
                .get(&contract.contractor_id)
                .map(|c| c.name.as_str());
            if resolved != Some(name.as_str()) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if contract.category != category {
                return false;
            }
        }
        true
    }
}

/// Values offered in the filter drop-downs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub hospitals: BTreeSet<String>,
    pub contractors: BTreeSet<String>,
}

impl FilterOptions {
    pub fn collect(db: &AppDb) -> Self {
        let mut options = Self::default();
        for contract in db.contracts.values() {
            if !contract.hospital.is_empty() {
                options.hospitals.insert(contract.hospital.clone());
            }
            if let Some(contractor) = db.contractors.get(&contract.contractor_id) {
                if !contractor.name.is_empty() {
                    options.contractors.insert(contractor.name.clone());
                }
            }
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractDetails {
    pub start_date: String,
    pub end_date: String,
    pub value: String,
    pub contract_number: String,
}

impl ContractDetails {
    pub fn of(contract: &Contract) -> Self {
        Self {
            start_date: or_missing(&contract.start_date),
            end_date: or_missing(&contract.end_date),
            value: display_value(&contract.value),
            contract_number: or_missing(&contract.contract_number),
        }
    }
}

fn or_missing(raw: &str) -> String {
    if raw.is_empty() {
        MISSING.into()
    } else {
        raw.into()
    }
}

/// One rendered line of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub id: ContractId,
    pub hospital: String,
    pub category: ContractCategory,
    pub contractor: String,
    pub late: usize,
    pub sent: usize,
    pub cells: Vec<MonthRecord>,
    pub notes: String,
    pub details: ContractDetails,
    pub editable: bool,
}

impl MatrixRow {
    /// Build the filtered rows. `can_edit` decides the per-row edit affordance.
    pub fn build<F>(db: &AppDb, filter: &Filter, can_edit: F) -> Vec<MatrixRow>
    where
        F: Fn(&Contract) -> bool,
    {
        let periods = db.period_count();
        db.contracts
            .iter()
            .filter(|(_, contract)| filter.matches(db, contract))
            .map(|(id, contract)| MatrixRow {
                id: id.clone(),
                hospital: contract.hospital.clone(),
                category: contract.category,
                contractor: contractor_name(db, &contract.contractor_id).to_string(),
                late: late_count(contract, periods),
                sent: sent_count(contract, periods),
                cells: (0..periods)
                    .map(|idx| get_month(contract, idx).into_owned())
                    .collect(),
                notes: contract.notes.clone(),
                details: ContractDetails::of(contract),
                editable: can_edit(contract),
            })
            .collect()
    }
}

/// Headline figures over a set of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub hospitals: usize,
    pub contracts: usize,
    pub late: usize,
    pub sent: usize,
    pub not_submitted: usize,
    pub compliance_rate: u32,
}

impl DashboardSummary {
    pub fn of_rows(rows: &[MatrixRow], period_count: usize) -> Self {
        let hospitals = rows
            .iter()
            .map(|r| r.hospital.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let late = rows.iter().map(|r| r.late).sum();
        let sent: usize = rows.iter().map(|r| r.sent).sum();
        let cells = rows.len() * period_count;
        Self {
            hospitals,
            contracts: rows.len(),
            late,
            sent,
            not_submitted: cells.saturating_sub(sent),
            compliance_rate: rounded_percent(sent, cells),
        }
    }
}
