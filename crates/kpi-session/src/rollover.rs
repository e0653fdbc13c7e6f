//! Month rollover: rebuild the period list and resynchronise every contract's
//! month array against it.
//!
//! Planning is pure. The session turns a plan into a single multi-path patch
//! so the period list and all month arrays commit together, and only mirrors
//! the plan into local state once that patch has succeeded.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use kpi_model::{AppDb, Contract, ContractId, MonthRecord, get_month};
use serde_json::{Map, Value};

use crate::config::{RecomputeAlignment, RolloverConfig, RolloverPolicy};
use crate::period::{MonthNaming, YearMonth, months_since_january};

/// Store key of the period list under the application root.
pub const MONTH_NAMES_KEY: &str = "monthNames";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverPlan {
    pub policy: RolloverPolicy,
    pub previous_names: Vec<String>,
    pub month_names: Vec<String>,
    pub months: BTreeMap<ContractId, Vec<MonthRecord>>,
}

impl RolloverPlan {
    pub fn compute(db: &AppDb, today: NaiveDate, config: &RolloverConfig) -> Self {
        match config.policy {
            RolloverPolicy::RecomputeFromEpoch => {
                recompute_from_epoch(db, today, config.naming, config.alignment)
            }
            RolloverPolicy::PrependOne => prepend_one(db, today, config.naming, config.max_periods),
        }
    }

    /// Labels present after the rollover that were not tracked before.
    pub fn added_labels(&self) -> Vec<&str> {
        self.month_names
            .iter()
            .filter(|label| !self.previous_names.contains(label))
            .map(String::as_str)
            .collect()
    }

    /// Labels that leave the window, taking their cells with them.
    pub fn dropped_labels(&self) -> Vec<&str> {
        self.previous_names
            .iter()
            .filter(|label| !self.month_names.contains(label))
            .map(String::as_str)
            .collect()
    }

    /// Patch fields relative to the application root.
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut fields = Map::new();
        fields.insert(MONTH_NAMES_KEY.into(), serde_json::to_value(&self.month_names)?);
        for (id, months) in &self.months {
            fields.insert(format!("contracts/{id}/months"), serde_json::to_value(months)?);
        }
        Ok(fields)
    }

    /// Mirror a committed plan into the local model.
    pub fn apply(&self, db: &mut AppDb) {
        db.month_names = self.month_names.clone();
        for (id, months) in &self.months {
            if let Some(contract) = db.contracts.get_mut(id) {
                contract.months = months.clone();
            }
        }
    }
}

/// Rebuild the list as January..previous month of the current year, most recent
/// first, and carry cells across according to `alignment`.
///
/// With [`RecomputeAlignment::Positional`] the cell at index `i` stays at index
/// `i` even when the period at that index changed, so a period that leaves the
/// window loses its data and shifted periods inherit their neighbour's cells.
pub fn recompute_from_epoch(
    db: &AppDb,
    today: NaiveDate,
    naming: MonthNaming,
    alignment: RecomputeAlignment,
) -> RolloverPlan {
    let month_names: Vec<String> = months_since_january(today)
        .into_iter()
        .map(|ym| ym.full_label(naming))
        .collect();
    let months = db
        .contracts
        .iter()
        .map(|(id, contract)| {
            let adjusted = match alignment {
                RecomputeAlignment::Positional => positional(contract, month_names.len()),
                RecomputeAlignment::ByLabel => by_label(contract, &db.month_names, &month_names),
            };
            (id.clone(), adjusted)
        })
        .collect();
    RolloverPlan {
        policy: RolloverPolicy::RecomputeFromEpoch,
        previous_names: db.month_names.clone(),
        month_names,
        months,
    }
}

/// Close the previous calendar month: put it at the front of the list and a late
/// record at the front of every month array, keeping at most `max_periods`.
pub fn prepend_one(
    db: &AppDb,
    today: NaiveDate,
    naming: MonthNaming,
    max_periods: usize,
) -> RolloverPlan {
    let label = YearMonth::of(today).previous().short_label(naming);
    let mut month_names = Vec::with_capacity(db.month_names.len() + 1);
    month_names.push(label);
    month_names.extend(db.month_names.iter().cloned());
    month_names.truncate(max_periods);

    let len = month_names.len();
    let months = db
        .contracts
        .iter()
        .map(|(id, contract)| {
            let mut shifted = Vec::with_capacity(len);
            if len > 0 {
                shifted.push(MonthRecord::late());
                shifted.extend((0..len - 1).map(|idx| get_month(contract, idx).into_owned()));
            }
            (id.clone(), shifted)
        })
        .collect();
    RolloverPlan {
        policy: RolloverPolicy::PrependOne,
        previous_names: db.month_names.clone(),
        month_names,
        months,
    }
}

fn positional(contract: &Contract, len: usize) -> Vec<MonthRecord> {
    (0..len)
        .map(|idx| get_month(contract, idx).into_owned())
        .collect()
}

fn by_label(contract: &Contract, old_names: &[String], new_names: &[String]) -> Vec<MonthRecord> {
    new_names
        .iter()
        .map(|label| match old_names.iter().position(|old| old == label) {
            Some(old_idx) => get_month(contract, old_idx).into_owned(),
            None => MonthRecord::late(),
        })
        .collect()
}
