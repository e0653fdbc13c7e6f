//! Safe accessors over the contract × period matrix.
//!
//! Every reader goes through [`get_month`], so cells that were never written
//! (contracts created before a rollover, holes left by older clients) read as
//! a late record everywhere without anyone patching the contract.

use std::borrow::Cow;

use crate::types::{AppDb, Contract, ContractId, FinanceStatus, MonthRecord};

/// Placeholder shown for a contract whose contractor no longer exists.
pub const UNKNOWN_CONTRACTOR: &str = "unknown";

/// Display value for an empty or non-numeric contract value.
const MISSING_VALUE: &str = "-";

/// Cell at `index`, or a synthesized late record when the contract has none.
pub fn get_month(contract: &Contract, index: usize) -> Cow<'_, MonthRecord> {
    match contract.months.get(index) {
        Some(record) => Cow::Borrowed(record),
        None => Cow::Owned(MonthRecord::late()),
    }
}

fn count_status(contract: &Contract, period_count: usize, status: FinanceStatus) -> usize {
    (0..period_count)
        .filter(|&idx| get_month(contract, idx).finance_status == status)
        .count()
}

/// Late cells across the visible periods, synthesized cells included.
pub fn late_count(contract: &Contract, period_count: usize) -> usize {
    count_status(contract, period_count, FinanceStatus::Late)
}

pub fn sent_count(contract: &Contract, period_count: usize) -> usize {
    count_status(contract, period_count, FinanceStatus::Sent)
}

/// Percentage of sent cells, rounded half up. Zero when there is nothing to measure.
pub fn compliance_rate<'a, I>(contracts: I, period_count: usize) -> u32
where
    I: IntoIterator<Item = &'a Contract>,
{
    let mut contract_total = 0usize;
    let mut sent = 0usize;
    for contract in contracts {
        contract_total += 1;
        sent += sent_count(contract, period_count);
    }
    rounded_percent(sent, contract_total * period_count)
}

pub(crate) fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

pub fn contractor_name<'a>(db: &'a AppDb, contractor_id: &str) -> &'a str {
    db.contractors
        .get(contractor_id)
        .map(|c| c.name.as_str())
        .unwrap_or(UNKNOWN_CONTRACTOR)
}

/// Format a stored amount with thousands separators, or `-` when it is not a number.
pub fn display_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(number) = trimmed.parse::<f64>() else {
        return MISSING_VALUE.into();
    };
    if trimmed.is_empty() || !number.is_finite() {
        return MISSING_VALUE.into();
    }
    let rendered = format!("{:.3}", number.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 1);
    if number < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let frac = frac_part.trim_end_matches('0');
    if !frac.is_empty() {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Read-only view binding the accessors to one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StatusMatrix<'a> {
    db: &'a AppDb,
}

impl<'a> StatusMatrix<'a> {
    pub fn new(db: &'a AppDb) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &'a AppDb {
        self.db
    }

    pub fn period_count(&self) -> usize {
        self.db.period_count()
    }

    pub fn contract(&self, id: &str) -> Option<&'a Contract> {
        self.db.contracts.get(id)
    }

    pub fn cell(&self, contract_id: &str, index: usize) -> Option<Cow<'a, MonthRecord>> {
        self.contract(contract_id)
            .map(|contract| get_month(contract, index))
    }

    pub fn late_count(&self, contract: &Contract) -> usize {
        late_count(contract, self.period_count())
    }

    pub fn compliance_rate(&self) -> u32 {
        compliance_rate(self.db.contracts.values(), self.period_count())
    }

    pub fn contractor_name(&self, contract: &Contract) -> &'a str {
        contractor_name(self.db, &contract.contractor_id)
    }

    /// Contracts whose contractor reference does not resolve.
    pub fn dangling_contractor_refs(&self) -> Vec<&'a ContractId> {
        self.db
            .contracts
            .iter()
            .filter(|(_, c)| !self.db.contractors.contains_key(&c.contractor_id))
            .map(|(id, _)| id)
            .collect()
    }
}
