use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode;
use crate::error::ModelError;

pub type ContractId = String;
pub type ContractorId = String;

/// Submission state of one contract for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FinanceStatus {
    #[default]
    Late,
    Sent,
    Returned,
}

impl FinanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FinanceStatus::Late => "late",
            FinanceStatus::Sent => "sent",
            FinanceStatus::Returned => "returned",
        }
    }
}

impl From<String> for FinanceStatus {
    fn from(raw: String) -> Self {
        FinanceStatus::from(raw.as_str())
    }
}

impl From<&str> for FinanceStatus {
    /// Anything that is not a recognised submission state is treated as late.
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "sent" => FinanceStatus::Sent,
            "returned" => FinanceStatus::Returned,
            _ => FinanceStatus::Late,
        }
    }
}

impl fmt::Display for FinanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract category; decides which supervisor role may edit the contract.
///
/// `Unknown` covers a missing or unrecognised stored type. Only the super
/// role may touch such a contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ContractCategory {
    Medical,
    NonMedical,
    #[default]
    Unknown,
}

impl ContractCategory {
    /// Categories a contract can be assigned.
    pub const ALL: [ContractCategory; 2] = [ContractCategory::Medical, ContractCategory::NonMedical];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractCategory::Medical => "medical",
            ContractCategory::NonMedical => "non_medical",
            ContractCategory::Unknown => "unknown",
        }
    }
}

impl From<String> for ContractCategory {
    fn from(raw: String) -> Self {
        ContractCategory::from(raw.as_str())
    }
}

impl From<&str> for ContractCategory {
    /// Accepts the legacy Arabic labels.
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "medical" | "طبي" => ContractCategory::Medical,
            "non_medical" | "غير طبي" => ContractCategory::NonMedical,
            _ => ContractCategory::Unknown,
        }
    }
}

impl fmt::Display for ContractCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of the matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    #[serde(default, deserialize_with = "decode::status")]
    pub finance_status: FinanceStatus,
    #[serde(default, deserialize_with = "decode::text")]
    pub claim_num: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub letter_num: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub submission_date: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub return_notes: String,
}

impl MonthRecord {
    /// The record used wherever a cell has never been written.
    pub fn late() -> Self {
        Self::default()
    }

    pub fn sent(
        claim_num: impl Into<String>,
        letter_num: impl Into<String>,
        submission_date: impl Into<String>,
    ) -> Self {
        Self {
            finance_status: FinanceStatus::Sent,
            claim_num: claim_num.into(),
            letter_num: letter_num.into(),
            submission_date: submission_date.into(),
            return_notes: String::new(),
        }
    }

    pub fn returned(reason: impl Into<String>) -> Self {
        Self {
            finance_status: FinanceStatus::Returned,
            return_notes: reason.into(),
            ..Self::default()
        }
    }

    pub fn with_status(status: FinanceStatus) -> Self {
        Self {
            finance_status: status,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contractor {
    #[serde(default, deserialize_with = "decode::text")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default, deserialize_with = "decode::text")]
    pub hospital: String,
    #[serde(rename = "type", default, deserialize_with = "decode::category")]
    pub category: ContractCategory,
    #[serde(default, deserialize_with = "decode::text")]
    pub contractor_id: ContractorId,
    #[serde(default, deserialize_with = "decode::text")]
    pub start_date: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub end_date: String,
    /// Numeric amount kept as entered.
    #[serde(default, deserialize_with = "decode::text")]
    pub value: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub contract_number: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub notes: String,
    #[serde(default, deserialize_with = "decode::months")]
    pub months: Vec<MonthRecord>,
}

/// Whole tree stored under the application root path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDb {
    #[serde(default, deserialize_with = "decode::labels")]
    pub month_names: Vec<String>,
    #[serde(default, deserialize_with = "decode::records")]
    pub contractors: BTreeMap<ContractorId, Contractor>,
    #[serde(default, deserialize_with = "decode::records")]
    pub contracts: BTreeMap<ContractId, Contract>,
}

impl AppDb {
    /// Decode a full snapshot pushed by the store.
    pub fn from_snapshot(value: &Value) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::NotAnObject(json_kind(value)));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn period_count(&self) -> usize {
        self.month_names.len()
    }

    /// Ids of contracts that point at the given contractor.
    pub fn contracts_referencing<'a>(
        &'a self,
        contractor_id: &'a str,
    ) -> impl Iterator<Item = &'a ContractId> + 'a {
        self.contracts
            .iter()
            .filter(move |(_, contract)| contract.contractor_id == contractor_id)
            .map(|(id, _)| id)
    }
}

/// Shared role passwords. These only gate the UI; they are not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passwords {
    #[serde(rename = "super", default, deserialize_with = "decode::text")]
    pub super_admin: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub medical: String,
    #[serde(default, deserialize_with = "decode::text")]
    pub non_medical: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
}

impl Default for Passwords {
    fn default() -> Self {
        Self {
            super_admin: "1234".into(),
            medical: "1111".into(),
            non_medical: "2222".into(),
            viewer: None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_status_reads_as_late() {
        let record: MonthRecord =
            serde_json::from_value(json!({"financeStatus": "pending", "claimNum": 12})).unwrap();
        assert_eq!(record.finance_status, FinanceStatus::Late);
        assert_eq!(record.claim_num, "12");
    }

    #[test]
    fn legacy_arabic_category_labels() {
        let medical: Contract = serde_json::from_value(json!({"type": "طبي"})).unwrap();
        let other: Contract = serde_json::from_value(json!({"type": "غير طبي"})).unwrap();
        assert_eq!(medical.category, ContractCategory::Medical);
        assert_eq!(other.category, ContractCategory::NonMedical);
    }

    #[test]
    fn missing_or_unrecognised_category_stays_unknown() {
        let missing: Contract = serde_json::from_value(json!({"hospital": "East"})).unwrap();
        let blank: Contract = serde_json::from_value(json!({"type": ""})).unwrap();
        let odd: Contract = serde_json::from_value(json!({"type": "surgical"})).unwrap();
        for contract in [missing, blank, odd] {
            assert_eq!(contract.category, ContractCategory::Unknown);
        }
    }

    #[test]
    fn contract_serializes_with_store_field_names() {
        let contract = Contract {
            hospital: "Tabuk General".into(),
            category: ContractCategory::Medical,
            contractor_id: "c1".into(),
            months: vec![MonthRecord::late()],
            ..Contract::default()
        };
        let value = serde_json::to_value(&contract).unwrap();
        assert_eq!(value["type"], "medical");
        assert_eq!(value["contractorId"], "c1");
        assert_eq!(value["months"][0]["financeStatus"], "late");
    }

    #[test]
    fn non_object_snapshot_is_rejected() {
        let err = AppDb::from_snapshot(&json!("oops")).unwrap_err();
        assert!(matches!(err, ModelError::NotAnObject("string")));
    }

    #[test]
    fn empty_document_shape() {
        let value = serde_json::to_value(AppDb::default()).unwrap();
        assert_eq!(value, json!({"monthNames": [], "contractors": {}, "contracts": {}}));
    }

    #[test]
    fn passwords_use_role_keys() {
        let value = serde_json::to_value(Passwords::default()).unwrap();
        assert_eq!(value, json!({"super": "1234", "medical": "1111", "non_medical": "2222"}));
    }
}
