//! Lenient field decoders for records written by older clients.
//!
//! The store never validates shape, so every field may be missing, `null`, a
//! number where text was expected, or an index-keyed object where an array was
//! expected. None of these are fatal.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{ContractCategory, FinanceStatus, MonthRecord};

/// Sparse arrays with indices beyond this are treated as garbage.
const MAX_SPARSE_INDEX: usize = 4096;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Other(IgnoredAny),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Other(_) => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Sequence {
    Dense(Vec<Value>),
    Sparse(BTreeMap<String, Value>),
    Other(IgnoredAny),
}

impl Sequence {
    /// Flatten into positional slots; holes stay `None`.
    fn into_slots(self) -> Vec<Option<Value>> {
        match self {
            Sequence::Dense(items) => items
                .into_iter()
                .map(|v| if v.is_null() { None } else { Some(v) })
                .collect(),
            Sequence::Sparse(entries) => {
                let indexed: Vec<(usize, Value)> = entries
                    .into_iter()
                    .filter_map(|(key, v)| {
                        let idx = key.parse::<usize>().ok()?;
                        (idx < MAX_SPARSE_INDEX && !v.is_null()).then_some((idx, v))
                    })
                    .collect();
                let len = indexed.iter().map(|(idx, _)| idx + 1).max().unwrap_or(0);
                let mut slots = vec![None; len];
                for (idx, v) in indexed {
                    slots[idx] = Some(v);
                }
                slots
            }
            Sequence::Other(_) => Vec::new(),
        }
    }
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

pub(crate) fn status<'de, D>(deserializer: D) -> Result<FinanceStatus, D::Error>
where
    D: Deserializer<'de>,
{
    text(deserializer).map(FinanceStatus::from)
}

pub(crate) fn category<'de, D>(deserializer: D) -> Result<ContractCategory, D::Error>
where
    D: Deserializer<'de>,
{
    text(deserializer).map(ContractCategory::from)
}

pub(crate) fn months<'de, D>(deserializer: D) -> Result<Vec<MonthRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(seq) = Option::<Sequence>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(seq
        .into_slots()
        .into_iter()
        .map(|slot| {
            slot.and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_else(MonthRecord::late)
        })
        .collect())
}

pub(crate) fn labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(seq) = Option::<Sequence>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(seq
        .into_slots()
        .into_iter()
        .map(|slot| match slot {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .collect())
}

/// Keyed children; entries that cannot be decoded are dropped with a warning.
pub(crate) fn records<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = match Option::<Sequence>::deserialize(deserializer)? {
        Some(Sequence::Sparse(entries)) => entries,
        Some(Sequence::Dense(items)) => items
            .into_iter()
            .enumerate()
            .map(|(idx, v)| (idx.to_string(), v))
            .collect(),
        Some(Sequence::Other(_)) | None => return Ok(BTreeMap::new()),
    };
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        match serde_json::from_value(value) {
            Ok(record) => {
                out.insert(key, record);
            }
            Err(err) => tracing::warn!(%key, %err, "skipping undecodable record"),
        }
    }
    Ok(out)
}
