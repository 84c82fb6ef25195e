// src/ledger/wire.rs
//! Ledger JSON object shapes.
//!
//! These mirror the legacy Indy ledger objects field for field. The field
//! names and the `"1.0"` / `"ISSUANCE_BY_DEFAULT"` literals are an external
//! protocol and must not change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OBJECT_VERSION: &str = "1.0";
pub const ISSUANCE_BY_DEFAULT: &str = "ISSUANCE_BY_DEFAULT";

fn object_version() -> String {
    OBJECT_VERSION.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSchema {
    #[serde(default = "object_version")]
    pub ver: String,
    pub id: String,
    pub name: String,
    pub version: String,
    pub attr_names: Vec<String>,
    /// `None` until the ledger assigns one
    pub seq_no: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCredDef {
    #[serde(default = "object_version")]
    pub ver: String,
    pub id: String,
    /// Sequence number of the schema, as a string
    pub schema_id: String,
    #[serde(rename = "type")]
    pub signature_type: String,
    pub tag: String,
    pub value: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRevRegDefValue {
    pub issuance_type: String,
    pub max_cred_num: u32,
    pub public_keys: Value,
    pub tails_hash: String,
    pub tails_location: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRevRegDef {
    #[serde(default = "object_version")]
    pub ver: String,
    pub id: String,
    pub revoc_def_type: String,
    pub cred_def_id: String,
    pub tag: String,
    pub value: LedgerRevRegDefValue,
}

/// Value of a revocation registry entry.
///
/// A plain status list update carries only `accum`; corrective entries also
/// carry `prevAccum` and the republished `revoked` indices.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RevRegEntryValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_accum: Option<String>,
    pub accum: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issued: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revoked: Vec<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RevRegEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    pub value: RevRegEntryValue,
}

impl RevRegEntry {
    /// Entry publishing a new accumulator value only.
    pub fn accumulator(accum: impl Into<String>) -> Self {
        Self {
            ver: None,
            value: RevRegEntryValue {
                accum: accum.into(),
                ..Default::default()
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RevRegDeltaValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_accum: Option<String>,
    #[serde(default)]
    pub accum: Option<String>,
    #[serde(default)]
    pub issued: Vec<u32>,
    #[serde(default)]
    pub revoked: Vec<u32>,
}

/// The ledger's cumulative view of a revocation registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RevRegDelta {
    #[serde(default = "object_version")]
    pub ver: String,
    pub value: RevRegDeltaValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TxnMetadata {
    pub seq_no: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_id: Option<String>,
}

/// `result` section of a ledger write reply.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TxnReply {
    #[serde(default)]
    pub txn_metadata: TxnMetadata,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl TxnReply {
    pub fn seq_no(&self) -> Option<u64> {
        self.txn_metadata.seq_no
    }
}
