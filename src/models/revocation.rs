// src/models/revocation.rs
//! Revocation registry definition and status list data models.
//!
//! A revocation registry tracks which credentials issued under a credential
//! definition have been revoked, via a cryptographic accumulator. The
//! definition is written once; the status list is appended to over time,
//! each write producing a new accumulator value on the ledger.

use serde::{Deserialize, Serialize};

use super::result::{ArtifactMetadata, ResolutionMetadata};

/// Registry type for CL accumulator based revocation.
pub const CL_ACCUM: &str = "CL_ACCUM";

fn default_registry_type() -> String {
    CL_ACCUM.to_string()
}

/// Public material of a revocation registry definition.
///
/// `tails_location` is computed by the registrar from the configured tails
/// server base URL and the registry identifier; anything supplied by the
/// caller is overwritten.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevRegDefValue {
    pub max_cred_num: u32,
    pub public_keys: serde_json::Value,
    pub tails_hash: String,
    #[serde(default)]
    pub tails_location: String,
}

/// A revocation registry definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevRegDef {
    pub issuer_id: String,
    pub cred_def_id: String,
    #[serde(rename = "revocDefType", default = "default_registry_type")]
    pub registry_type: String,
    pub tag: String,
    pub value: RevRegDefValue,
}

/// Accumulator state of a revocation registry at a point in time.
///
/// # Fields
/// - `rev_reg_id`: Identifier of the revocation registry definition
/// - `current_accumulator`: Accumulator value after the listed revocations
/// - `revoked_ids`: Credential revocation indices revoked so far
/// - `timestamp`: Ledger time of the entry, when known
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevStatusList {
    pub issuer_id: String,
    pub rev_reg_id: String,
    pub current_accumulator: Option<String>,
    #[serde(default)]
    pub revoked_ids: Vec<u32>,
    pub timestamp: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetRevRegDefResult {
    pub revocation_registry: RevRegDef,
    pub revocation_registry_id: String,
    pub resolution_metadata: ResolutionMetadata,
    pub revocation_registry_metadata: ArtifactMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetRevStatusListResult {
    pub revocation_list: RevStatusList,
    pub resolution_metadata: ResolutionMetadata,
    pub revocation_list_metadata: ArtifactMetadata,
}
