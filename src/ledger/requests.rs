// src/ledger/requests.rs
//! Ledger write request envelopes.
//!
//! Builds the `operation` bodies for the legacy Indy write transactions the
//! registry submits. Transaction type codes are ledger constants.

use serde_json::{json, Value};

use super::wire::{LedgerCredDef, LedgerRevRegDef, LedgerSchema, RevRegEntry};

pub const SCHEMA: &str = "101";
pub const CLAIM_DEF: &str = "102";
pub const REVOC_REG_DEF: &str = "113";
pub const REVOC_REG_ENTRY: &str = "114";

pub const PROTOCOL_VERSION: u64 = 2;

/// Request id, unique per author in practice: nanoseconds since the epoch.
pub fn next_req_id() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos.max(0) as u64)
        .unwrap_or_else(|| now.timestamp_millis().max(0) as u64)
}

/// Wraps an operation into a request authored by `author_did`.
pub fn envelope(author_did: &str, operation: Value) -> Value {
    json!({
        "identifier": author_did,
        "operation": operation,
        "protocolVersion": PROTOCOL_VERSION,
        "reqId": next_req_id(),
    })
}

pub fn schema_operation(schema: &LedgerSchema) -> Value {
    json!({
        "type": SCHEMA,
        "data": {
            "name": schema.name,
            "version": schema.version,
            "attr_names": schema.attr_names,
        },
    })
}

/// `schema_seq_no` is the `schemaId` field of the object, which the ledger
/// expects as a number under `ref`.
pub fn cred_def_operation(cred_def: &LedgerCredDef) -> Value {
    let schema_ref = cred_def
        .schema_id
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(cred_def.schema_id.clone()));
    json!({
        "type": CLAIM_DEF,
        "ref": schema_ref,
        "signature_type": cred_def.signature_type,
        "tag": cred_def.tag,
        "data": cred_def.value,
    })
}

pub fn revoc_reg_def_operation(rev_reg_def: &LedgerRevRegDef) -> Value {
    json!({
        "type": REVOC_REG_DEF,
        "id": rev_reg_def.id,
        "revocDefType": rev_reg_def.revoc_def_type,
        "tag": rev_reg_def.tag,
        "credDefId": rev_reg_def.cred_def_id,
        "value": rev_reg_def.value,
    })
}

pub fn revoc_reg_entry_operation(
    rev_reg_id: &str,
    revoc_def_type: &str,
    entry: &RevRegEntry,
) -> Value {
    json!({
        "type": REVOC_REG_ENTRY,
        "revocRegDefId": rev_reg_id,
        "revocDefType": revoc_def_type,
        "value": entry.value,
    })
}
