// src/registry/translate.rs
//! Domain ↔ ledger object translation.

use crate::ledger::wire::{
    LedgerCredDef, LedgerRevRegDef, LedgerRevRegDefValue, LedgerSchema, RevRegDelta,
    ISSUANCE_BY_DEFAULT, OBJECT_VERSION,
};
use crate::ledger::LedgerError;
use crate::models::{CredDef, RevRegDef, RevRegDefValue, RevStatusList, Schema};

use super::identifiers::{issuer_from_cred_def_id, issuer_from_rev_reg_id, issuer_from_schema_id};

fn malformed_id(kind: &str, id: &str) -> LedgerError {
    LedgerError::BadResponse(format!("malformed {kind} identifier: {id}"))
}

pub fn schema_to_ledger(schema_id: &str, schema: &Schema) -> LedgerSchema {
    LedgerSchema {
        ver: OBJECT_VERSION.to_string(),
        id: schema_id.to_string(),
        name: schema.name.clone(),
        version: schema.version.clone(),
        attr_names: schema.attr_names.clone(),
        seq_no: None,
    }
}

pub fn schema_from_ledger(schema: &LedgerSchema) -> Result<Schema, LedgerError> {
    let issuer_id =
        issuer_from_schema_id(&schema.id).ok_or_else(|| malformed_id("schema", &schema.id))?;
    Ok(Schema {
        issuer_id: issuer_id.to_string(),
        name: schema.name.clone(),
        version: schema.version.clone(),
        attr_names: schema.attr_names.clone(),
    })
}

/// The ledger object references the schema by sequence number only.
pub fn cred_def_to_ledger(
    cred_def_id: &str,
    schema_seq_no: u64,
    cred_def: &CredDef,
) -> LedgerCredDef {
    LedgerCredDef {
        ver: OBJECT_VERSION.to_string(),
        id: cred_def_id.to_string(),
        schema_id: schema_seq_no.to_string(),
        signature_type: cred_def.signature_type_or_default().to_string(),
        tag: cred_def.tag_or_default().to_string(),
        value: cred_def.value.clone(),
    }
}

/// `schema_id` of the result is the ledger's schema reference (its
/// sequence number) unless the caller knows the full identifier.
pub fn cred_def_from_ledger(
    cred_def: &LedgerCredDef,
    schema_id: Option<&str>,
) -> Result<CredDef, LedgerError> {
    let issuer_id = issuer_from_cred_def_id(&cred_def.id)
        .ok_or_else(|| malformed_id("credential definition", &cred_def.id))?;
    Ok(CredDef {
        issuer_id: issuer_id.to_string(),
        schema_id: schema_id.unwrap_or(&cred_def.schema_id).to_string(),
        signature_type: cred_def.signature_type.clone(),
        tag: cred_def.tag.clone(),
        value: cred_def.value.clone(),
    })
}

pub fn rev_reg_def_to_ledger(rev_reg_def_id: &str, rev_reg_def: &RevRegDef) -> LedgerRevRegDef {
    LedgerRevRegDef {
        ver: OBJECT_VERSION.to_string(),
        id: rev_reg_def_id.to_string(),
        revoc_def_type: rev_reg_def.registry_type.clone(),
        cred_def_id: rev_reg_def.cred_def_id.clone(),
        tag: rev_reg_def.tag.clone(),
        value: LedgerRevRegDefValue {
            issuance_type: ISSUANCE_BY_DEFAULT.to_string(),
            max_cred_num: rev_reg_def.value.max_cred_num,
            public_keys: rev_reg_def.value.public_keys.clone(),
            tails_hash: rev_reg_def.value.tails_hash.clone(),
            tails_location: rev_reg_def.value.tails_location.clone(),
        },
    }
}

pub fn rev_reg_def_from_ledger(rev_reg_def: &LedgerRevRegDef) -> Result<RevRegDef, LedgerError> {
    let issuer_id = issuer_from_rev_reg_id(&rev_reg_def.id)
        .ok_or_else(|| malformed_id("revocation registry", &rev_reg_def.id))?;
    Ok(RevRegDef {
        issuer_id: issuer_id.to_string(),
        cred_def_id: rev_reg_def.cred_def_id.clone(),
        registry_type: rev_reg_def.revoc_def_type.clone(),
        tag: rev_reg_def.tag.clone(),
        value: RevRegDefValue {
            max_cred_num: rev_reg_def.value.max_cred_num,
            public_keys: rev_reg_def.value.public_keys.clone(),
            tails_hash: rev_reg_def.value.tails_hash.clone(),
            tails_location: rev_reg_def.value.tails_location.clone(),
        },
    })
}

pub fn status_list_from_delta(
    rev_reg_id: &str,
    delta: &RevRegDelta,
    timestamp: u64,
) -> Result<RevStatusList, LedgerError> {
    let issuer_id = issuer_from_rev_reg_id(rev_reg_id)
        .ok_or_else(|| malformed_id("revocation registry", rev_reg_id))?;
    let mut revoked_ids = delta.value.revoked.clone();
    revoked_ids.sort_unstable();
    Ok(RevStatusList {
        issuer_id: issuer_id.to_string(),
        rev_reg_id: rev_reg_id.to_string(),
        current_accumulator: delta.value.accum.clone(),
        revoked_ids,
        timestamp: Some(timestamp),
    })
}
