// src/registry/identifiers.rs
//! Canonical legacy ledger identifiers.
//!
//! Pure functions, no I/O. Identical logical content always derives the
//! identical identifier, which is what makes "already exists" detectable.

use super::error::RegistryError;
use crate::models::{CredDef, GetSchemaResult, RevRegDef, Schema};

const SCHEMA_MARKER: &str = "2";
const CRED_DEF_MARKER: &str = "3";
const REV_REG_MARKER: &str = "4";

/// `<issuer>:2:<name>:<version>`
pub fn make_schema_id(schema: &Schema) -> String {
    format!(
        "{}:{SCHEMA_MARKER}:{}:{}",
        schema.issuer_id, schema.name, schema.version
    )
}

/// `<issuer>:3:<signature_type>:<schema_seq_no>:<tag>`
///
/// # Errors
/// `MissingDependencyMetadata` when the schema was not resolved from a
/// legacy ledger and so carries no sequence number.
pub fn make_cred_def_id(
    schema: &GetSchemaResult,
    cred_def: &CredDef,
) -> Result<String, RegistryError> {
    let seq_no = schema.schema_metadata.seq_no.ok_or_else(|| {
        RegistryError::MissingDependencyMetadata(format!(
            "Schema {} has no ledger sequence number; \
             legacy ledgers only support schemas from legacy ledgers",
            schema.schema_id
        ))
    })?;

    Ok(format!(
        "{}:{CRED_DEF_MARKER}:{}:{}:{}",
        cred_def.issuer_id,
        cred_def.signature_type_or_default(),
        seq_no,
        cred_def.tag_or_default()
    ))
}

/// `<issuer>:4:<cred_def_id>:<type>:<tag>`
pub fn make_rev_reg_def_id(rev_reg_def: &RevRegDef) -> String {
    format!(
        "{}:{REV_REG_MARKER}:{}:{}:{}",
        rev_reg_def.issuer_id, rev_reg_def.cred_def_id, rev_reg_def.registry_type, rev_reg_def.tag
    )
}

/// Issuer of a schema id. The issuer itself may contain colons.
pub fn issuer_from_schema_id(schema_id: &str) -> Option<&str> {
    let mut parts = schema_id.rsplitn(4, ':');
    let (_version, _name) = (parts.next()?, parts.next()?);
    let (marker, issuer) = (parts.next()?, parts.next()?);
    (marker == SCHEMA_MARKER && !issuer.is_empty()).then_some(issuer)
}

pub fn issuer_from_cred_def_id(cred_def_id: &str) -> Option<&str> {
    let mut parts = cred_def_id.rsplitn(5, ':');
    let (_tag, _seq_no, _sig_type, marker, issuer) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    (marker == CRED_DEF_MARKER && !issuer.is_empty()).then_some(issuer)
}

/// Issuer of a revocation registry id; the embedded credential definition
/// id means only the first `:4:` separates the issuer.
pub fn issuer_from_rev_reg_id(rev_reg_id: &str) -> Option<&str> {
    rev_reg_id
        .split_once(":4:")
        .map(|(issuer, _)| issuer)
        .filter(|issuer| !issuer.is_empty())
}
