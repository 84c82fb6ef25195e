// src/registry/resolver.rs
//! Artifact resolution.
//!
//! Each resolver selects the ledger authoritative for the identifier, reads
//! the object inside a scoped session and translates it back into the
//! domain model. Absent objects are `NotFound`; read failures are
//! `Resolution` with the ledger error kept as source.

use crate::ledger::{LedgerError, LedgerSession, SelectedLedger};
use crate::models::{
    ArtifactKind, ArtifactMetadata, GetCredDefResult, GetRevRegDefResult, GetRevStatusListResult,
    GetSchemaResult, ResolutionMetadata,
};
use crate::profile::Profile;

use super::error::RegistryError;
use super::translate;

/// Ledger authoritative for `identifier`.
pub(crate) async fn select_ledger(
    profile: &Profile,
    identifier: &str,
) -> Result<SelectedLedger, RegistryError> {
    profile
        .ledgers()
        .select(identifier)
        .await
        .ok_or_else(|| RegistryError::NoLedgerAvailable(profile.no_ledger_reason()))
}

fn not_found(kind: ArtifactKind, id: &str, ledger_id: &str) -> RegistryError {
    RegistryError::NotFound {
        kind,
        id: id.to_string(),
        ledger_id: Some(ledger_id.to_string()),
    }
}

fn resolution_metadata(ledger_id: &str) -> ResolutionMetadata {
    ResolutionMetadata {
        ledger_id: Some(ledger_id.to_string()),
    }
}

async fn open_session(selected: &SelectedLedger) -> Result<LedgerSession, RegistryError> {
    LedgerSession::open(selected.ledger.clone()).await.map_err(|e| {
        RegistryError::resolution(format!("Failed to open ledger {}", selected.ledger_id), e)
    })
}

/// Resolves a schema and its ledger sequence number.
pub async fn resolve_schema(
    profile: &Profile,
    schema_id: &str,
) -> Result<GetSchemaResult, RegistryError> {
    let selected = select_ledger(profile, schema_id).await?;
    let session = open_session(&selected).await?;

    let schema = session
        .get_schema(schema_id)
        .await
        .map_err(|e| RegistryError::resolution("Failed to retrieve schema", e))?
        .ok_or_else(|| not_found(ArtifactKind::Schema, schema_id, &selected.ledger_id))?;

    Ok(GetSchemaResult {
        schema: translate::schema_from_ledger(&schema)
            .map_err(|e| RegistryError::resolution("Failed to translate schema", e))?,
        schema_id: schema.id.clone(),
        resolution_metadata: resolution_metadata(&selected.ledger_id),
        schema_metadata: ArtifactMetadata {
            seq_no: schema.seq_no,
            ..Default::default()
        },
    })
}

pub async fn resolve_credential_definition(
    profile: &Profile,
    cred_def_id: &str,
) -> Result<GetCredDefResult, RegistryError> {
    let selected = select_ledger(profile, cred_def_id).await?;
    let session = open_session(&selected).await?;

    let cred_def = session
        .get_credential_definition(cred_def_id)
        .await
        .map_err(|e| RegistryError::resolution("Failed to retrieve credential definition", e))?
        .ok_or_else(|| {
            not_found(ArtifactKind::CredentialDefinition, cred_def_id, &selected.ledger_id)
        })?;

    Ok(GetCredDefResult {
        credential_definition: translate::cred_def_from_ledger(&cred_def, None).map_err(|e| {
            RegistryError::resolution("Failed to translate credential definition", e)
        })?,
        credential_definition_id: cred_def.id.clone(),
        resolution_metadata: resolution_metadata(&selected.ledger_id),
        credential_definition_metadata: ArtifactMetadata::default(),
    })
}

pub async fn resolve_revocation_registry_definition(
    profile: &Profile,
    rev_reg_id: &str,
) -> Result<GetRevRegDefResult, RegistryError> {
    let selected = select_ledger(profile, rev_reg_id).await?;
    let session = open_session(&selected).await?;

    let rev_reg_def = session
        .get_revoc_reg_def(rev_reg_id)
        .await
        .map_err(|e| {
            RegistryError::resolution("Failed to retrieve revocation registry definition", e)
        })?
        .ok_or_else(|| {
            not_found(
                ArtifactKind::RevocationRegistryDefinition,
                rev_reg_id,
                &selected.ledger_id,
            )
        })?;

    Ok(GetRevRegDefResult {
        revocation_registry: translate::rev_reg_def_from_ledger(&rev_reg_def).map_err(|e| {
            RegistryError::resolution("Failed to translate revocation registry definition", e)
        })?,
        revocation_registry_id: rev_reg_def.id.clone(),
        resolution_metadata: resolution_metadata(&selected.ledger_id),
        revocation_registry_metadata: ArtifactMetadata::default(),
    })
}

/// Current status list of a registry as published on the ledger.
pub async fn resolve_revocation_status_list(
    profile: &Profile,
    rev_reg_id: &str,
) -> Result<GetRevStatusListResult, RegistryError> {
    let selected = select_ledger(profile, rev_reg_id).await?;
    let session = open_session(&selected).await?;

    let (delta, timestamp) = session
        .get_revoc_reg_delta(rev_reg_id)
        .await
        .map_err(|e| RegistryError::resolution("Failed to retrieve revocation registry delta", e))?
        .ok_or_else(|| {
            not_found(ArtifactKind::RevocationStatusList, rev_reg_id, &selected.ledger_id)
        })?;

    let revocation_list = translate::status_list_from_delta(rev_reg_id, &delta, timestamp)
        .map_err(|e: LedgerError| {
            RegistryError::resolution("Failed to translate revocation registry delta", e)
        })?;

    Ok(GetRevStatusListResult {
        revocation_list,
        resolution_metadata: resolution_metadata(&selected.ledger_id),
        revocation_list_metadata: ArtifactMetadata::default(),
    })
}
