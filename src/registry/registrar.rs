// src/registry/registrar.rs
//! Artifact registration.
//!
//! # Process Flow
//! 1. Derive the canonical identifier
//! 2. Translate into the ledger object
//! 3. Select the write ledger and open a scoped session
//! 4. Submit as a shielded write (survives caller cancellation)
//! 5. Classify: finished, already exists, or registration failure

use log::debug;
use serde_json::{Map, Value};

use crate::ledger::wire::{LedgerCredDef, LedgerRevRegDef, LedgerSchema, TxnReply};
use crate::ledger::{shielded, LedgerError, LedgerSession, SelectedLedger};
use crate::models::{
    Artifact, ArtifactMetadata, CredDef, GetSchemaResult, RegistrationResult, RevRegDef, Schema,
};
use crate::profile::Profile;

use super::error::RegistryError;
use super::identifiers::{make_cred_def_id, make_rev_reg_def_id, make_schema_id};
use super::resolver::resolve_credential_definition;
use super::translate;

/// Caller-supplied registration options, carried into the artifact metadata.
pub type RegistrationOptions = Map<String, Value>;

pub(crate) fn write_ledger(profile: &Profile) -> Result<SelectedLedger, RegistryError> {
    profile
        .ledgers()
        .write_ledger()
        .ok_or_else(|| RegistryError::NoLedgerAvailable(profile.no_ledger_reason()))
}

pub(crate) fn finished_metadata(
    reply: &TxnReply,
    options: Option<&RegistrationOptions>,
) -> Result<ArtifactMetadata, RegistryError> {
    let seq_no = reply.seq_no().ok_or_else(|| {
        RegistryError::registration(
            "Ledger accepted the write but returned no sequence number",
            LedgerError::BadResponse("txnMetadata.seqNo missing".into()),
        )
    })?;
    let mut metadata = ArtifactMetadata::with_seq_no(seq_no);
    if let Some(options) = options {
        metadata.extra.extend(options.clone());
    }
    Ok(metadata)
}

/// Publishes a schema.
///
/// # Errors
/// - `AlreadyExists` carrying the ledger's schema when the id is taken
/// - `Registration` for any other ledger failure
pub async fn register_schema(
    profile: &Profile,
    schema: Schema,
    options: Option<&RegistrationOptions>,
) -> Result<RegistrationResult<Schema>, RegistryError> {
    let schema_id = make_schema_id(&schema);
    let selected = write_ledger(profile)?;

    debug!("Registering schema: {}", schema_id);
    let ledger_schema = translate::schema_to_ledger(&schema_id, &schema);
    debug!("schema value: {:?}", ledger_schema);

    let session = LedgerSession::open(selected.ledger)
        .await
        .map_err(|e| RegistryError::registration("Failed to register schema", e))?;
    let author = schema.issuer_id.clone();
    let sent = shielded(async move { session.send_schema(&ledger_schema, &author).await }).await;

    match sent {
        Ok(reply) => {
            let metadata = finished_metadata(&reply, options)?;
            Ok(RegistrationResult::finished(schema_id, schema, metadata))
        }
        Err(LedgerError::ObjectAlreadyExists { message, id, existing }) => {
            let existing = serde_json::from_value::<LedgerSchema>(existing)
                .ok()
                .and_then(|ledger_schema| translate::schema_from_ledger(&ledger_schema).ok())
                .map(|schema| Box::new(Artifact::Schema(schema)));
            Err(RegistryError::AlreadyExists { message, id, existing })
        }
        Err(err) => Err(RegistryError::registration("Failed to register schema", err)),
    }
}

/// Publishes a credential definition over a resolved schema.
///
/// The schema must come from a ledger resolution so its sequence number is
/// known. A definition the wallet holds but the ledger lacks is reported as
/// an inconsistency instead of being re-published.
pub async fn register_credential_definition(
    profile: &Profile,
    schema: &GetSchemaResult,
    cred_def: CredDef,
    options: Option<&RegistrationOptions>,
) -> Result<RegistrationResult<CredDef>, RegistryError> {
    let cred_def_id = make_cred_def_id(schema, &cred_def)?;
    let selected = write_ledger(profile)?;

    if profile.wallet().credential_definition_in_wallet(&cred_def_id).await? {
        match resolve_credential_definition(profile, &cred_def_id).await {
            Err(RegistryError::NotFound { .. }) => {
                return Err(RegistryError::precondition(format!(
                    "Credential definition with id {cred_def_id} already exists in wallet \
                     but not on the ledger"
                )));
            }
            Err(err) => return Err(err),
            Ok(_) => {}
        }
    }

    // Checked by make_cred_def_id above.
    let schema_seq_no = schema.schema_metadata.seq_no.unwrap_or_default();

    debug!("Registering credential definition: {}", cred_def_id);
    let ledger_cred_def = translate::cred_def_to_ledger(&cred_def_id, schema_seq_no, &cred_def);
    debug!("Cred def value: {:?}", ledger_cred_def);

    let session = LedgerSession::open(selected.ledger)
        .await
        .map_err(|e| RegistryError::registration("Failed to register credential definition", e))?;
    let author = cred_def.issuer_id.clone();
    let sent = shielded(async move {
        session
            .send_credential_definition(&ledger_cred_def, &author)
            .await
    })
    .await;

    match sent {
        Ok(reply) => {
            let metadata = finished_metadata(&reply, options)?;
            Ok(RegistrationResult::finished(cred_def_id, cred_def, metadata))
        }
        Err(LedgerError::ObjectAlreadyExists { id, existing, .. }) => {
            let message = if profile.wallet().credential_definition_in_wallet(&cred_def_id).await? {
                format!(
                    "Credential definition with id {cred_def_id} already exists \
                     in wallet and on ledger."
                )
            } else {
                format!(
                    "Credential definition {cred_def_id} is on ledger but not in wallet {}",
                    profile.name
                )
            };
            let existing = serde_json::from_value::<LedgerCredDef>(existing)
                .ok()
                .and_then(|ledger_cred_def| {
                    let schema_id = (ledger_cred_def.schema_id == schema_seq_no.to_string())
                        .then_some(schema.schema_id.as_str());
                    translate::cred_def_from_ledger(&ledger_cred_def, schema_id).ok()
                })
                .map(|cred_def| Box::new(Artifact::CredDef(cred_def)));
            Err(RegistryError::AlreadyExists { message, id, existing })
        }
        Err(err) => Err(RegistryError::registration(
            "Failed to register credential definition",
            err,
        )),
    }
}

/// `true` for absolute URLs with scheme, host and a non-root path.
pub(crate) fn is_valid_tails_url(location: &str) -> bool {
    match url::Url::parse(location) {
        Ok(url) => {
            !url.scheme().is_empty()
                && url.host_str().map_or(false, |host| !host.is_empty())
                && !matches!(url.path(), "" | "/")
        }
        Err(_) => false,
    }
}

/// Publishes a revocation registry definition.
///
/// `tails_location` is set to `<tails_server_base_url>/<rev_reg_def_id>`.
/// A missing base URL or an invalid resulting location fails before any
/// ledger call.
pub async fn register_revocation_registry_definition(
    profile: &Profile,
    mut rev_reg_def: RevRegDef,
    options: Option<&RegistrationOptions>,
) -> Result<RegistrationResult<RevRegDef>, RegistryError> {
    let tails_base_url = profile
        .settings
        .tails_server_base_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| RegistryError::precondition("tails_server_base_url not configured"))?;

    let rev_reg_def_id = make_rev_reg_def_id(&rev_reg_def);
    rev_reg_def.value.tails_location =
        format!("{}/{}", tails_base_url.trim_end_matches('/'), rev_reg_def_id);

    if !is_valid_tails_url(&rev_reg_def.value.tails_location) {
        return Err(RegistryError::precondition(format!(
            "URI {} is not a valid URL",
            rev_reg_def.value.tails_location
        )));
    }

    let selected = write_ledger(profile)?;
    let ledger_rev_reg_def: LedgerRevRegDef =
        translate::rev_reg_def_to_ledger(&rev_reg_def_id, &rev_reg_def);
    debug!("Registering revocation registry definition: {:?}", ledger_rev_reg_def);

    let session = LedgerSession::open(selected.ledger).await.map_err(|e| {
        RegistryError::registration("Failed to register revocation registry definition", e)
    })?;
    let author = rev_reg_def.issuer_id.clone();
    let sent =
        shielded(async move { session.send_revoc_reg_def(&ledger_rev_reg_def, &author).await })
            .await;

    match sent {
        Ok(reply) => {
            let metadata = finished_metadata(&reply, options)?;
            Ok(RegistrationResult::finished(rev_reg_def_id, rev_reg_def, metadata))
        }
        Err(LedgerError::ObjectAlreadyExists { message, id, existing }) => {
            let existing = serde_json::from_value::<LedgerRevRegDef>(existing)
                .ok()
                .and_then(|ledger_def| translate::rev_reg_def_from_ledger(&ledger_def).ok())
                .map(|def| Box::new(Artifact::RevRegDef(def)));
            Err(RegistryError::AlreadyExists { message, id, existing })
        }
        Err(err) => Err(RegistryError::registration(
            "Failed to register revocation registry definition",
            err,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::ledger::memory::InMemoryLedger;
    use crate::models::{JobState, RevRegDefValue};
    use crate::registry::error::ErrorKind;
    use crate::registry::resolver::resolve_schema;
    use crate::registry::testing::{profile, settings_with_tails};
    use crate::wallet::InMemoryWallet;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn degree_schema() -> Schema {
        Schema::new(
            "did:example:issuer1",
            "degree",
            "1.0",
            vec!["name".into(), "degree".into(), "date".into()],
        )
    }

    fn cred_def() -> CredDef {
        CredDef {
            issuer_id: "did:example:issuer1".into(),
            schema_id: "did:example:issuer1:2:degree:1.0".into(),
            signature_type: "CL".into(),
            tag: "default".into(),
            value: json!({"primary": {"n": "1"}}),
        }
    }

    fn rev_reg_def() -> RevRegDef {
        RevRegDef {
            issuer_id: "did:example:issuer1".into(),
            cred_def_id: "did:example:issuer1:3:CL:1:default".into(),
            registry_type: "CL_ACCUM".into(),
            tag: "0".into(),
            value: RevRegDefValue {
                max_cred_num: 100,
                public_keys: json!({"accumKey": {"z": "1 0"}}),
                tails_hash: "hash".into(),
                tails_location: "ignored".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_schema_then_cred_def_scenario() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let registered = register_schema(&profile, degree_schema(), None).await.unwrap();
        assert_eq!(registered.artifact_id, "did:example:issuer1:2:degree:1.0");
        assert_eq!(registered.state, JobState::Finished);
        let seq_no = registered.artifact_metadata.seq_no.unwrap();

        let resolved = resolve_schema(&profile, &registered.artifact_id).await.unwrap();
        assert_eq!(resolved.schema, degree_schema());
        assert_eq!(resolved.schema_metadata.seq_no, Some(seq_no));

        let mut options = RegistrationOptions::new();
        options.insert("endorser_connection_id".into(), json!("conn-1"));
        let result = register_credential_definition(&profile, &resolved, cred_def(), Some(&options))
            .await
            .unwrap();

        assert_eq!(result.artifact_id, format!("did:example:issuer1:3:CL:{seq_no}:default"));
        assert_eq!(result.artifact_metadata.extra["endorser_connection_id"], json!("conn-1"));
        assert_eq!(ledger.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_schema_returns_existing_copy() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());
        register_schema(&profile, degree_schema(), None).await.unwrap();

        let mut different = degree_schema();
        different.attr_names = vec!["gpa".into()];
        let err = register_schema(&profile, different, None).await.unwrap_err();

        match err {
            RegistryError::AlreadyExists { id, existing, .. } => {
                assert_eq!(id, "did:example:issuer1:2:degree:1.0");
                assert_eq!(existing.as_deref(), Some(&Artifact::Schema(degree_schema())));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.writes(), 1);
    }

    #[tokio::test]
    async fn test_registration_survives_cancellation() {
        let ledger = Arc::new(InMemoryLedger::new().with_write_delay(Duration::from_millis(50)));
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            register_schema(&profile, degree_schema(), None),
        )
        .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ledger.writes(), 1);
        assert_eq!(ledger.open_sessions(), 0);

        // A retry detects the completed write instead of writing again.
        let retry = register_schema(&profile, degree_schema(), None).await.unwrap_err();
        assert_eq!(retry.kind(), ErrorKind::Conflict);
        assert_eq!(ledger.writes(), 1);
    }

    #[tokio::test]
    async fn test_cred_def_in_wallet_but_not_on_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        let wallet = Arc::new(InMemoryWallet::new());
        let profile = profile(ledger.clone(), wallet.clone(), Settings::default());

        let registered = register_schema(&profile, degree_schema(), None).await.unwrap();
        let resolved = resolve_schema(&profile, &registered.artifact_id).await.unwrap();
        let cred_def_id = make_cred_def_id(&resolved, &cred_def()).unwrap();
        wallet.add_credential_definition(cred_def_id.clone()).await;

        let err = register_credential_definition(&profile, &resolved, cred_def(), None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exists in wallet but not on the ledger"));
        assert_eq!(ledger.writes(), 1);
    }

    #[tokio::test]
    async fn test_cred_def_on_ledger_but_not_in_wallet() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let registered = register_schema(&profile, degree_schema(), None).await.unwrap();
        let resolved = resolve_schema(&profile, &registered.artifact_id).await.unwrap();
        register_credential_definition(&profile, &resolved, cred_def(), None)
            .await
            .unwrap();

        let err = register_credential_definition(&profile, &resolved, cred_def(), None)
            .await
            .unwrap_err();
        match err {
            RegistryError::AlreadyExists { message, existing, .. } => {
                assert!(message.contains("is on ledger but not in wallet"));
                assert_eq!(existing.as_deref(), Some(&Artifact::CredDef(cred_def())));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cred_def_in_wallet_and_on_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        let wallet = Arc::new(InMemoryWallet::new());
        let profile = profile(ledger.clone(), wallet.clone(), Settings::default());

        let registered = register_schema(&profile, degree_schema(), None).await.unwrap();
        let resolved = resolve_schema(&profile, &registered.artifact_id).await.unwrap();
        let first = register_credential_definition(&profile, &resolved, cred_def(), None)
            .await
            .unwrap();
        wallet.add_credential_definition(first.artifact_id.clone()).await;

        let err = register_credential_definition(&profile, &resolved, cred_def(), None)
            .await
            .unwrap_err();

        match err {
            RegistryError::AlreadyExists { message, id, existing } => {
                assert_eq!(
                    message,
                    format!(
                        "Credential definition with id {} already exists in wallet and on ledger.",
                        first.artifact_id
                    )
                );
                assert_eq!(id, first.artifact_id);
                assert_eq!(existing.as_deref(), Some(&Artifact::CredDef(cred_def())));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.writes(), 2);
    }

    #[tokio::test]
    async fn test_unresolved_schema_fails_before_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());
        let unresolved = GetSchemaResult {
            schema: degree_schema(),
            schema_id: "did:example:issuer1:2:degree:1.0".into(),
            resolution_metadata: Default::default(),
            schema_metadata: ArtifactMetadata::default(),
        };

        let err = register_credential_definition(&profile, &unresolved, cred_def(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingDependencyMetadata(_)));
        assert_eq!(ledger.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_rev_reg_def_tails_location() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(
            ledger.clone(),
            Arc::new(InMemoryWallet::new()),
            settings_with_tails("https://tails.example/"),
        );

        let result = register_revocation_registry_definition(&profile, rev_reg_def(), None)
            .await
            .unwrap();

        let expected = format!("https://tails.example/{}", result.artifact_id);
        assert_eq!(result.artifact.value.tails_location, expected);
        assert!(is_valid_tails_url(&expected));
        assert_eq!(ledger.writes(), 1);
    }

    #[tokio::test]
    async fn test_rev_reg_def_without_tails_url_fails_early() {
        let ledger = Arc::new(InMemoryLedger::new());
        let wallet = Arc::new(InMemoryWallet::new());
        let profile = profile(ledger.clone(), wallet, settings_with_tails(""));

        let err = register_revocation_registry_definition(&profile, rev_reg_def(), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(ledger.sessions_opened(), 0);
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn test_rev_reg_def_with_malformed_tails_url_fails_early() {
        let ledger = Arc::new(InMemoryLedger::new());
        let wallet = Arc::new(InMemoryWallet::new());
        let profile = profile(ledger.clone(), wallet, settings_with_tails("tails-host"));

        let err = register_revocation_registry_definition(&profile, rev_reg_def(), None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("is not a valid URL"));
        assert_eq!(ledger.sessions_opened(), 0);
    }

    #[test]
    fn test_tails_url_validation() {
        assert!(is_valid_tails_url("https://tails.example/did:example:issuer1:4:x:CL_ACCUM:0"));
        assert!(!is_valid_tails_url("https://tails.example"));
        assert!(!is_valid_tails_url("tails.example/path"));
        assert!(!is_valid_tails_url("file:///tmp/tails"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_registration_error() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_unavailable(true);
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let err = register_schema(&profile, degree_schema(), None).await.unwrap_err();
        assert!(matches!(err, RegistryError::Registration { source: Some(_), .. }));
        assert!(err.is_retryable());
    }
}
