// src/registry/revocation.rs
//! Revocation status list publication and wallet/ledger reconciliation.
//!
//! The wallet marks credentials revoked before the ledger entry is written,
//! and the two are not updated atomically. A crash or partition between the
//! steps leaves indices revoked locally but never published.
//! `reconcile_revocation_entry` detects those and republishes exactly them.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::ledger::wire::{RevRegDelta, RevRegEntry, TxnReply};
use crate::ledger::{shielded, LedgerError, LedgerSession, RejectionReason};
use crate::models::revocation::CL_ACCUM;
use crate::models::{ArtifactKind, RegistrationResult, RevRegDef, RevStatusList};
use crate::profile::Profile;

use super::error::RegistryError;
use super::recovery::{build_corrective_transaction, CorrectiveTransaction};
use super::registrar::{finished_metadata, write_ledger, RegistrationOptions};
use super::resolver::select_ledger;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    /// The ledger's cumulative delta as read before any repair
    pub ledger_delta: RevRegDelta,
    /// Indices revoked in the wallet but absent from the ledger
    pub missed: Vec<u32>,
    /// Wallet and ledger disagree on the current accumulator. Reported only.
    pub accumulator_mismatch: bool,
    pub corrective: Option<CorrectiveTransaction>,
    /// Ledger reply when the corrective entry was submitted
    pub applied: Option<TxnReply>,
}

impl ReconcileOutcome {
    pub fn is_consistent(&self) -> bool {
        self.missed.is_empty()
    }
}

/// Genesis transactions of the write ledger.
pub async fn fetch_genesis(profile: &Profile) -> Result<String, RegistryError> {
    let selected = profile.ledgers().write_ledger().ok_or_else(|| {
        RegistryError::Ledger(LedgerError::NotAvailable(profile.no_ledger_reason()))
    })?;
    let session = LedgerSession::open(selected.ledger).await?;
    Ok(session.genesis_txns().await?)
}

/// Compares the wallet's revocation records with the ledger and computes
/// the entry republishing missed revocations.
///
/// With `apply` the entry is submitted through the write ledger; otherwise
/// it is only returned for inspection. Running it again after a successful
/// repair finds nothing missed and changes nothing.
///
/// # Errors
/// - `NotFound` when the ledger has no entries for the registry
/// - `Ledger(NotAvailable)` when applying without a write ledger
/// - `Ledger(Genesis)` when the genesis transactions name no node
pub async fn reconcile_revocation_entry(
    profile: &Profile,
    rev_reg_id: &str,
    apply: bool,
    genesis: &str,
) -> Result<ReconcileOutcome, RegistryError> {
    reconcile(profile, rev_reg_id, apply, genesis, None).await
}

/// Reconciliation publishing `target_accum` when given, else the wallet's
/// recorded accumulator, else the ledger's.
async fn reconcile(
    profile: &Profile,
    rev_reg_id: &str,
    apply: bool,
    genesis: &str,
    target_accum: Option<&str>,
) -> Result<ReconcileOutcome, RegistryError> {
    let ledger_delta = {
        let selected = select_ledger(profile, rev_reg_id).await?;
        let session = LedgerSession::open(selected.ledger)
            .await
            .map_err(|e| RegistryError::resolution("Failed to open ledger", e))?;
        let (delta, _timestamp) = session
            .get_revoc_reg_delta(rev_reg_id)
            .await
            .map_err(|e| {
                RegistryError::resolution("Failed to retrieve revocation registry delta", e)
            })?
            .ok_or_else(|| RegistryError::NotFound {
                kind: ArtifactKind::RevocationStatusList,
                id: rev_reg_id.to_string(),
                ledger_id: Some(selected.ledger_id.clone()),
            })?;
        delta
    };

    let records = profile.wallet().revocation_records(rev_reg_id).await?;
    let published: BTreeSet<u32> = ledger_delta.value.revoked.iter().copied().collect();
    let locally_revoked: BTreeSet<u32> = records
        .iter()
        .filter(|rec| rec.is_revoked())
        .map(|rec| rec.cred_rev_id)
        .collect();
    let missed: Vec<u32> = locally_revoked.difference(&published).copied().collect();

    debug!(
        "Registry {}: {} record(s), {} revoked locally, {} missed",
        rev_reg_id,
        records.len(),
        locally_revoked.len(),
        missed.len()
    );

    if missed.is_empty() {
        return Ok(ReconcileOutcome {
            ledger_delta,
            missed,
            accumulator_mismatch: false,
            corrective: None,
            applied: None,
        });
    }

    let local_accum = match target_accum {
        Some(accum) => Some(accum.to_string()),
        None => profile.wallet().current_accumulator(rev_reg_id).await?,
    };
    let ledger_accum = ledger_delta.value.accum.clone();
    let accumulator_mismatch =
        matches!((&local_accum, &ledger_accum), (Some(local), Some(ledger)) if local != ledger);
    if accumulator_mismatch {
        warn!("Registry {}: local accumulator differs from ledger accumulator", rev_reg_id);
    }

    let accum = local_accum.or_else(|| ledger_accum.clone()).ok_or_else(|| {
        RegistryError::precondition(format!("No accumulator recorded for registry {rev_reg_id}"))
    })?;
    let corrective = build_corrective_transaction(
        genesis,
        rev_reg_id,
        &missed,
        ledger_accum.as_deref(),
        &accum,
    )?;

    let applied = if apply {
        let selected = profile.ledgers().write_ledger().ok_or_else(|| {
            RegistryError::Ledger(LedgerError::NotAvailable(profile.no_ledger_reason()))
        })?;
        let session = LedgerSession::open(selected.ledger).await?;
        let (id, entry, author) = (
            rev_reg_id.to_string(),
            corrective.entry.clone(),
            corrective.author_did.clone(),
        );
        let reply = shielded(async move {
            session.send_revoc_reg_entry(&id, CL_ACCUM, &entry, &author).await
        })
        .await
        .map_err(|e| {
            RegistryError::registration("Failed to apply corrective revocation entry", e)
        })?;
        info!("Registry {}: republished {} missed revocation(s)", rev_reg_id, missed.len());
        Some(reply)
    } else {
        None
    };

    Ok(ReconcileOutcome {
        ledger_delta,
        missed,
        accumulator_mismatch,
        corrective: Some(corrective),
        applied,
    })
}

/// Publishes a new accumulator value for a revocation registry.
///
/// An `InvalidClientRequest` rejection means the ledger and wallet have
/// diverged: one reconciliation is applied, publishing the status list's
/// accumulator, and its result reported as the registration outcome. Any
/// other rejection is fatal.
pub async fn register_revocation_status_list(
    profile: &Profile,
    rev_reg_def: &RevRegDef,
    rev_list: RevStatusList,
    options: Option<&RegistrationOptions>,
) -> Result<RegistrationResult<RevStatusList>, RegistryError> {
    let accum = rev_list.current_accumulator.clone().ok_or_else(|| {
        RegistryError::precondition(format!(
            "Revocation status list for {} has no current accumulator",
            rev_list.rev_reg_id
        ))
    })?;
    let selected = write_ledger(profile)?;
    let rev_reg_id = rev_list.rev_reg_id.clone();

    debug!("Registering revocation status list: {}", rev_reg_id);
    let session = LedgerSession::open(selected.ledger)
        .await
        .map_err(|e| RegistryError::registration("Failed to register revocation status list", e))?;
    let (id, def_type, author, entry) = (
        rev_reg_id.clone(),
        rev_reg_def.registry_type.clone(),
        rev_reg_def.issuer_id.clone(),
        RevRegEntry::accumulator(accum.clone()),
    );
    let sent = shielded(async move {
        session.send_revoc_reg_entry(&id, &def_type, &entry, &author).await
    })
    .await;

    let err = match sent {
        Ok(reply) => {
            let metadata = finished_metadata(&reply, options)?;
            return Ok(RegistrationResult::finished(rev_reg_id, rev_list, metadata));
        }
        Err(err) => err,
    };

    match err.rejection_reason() {
        Some(RejectionReason::InvalidClientRequest) => {
            warn!("Ledger update failed due to InvalidClientRequest: {}", err);
            warn!("Attempting to fix ledger entry for registry {}", rev_reg_id);
            let genesis = fetch_genesis(profile).await?;
            let outcome = reconcile(profile, &rev_reg_id, true, &genesis, Some(&accum)).await?;
            match outcome.applied {
                Some(reply) => {
                    warn!("Ledger entry for registry {} fixed", rev_reg_id);
                    let metadata = finished_metadata(&reply, options)?;
                    Ok(RegistrationResult::finished(rev_reg_id, rev_list, metadata))
                }
                None => Err(RegistryError::registration(
                    "Ledger update failed due to invalid client request \
                     and no missed revocations to repair",
                    err,
                )),
            }
        }
        Some(RejectionReason::TaaAcceptanceRequired) => {
            error!("Ledger update failed due to TAA issue: {}", err);
            Err(RegistryError::registration("Ledger update failed due to TAA issue", err))
        }
        _ => {
            error!("Ledger update failed due to unknown issue: {}", err);
            Err(RegistryError::registration("Ledger update failed due to unknown issue", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::ledger::memory::{InMemoryLedger, LOCAL_GENESIS};
    use crate::ledger::LedgerPools;
    use crate::models::RevRegDefValue;
    use crate::registry::error::ErrorKind;
    use crate::registry::testing::profile;
    use crate::wallet::{InMemoryWallet, IssuerCredRevRecord, RevocationState};
    use serde_json::json;
    use std::error::Error;
    use std::sync::Arc;

    const REV_REG_ID: &str = "did:example:issuer1:4:did:example:issuer1:3:CL:12:default:CL_ACCUM:0";

    fn record(index: u32, state: RevocationState) -> IssuerCredRevRecord {
        IssuerCredRevRecord {
            rev_reg_id: REV_REG_ID.into(),
            cred_rev_id: index,
            cred_ex_id: Some(format!("cred-ex-{index}")),
            state,
        }
    }

    fn rev_reg_def() -> RevRegDef {
        RevRegDef {
            issuer_id: "did:example:issuer1".into(),
            cred_def_id: "did:example:issuer1:3:CL:12:default".into(),
            registry_type: CL_ACCUM.into(),
            tag: "0".into(),
            value: RevRegDefValue {
                max_cred_num: 100,
                public_keys: json!({}),
                tails_hash: "hash".into(),
                tails_location: "https://tails.example/x".into(),
            },
        }
    }

    fn status_list(accum: Option<&str>) -> RevStatusList {
        RevStatusList {
            issuer_id: "did:example:issuer1".into(),
            rev_reg_id: REV_REG_ID.into(),
            current_accumulator: accum.map(str::to_string),
            revoked_ids: vec![3, 7],
            timestamp: None,
        }
    }

    /// Ledger knows index 3; the wallet has revoked 3 and 7.
    async fn diverged() -> (Arc<InMemoryLedger>, Profile) {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_registry(REV_REG_ID, Some("21 LEDGER"), &[3]);
        let wallet = InMemoryWallet::with_records(vec![
            record(1, RevocationState::Issued),
            record(3, RevocationState::Revoked),
            record(7, RevocationState::Revoked),
        ]);
        wallet.set_accumulator(REV_REG_ID, "21 WALLET").await;
        let profile = profile(ledger.clone(), Arc::new(wallet), Settings::default());
        (ledger, profile)
    }

    #[tokio::test]
    async fn test_repair_republishes_only_missed() {
        let (ledger, profile) = diverged().await;

        let outcome = reconcile_revocation_entry(&profile, REV_REG_ID, true, LOCAL_GENESIS)
            .await
            .unwrap();

        assert_eq!(outcome.missed, vec![7]);
        assert!(outcome.accumulator_mismatch);
        let corrective = outcome.corrective.unwrap();
        assert_eq!(corrective.entry.value.revoked, vec![7]);
        assert_eq!(corrective.entry.value.prev_accum.as_deref(), Some("21 LEDGER"));
        assert!(outcome.applied.unwrap().seq_no().is_some());
        assert_eq!(ledger.revoked(REV_REG_ID), vec![3, 7]);
        assert_eq!(ledger.open_sessions(), 0);

        // Converged: a second pass is a no-op.
        let writes = ledger.writes();
        let again = reconcile_revocation_entry(&profile, REV_REG_ID, true, LOCAL_GENESIS)
            .await
            .unwrap();
        assert!(again.is_consistent());
        assert!(again.corrective.is_none() && again.applied.is_none());
        assert_eq!(ledger.writes(), writes);
    }

    #[tokio::test]
    async fn test_consistent_registry_is_a_no_op() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_registry(REV_REG_ID, Some("21 A"), &[3]);
        let wallet = InMemoryWallet::with_records(vec![record(3, RevocationState::Revoked)]);
        let profile = profile(ledger.clone(), Arc::new(wallet), Settings::default());

        let outcome = reconcile_revocation_entry(&profile, REV_REG_ID, true, LOCAL_GENESIS)
            .await
            .unwrap();

        assert!(outcome.missed.is_empty());
        assert!(!outcome.accumulator_mismatch);
        assert!(outcome.corrective.is_none());
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let (ledger, profile) = diverged().await;

        let outcome = reconcile_revocation_entry(&profile, REV_REG_ID, false, LOCAL_GENESIS)
            .await
            .unwrap();

        assert_eq!(outcome.corrective.unwrap().entry.value.revoked, vec![7]);
        assert!(outcome.applied.is_none());
        assert_eq!(ledger.writes(), 0);
        assert_eq!(ledger.revoked(REV_REG_ID), vec![3]);
    }

    #[tokio::test]
    async fn test_unknown_registry_is_not_found() {
        let profile = profile(
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryWallet::new()),
            Settings::default(),
        );
        let err = reconcile_revocation_entry(&profile, REV_REG_ID, false, LOCAL_GENESIS)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_bad_genesis_fails_before_write() {
        let (ledger, profile) = diverged().await;
        let err = reconcile_revocation_entry(&profile, REV_REG_ID, true, "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Ledger(LedgerError::Genesis(_))));
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn test_status_list_written() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let list = status_list(Some("21 NEW"));
        let result = register_revocation_status_list(&profile, &rev_reg_def(), list, None)
            .await
            .unwrap();

        assert_eq!(result.artifact_id, REV_REG_ID);
        assert!(result.artifact_metadata.seq_no.is_some());
        assert_eq!(ledger.accumulator(REV_REG_ID).as_deref(), Some("21 NEW"));
    }

    #[tokio::test]
    async fn test_status_list_without_accumulator() {
        let ledger = Arc::new(InMemoryLedger::new());
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let err = register_revocation_status_list(&profile, &rev_reg_def(), status_list(None), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(ledger.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_invalid_client_request_is_repaired_once() {
        let (ledger, profile) = diverged().await;
        ledger.reject_next_entry("client request invalid: InvalidClientRequest(\"accum\")");

        let list = status_list(Some("21 WALLET"));
        let result = register_revocation_status_list(&profile, &rev_reg_def(), list, None)
            .await
            .unwrap();

        assert!(result.artifact_metadata.seq_no.is_some());
        assert_eq!(ledger.revoked(REV_REG_ID), vec![3, 7]);
        assert_eq!(ledger.accumulator(REV_REG_ID).as_deref(), Some("21 WALLET"));
        assert_eq!(ledger.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_repair_publishes_status_list_accumulator() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_registry(REV_REG_ID, Some("21 LEDGER"), &[3]);
        // No accumulator recorded in the wallet.
        let wallet = InMemoryWallet::with_records(vec![
            record(3, RevocationState::Revoked),
            record(7, RevocationState::Revoked),
        ]);
        let profile = profile(ledger.clone(), Arc::new(wallet), Settings::default());
        ledger.reject_next_entry("client request invalid: InvalidClientRequest(\"accum\")");

        let result = register_revocation_status_list(
            &profile,
            &rev_reg_def(),
            status_list(Some("21 NEW")),
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.artifact.current_accumulator.as_deref(), Some("21 NEW"));
        assert_eq!(ledger.accumulator(REV_REG_ID), result.artifact.current_accumulator);
        assert_eq!(ledger.revoked(REV_REG_ID), vec![3, 7]);
    }

    #[tokio::test]
    async fn test_repair_prefers_status_list_over_wallet_accumulator() {
        let (ledger, profile) = diverged().await;
        ledger.reject_next_entry("InvalidClientRequest");

        register_revocation_status_list(&profile, &rev_reg_def(), status_list(Some("21 NEW")), None)
            .await
            .unwrap();

        assert_eq!(ledger.accumulator(REV_REG_ID).as_deref(), Some("21 NEW"));
    }

    #[tokio::test]
    async fn test_mismatch_measured_against_target_accumulator() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_registry(REV_REG_ID, Some("21 SAME"), &[]);
        let wallet = InMemoryWallet::with_records(vec![record(7, RevocationState::Revoked)]);
        wallet.set_accumulator(REV_REG_ID, "21 OTHER").await;
        let profile = profile(ledger.clone(), Arc::new(wallet), Settings::default());

        let outcome = reconcile(&profile, REV_REG_ID, false, LOCAL_GENESIS, Some("21 SAME"))
            .await
            .unwrap();

        assert!(!outcome.accumulator_mismatch);
        assert_eq!(outcome.corrective.unwrap().entry.value.accum, "21 SAME");
    }

    #[tokio::test]
    async fn test_invalid_client_request_with_nothing_to_repair() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_registry(REV_REG_ID, Some("21 A"), &[]);
        ledger.reject_next_entry("InvalidClientRequest");
        let profile = profile(ledger.clone(), Arc::new(InMemoryWallet::new()), Settings::default());

        let list = status_list(Some("21 B"));
        let err = register_revocation_status_list(&profile, &rev_reg_def(), list, None)
            .await
            .unwrap_err();

        assert!(err.source().unwrap().to_string().contains("InvalidClientRequest"));
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn test_taa_rejection_is_fatal() {
        let (ledger, profile) = diverged().await;
        ledger.reject_next_entry("InvalidClientTaaAcceptanceError(\"no taa\")");

        let list = status_list(Some("21 X"));
        let err = register_revocation_status_list(&profile, &rev_reg_def(), list, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Ledger update failed due to TAA issue");
        assert!(err.source().unwrap().to_string().contains("InvalidClientTaaAcceptanceError"));
        assert_eq!(ledger.writes(), 0);
        assert_eq!(ledger.revoked(REV_REG_ID), vec![3]);
    }

    #[tokio::test]
    async fn test_unknown_rejection_is_fatal() {
        let (ledger, profile) = diverged().await;
        ledger.reject_next_entry("UnauthorizedClientRequest");

        let list = status_list(Some("21 X"));
        let err = register_revocation_status_list(&profile, &rev_reg_def(), list, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Ledger update failed due to unknown issue");
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn test_apply_without_write_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_registry(REV_REG_ID, Some("21 A"), &[]);
        let read_only = LedgerPools::new().with_pool(crate::ledger::LedgerPool {
            id: "read".into(),
            namespaces: vec!["did:example:".into()],
            is_write: false,
            ledger: ledger.clone(),
        });
        let wallet = InMemoryWallet::with_records(vec![record(7, RevocationState::Revoked)]);
        let profile =
            Profile::new("test", Settings::default(), Arc::new(wallet), Arc::new(read_only));

        let err = reconcile_revocation_entry(&profile, REV_REG_ID, true, LOCAL_GENESIS)
            .await
            .unwrap_err();

        match err {
            RegistryError::Ledger(LedgerError::NotAvailable(reason)) => {
                assert_eq!(reason, "No ledger available: missing wallet-type?");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
