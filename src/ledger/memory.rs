// src/ledger/memory.rs
//! In-process append-only ledger.
//!
//! Behaves like a single ledger pool for the objects the registry writes:
//! objects are keyed by identifier and never overwritten, every accepted
//! write gets the next sequence number, and revocation entries accumulate
//! revoked indices. Used for local dry runs and throughout the test suite.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::error::LedgerError;
use super::wire::{
    LedgerCredDef, LedgerRevRegDef, LedgerSchema, RevRegDelta, RevRegDeltaValue, RevRegEntry,
    TxnMetadata, TxnReply, OBJECT_VERSION,
};
use super::Ledger;

/// Genesis of a one-node local pool.
pub const LOCAL_GENESIS: &str = concat!(
    r#"{"reqSignature":{},"txn":{"data":{"data":{"alias":"Node1","blskey":"#,
    r#""4N8aUNHSgjQVgkpm8nhNEfDf6txHznoYREg9kirmJrkivgL4oSEimFF6nsQ6M41QvhM2Z33nves5vf"#,
    r#"Sn9n1UwNFJBYtWVnHYMATn76vLuL3zU88KyeAYcHfsih3He6UHcXDxcaecHVz6jhCYz1P2UZn2bDVruL5wXpe"#,
    r#"hgBfBaLKm3Ba","#,
    r#""client_ip":"127.0.0.1","client_port":9702,"node_ip":"127.0.0.1","node_port":9701,"#,
    r#""services":["VALIDATOR"]},"dest":"Gw6pDLhcBcoQesN72qfotTgFa7cbuqZpkX3Xo6pLhPhv"},"#,
    r#""metadata":{"from":"Th7MpTaRZVRYnPiabds81Y"},"type":"0"},"txnMetadata":{"seqNo":1,"#,
    r#""txnId":"fea82e10e894419fe2bea7d96296a6d46f50f93f9eeda954ec461b2ed2950b62"},"ver":"1"}"#,
);

#[derive(Default)]
struct RegistryState {
    accum: Option<String>,
    revoked: BTreeSet<u32>,
    txn_time: u64,
}

#[derive(Default)]
struct State {
    schemas: HashMap<String, LedgerSchema>,
    cred_defs: HashMap<String, LedgerCredDef>,
    rev_reg_defs: HashMap<String, LedgerRevRegDef>,
    registries: HashMap<String, RegistryState>,
    seq_no: u64,
    writes: usize,
    entry_rejections: VecDeque<String>,
    unavailable: bool,
}

impl State {
    fn next_reply(&mut self) -> TxnReply {
        self.seq_no += 1;
        self.writes += 1;
        TxnReply {
            txn_metadata: TxnMetadata {
                seq_no: Some(self.seq_no),
                txn_time: Some(now()),
                txn_id: None,
            },
            ..Default::default()
        }
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable {
            return Err(LedgerError::Transport("ledger pool unreachable".into()));
        }
        Ok(())
    }
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub struct InMemoryLedger {
    state: Mutex<State>,
    genesis: String,
    write_delay: Option<Duration>,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            genesis: LOCAL_GENESIS.to_string(),
            write_delay: None,
            open_sessions: AtomicUsize::new(0),
            sessions_opened: AtomicUsize::new(0),
        }
    }

    /// Every write sleeps this long before it is committed.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-write; keep serving.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn delay_write(&self) {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Reject the next revocation entry write with `reason`.
    pub fn reject_next_entry(&self, reason: impl Into<String>) {
        self.state().entry_rejections.push_back(reason.into());
    }

    /// Make every read and write fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Put a revocation registry state on the ledger without a write.
    pub fn seed_registry(&self, rev_reg_id: &str, accum: Option<&str>, revoked: &[u32]) {
        let mut state = self.state();
        let registry = state.registries.entry(rev_reg_id.to_string()).or_default();
        registry.accum = accum.map(str::to_string);
        registry.revoked.extend(revoked.iter().copied());
        registry.txn_time = now();
    }

    /// Number of accepted writes.
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    pub fn revoked(&self, rev_reg_id: &str) -> Vec<u32> {
        self.state()
            .registries
            .get(rev_reg_id)
            .map(|registry| registry.revoked.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn accumulator(&self, rev_reg_id: &str) -> Option<String> {
        self.state().registries.get(rev_reg_id).and_then(|registry| registry.accum.clone())
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

fn already_exists<T: serde::Serialize>(kind: &str, id: &str, existing: &T) -> LedgerError {
    LedgerError::ObjectAlreadyExists {
        message: format!("{kind} {id} already exists on the ledger"),
        id: id.to_string(),
        existing: serde_json::to_value(existing).unwrap_or_else(|_| json!({})),
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn open(&self) -> Result<(), LedgerError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }

    async fn get_schema(&self, schema_id: &str) -> Result<Option<LedgerSchema>, LedgerError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.schemas.get(schema_id).cloned())
    }

    async fn get_credential_definition(
        &self,
        cred_def_id: &str,
    ) -> Result<Option<LedgerCredDef>, LedgerError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.cred_defs.get(cred_def_id).cloned())
    }

    async fn get_revoc_reg_def(
        &self,
        rev_reg_id: &str,
    ) -> Result<Option<LedgerRevRegDef>, LedgerError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.rev_reg_defs.get(rev_reg_id).cloned())
    }

    async fn get_revoc_reg_delta(
        &self,
        rev_reg_id: &str,
    ) -> Result<Option<(RevRegDelta, u64)>, LedgerError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.registries.get(rev_reg_id).map(|registry| {
            let delta = RevRegDelta {
                ver: OBJECT_VERSION.to_string(),
                value: RevRegDeltaValue {
                    prev_accum: None,
                    accum: registry.accum.clone(),
                    issued: Vec::new(),
                    revoked: registry.revoked.iter().copied().collect(),
                },
            };
            (delta, registry.txn_time)
        }))
    }

    async fn send_schema(
        &self,
        schema: &LedgerSchema,
        _author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        self.delay_write().await;
        let mut state = self.state();
        state.check_available()?;
        if let Some(existing) = state.schemas.get(&schema.id) {
            return Err(already_exists("Schema", &schema.id, existing));
        }
        let reply = state.next_reply();
        let mut stored = schema.clone();
        stored.seq_no = reply.seq_no();
        state.schemas.insert(schema.id.clone(), stored);
        Ok(reply)
    }

    async fn send_credential_definition(
        &self,
        cred_def: &LedgerCredDef,
        _author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        self.delay_write().await;
        let mut state = self.state();
        state.check_available()?;
        if let Some(existing) = state.cred_defs.get(&cred_def.id) {
            return Err(already_exists("Credential definition", &cred_def.id, existing));
        }
        let reply = state.next_reply();
        state.cred_defs.insert(cred_def.id.clone(), cred_def.clone());
        Ok(reply)
    }

    async fn send_revoc_reg_def(
        &self,
        rev_reg_def: &LedgerRevRegDef,
        _author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        self.delay_write().await;
        let mut state = self.state();
        state.check_available()?;
        if let Some(existing) = state.rev_reg_defs.get(&rev_reg_def.id) {
            return Err(already_exists(
                "Revocation registry definition",
                &rev_reg_def.id,
                existing,
            ));
        }
        let reply = state.next_reply();
        state.rev_reg_defs.insert(rev_reg_def.id.clone(), rev_reg_def.clone());
        Ok(reply)
    }

    async fn send_revoc_reg_entry(
        &self,
        rev_reg_id: &str,
        _revoc_def_type: &str,
        entry: &RevRegEntry,
        _author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        self.delay_write().await;
        let mut state = self.state();
        state.check_available()?;
        if let Some(reason) = state.entry_rejections.pop_front() {
            return Err(LedgerError::TransactionRejected { reason });
        }

        let current = state.registries.get(rev_reg_id).and_then(|registry| registry.accum.clone());
        if let (Some(prev), Some(current)) = (&entry.value.prev_accum, &current) {
            if prev != current {
                return Err(LedgerError::TransactionRejected {
                    reason: format!(
                        "client request invalid: \
                         InvalidClientRequest(\"prevAccum {prev} does not match {current}\")"
                    ),
                });
            }
        }

        let reply = state.next_reply();
        let registry = state.registries.entry(rev_reg_id.to_string()).or_default();
        registry.accum = Some(entry.value.accum.clone());
        // Republishing an index already in the set leaves it unchanged.
        registry.revoked.extend(entry.value.revoked.iter().copied());
        for index in &entry.value.issued {
            registry.revoked.remove(index);
        }
        registry.txn_time = reply.txn_metadata.txn_time.unwrap_or_default();
        Ok(reply)
    }

    async fn genesis_txns(&self) -> Result<String, LedgerError> {
        Ok(self.genesis.clone())
    }
}
