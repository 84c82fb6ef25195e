// src/ledger/mod.rs
//! Ledger access layer.
//!
//! The registry consumes the ledger only through the `Ledger` trait. A
//! `LedgerSession` is acquired per call and released on every exit path;
//! `LedgerSelector` decides which pool is authoritative for an identifier.

pub mod error;
pub mod http_client;
pub mod memory;
pub mod requests;
pub mod selector;
pub mod wire;

pub use error::{LedgerError, RejectionReason};
pub use selector::{LedgerPool, LedgerPools, LedgerSelector, SelectedLedger};

use async_trait::async_trait;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use wire::{LedgerCredDef, LedgerRevRegDef, LedgerSchema, RevRegDelta, RevRegEntry, TxnReply};

/// Raw read/write primitives of one ledger pool.
///
/// Reads return `Ok(None)` when the ledger has no such object. Writes that
/// hit an existing object fail with `LedgerError::ObjectAlreadyExists`
/// carrying the ledger's copy.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// async tasks behind an `Arc`.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Acquire the pool connection for a session.
    async fn open(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    /// Release the pool connection. Called from `Drop`, so it cannot block.
    fn close(&self) {}

    async fn get_schema(&self, schema_id: &str) -> Result<Option<LedgerSchema>, LedgerError>;

    async fn get_credential_definition(
        &self,
        cred_def_id: &str,
    ) -> Result<Option<LedgerCredDef>, LedgerError>;

    async fn get_revoc_reg_def(
        &self,
        rev_reg_id: &str,
    ) -> Result<Option<LedgerRevRegDef>, LedgerError>;

    /// Cumulative revocation delta and the ledger time it was read at.
    async fn get_revoc_reg_delta(
        &self,
        rev_reg_id: &str,
    ) -> Result<Option<(RevRegDelta, u64)>, LedgerError>;

    async fn send_schema(
        &self,
        schema: &LedgerSchema,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError>;

    async fn send_credential_definition(
        &self,
        cred_def: &LedgerCredDef,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError>;

    async fn send_revoc_reg_def(
        &self,
        rev_reg_def: &LedgerRevRegDef,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError>;

    async fn send_revoc_reg_entry(
        &self,
        rev_reg_id: &str,
        revoc_def_type: &str,
        entry: &RevRegEntry,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError>;

    /// Genesis transactions of the pool, newline-delimited JSON.
    async fn genesis_txns(&self) -> Result<String, LedgerError>;
}

/// Scoped ledger session.
///
/// Opening calls `Ledger::open`; dropping the session calls
/// `Ledger::close`, whether the holder returned normally, bailed out with
/// `?`, or was cancelled mid-await.
pub struct LedgerSession {
    ledger: Arc<dyn Ledger>,
}

impl LedgerSession {
    pub async fn open(ledger: Arc<dyn Ledger>) -> Result<Self, LedgerError> {
        ledger.open().await?;
        Ok(Self { ledger })
    }
}

impl Deref for LedgerSession {
    type Target = dyn Ledger;

    fn deref(&self) -> &Self::Target {
        self.ledger.as_ref()
    }
}

impl Drop for LedgerSession {
    fn drop(&mut self) {
        self.ledger.close();
    }
}

/// Runs a ledger write as its own task and joins it.
///
/// Dropping the returned future (caller timeout or cancellation) detaches
/// the task instead of aborting it, so a dispatched write always completes.
pub async fn shielded<T, F>(write: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(write).await {
        Ok(result) => result,
        Err(join_err) => Err(LedgerError::Transport(format!(
            "ledger write task failed: {join_err}"
        ))),
    }
}
