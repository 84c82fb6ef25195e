// src/wallet/mod.rs
//! Wallet-side bookkeeping consumed by the registry.
//!
//! The registry never writes wallet records; it only reads what the
//! issuance and revocation workflows recorded locally.

pub mod record_storage;

pub use record_storage::InMemoryWallet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors from wallet storage.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("wallet record not found: {0}")]
    NotFound(String),
}

/// Local revocation state of one issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationState {
    Issued,
    Revoked,
}

/// Issuer-side record linking a credential exchange to its revocation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerCredRevRecord {
    pub rev_reg_id: String,
    /// Index of the credential in the revocation registry
    pub cred_rev_id: u32,
    pub cred_ex_id: Option<String>,
    pub state: RevocationState,
}

impl IssuerCredRevRecord {
    pub fn is_revoked(&self) -> bool {
        self.state == RevocationState::Revoked
    }
}

/// Read access to the wallet's issuer records.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// All credential revocation records of a registry.
    async fn revocation_records(
        &self,
        rev_reg_id: &str,
    ) -> Result<Vec<IssuerCredRevRecord>, WalletError>;

    /// Accumulator value the wallet last recorded for a registry.
    async fn current_accumulator(&self, rev_reg_id: &str) -> Result<Option<String>, WalletError>;

    /// Whether the wallet holds private material for a credential definition.
    async fn credential_definition_in_wallet(&self, cred_def_id: &str) -> Result<bool, WalletError>;
}
