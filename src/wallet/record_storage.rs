// src/wallet/record_storage.rs
//! In-memory wallet record storage.
//!
//! Keeps issuer revocation records, registry accumulators and the set of
//! credential definitions with private material in hashmaps behind a
//! `tokio::sync::RwLock`, so one instance can be shared across request tasks.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::{IssuerCredRevRecord, RevocationState, WalletError, WalletStore};

#[derive(Default)]
struct Records {
    /// Keyed by (rev_reg_id, cred_rev_id)
    revocations: HashMap<(String, u32), IssuerCredRevRecord>,
    accumulators: HashMap<String, String>,
    cred_defs: HashSet<String>,
}

/// In-memory implementation of `WalletStore`.
///
/// # Note
/// Nothing is persisted; intended for tests, dry runs and CLI inspection of
/// exported records.
#[derive(Default)]
pub struct InMemoryWallet {
    records: RwLock<Records>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet preloaded with `records`.
    pub fn with_records(records: Vec<IssuerCredRevRecord>) -> Self {
        let revocations = records
            .into_iter()
            .map(|rec| ((rec.rev_reg_id.clone(), rec.cred_rev_id), rec))
            .collect();
        Self {
            records: RwLock::new(Records {
                revocations,
                ..Default::default()
            }),
        }
    }

    /// Stores a revocation record.
    ///
    /// # Behavior
    /// - Overwrites the record for the same registry and index
    pub async fn store_record(&self, record: IssuerCredRevRecord) {
        let key = (record.rev_reg_id.clone(), record.cred_rev_id);
        self.records.write().await.revocations.insert(key, record);
    }

    /// Marks an index revoked locally; the ledger is not touched.
    pub async fn mark_revoked(
        &self,
        rev_reg_id: &str,
        cred_rev_id: u32,
    ) -> Result<(), WalletError> {
        let mut records = self.records.write().await;
        let record = records
            .revocations
            .get_mut(&(rev_reg_id.to_string(), cred_rev_id))
            .ok_or_else(|| WalletError::NotFound(format!("{rev_reg_id}#{cred_rev_id}")))?;
        record.state = RevocationState::Revoked;
        Ok(())
    }

    pub async fn set_accumulator(&self, rev_reg_id: &str, accum: impl Into<String>) {
        self.records
            .write()
            .await
            .accumulators
            .insert(rev_reg_id.to_string(), accum.into());
    }

    pub async fn add_credential_definition(&self, cred_def_id: impl Into<String>) {
        self.records.write().await.cred_defs.insert(cred_def_id.into());
    }

}

#[async_trait]
impl WalletStore for InMemoryWallet {
    async fn revocation_records(
        &self,
        rev_reg_id: &str,
    ) -> Result<Vec<IssuerCredRevRecord>, WalletError> {
        let records = self.records.read().await;
        let mut found: Vec<_> = records
            .revocations
            .values()
            .filter(|rec| rec.rev_reg_id == rev_reg_id)
            .cloned()
            .collect();
        found.sort_by_key(|rec| rec.cred_rev_id);
        Ok(found)
    }

    async fn current_accumulator(&self, rev_reg_id: &str) -> Result<Option<String>, WalletError> {
        Ok(self.records.read().await.accumulators.get(rev_reg_id).cloned())
    }

    async fn credential_definition_in_wallet(
        &self,
        cred_def_id: &str,
    ) -> Result<bool, WalletError> {
        Ok(self.records.read().await.cred_defs.contains(cred_def_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rev_reg_id: &str, index: u32, state: RevocationState) -> IssuerCredRevRecord {
        IssuerCredRevRecord {
            rev_reg_id: rev_reg_id.to_string(),
            cred_rev_id: index,
            cred_ex_id: Some(format!("cred-ex-{index}")),
            state,
        }
    }

    #[tokio::test]
    async fn test_records_filtered_by_registry() {
        let wallet = InMemoryWallet::with_records(vec![
            record("reg-a", 2, RevocationState::Issued),
            record("reg-b", 1, RevocationState::Revoked),
            record("reg-a", 1, RevocationState::Revoked),
        ]);

        let found = wallet.revocation_records("reg-a").await.unwrap();
        let indices: Vec<u32> = found.iter().map(|rec| rec.cred_rev_id).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_mark_revoked() {
        let wallet = InMemoryWallet::new();
        wallet.store_record(record("reg-a", 4, RevocationState::Issued)).await;

        wallet.mark_revoked("reg-a", 4).await.unwrap();
        let found = wallet.revocation_records("reg-a").await.unwrap();
        assert!(found[0].is_revoked());

        // Unknown index
        assert!(wallet.mark_revoked("reg-a", 9).await.is_err());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let wallet = InMemoryWallet::new();
        wallet.store_record(record("reg-a", 1, RevocationState::Issued)).await;
        wallet.store_record(record("reg-a", 1, RevocationState::Revoked)).await;

        let found = wallet.revocation_records("reg-a").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_revoked());
    }

    #[tokio::test]
    async fn test_accumulator_and_cred_defs() {
        let wallet = InMemoryWallet::new();
        assert_eq!(wallet.current_accumulator("reg-a").await.unwrap(), None);

        wallet.set_accumulator("reg-a", "21 ACC").await;
        wallet.add_credential_definition("did:example:issuer1:3:CL:12:default").await;

        assert_eq!(wallet.current_accumulator("reg-a").await.unwrap().as_deref(), Some("21 ACC"));
        assert!(wallet
            .credential_definition_in_wallet("did:example:issuer1:3:CL:12:default")
            .await
            .unwrap());
    }
}
