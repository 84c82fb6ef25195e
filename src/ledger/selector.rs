// src/ledger/selector.rs
//! Ledger pool selection.
//!
//! An agent may be connected to several ledger pools. `LedgerPools` is an
//! explicit registry object handed to the `Profile` at construction; it
//! routes identifiers to the pool whose namespace they live in.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::Ledger;

/// A ledger chosen for an operation, with the id it is known under.
#[derive(Clone)]
pub struct SelectedLedger {
    pub ledger_id: String,
    pub ledger: Arc<dyn Ledger>,
}

impl fmt::Debug for SelectedLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedLedger").field("ledger_id", &self.ledger_id).finish()
    }
}

/// Resolves which ledger pool owns an identifier's namespace.
#[async_trait]
pub trait LedgerSelector: Send + Sync {
    /// Pool authoritative for `identifier`, or `None` when nothing fits.
    async fn select(&self, identifier: &str) -> Option<SelectedLedger>;

    /// Pool this agent writes to.
    fn write_ledger(&self) -> Option<SelectedLedger>;
}

/// One configured ledger pool.
pub struct LedgerPool {
    pub id: String,
    /// Identifier prefixes served by this pool (e.g. `"did:sov:"`, `"Th7M"`)
    pub namespaces: Vec<String>,
    pub is_write: bool,
    pub ledger: Arc<dyn Ledger>,
}

/// Namespace-routing selector over a fixed set of pools.
///
/// The longest matching namespace prefix wins; identifiers no pool claims go
/// to the write pool.
#[derive(Default)]
pub struct LedgerPools {
    pools: Vec<LedgerPool>,
}

impl LedgerPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding a single pool that is both read and write target.
    pub fn single(id: impl Into<String>, ledger: Arc<dyn Ledger>) -> Self {
        Self::new().with_pool(LedgerPool {
            id: id.into(),
            namespaces: Vec::new(),
            is_write: true,
            ledger,
        })
    }

    pub fn with_pool(mut self, pool: LedgerPool) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    fn selected(pool: &LedgerPool) -> SelectedLedger {
        SelectedLedger {
            ledger_id: pool.id.clone(),
            ledger: pool.ledger.clone(),
        }
    }
}

#[async_trait]
impl LedgerSelector for LedgerPools {
    async fn select(&self, identifier: &str) -> Option<SelectedLedger> {
        let by_namespace = self
            .pools
            .iter()
            .filter_map(|pool| {
                pool.namespaces
                    .iter()
                    .filter(|ns| identifier.starts_with(ns.as_str()))
                    .map(|ns| ns.len())
                    .max()
                    .map(|len| (len, pool))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, pool)| Self::selected(pool));

        by_namespace.or_else(|| self.write_ledger())
    }

    fn write_ledger(&self) -> Option<SelectedLedger> {
        self.pools.iter().find(|pool| pool.is_write).map(Self::selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::InMemoryLedger;

    fn pools() -> LedgerPools {
        LedgerPools::new()
            .with_pool(LedgerPool {
                id: "main".into(),
                namespaces: vec!["did:example:".into()],
                is_write: true,
                ledger: Arc::new(InMemoryLedger::new()),
            })
            .with_pool(LedgerPool {
                id: "test".into(),
                namespaces: vec!["did:example:test".into()],
                is_write: false,
                ledger: Arc::new(InMemoryLedger::new()),
            })
    }

    #[tokio::test]
    async fn test_longest_namespace_wins() {
        let selected = pools().select("did:example:test1:2:degree:1.0").await.unwrap();
        assert_eq!(selected.ledger_id, "test");

        let selected = pools().select("did:example:issuer1:2:degree:1.0").await.unwrap();
        assert_eq!(selected.ledger_id, "main");
    }

    #[tokio::test]
    async fn test_unclaimed_identifier_falls_back_to_write_pool() {
        let selected = pools().select("Th7MpTaRZVRYnPiabds81Y:2:degree:1.0").await.unwrap();
        assert_eq!(selected.ledger_id, "main");
    }

    #[tokio::test]
    async fn test_empty_registry_selects_nothing() {
        let empty = LedgerPools::new();
        assert!(empty.select("anything").await.is_none());
        assert!(empty.write_ledger().is_none());
    }
}
