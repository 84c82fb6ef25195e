// src/profile.rs
//! Per-agent context handed to every registry operation.

use std::sync::Arc;

use crate::config::Settings;
use crate::ledger::LedgerSelector;
use crate::wallet::WalletStore;

/// Settings, wallet and ledger pools of one agent (or tenant).
///
/// Cheap to clone; the collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct Profile {
    pub name: String,
    pub settings: Settings,
    wallet: Arc<dyn WalletStore>,
    ledgers: Arc<dyn LedgerSelector>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        settings: Settings,
        wallet: Arc<dyn WalletStore>,
        ledgers: Arc<dyn LedgerSelector>,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            wallet,
            ledgers,
        }
    }

    pub fn wallet(&self) -> &dyn WalletStore {
        self.wallet.as_ref()
    }

    pub fn ledgers(&self) -> &dyn LedgerSelector {
        self.ledgers.as_ref()
    }

    /// Why no ledger could be used, hinting at a missing wallet type.
    pub fn no_ledger_reason(&self) -> String {
        let mut reason = String::from("No ledger available");
        if self.settings.wallet_type.is_none() {
            reason.push_str(": missing wallet-type?");
        }
        reason
    }
}
