// src/registry/error.rs
//! Errors surfaced by registry operations.
//!
//! Ledger and wallet failures are wrapped here at the registry boundary;
//! callers never see a transport client's native error type directly, only
//! as the preserved `source()`.

use crate::ledger::LedgerError;
use crate::models::{Artifact, ArtifactKind};
use crate::wallet::WalletError;

/// Coarse category used by workflows to pick retry / alert / abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing configuration or dependency metadata, malformed input.
    Precondition,
    NotFound,
    Conflict,
    /// The ledger refused the write.
    Ledger,
    Transport,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{0}")]
    NoLedgerAvailable(String),

    /// A credential definition's schema has no ledger sequence number.
    #[error("{0}")]
    MissingDependencyMetadata(String),

    #[error("{kind} not found: {id}")]
    NotFound {
        kind: ArtifactKind,
        id: String,
        ledger_id: Option<String>,
    },

    /// The identifier is taken; `existing` is the ledger's copy when it
    /// could be read back.
    #[error("{message}")]
    AlreadyExists {
        message: String,
        id: String,
        existing: Option<Box<Artifact>>,
    },

    #[error("{message}")]
    Registration {
        message: String,
        #[source]
        source: Option<LedgerError>,
    },

    #[error("{message}")]
    Resolution {
        message: String,
        #[source]
        source: Option<LedgerError>,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl RegistryError {
    pub fn registration(message: impl Into<String>, source: LedgerError) -> Self {
        Self::Registration {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Registration failure detected before anything reached the ledger.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
            source: None,
        }
    }

    pub fn resolution(message: impl Into<String>, source: LedgerError) -> Self {
        Self::Resolution {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoLedgerAvailable(_) | Self::MissingDependencyMetadata(_) => {
                ErrorKind::Precondition
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::Conflict,
            Self::Registration { source: None, .. } | Self::Resolution { source: None, .. } => {
                ErrorKind::Precondition
            }
            Self::Registration { source: Some(err), .. }
            | Self::Resolution { source: Some(err), .. }
            | Self::Ledger(err) => ledger_kind(err),
            Self::Wallet(_) => ErrorKind::Storage,
        }
    }

    /// Only transport failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

fn ledger_kind(err: &LedgerError) -> ErrorKind {
    match err {
        LedgerError::ObjectAlreadyExists { .. } => ErrorKind::Conflict,
        LedgerError::Http { .. } | LedgerError::Transport(_) => ErrorKind::Transport,
        LedgerError::NotAvailable(_) | LedgerError::Genesis(_) => ErrorKind::Precondition,
        LedgerError::TransactionRejected { .. } | LedgerError::BadResponse(_) => ErrorKind::Ledger,
    }
}
