// src/ledger/error.rs
//! Ledger client error taxonomy.
//!
//! These errors never leave the crate's public registry functions as-is;
//! `registry` wraps them into `RegistryError` while preserving the source.

/// Rejection code embedded in a ledger `REJECT`/`REQNACK` reason string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The request was malformed or conflicts with ledger-side state.
    InvalidClientRequest,
    /// The author has no current transaction author agreement acceptance.
    TaaAcceptanceRequired,
    /// Anything the registry does not know how to handle.
    Other,
}

impl RejectionReason {
    pub fn from_reason(reason: &str) -> Self {
        // TAA first: its code also starts with "InvalidClient".
        if reason.contains("InvalidClientTaaAcceptanceError") {
            Self::TaaAcceptanceRequired
        } else if reason.contains("InvalidClientRequest") {
            Self::InvalidClientRequest
        } else {
            Self::Other
        }
    }
}

/// Errors raised by `Ledger` implementations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The object is already on the ledger; `existing` is the ledger's copy.
    #[error("{message}")]
    ObjectAlreadyExists {
        message: String,
        id: String,
        existing: serde_json::Value,
    },

    /// The ledger refused the transaction.
    #[error("Ledger rejected transaction request: {reason}")]
    TransactionRejected { reason: String },

    /// HTTP transport failure talking to a ledger gateway.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Any other transport-level failure.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// No ledger is configured for the requested operation.
    #[error("{0}")]
    NotAvailable(String),

    /// The ledger answered with something that could not be interpreted.
    #[error("malformed ledger response: {0}")]
    BadResponse(String),

    /// Genesis transactions missing or unusable.
    #[error("invalid genesis transactions: {0}")]
    Genesis(String),
}

impl LedgerError {
    /// Rejection code of a `TransactionRejected` error.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            Self::TransactionRejected { reason } => Some(RejectionReason::from_reason(reason)),
            _ => None,
        }
    }
}
