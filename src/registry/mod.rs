// src/registry/mod.rs
//! Legacy ledger AnonCreds registry.
//!
//! Publishes and resolves schemas, credential definitions, revocation
//! registry definitions and revocation status lists on a legacy Indy-style
//! ledger, and repairs revocation entries the ledger missed.

pub mod error;
pub mod identifiers;
pub mod recovery;
pub mod registrar;
pub mod resolver;
pub mod revocation;
pub mod translate;

pub use error::{ErrorKind, RegistryError};
pub use recovery::{build_corrective_transaction, CorrectiveTransaction};
pub use registrar::{
    register_credential_definition, register_revocation_registry_definition, register_schema,
    RegistrationOptions,
};
pub use resolver::{
    resolve_credential_definition, resolve_revocation_registry_definition,
    resolve_revocation_status_list, resolve_schema,
};
pub use revocation::{
    fetch_genesis, reconcile_revocation_entry, register_revocation_status_list, ReconcileOutcome,
};
