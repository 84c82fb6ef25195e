// src/lib.rs
//! # AnonCreds Ledger Registry
//!
//! Registers and resolves AnonCreds artifacts (schemas, credential
//! definitions, revocation registry definitions and revocation status
//! lists) against a legacy Indy-style ledger, and reconciles revocation
//! state the wallet recorded but the ledger never received.
//!
//! ## Layers
//! 1. **Models**: artifact data structures and result envelopes
//! 2. **Ledger**: `Ledger` trait, scoped sessions, pool selection, HTTP gateway client
//! 3. **Wallet**: read access to issuer revocation records
//! 4. **Registry**: identifier derivation, registrar, resolver, reconciliation

pub mod config;
pub mod ledger;
pub mod models;
pub mod profile;
pub mod registry;
pub mod utils;
pub mod wallet;

pub use config::Settings;
pub use profile::Profile;
pub use registry::{ErrorKind, RegistryError};
