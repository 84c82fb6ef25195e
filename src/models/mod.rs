// src/models/mod.rs
//! Domain data structures for the AnonCreds artifacts handled by the registry.

pub mod cred_def;
pub mod result;
pub mod revocation;
pub mod schema;

pub use cred_def::{CredDef, GetCredDefResult};
pub use result::{
    Artifact, ArtifactKind, ArtifactMetadata, JobState, RegistrationResult, ResolutionMetadata,
};
pub use revocation::{
    GetRevRegDefResult, GetRevStatusListResult, RevRegDef, RevRegDefValue, RevStatusList,
};
pub use schema::{GetSchemaResult, Schema};
